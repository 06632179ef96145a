//! Recast Bundles - reusable attribute groups
//!
//! Each bundle is a [`Bundle`](recast_model::Bundle) mixed into a schema
//! through [`SchemaBuilder::bundle`](recast_model::SchemaBuilder::bundle).
//!
//! # Core Concepts
//!
//! - [`with_url`] / [`with_connection_url`]: a composite `url` over its parts
//! - [`with_image`]: a composite container `image` reference
//! - [`with_environment`]: an `env` mapping rendered by [`format_env`]
//! - [`with_aws`]: credential fields
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use recast_bundles::with_url;
//! use recast_model::{config, Registry, SchemaBuilder, Value};
//!
//! let registry = Arc::new(Registry::new());
//! let endpoint = SchemaBuilder::new("Endpoint", registry.root())
//!     .new_model()
//!     .bundle(with_url())
//!     .register(&registry);
//!
//! let mut record = registry
//!     .from_config(&endpoint, config! { "url" => "http://host:80/path" })
//!     .unwrap();
//! assert_eq!(record.get("hostname").unwrap(), Value::from("host"));
//!
//! record.set("url", "//other:8080").unwrap();
//! assert_eq!(record.get("url").unwrap(), Value::from("http://other:8080/path"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod aws;
pub mod environment;
pub mod image;
pub mod urls;

pub use aws::with_aws;
pub use environment::{format_env, format_value, with_environment, Escape, FormattedEnv, ENV};
pub use image::{with_image, ImageRef, IMAGE};
pub use urls::{
    compose_url, encode_query, parse_query, with_connection_url, with_url, Netloc, UrlParts, DATABASE, HOSTNAMES,
    NETLOC, URL,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
