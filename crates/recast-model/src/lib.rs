//! Recast Model - declarative typed records
//!
//! Records are declared once as a [`Schema`] and instantiated from loose
//! configuration, resolving at construction time to the most specific
//! registered schema for a `(model, type)` pair.
//!
//! # Core Concepts
//!
//! - [`Attribute`]: computed, cached and validated-stored field descriptors
//! - [`Schema`] / [`SchemaBuilder`]: ordered fields, compact and key attributes
//! - [`Registry`]: `(model, type)` table with cast-checked construction
//! - [`Record`]: live instance; mapping-style access, qualified keys, merge
//! - [`collection`]: keyed collections of sub-records
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use recast_model::{config, Registry, SchemaBuilder, Value};
//!
//! let registry = Arc::new(Registry::new());
//! let service = SchemaBuilder::new("Service", registry.root())
//!     .new_model()
//!     .field("port", 80)
//!     .register(&registry);
//! SchemaBuilder::new("Web", &service).register(&registry);
//!
//! let web = registry
//!     .from_config(registry.root(), config! { "model" => "service", "type" => "web", "name" => "api" })
//!     .unwrap();
//! assert_eq!(web.key().unwrap(), "web/api");
//! assert_eq!(web.get("port").unwrap(), Value::Int(80));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use std::sync::Arc;

use once_cell::sync::Lazy;

pub mod attribute;
pub mod collection;
pub mod config;
pub mod error;
mod identity;
pub mod merge;
pub mod record;
pub mod registry;
pub mod schema;
pub mod value;

pub use attribute::{Access, Assign, Attribute, AttributeHost, Capability, Outcome};
pub use collection::{collection, DEFAULTS_KEY};
pub use config::ConfigError;
pub use error::{CastError, ModelError, Result, ValidationError};
pub use identity::normalize_name;
pub use merge::{merge, merge_from};
pub use record::{key_to_config, AttributeFilter, Record};
pub use registry::{Registry, TypeRequest};
pub use schema::{base, snake_case, Bundle, Field, Schema, SchemaBuilder, KEY, MODEL, NAME, TYPE, WILDCARD};
pub use value::{Config, Value};

static REGISTRY: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::new()));

/// Process-wide registry
#[must_use]
pub fn registry() -> Arc<Registry> {
    Arc::clone(&REGISTRY)
}

/// Construct through the root `Model` of the process-wide registry
///
/// # Errors
/// Same as [`Registry::from_config`]
pub fn new(config: Config) -> Result<Record> {
    from_config(config)
}

/// Construct from configuration through the process-wide registry
///
/// # Errors
/// Same as [`Registry::from_config`]
pub fn from_config(config: Config) -> Result<Record> {
    REGISTRY.from_config(REGISTRY.root(), config)
}

/// Construct from a qualified key through the process-wide registry
///
/// # Errors
/// Same as [`Registry::from_keyconfig`]
pub fn from_keyconfig(key: &str, config: Config) -> Result<Record> {
    REGISTRY.from_keyconfig(REGISTRY.root(), key, config)
}

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for declaring and building records
    pub use crate::{
        collection, config, AttributeFilter, Attribute, Bundle, Config, ModelError, Record, Registry,
        Schema, SchemaBuilder, Value,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
