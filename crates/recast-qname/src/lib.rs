//! Recast Qualified Names
//!
//! Stable string identities for records.
//!
//! # Core Concepts
//!
//! - [`encode`] / [`decode`]: separator-joined atoms and back
//! - [`QName`]: decoded atom list
//! - [`resolve_qualifier`]: abbreviated qualifier lookup over an ordered list
//! - [`Codec`]: separator + known qualifiers, parses `qualifier/name` inputs
//! - [`CodecSettings`]: serde/TOML configuration for a codec
//!
//! # Example
//!
//! ```rust
//! use recast_qname::{decode, encode, Codec};
//!
//! let key = encode(["custom_name", "web"], "/");
//! assert_eq!(decode(&key, "/"), vec!["custom_name", "web"]);
//!
//! let codec = Codec::default();
//! assert_eq!(codec.qname("mod/web").unwrap(), vec![("model".into(), "web".into())]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod codec;
mod qname;
mod settings;

pub use codec::{resolve_qualifier, Codec};
pub use qname::{decode, encode, QName, DEFAULT_SEPARATOR};
pub use settings::{CodecSettings, MODEL_QUALIFIER};

/// Errors related to qualified names
#[derive(Debug, thiserror::Error)]
pub enum QNameError {
    /// Input does not match `qualifier/name` or uses an unknown qualifier
    #[error("bad qname: {0}")]
    BadQName(String),

    /// Settings document could not be parsed
    #[error("invalid codec settings: {0}")]
    Settings(#[from] toml::de::Error),
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
