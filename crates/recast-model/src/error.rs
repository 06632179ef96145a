//! Error types for records
//!
//! Provides error handling for:
//! - Casts (unregistered or wrong-direction `(model, type)` resolution)
//! - Unknown attributes in configuration or on live records
//! - Validator rejections
//! - Mapping-style accessor failures

use recast_qname::QNameError;

use crate::config::ConfigError;

/// Main record error type
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Requested `(model, type)` could not be cast
    #[error(transparent)]
    Cast(#[from] CastError),

    /// Configuration named attributes the schema does not declare
    #[error("bad attributes for {model}/{type_name}: {}", .names.join(", "))]
    UnknownAttributes {
        /// Model being constructed
        model: String,
        /// Type being constructed
        type_name: String,
        /// Leftover keys, sorted
        names: Vec<String>,
    },

    /// Access to an attribute the schema does not expose
    #[error("bad {type_name} attribute: {name}")]
    UnknownAttribute {
        /// Type of the record
        type_name: String,
        /// Requested attribute
        name: String,
    },

    /// Attributes can never be deleted
    #[error("deleting {name} is not allowed")]
    DeleteForbidden {
        /// Attribute named in the delete
        name: String,
    },

    /// Write to a computed attribute without a writer
    #[error("attribute {name} is read-only")]
    ReadOnly {
        /// Computed attribute
        name: String,
    },

    /// Validator rejected a value
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Failure raised through a mapping-style accessor
    #[error("{source}")]
    Key {
        /// Attribute named in the access
        name: String,
        /// Underlying failure
        #[source]
        source: Box<ModelError>,
    },

    /// Qualified key has more parts than the schema has key attributes
    #[error("bad key for {type_name}: {key}")]
    BadKey {
        /// Type the key was aligned against
        type_name: String,
        /// Offending key
        key: String,
    },

    /// Qualified-name error
    #[error(transparent)]
    QName(#[from] QNameError),

    /// Configuration document error
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ModelError {
    /// Wrap as a mapping-style lookup failure
    #[inline]
    #[must_use]
    pub fn into_key_error(self, name: impl Into<String>) -> Self {
        match self {
            key @ Self::Key { .. } => key,
            other => Self::Key {
                name: name.into(),
                source: Box::new(other),
            },
        }
    }

    /// Innermost error, looking through mapping-style wrappers
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Key { source, .. } => source.root(),
            other => other,
        }
    }

    /// Check if error is a cast failure
    #[inline]
    #[must_use]
    pub fn is_cast(&self) -> bool {
        matches!(self.root(), Self::Cast(_))
    }

    /// Check if error is an unknown-attribute failure
    #[inline]
    #[must_use]
    pub fn is_unknown_attribute(&self) -> bool {
        matches!(
            self.root(),
            Self::UnknownAttributes { .. } | Self::UnknownAttribute { .. } | Self::DeleteForbidden { .. }
        )
    }

    /// Check if error came from a validator
    #[inline]
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self.root(), Self::Validation(_))
    }

    /// Check if error was raised through a mapping-style accessor
    #[inline]
    #[must_use]
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Key { .. })
    }
}

/// Cast errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CastError {
    /// No schema registered for any candidate type
    #[error("bad model-type: {model}-{}", .types.join(","))]
    Unregistered {
        /// Requested model
        model: String,
        /// Candidate types tried, in order
        types: Vec<String>,
    },

    /// Resolved schema is an ancestor of the caller
    #[error("attempted upcast: {from} to {to}")]
    Upcast {
        /// Calling schema's `model-type` label
        from: String,
        /// Resolved ancestor's `model-type` label
        to: String,
    },

    /// Resolved schema is unrelated to the caller
    #[error("attempted bad cast: {from} to {to}: {from_schema} to {to_schema}")]
    BadCast {
        /// Calling schema's `model-type` label
        from: String,
        /// Resolved schema's `model-type` label
        to: String,
        /// Calling schema name
        from_schema: String,
        /// Resolved schema name
        to_schema: String,
    },
}

/// Validator rejection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {attribute}: {message}")]
pub struct ValidationError {
    /// Attribute being written
    pub attribute: String,
    /// Reason
    pub message: String,
}

impl ValidationError {
    /// Create validation error
    #[inline]
    pub fn new(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Value of the wrong kind for `attribute`
    #[must_use]
    pub fn mismatch(attribute: &str, expected: &str, actual: &crate::Value) -> Self {
        Self::new(attribute, format!("expected {expected}, got {}", actual.kind()))
    }
}

/// Crate result alias
pub type Result<T, E = ModelError> = std::result::Result<T, E>;
