//! Codec settings

use serde::{Deserialize, Serialize};

use crate::qname::DEFAULT_SEPARATOR;
use crate::QNameError;

/// Qualifier used by model configuration
pub const MODEL_QUALIFIER: &str = "model";

/// Settings for a [`Codec`](crate::Codec)
///
/// ```toml
/// separator = "/"
/// qualifiers = ["model", "service"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecSettings {
    /// Atom separator
    pub separator: String,
    /// Known qualifiers, in resolution order
    pub qualifiers: Vec<String>,
}

impl CodecSettings {
    /// Default settings
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With separator
    #[inline]
    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// With known qualifiers
    #[inline]
    #[must_use]
    pub fn with_qualifiers<I, S>(mut self, qualifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.qualifiers = qualifiers.into_iter().map(Into::into).collect();
        self
    }

    /// Parse from a TOML document; missing keys keep their defaults
    ///
    /// # Errors
    /// Returns error if the document is not valid TOML for these settings
    pub fn from_toml_str(input: &str) -> Result<Self, QNameError> {
        toml::from_str(input).map_err(QNameError::Settings)
    }
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            qualifiers: vec![MODEL_QUALIFIER.to_string()],
        }
    }
}
