//! Qualifier-aware codec
//!
//! A [`Codec`] pairs a separator with an ordered list of known qualifiers and
//! parses `qualifier/name` strings against them.

use crate::qname::{decode, encode};
use crate::settings::CodecSettings;
use crate::QNameError;

/// Resolve an abbreviated qualifier
///
/// An exact match wins; otherwise the first qualifier in `known` that starts
/// with `candidate`. An empty candidate never resolves.
///
/// # Examples
/// ```
/// use recast_qname::resolve_qualifier;
/// let known = ["model", "module"];
/// assert_eq!(resolve_qualifier("mod", &known), Some("model"));
/// assert_eq!(resolve_qualifier("module", &known), Some("module"));
/// assert_eq!(resolve_qualifier("x", &known), None);
/// ```
#[must_use]
pub fn resolve_qualifier<'a, S: AsRef<str>>(candidate: &str, known: &'a [S]) -> Option<&'a str> {
    if candidate.is_empty() {
        return None;
    }

    if let Some(exact) = known.iter().find(|q| q.as_ref() == candidate) {
        return Some(exact.as_ref());
    }

    known
        .iter()
        .map(AsRef::as_ref)
        .find(|q| q.starts_with(candidate))
}

/// Codec bound to a separator and a qualifier list
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Codec {
    settings: CodecSettings,
}

impl Codec {
    /// Create codec from settings
    #[inline]
    #[must_use]
    pub fn new(settings: CodecSettings) -> Self {
        Self { settings }
    }

    /// Settings in use
    #[inline]
    #[must_use]
    pub fn settings(&self) -> &CodecSettings {
        &self.settings
    }

    /// Configured separator
    #[inline]
    #[must_use]
    pub fn separator(&self) -> &str {
        &self.settings.separator
    }

    /// Known qualifiers, in resolution order
    #[inline]
    #[must_use]
    pub fn qualifiers(&self) -> &[String] {
        &self.settings.qualifiers
    }

    /// Encode atoms with this codec's separator
    #[inline]
    #[must_use]
    pub fn encode<I, T>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = T>,
        T: std::fmt::Display,
    {
        encode(parts, self.separator())
    }

    /// Decode a key with this codec's separator
    #[inline]
    #[must_use]
    pub fn decode(&self, key: &str) -> Vec<String> {
        decode(key, self.separator())
    }

    /// Resolve a qualifier against the configured list
    #[inline]
    #[must_use]
    pub fn qualifier(&self, candidate: &str) -> Option<&str> {
        resolve_qualifier(candidate, self.qualifiers())
    }

    /// Parse one `qualifier/name` string
    ///
    /// A missing or empty qualifier expands to every known qualifier.
    ///
    /// # Errors
    /// Returns [`QNameError::BadQName`] if the string does not match the
    /// grammar or names an unknown qualifier
    pub fn qname(&self, input: &str) -> Result<Vec<(String, String)>, QNameError> {
        let (qualifier, name) = match input.split_once(self.separator()) {
            Some((q, n)) => (q, n),
            None => ("", input),
        };

        if !is_atom(qualifier, true) || !is_atom(name, false) {
            return Err(QNameError::BadQName(input.to_string()));
        }

        if qualifier.is_empty() {
            return Ok(self
                .qualifiers()
                .iter()
                .map(|q| (q.clone(), name.to_string()))
                .collect());
        }

        match self.qualifier(qualifier) {
            Some(q) => Ok(vec![(q.to_string(), name.to_string())]),
            None => {
                tracing::debug!("unknown qualifier '{}' in {}", qualifier, input);
                Err(QNameError::BadQName(input.to_string()))
            }
        }
    }

    /// Parse many `qualifier/name` strings, preserving input order
    ///
    /// # Errors
    /// Fails on the first input rejected by [`Codec::qname`]
    pub fn qnames<I, S>(&self, inputs: I) -> Result<Vec<(String, String)>, QNameError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out = Vec::new();
        for input in inputs {
            out.extend(self.qname(input.as_ref())?);
        }
        Ok(out)
    }
}

/// `[0-9A-Za-z_]*` when `allow_empty`, `[0-9A-Za-z_]+` otherwise
fn is_atom(atom: &str, allow_empty: bool) -> bool {
    if atom.is_empty() {
        return allow_empty;
    }
    atom.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
