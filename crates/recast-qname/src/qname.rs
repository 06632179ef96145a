//! Qualified names
//!
//! Provides [`QName`] plus the [`encode`]/[`decode`] pair used to turn an
//! ordered list of atoms into a separator-joined identity and back.
//!
//! Separators embedded inside an atom are not escaped: `encode(["a/b"])`
//! decodes to `["a", "b"]`.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Separator used when none is configured
pub const DEFAULT_SEPARATOR: &str = "/";

/// Join stringified atoms with `separator`
///
/// # Examples
/// ```
/// use recast_qname::encode;
/// assert_eq!(encode(["_", "0"], "/"), "_/0");
/// assert_eq!(encode([1, 2, 3], ":"), "1:2:3");
/// ```
#[must_use]
pub fn encode<I, T>(parts: I, separator: &str) -> String
where
    I: IntoIterator<Item = T>,
    T: Display,
{
    let mut out = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(&part.to_string());
    }
    out
}

/// Split `key` on `separator`
///
/// A key without the separator yields a single atom, the empty key included.
#[must_use]
pub fn decode(key: &str, separator: &str) -> Vec<String> {
    key.split(separator).map(str::to_string).collect()
}

/// Decoded qualified name
///
/// # Examples
/// - `["type", "name"]` → `type/name`
/// - `["name"]` → `name`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QName(Vec<String>);

impl QName {
    /// Create from atoms
    #[inline]
    #[must_use]
    pub fn new(parts: Vec<String>) -> Self {
        Self(parts)
    }

    /// Single-atom name
    #[inline]
    #[must_use]
    pub fn single(part: impl Into<String>) -> Self {
        Self(vec![part.into()])
    }

    /// Decode with a custom separator
    #[inline]
    #[must_use]
    pub fn decode_with(key: &str, separator: &str) -> Self {
        Self(decode(key, separator))
    }

    /// Encode with a custom separator
    #[inline]
    #[must_use]
    pub fn encode_with(&self, separator: &str) -> String {
        self.0.join(separator)
    }

    /// Atoms, left to right
    #[inline]
    #[must_use]
    pub fn parts(&self) -> &[String] {
        &self.0
    }

    /// Consume into atoms
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> Vec<String> {
        self.0
    }

    /// Number of atoms
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when there are no atoms
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether this is a one-atom shorthand
    #[inline]
    #[must_use]
    pub fn is_simple(&self) -> bool {
        self.0.len() == 1
    }

    /// Last atom, usually the name
    #[inline]
    #[must_use]
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    /// Iterator over atoms
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for QName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(DEFAULT_SEPARATOR))
    }
}

impl FromStr for QName {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::decode_with(s, DEFAULT_SEPARATOR))
    }
}

impl From<Vec<String>> for QName {
    fn from(parts: Vec<String>) -> Self {
        Self(parts)
    }
}

impl From<&[&str]> for QName {
    fn from(parts: &[&str]) -> Self {
        Self(parts.iter().map(|p| (*p).to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_joins_atoms() {
        assert_eq!(encode(["a", "b", "c"], "/"), "a/b/c");
        assert_eq!(encode(["_", "0"], "/"), "_/0");
    }

    #[test]
    fn encode_stringifies_numbers() {
        assert_eq!(encode([4, 2], "/"), "4/2");
    }

    #[test]
    fn encode_empty() {
        let parts: [&str; 0] = [];
        assert_eq!(encode(parts, "/"), "");
    }

    #[test]
    fn decode_without_separator() {
        assert_eq!(decode("name", "/"), vec!["name"]);
        assert_eq!(decode("", "/"), vec![""]);
    }

    #[test]
    fn decode_keeps_empty_atoms() {
        assert_eq!(decode("/name", "/"), vec!["", "name"]);
        assert_eq!(decode("a//b", "/"), vec!["a", "", "b"]);
    }

    #[test]
    fn embedded_separator_is_not_escaped() {
        let key = encode(["a/b", "c"], "/");
        assert_eq!(decode(&key, "/"), vec!["a", "b", "c"]);
    }

    #[test]
    fn qname_display_and_parse() {
        let qname: QName = "custom/web".parse().unwrap();
        assert_eq!(qname.parts(), &["custom", "web"]);
        assert_eq!(qname.to_string(), "custom/web");
        assert_eq!(qname.last(), Some("web"));
        assert!(!qname.is_simple());
    }

    #[test]
    fn qname_custom_separator() {
        let qname = QName::decode_with("a::b", "::");
        assert_eq!(qname.len(), 2);
        assert_eq!(qname.encode_with("."), "a.b");
    }

    #[test]
    fn qname_single() {
        let qname = QName::single("web");
        assert!(qname.is_simple());
        assert_eq!(qname.iter().collect::<Vec<_>>(), vec!["web"]);
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(parts in proptest::collection::vec("[0-9A-Za-z_.-]{0,8}", 1..6)) {
            let key = encode(&parts, "/");
            prop_assert_eq!(decode(&key, "/"), parts);
        }
    }
}
