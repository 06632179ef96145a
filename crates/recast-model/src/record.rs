//! Live records
//!
//! A [`Record`] pairs a resolved [`Schema`] with an attribute store. Every
//! read and write goes through the attribute descriptor the schema declares
//! for that name.

use std::collections::HashSet;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use recast_qname::{decode, encode, DEFAULT_SEPARATOR};
use tracing::trace;

use crate::attribute::AttributeHost;
use crate::error::{ModelError, Result};
use crate::schema::{Schema, NAME, TYPE, WILDCARD};
use crate::value::{Config, Value};

/// Selects which attributes [`Record::to_config`] emits
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AttributeFilter {
    /// Every materialised attribute
    #[default]
    All,
    /// The schema's compact attributes
    Compact,
    /// The schema's key attributes
    Key,
    /// An explicit list of names
    Only(Vec<String>),
}

impl AttributeFilter {
    fn includes(&self, record: &Record, name: &str) -> bool {
        match self {
            Self::All => record.store.read().contains_key(name),
            Self::Compact => record.schema.compact().iter().any(|n| n == name),
            Self::Key => record.schema.keys().iter().any(|n| n == name),
            Self::Only(names) => names.iter().any(|n| n == name),
        }
    }
}

/// Instance of a schema
///
/// Cached attributes materialise on first read, so the store sits behind a
/// lock and reads only need `&self`.
#[derive(Debug)]
pub struct Record {
    schema: Arc<Schema>,
    store: RwLock<IndexMap<String, Value>>,
}

impl Clone for Record {
    fn clone(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            store: RwLock::new(self.store.read().clone()),
        }
    }
}

impl AttributeHost for Record {
    fn stored(&self, name: &str) -> Option<Value> {
        self.store.read().get(name).cloned()
    }

    fn store(&self, name: &str, value: Value) {
        self.store.write().insert(name.to_string(), value);
    }
}

impl Record {
    /// Populate a record of `schema` from `config`
    ///
    /// Defaults are seeded first, then every declared field is written in
    /// order: supplied values through their descriptor, missing ones through
    /// the descriptor's own read. Leftover keys fail the whole construction.
    pub(crate) fn instantiate(schema: &Arc<Schema>, mut config: Config) -> Result<Self> {
        let mut record = Self {
            schema: Arc::clone(schema),
            store: RwLock::new(IndexMap::with_capacity(schema.fields().len())),
        };

        for field in schema.fields() {
            let Some(attribute) = schema.attribute(&field.name) else {
                continue;
            };
            if attribute.is_computed() || (field.default.is_none() && attribute.can_compute()) {
                continue;
            }
            record.store.get_mut().insert(field.name.clone(), field.default.clone());
        }

        for field in schema.fields() {
            match config.shift_remove(&field.name) {
                Some(value) => {
                    trace!("populate {}.{} = {}", schema.name(), field.name, value);
                    record.set(&field.name, value)?;
                }
                None => {
                    let computed = schema.attribute(&field.name).is_some_and(|a| a.is_computed());
                    if !computed {
                        record.get(&field.name)?;
                    }
                }
            }
        }

        if !config.is_empty() {
            let mut names: Vec<String> = config.into_keys().collect();
            names.sort();
            return Err(ModelError::UnknownAttributes {
                model: record.model().to_string(),
                type_name: record.type_name().to_string(),
                names,
            });
        }

        Ok(record)
    }

    /// Resolved schema
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Model name
    #[inline]
    #[must_use]
    pub fn model(&self) -> &str {
        self.schema.model().unwrap_or_default()
    }

    /// Type name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.schema.type_name().unwrap_or_default()
    }

    /// Record name: an integer when locally scoped, a string when global
    #[must_use]
    pub fn name(&self) -> Value {
        self.stored(NAME).unwrap_or_default()
    }

    /// Number of materialised entries in the store
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    /// True when nothing is materialised
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.read().is_empty()
    }

    /// Whether `name` is a declared field or pseudo-attribute
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.schema.contains(name)
    }

    fn unknown(&self, name: &str) -> ModelError {
        ModelError::UnknownAttribute {
            type_name: self.type_name().to_string(),
            name: name.to_string(),
        }
    }

    /// Read an attribute, caching the result when its policy allows
    ///
    /// # Errors
    /// - [`ModelError::UnknownAttribute`] if the schema does not expose `name`
    /// - computation failures
    pub fn get(&self, name: &str) -> Result<Value> {
        match self.schema.attribute(name) {
            Some(attribute) => attribute.read(self),
            None => Err(self.unknown(name)),
        }
    }

    /// Write an attribute through its descriptor
    ///
    /// # Errors
    /// - [`ModelError::UnknownAttribute`] if the schema does not expose `name`
    /// - validator or writer failures
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let Some(attribute) = schema.attribute(name) else {
            return Err(self.unknown(name));
        };
        attribute.write(self, value.into())
    }

    /// Attributes cannot be deleted
    ///
    /// # Errors
    /// Always [`ModelError::DeleteForbidden`]
    pub fn delete(&mut self, name: &str) -> Result<()> {
        Err(ModelError::DeleteForbidden {
            name: name.to_string(),
        })
    }

    /// Mapping-style [`Record::get`]
    ///
    /// # Errors
    /// Any failure wrapped as [`ModelError::Key`]
    pub fn get_item(&self, name: &str) -> Result<Value> {
        self.get(name).map_err(|e| e.into_key_error(name))
    }

    /// Mapping-style [`Record::set`]
    ///
    /// # Errors
    /// Any failure wrapped as [`ModelError::Key`]
    pub fn set_item(&mut self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.set(name, value).map_err(|e| e.into_key_error(name))
    }

    /// Mapping-style [`Record::delete`]
    ///
    /// # Errors
    /// Always, wrapped as [`ModelError::Key`]
    pub fn del_item(&mut self, name: &str) -> Result<()> {
        self.delete(name).map_err(|e| e.into_key_error(name))
    }

    /// `(name, value)` over declared fields in declared order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Result<Value>)> + '_ {
        self.schema
            .fields()
            .iter()
            .map(move |field| (field.name.as_str(), self.get(&field.name)))
    }

    /// Qualified key built from the key attributes
    ///
    /// # Errors
    /// Propagates read failures of key attributes
    pub fn key(&self) -> Result<String> {
        let values = self
            .schema
            .keys()
            .iter()
            .map(|name| self.get(name))
            .collect::<Result<Vec<_>>>()?;
        Ok(encode(values, DEFAULT_SEPARATOR))
    }

    /// Assign key attributes from a qualified key
    ///
    /// A single part sets the simple key when the schema has several key
    /// attributes; otherwise parts align with the rightmost key attributes.
    ///
    /// # Errors
    /// - [`ModelError::BadKey`] for too many parts
    /// - validator failures
    pub fn set_key(&mut self, key: &str) -> Result<()> {
        let schema = Arc::clone(&self.schema);
        let parts = decode(key, DEFAULT_SEPARATOR);
        let keys = schema.keys();
        if parts.len() == 1 && keys.len() > 1 && keys.iter().any(|k| k == schema.simple_key()) {
            return self.set(schema.simple_key(), parts[0].as_str());
        }
        for (name, value) in align_key(&schema, key, parts)? {
            self.set(&name, value)?;
        }
        Ok(())
    }

    /// Configuration that reconstructs this record
    ///
    /// Keyed collections of records recurse with the same filter; absent
    /// values are omitted.
    ///
    /// # Errors
    /// Propagates read failures
    pub fn to_config(&self, filter: &AttributeFilter) -> Result<Config> {
        let mut config = Config::new();
        for field in self.schema.fields() {
            if !filter.includes(self, &field.name) {
                continue;
            }
            let value = match self.get(&field.name)? {
                Value::Map(entries) => Value::Map(
                    entries
                        .into_iter()
                        .map(|(k, v)| match v {
                            Value::Record(record) => Ok((k, Value::Map(record.to_config(filter)?))),
                            other => Ok((k, other)),
                        })
                        .collect::<Result<_>>()?,
                ),
                Value::Record(record) => Value::Map(record.to_config(filter)?),
                other => other,
            };
            if !value.is_none() {
                config.insert(field.name.clone(), value);
            }
        }
        Ok(config)
    }

    /// Deep copy with an independent store
    #[inline]
    #[must_use]
    pub fn clone_record(&self) -> Self {
        self.clone()
    }
}

fn align_key(schema: &Schema, key: &str, parts: Vec<String>) -> Result<Vec<(String, Value)>> {
    let keys = schema.keys();
    if parts.len() > keys.len() {
        return Err(ModelError::BadKey {
            type_name: schema.type_name().unwrap_or_default().to_string(),
            key: key.to_string(),
        });
    }
    let offset = keys.len() - parts.len();
    Ok(keys[offset..]
        .iter()
        .cloned()
        .zip(parts.into_iter().map(Value::from))
        .collect())
}

/// Configuration implied by a qualified key
///
/// A single part against several key attributes fills the simple key and
/// requests its value as type, falling back to the wildcard.
///
/// # Errors
/// [`ModelError::BadKey`] if `key` has more parts than key attributes
pub fn key_to_config(schema: &Schema, key: &str) -> Result<Config> {
    let parts = decode(key, DEFAULT_SEPARATOR);
    let keys = schema.keys();
    let simple = schema.simple_key();
    if parts.len() == 1 && keys.len() > 1 && keys.iter().any(|k| k == simple) {
        let mut config = Config::new();
        config.insert(simple.to_string(), Value::from(parts[0].as_str()));
        config.insert(
            TYPE.to_string(),
            Value::List(vec![Value::from(parts[0].as_str()), Value::from(WILDCARD)]),
        );
        return Ok(config);
    }
    Ok(align_key(schema, key, parts)?.into_iter().collect())
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.schema, &other.schema)
            && self
                .schema
                .fields()
                .iter()
                .all(|f| self.get(&f.name).ok() == other.get(&f.name).ok())
    }
}

impl Display for Record {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut seen = HashSet::new();
        let mut pairs = Vec::new();
        for name in self.schema.compact() {
            if name == NAME || !seen.insert(name.as_str()) {
                continue;
            }
            let value = match self.get(name) {
                Ok(Value::None) | Err(_) => continue,
                Ok(value) => value,
            };
            let shown = match value {
                Value::Map(entries) => {
                    let mut keys: Vec<&str> = entries.keys().map(String::as_str).collect();
                    keys.sort_unstable();
                    format!("{{{}}}", keys.join(","))
                }
                other => other.to_string(),
            };
            pairs.push(format!("{name}={shown}"));
        }
        pairs.sort();

        write!(f, "<{}({})", self.schema.name(), self.name())?;
        if !pairs.is_empty() {
            write!(f, ": {}", pairs.join(" "))?;
        }
        f.write_str(">")
    }
}
