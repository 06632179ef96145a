//! Model registry and polymorphic construction
//!
//! Provides [`Registry`], the `(model, type) → schema` table, and the
//! construction entry points that resolve a requested pair to the most
//! specific registered schema before allocating a record.
//!
//! # Cast direction
//!
//! Construction goes *through* a schema. The resolved schema must be that
//! schema or one of its descendants; resolving to an ancestor is an upcast,
//! anything else is a bad cast.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use recast_qname::{Codec, CodecSettings};
use tracing::{debug, warn};

use crate::error::{CastError, ModelError, Result, ValidationError};
use crate::record::{key_to_config, Record};
use crate::schema::{base, Schema, SchemaBuilder, MODEL, TYPE, WILDCARD};
use crate::value::{Config, Value};

/// Requested type for a construction
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeRequest {
    /// The calling schema's own type
    #[default]
    Default,
    /// Exactly one candidate
    One(String),
    /// Ordered candidates, first registered wins
    Any(Vec<String>),
}

impl TypeRequest {
    /// Interpret a configuration value
    ///
    /// # Errors
    /// Returns error for values that are neither none, a string nor a list
    pub fn from_value(value: Option<&Value>) -> Result<Self> {
        match value {
            None | Some(Value::None) => Ok(Self::Default),
            Some(Value::Str(s)) => Ok(Self::One(s.clone())),
            Some(Value::List(items)) => Ok(Self::Any(items.iter().map(ToString::to_string).collect())),
            Some(other) => Err(ValidationError::mismatch(TYPE, "str or list", other).into()),
        }
    }

    /// Candidate types in resolution order
    #[must_use]
    pub fn candidates(&self, fallback: &str) -> Vec<String> {
        match self {
            Self::Default => vec![fallback.to_string()],
            Self::One(type_name) => vec![type_name.clone()],
            Self::Any(types) => types.clone(),
        }
    }
}

impl From<&str> for TypeRequest {
    fn from(type_name: &str) -> Self {
        Self::One(type_name.to_string())
    }
}

impl From<String> for TypeRequest {
    fn from(type_name: String) -> Self {
        Self::One(type_name)
    }
}

impl<const N: usize> From<[&str; N]> for TypeRequest {
    fn from(types: [&str; N]) -> Self {
        Self::Any(types.iter().map(ToString::to_string).collect())
    }
}

impl From<Vec<String>> for TypeRequest {
    fn from(types: Vec<String>) -> Self {
        Self::Any(types)
    }
}

/// `(model, type)` → schema table
///
/// Thread-safe; registration may happen at any time and lookups see a
/// consistent snapshot.
#[derive(Debug)]
pub struct Registry {
    schemas: RwLock<HashMap<(String, String), Arc<Schema>>>,
    root: Arc<Schema>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create registry holding only the root `Model` schema (`model/_`)
    #[must_use]
    pub fn new() -> Self {
        let root = SchemaBuilder::new("Model", &base()).new_model().build();
        let registry = Self {
            schemas: RwLock::new(HashMap::new()),
            root: Arc::clone(&root),
        };
        registry.register(root);
        registry
    }

    /// Root `Model` schema every model derives from
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Arc<Schema> {
        &self.root
    }

    /// Register a schema under its `(model, type)`
    ///
    /// A later registration for the same pair replaces the earlier one.
    /// Schemas without model or type are not registrable and are returned
    /// untouched.
    pub fn register(&self, schema: Arc<Schema>) -> Arc<Schema> {
        let (Some(model), Some(type_name)) = (schema.model(), schema.type_name()) else {
            warn!("schema {} has no model-type, not registered", schema.name());
            return schema;
        };

        let pair = (model.to_string(), type_name.to_string());
        let previous = self.schemas.write().insert(pair, Arc::clone(&schema));
        match previous {
            Some(previous) => {
                warn!("{}-{} re-registered: {} replaces {}", model, type_name, schema.name(), previous.name());
            }
            None => debug!("registered {} as {}-{}", schema.name(), model, type_name),
        }
        schema
    }

    /// Registered schema for a pair
    #[must_use]
    pub fn lookup(&self, model: &str, type_name: &str) -> Option<Arc<Schema>> {
        self.schemas
            .read()
            .get(&(model.to_string(), type_name.to_string()))
            .cloned()
    }

    /// Check if a pair is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, model: &str, type_name: &str) -> bool {
        self.lookup(model, type_name).is_some()
    }

    /// Number of registered pairs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.read().len()
    }

    /// Check if nothing is registered
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.read().is_empty()
    }

    /// Registered model names, sorted
    #[must_use]
    pub fn models(&self) -> Vec<String> {
        let mut models: Vec<String> = self.schemas.read().keys().map(|(m, _)| m.clone()).collect();
        models.sort();
        models.dedup();
        models
    }

    /// Registered pairs, sorted
    #[must_use]
    pub fn pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<_> = self.schemas.read().keys().cloned().collect();
        pairs.sort();
        pairs
    }

    /// Parse `model/name` inputs, abbreviated models allowed
    ///
    /// A bare name expands to every registered model.
    ///
    /// # Errors
    /// [`ModelError::QName`] for malformed input or an unknown model
    pub fn qnames<I, S>(&self, inputs: I) -> Result<Vec<(String, String)>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let codec = Codec::new(CodecSettings::default().with_qualifiers(self.models()));
        Ok(codec.qnames(inputs)?)
    }

    /// Resolve a requested pair as seen through `through`
    ///
    /// # Errors
    /// - [`CastError::Unregistered`] if no candidate is registered
    /// - [`CastError::Upcast`] if the match is an ancestor of `through`
    /// - [`CastError::BadCast`] if the match is unrelated to `through`
    pub fn resolve(
        &self,
        through: &Arc<Schema>,
        model: Option<&str>,
        types: &TypeRequest,
    ) -> Result<Arc<Schema>, CastError> {
        let model = model.or(through.model()).unwrap_or_default();
        let candidates = types.candidates(through.type_name().unwrap_or(WILDCARD));

        let resolved = {
            let schemas = self.schemas.read();
            candidates
                .iter()
                .find_map(|t| schemas.get(&(model.to_string(), t.clone())).cloned())
        };
        let Some(resolved) = resolved else {
            return Err(CastError::Unregistered {
                model: model.to_string(),
                types: candidates,
            });
        };

        if !resolved.descends_from(through) {
            if through.descends_from(&resolved) {
                return Err(CastError::Upcast {
                    from: through.label(),
                    to: resolved.label(),
                });
            }
            return Err(CastError::BadCast {
                from: through.label(),
                to: resolved.label(),
                from_schema: through.name().to_string(),
                to_schema: resolved.name().to_string(),
            });
        }

        debug!("resolved {}-{:?} through {} to {}", model, candidates, through.name(), resolved.name());
        Ok(resolved)
    }

    /// Construct a record of the most specific schema for `(model, types)`
    ///
    /// # Errors
    /// - cast failures
    /// - validation failures while populating
    /// - [`ModelError::UnknownAttributes`] for leftover configuration
    pub fn construct(
        &self,
        through: &Arc<Schema>,
        model: Option<&str>,
        types: impl Into<TypeRequest>,
        config: Config,
    ) -> Result<Record> {
        let schema = self.resolve(through, model, &types.into())?;
        Record::instantiate(&schema, config)
    }

    /// Construct from configuration carrying its own `model` and `type`
    ///
    /// # Errors
    /// Same as [`Registry::construct`]
    pub fn from_config(&self, through: &Arc<Schema>, config: Config) -> Result<Record> {
        let model = match config.get(MODEL) {
            None | Some(Value::None) => None,
            Some(Value::Str(model)) => Some(model.clone()),
            Some(other) => return Err(ValidationError::mismatch(MODEL, "str", other).into()),
        };
        let types = TypeRequest::from_value(config.get(TYPE))?;
        self.construct(through, model.as_deref(), types, config)
    }

    /// Construct from a qualified key plus configuration
    ///
    /// Configuration wins over values implied by the key.
    ///
    /// # Errors
    /// - [`ModelError::BadKey`] for a key with too many parts
    /// - same as [`Registry::construct`]
    pub fn from_keyconfig(&self, through: &Arc<Schema>, key: &str, config: Config) -> Result<Record> {
        let mut merged = key_to_config(through, key)?;
        merged.extend(config);
        self.from_config(through, merged)
    }
}

impl SchemaBuilder {
    /// Build and register in one step
    #[must_use]
    pub fn register(self, registry: &Registry) -> Arc<Schema> {
        registry.register(self.build())
    }
}
