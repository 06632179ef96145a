//! Attribute protocol
//!
//! Every field on a schema is backed by an [`Attribute`], one of three
//! layered capabilities plus plain storage:
//!
//! - **computed**: recomputed on every read from an [`Access`] context
//! - **cached**: computed once, then materialised into the host's store
//!   (the computation may override the policy through [`Outcome::cache`])
//! - **validated**: writes pass through a validator whose return value is
//!   what gets stored; reads hit the store first and fall back to an
//!   optional computation
//!
//! The protocol is generic over an [`AttributeHost`], the object owning the
//! store. Records are the production host.

use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::value::Value;

/// Object that owns an attribute store
///
/// Reads may materialise cached values, so the store is written through a
/// shared reference. Implementations must not hold a lock across calls.
pub trait AttributeHost {
    /// Materialised value, if any
    fn stored(&self, name: &str) -> Option<Value>;

    /// Materialise a value
    fn store(&self, name: &str, value: Value);
}

/// Read context handed to computations
#[derive(Debug)]
pub enum Access<'a, H> {
    /// Read on the schema itself, no live host
    Owner,
    /// Read on a live host
    Instance(&'a H),
}

impl<'a, H> Access<'a, H> {
    /// True for schema-level reads
    #[inline]
    #[must_use]
    pub fn is_owner(&self) -> bool {
        matches!(self, Self::Owner)
    }

    /// Live host, if any
    #[inline]
    #[must_use]
    pub fn instance(&self) -> Option<&'a H> {
        match self {
            Self::Owner => None,
            Self::Instance(host) => Some(*host),
        }
    }
}

impl<H> Clone for Access<'_, H> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<H> Copy for Access<'_, H> {}

/// Write context handed to validators
#[derive(Debug)]
pub struct Assign<'a, H> {
    /// Host being written
    pub host: &'a H,
    /// Raw incoming value
    pub value: Value,
}

/// Result of a computation, optionally overriding the cache policy
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// Computed value
    pub value: Value,
    /// `Some` overrides the attribute's cache policy for this read
    pub cache: Option<bool>,
}

impl Outcome {
    /// Value under the attribute's own policy
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            cache: None,
        }
    }

    /// Value that must be cached
    #[inline]
    #[must_use]
    pub fn cached(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            cache: Some(true),
        }
    }

    /// Value that must not be cached
    #[inline]
    #[must_use]
    pub fn uncached(value: impl Into<Value>) -> Self {
        Self {
            value: value.into(),
            cache: Some(false),
        }
    }
}

impl From<Value> for Outcome {
    fn from(value: Value) -> Self {
        Self::new(value)
    }
}

/// Computation invoked on reads
pub type ComputeFn<H> = Arc<dyn Fn(Access<'_, H>) -> Result<Outcome> + Send + Sync>;

/// Validator/normaliser invoked on writes
pub type ValidateFn<H> = Arc<dyn Fn(Assign<'_, H>) -> Result<Value> + Send + Sync>;

/// Writer for computed attributes that decompose into other attributes
pub type WriteFn<H> = Arc<dyn Fn(&mut H, Value) -> Result<()> + Send + Sync>;

/// Capability backing an attribute
pub enum Capability<H> {
    /// Plain storage
    Stored,
    /// Recomputed on every read
    Computed {
        /// Read computation
        compute: ComputeFn<H>,
        /// Optional write hook; without it the attribute is read-only
        write: Option<WriteFn<H>>,
    },
    /// Computed once and materialised
    Cached {
        /// Read computation
        compute: ComputeFn<H>,
        /// Default cache policy
        cache: bool,
    },
    /// Validated writes, store-first reads
    Validated {
        /// Write validator
        validate: ValidateFn<H>,
        /// Fallback computation when nothing is stored
        compute: Option<ComputeFn<H>>,
        /// Default cache policy for the fallback
        cache: bool,
    },
}

impl<H> Clone for Capability<H> {
    fn clone(&self) -> Self {
        match self {
            Self::Stored => Self::Stored,
            Self::Computed { compute, write } => Self::Computed {
                compute: Arc::clone(compute),
                write: write.clone(),
            },
            Self::Cached { compute, cache } => Self::Cached {
                compute: Arc::clone(compute),
                cache: *cache,
            },
            Self::Validated {
                validate,
                compute,
                cache,
            } => Self::Validated {
                validate: Arc::clone(validate),
                compute: compute.clone(),
                cache: *cache,
            },
        }
    }
}

/// Named attribute descriptor
pub struct Attribute<H> {
    name: String,
    capability: Capability<H>,
}

impl<H> Clone for Attribute<H> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            capability: self.capability.clone(),
        }
    }
}

impl<H> fmt::Debug for Attribute<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.capability {
            Capability::Stored => "stored",
            Capability::Computed { write: None, .. } => "computed",
            Capability::Computed { write: Some(_), .. } => "computed+writer",
            Capability::Cached { .. } => "cached",
            Capability::Validated { .. } => "validated",
        };
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("kind", &kind)
            .finish()
    }
}

impl<H: AttributeHost> Attribute<H> {
    /// Plain stored attribute
    #[must_use]
    pub fn stored(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capability: Capability::Stored,
        }
    }

    /// Attribute recomputed on every read
    pub fn computed<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(Access<'_, H>) -> Result<Outcome> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            capability: Capability::Computed {
                compute: Arc::new(compute),
                write: None,
            },
        }
    }

    /// Attribute computed once and cached
    pub fn cached<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(Access<'_, H>) -> Result<Outcome> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            capability: Capability::Cached {
                compute: Arc::new(compute),
                cache: true,
            },
        }
    }

    /// Attribute whose writes pass through `validate`
    pub fn validated<F>(name: impl Into<String>, validate: F) -> Self
    where
        F: Fn(Assign<'_, H>) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            capability: Capability::Validated {
                validate: Arc::new(validate),
                compute: None,
                cache: true,
            },
        }
    }

    /// Attach a write hook to a computed attribute
    ///
    /// Other capabilities are returned unchanged.
    #[must_use]
    pub fn with_writer<F>(mut self, writer: F) -> Self
    where
        F: Fn(&mut H, Value) -> Result<()> + Send + Sync + 'static,
    {
        if let Capability::Computed { write, .. } = &mut self.capability {
            *write = Some(Arc::new(writer));
        }
        self
    }

    /// Attach a fallback computation to a validated attribute
    ///
    /// Other capabilities are returned unchanged.
    #[must_use]
    pub fn with_compute<F>(mut self, fallback: F) -> Self
    where
        F: Fn(Access<'_, H>) -> Result<Outcome> + Send + Sync + 'static,
    {
        if let Capability::Validated { compute, .. } = &mut self.capability {
            *compute = Some(Arc::new(fallback));
        }
        self
    }

    /// Set the default cache policy of a cached or validated attribute
    #[must_use]
    pub fn with_cache(mut self, policy: bool) -> Self {
        match &mut self.capability {
            Capability::Cached { cache, .. } | Capability::Validated { cache, .. } => *cache = policy,
            Capability::Stored | Capability::Computed { .. } => {}
        }
        self
    }

    /// Attribute name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing capability
    #[inline]
    #[must_use]
    pub fn capability(&self) -> &Capability<H> {
        &self.capability
    }

    /// True when values are never stored
    #[inline]
    #[must_use]
    pub fn is_computed(&self) -> bool {
        matches!(self.capability, Capability::Computed { .. })
    }

    /// True for computed attributes without a writer
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        matches!(self.capability, Capability::Computed { write: None, .. })
    }

    /// True when a read can produce a value without a store entry
    #[inline]
    #[must_use]
    pub fn can_compute(&self) -> bool {
        match &self.capability {
            Capability::Stored => false,
            Capability::Computed { .. } | Capability::Cached { .. } => true,
            Capability::Validated { compute, .. } => compute.is_some(),
        }
    }

    fn computation(&self) -> Option<(&ComputeFn<H>, bool)> {
        match &self.capability {
            Capability::Stored => None,
            Capability::Computed { compute, .. } => Some((compute, false)),
            Capability::Cached { compute, cache } => Some((compute, *cache)),
            Capability::Validated { compute, cache, .. } => compute.as_ref().map(|c| (c, *cache)),
        }
    }

    /// Read, materialising the computed value when the cache policy allows
    ///
    /// Computed attributes are never stored.
    ///
    /// # Errors
    /// Propagates computation failures
    pub fn read(&self, host: &H) -> Result<Value> {
        if !self.is_computed() {
            if let Some(value) = host.stored(&self.name) {
                return Ok(value);
            }
        }

        let Some((compute, default_cache)) = self.computation() else {
            return Ok(Value::None);
        };

        let outcome = compute(Access::Instance(host))?;
        if !self.is_computed() && outcome.cache.unwrap_or(default_cache) {
            host.store(&self.name, outcome.value.clone());
        }
        Ok(outcome.value)
    }

    /// Schema-level read; never caches
    ///
    /// Returns `None` for attributes with nothing to compute.
    ///
    /// # Errors
    /// Propagates computation failures
    pub fn read_owner(&self) -> Result<Option<Value>> {
        match self.computation() {
            Some((compute, _)) => Ok(Some(compute(Access::Owner)?.value)),
            None => Ok(None),
        }
    }

    /// Write through the capability
    ///
    /// # Errors
    /// - [`ModelError::ReadOnly`] for computed attributes without a writer
    /// - whatever the validator or writer raises
    pub fn write(&self, host: &mut H, value: Value) -> Result<()> {
        match &self.capability {
            Capability::Stored | Capability::Cached { .. } => {
                host.store(&self.name, value);
                Ok(())
            }
            Capability::Computed { write: Some(write), .. } => write(host, value),
            Capability::Computed { write: None, .. } => Err(ModelError::ReadOnly {
                name: self.name.clone(),
            }),
            Capability::Validated { validate, .. } => {
                let value = validate(Assign { host: &*host, value })?;
                host.store(&self.name, value);
                Ok(())
            }
        }
    }
}
