//! Keyed collections of sub-records
//!
//! [`collection`] declares a validated attribute holding records of one
//! model keyed by their qualified key. Writes accept a mapping of
//! `key → config | record` or a list of `config | record`; configuration
//! entries are constructed through the registry. A `_/_` entry acts as
//! defaults layered under every other entry.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use tracing::trace;

use crate::attribute::{Attribute, AttributeHost};
use crate::error::{Result, ValidationError};
use crate::merge::rekey;
use crate::record::{AttributeFilter, Record};
use crate::registry::Registry;
use crate::schema::{Schema, MODEL, TYPE, WILDCARD};
use crate::value::{Config, Value};

/// Key of the defaults entry
pub const DEFAULTS_KEY: &str = "_/_";

/// Attribute holding records of `model`, keyed by qualified key
///
/// Writing none keeps the current collection.
pub fn collection(
    name: impl Into<String>,
    model: impl Into<String>,
    registry: &Arc<Registry>,
) -> Attribute<Record> {
    let name = name.into();
    let members = Members {
        attribute: name.clone(),
        model: model.into(),
        registry: Arc::downgrade(registry),
    };
    Attribute::<Record>::validated(name, move |assign| {
        let current = assign.host.stored(&members.attribute);
        members.normalize(current, assign.value)
    })
}

struct Members {
    attribute: String,
    model: String,
    registry: Weak<Registry>,
}

impl Members {
    fn normalize(&self, current: Option<Value>, value: Value) -> Result<Value> {
        let pairs: Vec<(Option<String>, Value)> = match value {
            Value::None => {
                return Ok(match current {
                    Some(current @ Value::Map(_)) => current,
                    _ => Value::Map(IndexMap::new()),
                });
            }
            Value::Map(entries) => entries.into_iter().map(|(k, v)| (Some(k), v)).collect(),
            Value::List(items) => items.into_iter().map(|v| (None, v)).collect(),
            other => {
                return Err(ValidationError::mismatch(&self.attribute, "map or list", &other).into());
            }
        };

        let mut entries = IndexMap::with_capacity(pairs.len());
        for (key, value) in pairs {
            let record = self.reify(key.as_deref(), value)?;
            entries.insert(record.key()?, Value::from(record));
        }

        if let Some(Value::Record(defaults)) = entries.get(DEFAULTS_KEY).cloned() {
            trace!("{} layering {} entries over defaults", self.attribute, entries.len());
            for entry in entries.values_mut() {
                if let Value::Record(record) = entry {
                    let layered = layer(&defaults, record)?;
                    **record = layered;
                }
            }
            entries = rekey(entries)?;
        }

        Ok(Value::Map(entries))
    }

    fn reify(&self, key: Option<&str>, value: Value) -> Result<Record> {
        let mut config = match value {
            Value::Record(record) if record.model() == self.model => return Ok(*record),
            Value::Map(config) => config,
            Value::None => Config::new(),
            other => {
                return Err(ValidationError::mismatch(&self.attribute, &self.model, &other).into());
            }
        };

        let registry = self.registry.upgrade().ok_or_else(|| {
            ValidationError::new(self.attribute.clone(), "registry is no longer available")
        })?;
        let through = match registry.lookup(&self.model, WILDCARD) {
            Some(schema) => schema,
            None => {
                config
                    .entry(MODEL.to_string())
                    .or_insert_with(|| Value::from(self.model.as_str()));
                Arc::clone(registry.root())
            }
        };

        match key {
            Some(key) => registry.from_keyconfig(&through, key, config),
            None => registry.from_config(&through, config),
        }
    }
}

/// `defaults` re-instantiated as `record`'s schema, with `record` merged on top
fn layer(defaults: &Record, record: &Record) -> Result<Record> {
    let mut config = defaults.to_config(&AttributeFilter::All)?;
    config.shift_remove(MODEL);
    config.shift_remove(TYPE);
    let schema: &Arc<Schema> = record.schema();
    let mut layered = Record::instantiate(schema, config)?;
    layered.merge(record, false)?;
    Ok(layered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::schema::SchemaBuilder;
    use pretty_assertions::assert_eq;

    struct Fixture {
        registry: Arc<Registry>,
        stack: Arc<Schema>,
    }

    fn fixture() -> Fixture {
        let registry = Arc::new(Registry::new());
        let service = SchemaBuilder::new("Service", registry.root())
            .new_model()
            .field("port", Value::None)
            .field("replicas", 1)
            .register(&registry);
        SchemaBuilder::new("Web", &service).field("path", "/").register(&registry);
        let stack = SchemaBuilder::new("Stack", registry.root())
            .new_model()
            .field_with(collection("services", "service", &registry), Value::Map(IndexMap::new()))
            .register(&registry);
        Fixture { registry, stack }
    }

    fn services(record: &Record) -> IndexMap<String, Value> {
        record.get("services").unwrap().as_map().unwrap().clone()
    }

    #[test]
    fn mapping_entries_constructed_from_keys() {
        let f = fixture();
        let stack = f
            .registry
            .from_config(
                &f.stack,
                config! {
                    "services" => Value::Map(config! {
                        "web/api" => Value::Map(config! { "port" => 8080 }),
                        "db" => Value::None,
                    }),
                },
            )
            .unwrap();

        let services = services(&stack);
        let keys: Vec<_> = services.keys().cloned().collect();
        assert_eq!(keys, vec!["web/api", "_/0"]);

        let api = services["web/api"].as_record().unwrap();
        assert_eq!(api.type_name(), "web");
        assert_eq!(api.get("port").unwrap(), Value::Int(8080));
        assert_eq!(api.get("path").unwrap(), Value::from("/"));
    }

    #[test]
    fn list_entries_keyed_by_identity() {
        let f = fixture();
        let stack = f
            .registry
            .from_config(
                &f.stack,
                config! {
                    "services" => Value::List(vec![
                        Value::Map(config! { "type" => "web", "name" => "a" }),
                        Value::Map(config! { "name" => "b" }),
                    ]),
                },
            )
            .unwrap();
        let keys: Vec<_> = services(&stack).keys().cloned().collect();
        assert_eq!(keys, vec!["web/a", "_/b"]);
    }

    #[test]
    fn records_of_model_are_taken_as_is() {
        let f = fixture();
        let web = f
            .registry
            .construct(f.registry.root(), Some("service"), "web", config! { "name" => "x" })
            .unwrap();
        let stack = f
            .registry
            .from_config(&f.stack, config! { "services" => Value::List(vec![Value::from(web.clone())]) })
            .unwrap();
        assert_eq!(services(&stack)["web/x"], Value::from(web));
    }

    #[test]
    fn foreign_records_rejected() {
        let f = fixture();
        let stack = f.registry.from_config(&f.stack, Config::new()).unwrap();
        let err = f
            .registry
            .from_config(&f.stack, config! { "services" => Value::List(vec![Value::from(stack)]) })
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn defaults_entry_layers_under_others() {
        let f = fixture();
        let stack = f
            .registry
            .from_config(
                &f.stack,
                config! {
                    "services" => Value::Map(config! {
                        "_/_" => Value::Map(config! { "port" => 9000, "replicas" => 3 }),
                        "web/api" => Value::Map(config! { "replicas" => 5 }),
                    }),
                },
            )
            .unwrap();

        let services = services(&stack);
        let api = services["web/api"].as_record().unwrap();
        assert_eq!(api.get("port").unwrap(), Value::Int(9000));
        assert_eq!(api.get("replicas").unwrap(), Value::Int(5));
        assert_eq!(api.get("path").unwrap(), Value::from("/"));
    }

    #[test]
    fn writing_none_keeps_collection() {
        let f = fixture();
        let mut stack = f
            .registry
            .from_config(
                &f.stack,
                config! { "services" => Value::List(vec![Value::Map(config! { "name" => "a" })]) },
            )
            .unwrap();
        stack.set("services", Value::None).unwrap();
        assert_eq!(services(&stack).len(), 1);
    }

    #[test]
    fn scalar_rejected() {
        let f = fixture();
        let err = f
            .registry
            .from_config(&f.stack, config! { "services" => 3 })
            .unwrap_err();
        assert!(err.is_validation());
    }
}
