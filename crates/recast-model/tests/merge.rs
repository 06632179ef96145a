//! Merging records that hold keyed collections

use std::sync::Arc;

use indexmap::IndexMap;
use pretty_assertions::assert_eq;
use recast_model::{collection, config, AttributeFilter, Config, Record, Registry, Schema, SchemaBuilder, Value};

struct Stack {
    registry: Arc<Registry>,
    stack: Arc<Schema>,
}

fn stack() -> Stack {
    let registry = Arc::new(Registry::new());
    let service = SchemaBuilder::new("Service", registry.root())
        .new_model()
        .field("port", Value::None)
        .field("replicas", 1)
        .compact(["port"])
        .register(&registry);
    SchemaBuilder::new("Web", &service).field("path", "/").register(&registry);
    SchemaBuilder::new("Worker", &service).field("queue", Value::None).register(&registry);
    let stack = SchemaBuilder::new("Stack", registry.root())
        .new_model()
        .field("region", Value::None)
        .field_with(collection("services", "service", &registry), Value::Map(IndexMap::new()))
        .register(&registry);
    Stack { registry, stack }
}

impl Stack {
    fn build(&self, config: Config) -> Record {
        self.registry.from_config(&self.stack, config).unwrap()
    }
}

fn services(record: &Record) -> IndexMap<String, Value> {
    record.get("services").unwrap().as_map().unwrap().clone()
}

#[test]
fn nested_collections_merge_by_key() {
    let s = stack();
    let mut target = s.build(config! {
        "region" => "eu",
        "services" => Value::Map(config! {
            "web/api" => Value::Map(config! { "port" => 80 }),
            "worker/jobs" => Value::Map(config! { "queue" => "default" }),
        }),
    });
    let source = s.build(config! {
        "services" => Value::Map(config! {
            "web/api" => Value::Map(config! { "replicas" => 4 }),
            "web/admin" => Value::None,
        }),
    });

    target.merge(&source, false).unwrap();
    assert_eq!(target.get("region").unwrap(), Value::from("eu"));

    let services = services(&target);
    let keys: Vec<_> = services.keys().cloned().collect();
    assert_eq!(keys, vec!["web/api", "worker/jobs", "web/admin"]);

    let api = services["web/api"].as_record().unwrap();
    assert_eq!(api.get("port").unwrap(), Value::Int(80));
    assert_eq!(api.get("replicas").unwrap(), Value::Int(4));
    let jobs = services["worker/jobs"].as_record().unwrap();
    assert_eq!(jobs.get("queue").unwrap(), Value::from("default"));
}

#[test]
fn merge_twice_changes_nothing() {
    let s = stack();
    let mut target = s.build(config! {
        "services" => Value::List(vec![
            Value::Map(config! { "type" => "web", "name" => "api", "port" => 8080 }),
        ]),
    });
    let source = s.build(config! {
        "region" => "us",
        "services" => Value::List(vec![
            Value::Map(config! { "type" => "worker", "name" => "jobs" }),
        ]),
    });

    target.merge(&source, false).unwrap();
    let once = target.clone_record();
    target.merge(&source, false).unwrap();
    assert_eq!(target, once);
}

#[test]
fn merge_from_applies_in_order() {
    let s = stack();
    let mut target = s.build(Config::new());
    let first = s.build(config! { "region" => "eu" });
    let second = s.build(config! { "region" => "us" });
    target.merge_from([&first, &second], false).unwrap();
    assert_eq!(target.get("region").unwrap(), Value::from("us"));
}

#[test]
fn merged_record_round_trips_through_config() {
    let s = stack();
    let mut target = s.build(config! {
        "services" => Value::Map(config! { "web/api" => Value::Map(config! { "port" => 80 }) }),
    });
    let source = s.build(config! {
        "services" => Value::Map(config! { "worker/jobs" => Value::None }),
    });
    target.merge(&source, false).unwrap();

    let config = target.to_config(&AttributeFilter::All).unwrap();
    let services = config["services"].as_map().unwrap();
    assert_eq!(
        services["web/api"],
        Value::Map(config! { "model" => "service", "type" => "web", "name" => "api", "port" => 80, "replicas" => 1, "path" => "/" })
    );

    let rebuilt = s.build(config);
    assert_eq!(rebuilt, target);
}

#[test]
fn compact_config_keeps_identity() {
    let s = stack();
    let record = s.build(config! {
        "services" => Value::Map(config! { "web/api" => Value::Map(config! { "port" => 80 }) }),
    });
    let compact = record.to_config(&AttributeFilter::Compact).unwrap();
    let services = compact["services"].as_map().unwrap();
    assert_eq!(services["web/api"], Value::Map(config! { "name" => "api", "port" => 80, "path" => "/" }));
}
