//! Record behaviour through a registry: casting, defaults and protocols

use std::sync::Arc;

use pretty_assertions::assert_eq;
use recast_model::{config, AttributeFilter, CastError, Config, ModelError, Registry, Value};
use recast_test_utils::{init_tracing, model_family};

#[test]
fn casting_resolves_most_specific_schema() {
    init_tracing();
    let family = model_family();
    let registry = &family.registry;

    let model1 = registry
        .from_config(registry.root(), config! { "model" => "new_model", "type" => "custom_name" })
        .unwrap();
    let model2 = registry
        .from_config(registry.root(), config! { "model" => "new_model", "type" => "new_type2" })
        .unwrap();
    assert!(Arc::ptr_eq(model1.schema(), &family.new_type1));
    assert!(Arc::ptr_eq(model2.schema(), &family.new_type2));
}

#[test]
fn casting_rejects_upcasts() {
    let family = model_family();
    let registry = &family.registry;

    let err = registry
        .from_config(&family.new_model, config! { "model" => "model", "type" => "_" })
        .unwrap_err();
    assert!(matches!(err, ModelError::Cast(CastError::Upcast { .. })));

    let err = registry
        .from_config(&family.new_type1, config! { "model" => "new_model", "type" => "_" })
        .unwrap_err();
    assert!(err.is_cast());
    assert_eq!(err.to_string(), "attempted upcast: new_model-custom_name to new_model-_");
}

#[test]
fn casting_rejects_siblings_and_unknown_pairs() {
    let family = model_family();
    let registry = &family.registry;

    let err = registry
        .construct(&family.new_type1, None, "new_type2", Config::new())
        .unwrap_err();
    assert!(matches!(err, ModelError::Cast(CastError::BadCast { .. })));

    let err = registry
        .construct(registry.root(), Some("nope"), "_", Config::new())
        .unwrap_err();
    assert!(matches!(err, ModelError::Cast(CastError::Unregistered { .. })));
}

#[test]
fn type_list_falls_back_in_order() {
    let family = model_family();
    let registry = &family.registry;
    let record = registry
        .construct(registry.root(), Some("new_model"), vec!["missing".to_string(), "_".to_string()], Config::new())
        .unwrap();
    assert!(Arc::ptr_eq(record.schema(), &family.new_model));
}

#[test]
fn defaults() {
    let registry = Registry::new();
    let record = registry.from_config(registry.root(), Config::new()).unwrap();
    let expect = config! { "model" => "model", "type" => "_", "name" => 0 };
    assert_eq!(record.to_config(&AttributeFilter::All).unwrap(), expect);
    let pairs: Config = record.iter().map(|(k, v)| (k.to_string(), v.unwrap())).collect();
    assert_eq!(pairs, expect);
}

#[test]
fn init() {
    let registry = Registry::new();
    let record = registry.from_config(registry.root(), config! { "name" => 1 }).unwrap();
    assert_eq!(record.get("name").unwrap(), Value::Int(1));
}

#[test]
fn bad_init() {
    let registry = Registry::new();
    let err = registry
        .from_config(registry.root(), config! { "unknown" => Value::None })
        .unwrap_err();
    assert!(err.is_unknown_attribute());
    assert_eq!(err.to_string(), "bad attributes for model/_: unknown");
}

#[test]
fn bad_set() {
    let registry = Registry::new();
    let mut record = registry.from_config(registry.root(), Config::new()).unwrap();
    let err = record.set("unknown", Value::None).unwrap_err();
    assert!(err.is_unknown_attribute());
    assert!(!err.is_key());
}

#[test]
fn key_follows_name() {
    let registry = Registry::new();
    let mut record = registry.from_config(registry.root(), Config::new()).unwrap();
    assert_eq!(record.key().unwrap(), "_/0");
    record.set("name", 1).unwrap();
    assert_eq!(record.key().unwrap(), "_/1");
    record.set("name", "one").unwrap();
    assert_eq!(record.key().unwrap(), "_/one");
    record.set("name", "7").unwrap();
    assert_eq!(record.get("name").unwrap(), Value::Int(7));
}

#[test]
fn key_constructs_records() {
    let family = model_family();
    let registry = &family.registry;

    let record = registry
        .from_keyconfig(&family.new_model, "custom_name/api", Config::new())
        .unwrap();
    assert!(Arc::ptr_eq(record.schema(), &family.new_type1));
    assert_eq!(record.key().unwrap(), "custom_name/api");

    let record = registry.from_keyconfig(&family.new_model, "new_type2", Config::new()).unwrap();
    assert!(Arc::ptr_eq(record.schema(), &family.new_type2));
    assert_eq!(record.get("name").unwrap(), Value::Int(0));

    let record = registry.from_keyconfig(&family.new_model, "other", Config::new()).unwrap();
    assert!(Arc::ptr_eq(record.schema(), &family.new_model));
    assert_eq!(record.key().unwrap(), "_/0");

    let err = registry.from_keyconfig(&family.new_model, "a/b/c", Config::new()).unwrap_err();
    assert!(matches!(err, ModelError::BadKey { .. }));
}

#[test]
fn protocols() {
    let registry = Registry::new();
    let mut record = registry.from_config(registry.root(), Config::new()).unwrap();

    assert_eq!(record.len(), record.iter().count());
    assert!(record.contains("name"));
    assert!(record.contains("key"));
    assert!(!record.contains("unknown"));
    assert_eq!(record.get_item("name").unwrap(), Value::Int(0));
    assert_eq!(record.get("name").unwrap(), Value::Int(0));

    record.set_item("name", 1).unwrap();
    assert_eq!(record.get("name").unwrap(), Value::Int(1));
    record.set("name", 0).unwrap();
    assert_eq!(record.get("name").unwrap(), Value::Int(0));

    let err = record.del_item("name").unwrap_err();
    assert!(err.is_key());
    let err = record.delete("name").unwrap_err();
    assert!(err.is_unknown_attribute());
    assert!(!err.is_key());

    let names: Vec<&str> = record.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["model", "type", "name"]);
}

#[test]
fn display_lists_compact_attributes() {
    let registry = Registry::new();
    let record = registry.from_config(registry.root(), config! { "name" => "api" }).unwrap();
    assert_eq!(record.to_string(), "<Model(api)>");
}

#[test]
fn config_round_trip() {
    let family = model_family();
    let registry = &family.registry;
    let record = registry
        .from_config(registry.root(), config! { "model" => "new_model", "type" => "new_type2", "name" => "x" })
        .unwrap();
    let config = record.to_config(&AttributeFilter::All).unwrap();
    let again = registry.from_config(registry.root(), config).unwrap();
    assert_eq!(again, record);

    let key = record.to_config(&AttributeFilter::Key).unwrap();
    assert_eq!(key, config! { "type" => "new_type2", "name" => "x" });
}
