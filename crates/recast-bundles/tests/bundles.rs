use std::sync::Arc;

use pretty_assertions::assert_eq;
use recast_bundles::{format_env, with_aws, with_environment, with_image, with_url, Escape};
use recast_model::{config, AttributeFilter, Config, Record, Registry, Schema, SchemaBuilder, Value};

struct Fixture {
    registry: Arc<Registry>,
    app: Arc<Schema>,
}

fn fixture() -> Fixture {
    let registry = Arc::new(Registry::new());
    let app = SchemaBuilder::new("App", registry.root())
        .new_model()
        .bundle(with_image())
        .bundle(with_environment())
        .bundle(with_url())
        .bundle(with_aws())
        .register(&registry);
    Fixture { registry, app }
}

impl Fixture {
    fn build(&self, config: Config) -> Record {
        self.registry.from_config(&self.app, config).unwrap()
    }
}

#[test]
fn image_splits_into_parts() {
    let f = fixture();
    let record = f.build(config! { "image" => "registry.local:5000/team/app:1.2" });
    assert_eq!(record.get("image_registry").unwrap(), Value::from("registry.local:5000"));
    assert_eq!(record.get("image_project").unwrap(), Value::from("team"));
    assert_eq!(record.get("image_name").unwrap(), Value::from("app"));
    assert_eq!(record.get("image_tag").unwrap(), Value::from("1.2"));
    assert_eq!(record.get("image_id").unwrap(), Value::None);
    assert_eq!(record.get("image").unwrap(), Value::from("registry.local:5000/team/app:1.2"));
}

#[test]
fn image_updates_only_given_parts() {
    let f = fixture();
    let mut record = f.build(config! { "image" => "team/app:1.2" });
    record.set("image", "app:2.0").unwrap();
    assert_eq!(record.get("image").unwrap(), Value::from("team/app:2.0"));

    record.set("image", "").unwrap();
    record.set("image", Value::None).unwrap();
    assert_eq!(record.get("image").unwrap(), Value::from("team/app:2.0"));

    record.set("image", "app@sha256:beef").unwrap();
    assert_eq!(record.get("image").unwrap(), Value::from("team/app@sha256:beef"));
}

#[test]
fn malformed_image_rejected() {
    let f = fixture();
    let err = f
        .registry
        .from_config(&f.app, config! { "image" => "a/b/c/d" })
        .unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn environment_references_own_record() {
    let f = fixture();
    let record = f.build(config! {
        "url" => "http://web:8080",
        "env" => Value::Map(config! {
            "HOST" => "{0.hostname}",
            "ADDR" => "{0.hostname}:{0.port}",
            "REPLICAS" => 3,
            "SECRET" => "{0.secret_access_key}",
        }),
    });

    let formatted = format_env(&record, None, None).unwrap();
    assert_eq!(
        formatted.env,
        config! {
            "HOST" => "web",
            "ADDR" => "web:8080",
            "REPLICAS" => "3",
            "SECRET" => "{0.secret_access_key}",
        }
    );
    let missing: Vec<_> = formatted.missing.keys().cloned().collect();
    assert_eq!(missing, vec!["SECRET"]);
    assert_eq!(formatted.missing["SECRET"], vec!["0.secret_access_key".to_string()]);
}

#[test]
fn environment_with_other_objects_and_escape() {
    let f = fixture();
    let db = f.build(config! { "url" => "postgres://db:5432/app", "name" => "db" });
    let record = f.build(config! {
        "env" => Value::Map(config! { "DSN" => "{0.url}${0.name}", "PLAIN" => "a$b" }),
    });

    let formatted = format_env(&record, Some(&[&db][..]), Some(&Escape::double("$"))).unwrap();
    assert_eq!(formatted.env["DSN"], Value::from("postgres://db:5432/app$$db"));
    assert_eq!(formatted.env["PLAIN"], Value::from("a$$b"));
    assert!(formatted.missing.is_empty());
}

#[test]
fn environment_defaults_to_empty() {
    let f = fixture();
    let record = f.build(Config::new());
    let formatted = format_env(&record, None, None).unwrap();
    assert!(formatted.env.is_empty());
    assert!(formatted.missing.is_empty());
}

#[test]
fn compact_config_lists_bundle_heads() {
    let f = fixture();
    let record = f.build(config! {
        "image" => "app:1",
        "url" => "http://web",
        "region" => "eu-west-1",
        "name" => "api",
    });
    let compact = record.to_config(&AttributeFilter::Compact).unwrap();
    assert_eq!(compact, config! { "name" => "api", "image" => "app:1", "url" => "http://web" });
    assert_eq!(record.get("region").unwrap(), Value::from("eu-west-1"));
}
