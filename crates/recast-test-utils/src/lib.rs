//! Testing utilities for the Recast workspace
//!
//! Shared schema fixtures and tracing setup.

#![allow(missing_docs)]

use std::sync::{Arc, Once};

use recast_bundles::{with_connection_url, with_url};
use recast_model::{Registry, Schema, SchemaBuilder};
use tracing_subscriber::EnvFilter;

/// `NewModel` with two types: `custom_name` and the derived `new_type2`
#[derive(Debug, Clone)]
pub struct ModelFamily {
    pub registry: Arc<Registry>,
    pub new_model: Arc<Schema>,
    pub new_type1: Arc<Schema>,
    pub new_type2: Arc<Schema>,
}

pub fn model_family() -> ModelFamily {
    let registry = Arc::new(Registry::new());
    let new_model = SchemaBuilder::new("NewModel", registry.root())
        .new_model()
        .register(&registry);
    let new_type1 = SchemaBuilder::new("NewType1", &new_model)
        .type_name("custom_name")
        .register(&registry);
    let new_type2 = SchemaBuilder::new("NewType2", &new_model).register(&registry);
    ModelFamily {
        registry,
        new_model,
        new_type1,
        new_type2,
    }
}

pub fn with_url_model(registry: &Registry) -> Arc<Schema> {
    SchemaBuilder::new("WithUrlModel", registry.root())
        .bundle(with_url())
        .register(registry)
}

pub fn with_connection_url_model(registry: &Registry) -> Arc<Schema> {
    SchemaBuilder::new("WithConnectionUrlModel", registry.root())
        .bundle(with_connection_url())
        .register(registry)
}

static TRACING: Once = Once::new();

/// Install a fmt subscriber filtered by `RUST_LOG`, once per process
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
            .with_test_writer()
            .try_init();
    });
}
