//! Schemas and their declaration
//!
//! A [`Schema`] is the resolved description of one record type: ordered
//! fields with defaults, the attribute descriptor behind every field,
//! compact/key attribute lists and the simple key. Schemas form a single
//! rooted hierarchy starting at [`base`]; [`SchemaBuilder`] derives a child
//! from a parent, optionally layering [`Bundle`]s in between.
//!
//! Building a schema does not register it. Registration is an explicit
//! [`Registry::register`](crate::Registry::register) call.

use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::attribute::Attribute;
use crate::error::Result;
use crate::identity;
use crate::record::Record;
use crate::value::{Config, Value};

/// Identity attribute holding the model name
pub const MODEL: &str = "model";
/// Identity attribute holding the type name
pub const TYPE: &str = "type";
/// Identity attribute holding the record name
pub const NAME: &str = "name";
/// Pseudo-attribute exposing the qualified key
pub const KEY: &str = "key";
/// Wildcard type registered for every model
pub const WILDCARD: &str = "_";

static BASE: Lazy<Arc<Schema>> = Lazy::new(|| Arc::new(Schema::base_schema()));

/// Root of every schema hierarchy
///
/// Declares `model`, `type` and `name`, keys on `type/name` and uses `type`
/// as the simple key. It has no model or type and is never registered.
#[must_use]
pub fn base() -> Arc<Schema> {
    Arc::clone(&BASE)
}

/// Declared field
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Attribute name
    pub name: String,
    /// Declared default
    pub default: Value,
}

impl Field {
    /// Create field
    #[inline]
    pub fn new(name: impl Into<String>, default: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            default: default.into(),
        }
    }
}

/// Reusable attribute list composed into schemas
#[derive(Debug, Clone, Default)]
pub struct Bundle {
    name: String,
    fields: Vec<Field>,
    compact: Option<Vec<String>>,
    attributes: Vec<Attribute<Record>>,
}

impl Bundle {
    /// Create empty bundle
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Bundle name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a field, or override the default of an inherited one
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.fields.push(Field::new(name, default));
        self
    }

    /// Attach a descriptor; declares nothing by itself
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute<Record>) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Declare a field backed by `attribute`
    #[must_use]
    pub fn field_with(self, attribute: Attribute<Record>, default: impl Into<Value>) -> Self {
        let name = attribute.name().to_string();
        self.attribute(attribute).field(name, default)
    }

    /// Compact attributes contributed by this layer
    ///
    /// Unset, a composed bundle contributes none while a schema's own layer
    /// contributes every field it declares.
    #[must_use]
    pub fn compact<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compact = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Fields declared by this layer
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    fn compact_names(&self, auto: bool) -> Vec<String> {
        match &self.compact {
            Some(names) => names.clone(),
            None if auto => self.fields.iter().map(|f| f.name.clone()).collect(),
            None => Vec::new(),
        }
    }
}

/// Resolved record schema
pub struct Schema {
    name: String,
    model: Option<String>,
    type_name: Option<String>,
    parent: Option<Arc<Schema>>,
    fields: Vec<Field>,
    attributes: IndexMap<String, Attribute<Record>>,
    compact: Vec<String>,
    keys: Vec<String>,
    simple_key: String,
}

impl Schema {
    fn base_schema() -> Self {
        let fields = vec![
            Field::new(MODEL, Value::None),
            Field::new(TYPE, Value::None),
            Field::new(NAME, 0),
        ];
        let attributes = [
            identity::model_attribute(),
            identity::type_attribute(),
            identity::name_attribute(),
            identity::key_attribute(),
        ]
        .into_iter()
        .map(|attr| (attr.name().to_string(), attr))
        .collect();

        Self {
            name: "BaseModel".to_string(),
            model: None,
            type_name: None,
            parent: None,
            fields,
            attributes,
            compact: vec![NAME.to_string()],
            keys: vec![TYPE.to_string(), NAME.to_string()],
            simple_key: TYPE.to_string(),
        }
    }

    /// Declared schema name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Model name, `None` for the root
    #[inline]
    #[must_use]
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Type name, `None` for the root
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Parent schema, `None` for the root
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<&Arc<Schema>> {
        self.parent.as_ref()
    }

    /// Declared fields in population order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Declared field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Descriptor for a declared field or pseudo-attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute<Record>> {
        self.attributes.get(name)
    }

    /// Whether `name` is a declared field or pseudo-attribute
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Compact attributes, used for display
    #[inline]
    #[must_use]
    pub fn compact(&self) -> &[String] {
        &self.compact
    }

    /// Key attributes, used for identity
    #[inline]
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Attribute used for one-part keys
    #[inline]
    #[must_use]
    pub fn simple_key(&self) -> &str {
        &self.simple_key
    }

    /// Field defaults in declared order
    #[must_use]
    pub fn defaults(&self) -> Config {
        self.fields
            .iter()
            .map(|f| (f.name.clone(), f.default.clone()))
            .collect()
    }

    /// Schema-level read of an attribute
    ///
    /// Computations run with the owner context; plain fields yield their
    /// default.
    ///
    /// # Errors
    /// Propagates computation failures
    pub fn owner_value(&self, name: &str) -> Result<Option<Value>> {
        if let Some(value) = self.attribute(name).map(Attribute::read_owner).transpose()?.flatten() {
            return Ok(Some(value));
        }
        Ok(self.field(name).map(|f| f.default.clone()))
    }

    /// True if `self` is `ancestor` or descends from it
    #[must_use]
    pub fn descends_from(&self, ancestor: &Schema) -> bool {
        let mut current = Some(self);
        while let Some(schema) = current {
            if std::ptr::eq(schema, ancestor) {
                return true;
            }
            current = schema.parent.as_deref();
        }
        false
    }

    /// `model-type` label used in messages
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}-{}",
            self.model.as_deref().unwrap_or_default(),
            self.type_name.as_deref().unwrap_or_default()
        )
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("model", &self.model)
            .field("type_name", &self.type_name)
            .field("fields", &self.fields.iter().map(|f| f.name.as_str()).collect::<Vec<_>>())
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

impl Display for Schema {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone)]
enum Naming {
    Inherit,
    Derived,
    Named(String),
}

/// Builder deriving a child schema
///
/// Naming follows the declared schema name: `.new_model()` on `NewModel`
/// defines model `new_model` with the wildcard type; a child that names
/// neither model nor type inherits the model and takes its snake-cased name
/// as type.
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    parent: Arc<Schema>,
    model: Naming,
    type_name: Naming,
    bundles: Vec<Bundle>,
    own: Bundle,
    keys: Option<Vec<String>>,
    simple_key: Option<String>,
}

impl SchemaBuilder {
    /// Start a child of `parent`
    #[must_use]
    pub fn new(name: impl Into<String>, parent: &Arc<Schema>) -> Self {
        let name = name.into();
        Self {
            own: Bundle::new(name.clone()),
            name,
            parent: Arc::clone(parent),
            model: Naming::Inherit,
            type_name: Naming::Inherit,
            bundles: Vec::new(),
            keys: None,
            simple_key: None,
        }
    }

    /// Define a new model named after the schema
    #[must_use]
    pub fn new_model(mut self) -> Self {
        self.model = Naming::Derived;
        self
    }

    /// Define (or reopen) a model by name
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Naming::Named(model.into());
        self
    }

    /// Register under an explicit type name
    #[must_use]
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Naming::Named(type_name.into());
        self
    }

    /// Register under the wildcard type
    #[must_use]
    pub fn wildcard(mut self) -> Self {
        self.type_name = Naming::Named(WILDCARD.to_string());
        self
    }

    /// Compose a bundle between the parent and this schema's own fields
    #[must_use]
    pub fn bundle(mut self, bundle: Bundle) -> Self {
        self.bundles.push(bundle);
        self
    }

    /// Declare a field, or override an inherited default
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, default: impl Into<Value>) -> Self {
        self.own = self.own.field(name, default);
        self
    }

    /// Attach a descriptor
    #[must_use]
    pub fn attribute(mut self, attribute: Attribute<Record>) -> Self {
        self.own = self.own.attribute(attribute);
        self
    }

    /// Declare a field backed by `attribute`
    #[must_use]
    pub fn field_with(mut self, attribute: Attribute<Record>, default: impl Into<Value>) -> Self {
        self.own = self.own.field_with(attribute, default);
        self
    }

    /// Compact attributes contributed by this schema
    #[must_use]
    pub fn compact<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.own = self.own.compact(names);
        self
    }

    /// Replace the inherited key attributes
    #[must_use]
    pub fn keys<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Replace the inherited simple key
    #[must_use]
    pub fn simple_key(mut self, name: impl Into<String>) -> Self {
        self.simple_key = Some(name.into());
        self
    }

    /// Resolve into a schema
    #[must_use]
    pub fn build(self) -> Arc<Schema> {
        let parent = self.parent;
        let mut fields = parent.fields.clone();
        let mut attributes = parent.attributes.clone();
        let mut compact = parent.compact.clone();

        let layers = self
            .bundles
            .iter()
            .map(|bundle| (bundle, false))
            .chain(std::iter::once((&self.own, true)));
        for (layer, own) in layers {
            for field in &layer.fields {
                match fields.iter_mut().find(|f| f.name == field.name) {
                    Some(existing) => existing.default = field.default.clone(),
                    None => fields.push(field.clone()),
                }
            }
            for attribute in &layer.attributes {
                attributes.insert(attribute.name().to_string(), attribute.clone());
            }
            for name in layer.compact_names(own) {
                if !compact.contains(&name) {
                    compact.push(name);
                }
            }
        }

        let derived = snake_case(&self.name);
        let mut model = match self.model {
            Naming::Inherit => None,
            Naming::Derived => Some(derived.clone()),
            Naming::Named(model) => Some(model),
        };
        let mut type_name = match self.type_name {
            Naming::Inherit | Naming::Derived => None,
            Naming::Named(type_name) => Some(type_name),
        };
        if model.is_some() && type_name.is_none() {
            type_name = Some(WILDCARD.to_string());
        }
        if model.is_none() {
            model.clone_from(&parent.model);
        }
        if model.is_some() && type_name.is_none() {
            type_name = Some(derived);
        }

        for field in &mut fields {
            match field.name.as_str() {
                MODEL => field.default = Value::from(model.clone()),
                TYPE => field.default = Value::from(type_name.clone()),
                _ => {}
            }
        }
        for field in &fields {
            attributes
                .entry(field.name.clone())
                .or_insert_with(|| Attribute::stored(field.name.clone()));
        }

        Arc::new(Schema {
            name: self.name,
            model,
            type_name,
            keys: self.keys.unwrap_or_else(|| parent.keys.clone()),
            simple_key: self.simple_key.unwrap_or_else(|| parent.simple_key.clone()),
            parent: Some(Arc::clone(&parent)),
            fields,
            attributes,
            compact,
        })
    }
}

/// `NewType2` → `new_type2`
#[must_use]
pub fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out.trim_matches('_').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model_root() -> Arc<Schema> {
        SchemaBuilder::new("Model", &base()).new_model().build()
    }

    #[test]
    fn snake_case_names() {
        assert_eq!(snake_case("NewType2"), "new_type2");
        assert_eq!(snake_case("Model"), "model");
        assert_eq!(snake_case("WithUrlModel"), "with_url_model");
        assert_eq!(snake_case("_Private"), "private");
    }

    #[test]
    fn base_has_identity_fields() {
        let base = base();
        let names: Vec<_> = base.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["model", "type", "name"]);
        assert_eq!(base.keys(), &["type", "name"]);
        assert_eq!(base.simple_key(), "type");
        assert!(base.model().is_none());
        assert!(base.contains("key"));
    }

    #[test]
    fn new_model_gets_wildcard_type() {
        let model = model_root();
        assert_eq!(model.model(), Some("model"));
        assert_eq!(model.type_name(), Some("_"));
        assert_eq!(model.defaults()["model"], Value::from("model"));
        assert_eq!(model.defaults()["type"], Value::from("_"));
        assert_eq!(model.defaults()["name"], Value::Int(0));
    }

    #[test]
    fn child_inherits_model_and_derives_type() {
        let model = model_root();
        let new_model = SchemaBuilder::new("NewModel", &model).new_model().build();
        let explicit = SchemaBuilder::new("NewType1", &new_model).type_name("custom_name").build();
        let derived = SchemaBuilder::new("NewType2", &new_model).build();

        assert_eq!(new_model.label(), "new_model-_");
        assert_eq!(explicit.label(), "new_model-custom_name");
        assert_eq!(derived.label(), "new_model-new_type2");
    }

    #[test]
    fn explicit_model_without_type_is_wildcard() {
        let schema = SchemaBuilder::new("Anything", &model_root()).model("service").build();
        assert_eq!(schema.label(), "service-_");
    }

    #[test]
    fn redeclared_field_keeps_position() {
        let model = model_root();
        let parent = SchemaBuilder::new("Parent", &model)
            .field("a", 1)
            .field("b", 2)
            .build();
        let child = SchemaBuilder::new("Child", &parent).field("c", 3).field("a", 10).build();

        let names: Vec<_> = child.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["model", "type", "name", "a", "b", "c"]);
        assert_eq!(child.field("a").unwrap().default, Value::Int(10));
        assert_eq!(parent.field("a").unwrap().default, Value::Int(1));
    }

    #[test]
    fn bundles_layer_between_parent_and_own() {
        let bundle = Bundle::new("WithThing").field("thing", "x").compact(["thing"]);
        let schema = SchemaBuilder::new("Thing", &model_root())
            .bundle(bundle)
            .field("own", 1)
            .field("thing", "y")
            .build();

        let names: Vec<_> = schema.fields().iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["model", "type", "name", "thing", "own"]);
        assert_eq!(schema.field("thing").unwrap().default, Value::from("y"));
        assert_eq!(schema.compact(), &["name", "thing", "own"]);
    }

    #[test]
    fn bundle_without_compact_contributes_none() {
        let bundle = Bundle::new("WithSecret").field("secret", Value::None);
        let schema = SchemaBuilder::new("Vault", &model_root())
            .bundle(bundle)
            .compact(Vec::<String>::new())
            .build();
        assert_eq!(schema.compact(), &["name"]);
        assert!(schema.contains("secret"));
    }

    #[test]
    fn descends_from_walks_parents() {
        let model = model_root();
        let child = SchemaBuilder::new("Child", &model).build();
        let other = SchemaBuilder::new("Other", &model).build();

        assert!(child.descends_from(&model));
        assert!(child.descends_from(&child));
        assert!(child.descends_from(&base()));
        assert!(!model.descends_from(&child));
        assert!(!child.descends_from(&other));
    }

    #[test]
    fn keys_and_simple_key_override() {
        let schema = SchemaBuilder::new("Named", &model_root())
            .keys(["name"])
            .simple_key("name")
            .build();
        assert_eq!(schema.keys(), &["name"]);
        assert_eq!(schema.simple_key(), "name");
    }

    #[test]
    fn owner_value_uses_default_for_plain_fields() {
        let schema = SchemaBuilder::new("Plain", &model_root()).field("port", 80).build();
        assert_eq!(schema.owner_value("port").unwrap(), Some(Value::Int(80)));
        assert_eq!(schema.owner_value("missing").unwrap(), None);
        assert_eq!(schema.owner_value("key").unwrap(), Some(Value::None));
    }
}
