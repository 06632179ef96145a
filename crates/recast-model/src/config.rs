//! Loose configuration documents
//!
//! Parses JSON and YAML text into a [`Config`] and renders records back.
//! YAML goes through `serde_json::Value` so both formats convert to
//! [`Value`] the same way. No I/O happens here; callers supply strings.

use serde_json::Value as JsonValue;

use crate::record::{AttributeFilter, Record};
use crate::value::{Config, Value};

/// Configuration document errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Input is not valid JSON
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// Input is not valid YAML
    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    /// Document root is not a mapping
    #[error("configuration root must be a mapping, got {0}")]
    NotAMapping(&'static str),

    /// Record could not be rendered
    #[error("serialization failed: {0}")]
    Serialization(String),
}

fn into_config(json: JsonValue) -> Result<Config, ConfigError> {
    match Value::from(json) {
        Value::Map(config) => Ok(config),
        other => Err(ConfigError::NotAMapping(other.kind())),
    }
}

/// Parse a JSON mapping
///
/// # Errors
/// Returns error if the text is not JSON or the root is not an object
pub fn from_json(json: &str) -> Result<Config, ConfigError> {
    let value: JsonValue = serde_json::from_str(json)?;
    into_config(value)
}

/// Parse a YAML mapping
///
/// # Errors
/// Returns error if the text is not YAML or the root is not a mapping
pub fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
    let value: JsonValue = serde_yaml::from_str(yaml)?;
    into_config(value)
}

/// Render a record's configuration as pretty JSON
///
/// # Errors
/// Returns error if the record cannot produce its configuration
pub fn to_json(record: &Record) -> Result<String, ConfigError> {
    let config = record
        .to_config(&AttributeFilter::All)
        .map_err(|e| ConfigError::Serialization(e.to_string()))?;
    Ok(serde_json::to_string_pretty(&config)?)
}

/// Render a record's configuration as YAML
///
/// # Errors
/// Returns error if the record cannot produce its configuration
pub fn to_yaml(record: &Record) -> Result<String, ConfigError> {
    let config = record
        .to_config(&AttributeFilter::All)
        .map_err(|e| ConfigError::Serialization(e.to_string()))?;
    Ok(serde_yaml::to_string(&config)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_mapping_keeps_order() {
        let config = from_json(r#"{"type": "web", "name": "api", "port": 8080}"#).unwrap();
        let keys: Vec<_> = config.keys().cloned().collect();
        assert_eq!(keys, vec!["type", "name", "port"]);
        assert_eq!(config["port"], Value::Int(8080));
    }

    #[test]
    fn yaml_mapping_converts_values() {
        let config = from_yaml("name: api\nreplicas: 2\nratio: 0.5\ntags: [a, b]\nempty: null\n").unwrap();
        assert_eq!(config["name"], Value::from("api"));
        assert_eq!(config["replicas"], Value::Int(2));
        assert_eq!(config["ratio"], Value::Float(0.5));
        assert_eq!(config["tags"], Value::List(vec![Value::from("a"), Value::from("b")]));
        assert_eq!(config["empty"], Value::None);
    }

    #[test]
    fn non_mapping_root_rejected() {
        let err = from_json("[1, 2]").unwrap_err();
        assert!(matches!(err, ConfigError::NotAMapping("list")));
        assert!(from_yaml("just text").is_err());
    }

    #[test]
    fn invalid_input_rejected() {
        assert!(matches!(from_json("{"), Err(ConfigError::InvalidJson(_))));
        assert!(matches!(from_yaml("a: [1"), Err(ConfigError::InvalidYaml(_))));
    }
}
