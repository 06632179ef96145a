//! Templated environment mappings
//!
//! The `env` attribute maps variable names to values. String values may
//! reference records positionally, `{0.hostname}` or `{}`, and are
//! rendered by [`format_env`]. References that resolve to nothing are
//! left in place as `{path}` and reported back.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use recast_model::{Bundle, Config, ConfigError, Record, Result, ValidationError, Value};

/// Environment mapping attribute
pub const ENV: &str = "env";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{|\}\}|\{([^{}]*)\}").expect("placeholder pattern is valid")
});

/// Escaping applied after rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Escape {
    /// Double every occurrence
    Double(String),
    /// Replace every occurrence
    Replace {
        /// Text to find
        search: String,
        /// Replacement
        replace: String,
    },
}

impl Escape {
    /// Double every occurrence of `search`
    #[must_use]
    pub fn double(search: impl Into<String>) -> Self {
        Self::Double(search.into())
    }

    /// Replace every occurrence of `search` with `replace`
    #[must_use]
    pub fn replace(search: impl Into<String>, replace: impl Into<String>) -> Self {
        Self::Replace {
            search: search.into(),
            replace: replace.into(),
        }
    }

    fn apply(&self, text: &str) -> String {
        match self {
            Self::Double(search) if search.is_empty() => text.to_string(),
            Self::Double(search) => text.replace(search.as_str(), &search.repeat(2)),
            Self::Replace { search, .. } if search.is_empty() => text.to_string(),
            Self::Replace { search, replace } => text.replace(search.as_str(), replace),
        }
    }
}

/// Rendered environment plus unresolved references per variable
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormattedEnv {
    /// Variable name to rendered text
    pub env: Config,
    /// Variable name to the dotted paths that resolved to nothing
    pub missing: IndexMap<String, Vec<String>>,
}

fn lookup(value: &Value, attribute: &str) -> Value {
    match value {
        Value::Record(record) => record.get(attribute).unwrap_or(Value::None),
        Value::Map(map) => map.get(attribute).cloned().unwrap_or(Value::None),
        _ => Value::None,
    }
}

fn render(value: &Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s.clone()),
        other => Ok(serde_json::to_string(other).map_err(ConfigError::from)?),
    }
}

struct Template<'a> {
    objects: &'a [&'a Record],
    next_index: usize,
    missing: Vec<String>,
}

impl Template<'_> {
    fn resolve(&self, index: usize, attributes: &[&str]) -> Value {
        let Some(record) = self.objects.get(index) else {
            return Value::None;
        };
        let Some((first, rest)) = attributes.split_first() else {
            return Value::from((*record).clone());
        };
        let mut value = record.get(first).unwrap_or(Value::None);
        for attribute in rest {
            value = lookup(&value, attribute);
        }
        value
    }

    fn field(&mut self, field: &str) -> Result<String> {
        // Conversion and format spec are accepted and ignored.
        let field = field.split(|c: char| c == '!' || c == ':').next().unwrap_or_default();
        let mut segments = field.split('.');
        let head = segments.next().unwrap_or_default();
        let attributes: Vec<&str> = segments.collect();
        let index = if head.is_empty() {
            let index = self.next_index;
            self.next_index += 1;
            index
        } else {
            head.parse().unwrap_or(usize::MAX)
        };

        let value = self.resolve(index, &attributes);
        if value.is_none() {
            let path = std::iter::once(if head.is_empty() { index.to_string() } else { head.to_string() })
                .chain(attributes.iter().map(ToString::to_string))
                .collect::<Vec<_>>()
                .join(".");
            trace!("environment reference {} is missing", path);
            let output = format!("{{{path}}}");
            self.missing.push(path);
            return Ok(output);
        }
        render(&value)
    }

    fn fill(&mut self, text: &str) -> Result<String> {
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for captures in PLACEHOLDER.captures_iter(text) {
            let whole = captures.get(0).map_or(0..0, |m| m.range());
            output.push_str(&text[last..whole.start]);
            output.push_str(&self.replacement(&captures)?);
            last = whole.end;
        }
        output.push_str(&text[last..]);
        Ok(output)
    }

    fn replacement(&mut self, captures: &Captures<'_>) -> Result<String> {
        match captures.get(1) {
            Some(field) => self.field(field.as_str()),
            None => Ok(captures[0][..1].to_string()),
        }
    }
}

/// Render one environment value
///
/// With neither `objects` nor `escape` the value is returned unchanged.
/// Otherwise non-strings become JSON, strings are filled from `objects`,
/// and `escape` is applied last. Unresolved references are appended to
/// `missing`.
///
/// # Errors
/// Returns error if a referenced record cannot produce its configuration
pub fn format_value(
    value: &Value,
    objects: Option<&[&Record]>,
    escape: Option<&Escape>,
    missing: &mut Vec<String>,
) -> Result<Value> {
    if objects.is_none() && escape.is_none() {
        return Ok(value.clone());
    }

    let text = match (value, objects) {
        (Value::Str(text), Some(objects)) => {
            let mut template = Template {
                objects,
                next_index: 0,
                missing: Vec::new(),
            };
            let text = template.fill(text)?;
            missing.append(&mut template.missing);
            text
        }
        (Value::Str(text), None) => text.clone(),
        (other, _) => render(other)?,
    };

    Ok(Value::Str(match escape {
        Some(escape) => escape.apply(&text),
        None => text,
    }))
}

/// Render a record's `env` mapping
///
/// `objects` defaults to the record itself; pass an empty slice to render
/// without references.
///
/// # Errors
/// Returns error if `env` is not a mapping or a referenced record cannot
/// produce its configuration
pub fn format_env(record: &Record, objects: Option<&[&Record]>, escape: Option<&Escape>) -> Result<FormattedEnv> {
    let own = [record];
    let objects = objects.unwrap_or(&own);

    let env = match record.get(ENV)? {
        Value::None => IndexMap::new(),
        Value::Map(env) => env,
        other => {
            return Err(ValidationError::mismatch(ENV, "map", &other).into());
        }
    };

    let mut formatted = FormattedEnv::default();
    for (name, value) in &env {
        let mut missed = Vec::new();
        let value = format_value(value, Some(objects), escape, &mut missed)?;
        formatted.env.insert(name.clone(), value);
        if !missed.is_empty() {
            debug!("{} environment {} has unresolved references", record.type_name(), name);
            formatted.missing.insert(name.clone(), missed);
        }
    }
    Ok(formatted)
}

/// `env` mapping, default none
#[must_use]
pub fn with_environment() -> Bundle {
    Bundle::new("WithEnvironment").field(ENV, Value::None).compact([ENV])
}
