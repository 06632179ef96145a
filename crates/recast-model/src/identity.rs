//! Identity attributes declared on the schema root
//!
//! `model` and `type` only accept the schema's own values, `name` is
//! normalised to an integer when it is all digits, and `key` is the
//! qualified-name view of the key attributes.

use crate::attribute::{Access, Attribute, Outcome};
use crate::error::ValidationError;
use crate::record::Record;
use crate::schema::{KEY, MODEL, NAME, TYPE};
use crate::value::Value;

/// Normalise a record name
///
/// Empty names become `0`, all-digit names become integers and negative
/// integers keep their textual form. Only ASCII `0-9` count as digits;
/// names written in other scripts' decimal digits stay text.
///
/// # Errors
/// Returns error for values that are neither strings nor integers
pub fn normalize_name(value: Value) -> Result<Value, ValidationError> {
    let text = match value {
        Value::None => return Ok(Value::Int(0)),
        Value::Int(i) if i >= 0 => return Ok(Value::Int(i)),
        Value::Int(i) => i.to_string(),
        Value::Str(s) => s,
        other => return Err(ValidationError::mismatch(NAME, "str or int", &other)),
    };
    if text.is_empty() {
        return Ok(Value::Int(0));
    }
    if text.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(i) = text.parse::<i64>() {
            return Ok(Value::Int(i));
        }
    }
    Ok(Value::Str(text))
}

pub(crate) fn model_attribute() -> Attribute<Record> {
    Attribute::<Record>::validated(MODEL, |assign| {
        let expected = assign.host.schema().model();
        match (&assign.value, expected) {
            (Value::None, _) => Ok(Value::from(expected)),
            (Value::Str(given), Some(expected)) if given == expected => Ok(Value::from(expected)),
            (other, expected) => Err(ValidationError::new(
                MODEL,
                format!("expected {}, got {other}", expected.unwrap_or("none")),
            )
            .into()),
        }
    })
}

pub(crate) fn type_attribute() -> Attribute<Record> {
    Attribute::<Record>::validated(TYPE, |assign| {
        let expected = assign.host.schema().type_name();
        let accepted = match (&assign.value, expected) {
            (Value::None, _) => true,
            (Value::Str(given), Some(expected)) => given == expected,
            (Value::List(items), Some(expected)) => {
                items.iter().any(|item| item.as_str() == Some(expected))
            }
            _ => false,
        };
        if accepted {
            Ok(Value::from(expected))
        } else {
            Err(ValidationError::new(
                TYPE,
                format!("expected {}, got {}", expected.unwrap_or("none"), assign.value),
            )
            .into())
        }
    })
}

pub(crate) fn name_attribute() -> Attribute<Record> {
    Attribute::<Record>::validated(NAME, |assign| Ok(normalize_name(assign.value)?))
}

pub(crate) fn key_attribute() -> Attribute<Record> {
    Attribute::<Record>::computed(KEY, |access| match access {
        Access::Owner => Ok(Outcome::new(Value::None)),
        Access::Instance(record) => Ok(Outcome::new(record.key()?)),
    })
    .with_writer(|record, value| {
        let key = match value {
            Value::Str(s) => s,
            other => other.to_string(),
        };
        record.set_key(&key)
    })
}
