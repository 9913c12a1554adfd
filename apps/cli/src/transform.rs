//! Synchronous field rules built from `[[fields]]` entries.

use crate::definition::{FieldSpec, Transform};
use blueprinter::Record;
use serde_json::Value;

#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error("Field `{field}` expects a string source, found {found}")]
    NotAString { field: String, found: &'static str },
    #[error("Field `{field}` expects a string, array or object source, found {found}")]
    NotMeasurable { field: String, found: &'static str },
}

/// Builds the rule for one field entry.
///
/// An absent source yields `null`; a present source of the wrong type fails the render.
pub fn field_rule(
    spec: &FieldSpec,
) -> impl Fn(&Value, &Record) -> Result<Record, TransformError> + Send + Sync + 'static {
    let spec = spec.clone();
    move |input: &Value, options: &Record| -> Result<Record, TransformError> {
        let value = apply(&spec, input, options)?;
        Ok(Record::from_iter([(spec.name.clone(), value)]))
    }
}

fn apply(spec: &FieldSpec, input: &Value, options: &Record) -> Result<Value, TransformError> {
    let source = spec.source();
    let found = input.get(source);

    let value = match spec.transform {
        Transform::Constant => spec.value.clone(),
        Transform::Option => options.get(source).cloned().unwrap_or(Value::Null),
        _ if found.is_none_or(Value::is_null) => Value::Null,
        Transform::Copy => found.cloned().unwrap_or(Value::Null),
        Transform::Uppercase => map_str(spec, found, str::to_uppercase)?,
        Transform::Lowercase => map_str(spec, found, str::to_lowercase)?,
        Transform::Trim => map_str(spec, found, |s| s.trim().to_owned())?,
        Transform::Length => match found {
            Some(Value::String(s)) => Value::from(s.chars().count()),
            Some(Value::Array(items)) => Value::from(items.len()),
            Some(Value::Object(fields)) => Value::from(fields.len()),
            other => {
                return Err(TransformError::NotMeasurable {
                    field: spec.name.clone(),
                    found: kind_of(other),
                });
            }
        },
    };
    Ok(value)
}

fn map_str(
    spec: &FieldSpec,
    found: Option<&Value>,
    f: impl FnOnce(&str) -> String,
) -> Result<Value, TransformError> {
    match found {
        Some(Value::String(s)) => Ok(Value::String(f(s))),
        other => Err(TransformError::NotAString { field: spec.name.clone(), found: kind_of(other) }),
    }
}

const fn kind_of(value: Option<&Value>) -> &'static str {
    match value {
        None | Some(Value::Null) => "null",
        Some(Value::Bool(_)) => "boolean",
        Some(Value::Number(_)) => "number",
        Some(Value::String(_)) => "string",
        Some(Value::Array(_)) => "array",
        Some(Value::Object(_)) => "object",
    }
}
