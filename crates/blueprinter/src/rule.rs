use crate::error::{BlueprintError, BlueprintErrorExt, Result};
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::Arc;

/// A plain output record: field name to value.
pub type Record = serde_json::Map<String, Value>;

/// Synchronous field rule: computes a partial record from the input and the options.
pub(crate) type FieldRule<T, O> = Arc<dyn Fn(&T, &O) -> Result<Record> + Send + Sync>;

/// Asynchronous field rule: same contract, completed through a future.
pub(crate) type AsyncFieldRule<T, O> =
    Arc<dyn Fn(&T, &O) -> BoxFuture<'static, Result<Record>> + Send + Sync>;

/// Serializes the value a lifted blueprint reads its kept fields from.
pub(crate) type KeptProjection<T> = Arc<dyn Fn(&T) -> Result<Value> + Send + Sync>;

/// Where a group of kept fields is selected from.
pub(crate) enum KeptSource<T> {
    /// The rendered input itself.
    Input,
    /// The value a `lift` projection maps the input onto.
    Projected(KeptProjection<T>),
}

/// Kept field names that share one source.
pub(crate) struct KeptGroup<T> {
    pub(crate) names: Arc<[Cow<'static, str>]>,
    pub(crate) source: KeptSource<T>,
}

impl<T> Clone for KeptGroup<T> {
    fn clone(&self) -> Self {
        let source = match &self.source {
            KeptSource::Input => KeptSource::Input,
            KeptSource::Projected(project) => KeptSource::Projected(Arc::clone(project)),
        };
        Self { names: Arc::clone(&self.names), source }
    }
}

/// Converts a rule output into a partial record.
///
/// `null` is an empty partial record, so rules may return `()` or `None` to
/// contribute nothing. Any non-object value is rejected.
pub(crate) fn into_record<R: Serialize>(output: &R) -> Result<Record> {
    match serde_json::to_value(output).context("Failed to serialize rule output")? {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Record::new()),
        other => Err(BlueprintError::NotARecord {
            message: kind_of(&other).into(),
            context: Some(std::any::type_name::<R>().into()),
        }),
    }
}

/// Shallow merge: every field of `part` overwrites the same-named field of `target`.
pub(crate) fn merge_into(target: &mut Record, part: Record) {
    for (name, value) in part {
        target.insert(name, value);
    }
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Upper {
        upper: String,
    }

    #[test]
    fn test_struct_output_becomes_record() {
        let record = into_record(&Upper { upper: "AB".to_owned() }).unwrap();
        assert_eq!(Value::Object(record), json!({ "upper": "AB" }));
    }

    #[test]
    fn test_null_output_is_empty() {
        assert!(into_record(&()).unwrap().is_empty());
        assert!(into_record(&None::<Upper>).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_output_is_rejected() {
        let err = into_record(&42).unwrap_err();
        assert!(matches!(err, BlueprintError::NotARecord { ref message, .. } if message == "number"));
    }

    #[test]
    fn test_merge_is_shallow_and_later_wins() {
        let mut target = json!({ "a": 1, "nested": { "x": 1, "y": 2 } })
            .as_object()
            .cloned()
            .unwrap();
        let part = json!({ "nested": { "x": 9 }, "b": 2 }).as_object().cloned().unwrap();
        merge_into(&mut target, part);
        assert_eq!(Value::Object(target), json!({ "a": 1, "b": 2, "nested": { "x": 9 } }));
    }
}
