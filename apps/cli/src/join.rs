//! Asynchronous field rules built from `[[joins]]` entries.
//!
//! A join reads `<dir>/<key value>.json` and places the parsed document under
//! the join's name.

use crate::definition::{JoinSpec, MissingPolicy};
use blueprinter::Record;
use serde_json::Value;
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, trace};

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("Join `{join}` has no value for key `{key}`")]
    MissingKey { join: String, key: String },
    #[error("Join `{join}` cannot use `{value}` as a document name")]
    InvalidKey { join: String, value: String },
    #[error("Join `{join}` found no document at {}", path.display())]
    MissingDocument { join: String, path: PathBuf },
    #[error("Join `{join}` failed to read {}: {source}", path.display())]
    Io { join: String, path: PathBuf, source: std::io::Error },
    #[error("Join `{join}` failed to parse {}: {source}", path.display())]
    Parse { join: String, path: PathBuf, source: serde_json::Error },
}

/// Builds the async rule for one join entry.
pub fn join_rule(
    spec: &JoinSpec,
) -> impl Fn(&Value, &Record) -> JoinFuture + Send + Sync + 'static {
    let spec = Arc::new(spec.clone());
    move |input: &Value, _: &Record| -> JoinFuture {
        let spec = Arc::clone(&spec);
        let key_value = input.get(&spec.key).cloned();
        Box::pin(async move {
            let related = resolve(&spec, key_value).await?;
            Ok::<_, JoinError>(Record::from_iter([(spec.name.clone(), related)]))
        })
    }
}

pub type JoinFuture =
    std::pin::Pin<Box<dyn Future<Output = Result<Record, JoinError>> + Send + 'static>>;

async fn resolve(spec: &JoinSpec, key_value: Option<Value>) -> Result<Value, JoinError> {
    let stem = match key_value {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => {
            return match spec.missing {
                MissingPolicy::Null => Ok(Value::Null),
                MissingPolicy::Error => Err(JoinError::MissingKey {
                    join: spec.name.clone(),
                    key: spec.key.clone(),
                }),
            };
        }
    };

    if !is_plain_name(&stem) {
        return Err(JoinError::InvalidKey { join: spec.name.clone(), value: stem });
    }

    let path = spec.dir.join(format!("{stem}.json"));
    trace!(join = %spec.name, path = %path.display(), "Reading related document");

    match tokio::fs::read(&path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| JoinError::Parse {
            join: spec.name.clone(),
            path,
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(join = %spec.name, path = %path.display(), "Related document not found");
            match spec.missing {
                MissingPolicy::Null => Ok(Value::Null),
                MissingPolicy::Error => {
                    Err(JoinError::MissingDocument { join: spec.name.clone(), path })
                }
            }
        }
        Err(source) => Err(JoinError::Io { join: spec.name.clone(), path, source }),
    }
}

/// A single normal path component: no separators, no `.` or `..`.
fn is_plain_name(stem: &str) -> bool {
    let mut components = Path::new(stem).components();
    matches!(
        (components.next(), components.next()),
        (Some(std::path::Component::Normal(_)), None)
    ) && !stem.contains(['/', '\\'])
}
