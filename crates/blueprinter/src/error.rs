use std::borrow::Cow;

/// Boxed error returned by a fallible field rule.
pub type RuleError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A specialized [`Result`](std::result::Result) for rendering operations.
pub type Result<T, E = BlueprintError> = std::result::Result<T, E>;

/// Errors that can occur while rendering a [`Blueprint`](crate::Blueprint).
#[derive(Debug, thiserror::Error)]
pub enum BlueprintError {
    /// A synchronous or asynchronous field rule failed.
    /// The rule's own error is kept untouched as the source.
    #[error("Field rule failed{}: {source}", format_context(.context))]
    Rule { source: RuleError, context: Option<Cow<'static, str>> },

    /// The input object or a rule output could not be converted to a record.
    #[error("Serialization failure{}: {source}", format_context(.context))]
    Serialization { source: serde_json::Error, context: Option<Cow<'static, str>> },

    /// A rule produced something other than a record (an object or `null`).
    #[error("Rule output is not a record{}: {message}", format_context(.context))]
    NotARecord { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl BlueprintError {
    /// Wraps a rule failure without altering it.
    pub fn rule(source: impl Into<RuleError>) -> Self {
        Self::Rule { source: source.into(), context: None }
    }

    /// Returns the original rule error, if this is a rule failure.
    #[must_use]
    pub fn rule_source(&self) -> Option<&(dyn std::error::Error + Send + Sync + 'static)> {
        match self {
            Self::Rule { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Adds `.context()` to results that can be converted into [`BlueprintError`].
pub trait BlueprintErrorExt<T> {
    /// Attaches a human-readable context to the error, if any.
    ///
    /// # Errors
    /// Returns the original error converted into [`BlueprintError`] with the context set.
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T>;
}

impl<T> BlueprintErrorExt<T> for Result<T> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                BlueprintError::Rule { context: c, .. }
                | BlueprintError::Serialization { context: c, .. }
                | BlueprintError::NotARecord { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

impl<T> BlueprintErrorExt<T> for std::result::Result<T, serde_json::Error> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T> {
        self.map_err(|source| BlueprintError::Serialization {
            source,
            context: Some(context.into()),
        })
    }
}

impl From<serde_json::Error> for BlueprintError {
    #[inline]
    fn from(source: serde_json::Error) -> Self {
        Self::Serialization { source, context: None }
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
