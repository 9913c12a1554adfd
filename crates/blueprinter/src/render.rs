use crate::blueprint::Blueprint;
use crate::error::{BlueprintErrorExt, Result};
use crate::mode::{Deferred, Immediate, Mode};
use crate::rule::{KeptSource, Record, merge_into};
use futures::future::try_join_all;
use fxhash::FxHashSet;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

impl<T, O, M> Blueprint<T, O, M>
where
    T: Serialize,
    M: Mode,
{
    /// Selects the kept fields, each group from its own source.
    ///
    /// A name is taken at most once per group; a later group overwrites an
    /// earlier one on the same name. Non-object sources contribute nothing.
    fn kept_record(&self, input: &T) -> Result<Record> {
        let mut view = Record::new();
        if self.kept.is_empty() {
            return Ok(view);
        }

        let own = if self.kept.iter().any(|group| matches!(group.source, KeptSource::Input)) {
            Some(serde_json::to_value(input).context("Failed to serialize input object")?)
        } else {
            None
        };

        for group in self.kept.iter() {
            let projected;
            let source = match &group.source {
                KeptSource::Input => own.as_ref(),
                KeptSource::Projected(project) => {
                    projected = project(input)?;
                    Some(&projected)
                }
            };
            let Some(Value::Object(fields)) = source else {
                continue;
            };

            let wanted: FxHashSet<&str> = group.names.iter().map(AsRef::as_ref).collect();
            for (name, value) in fields.iter().filter(|(name, _)| wanted.contains(name.as_str())) {
                view.insert(name.clone(), value.clone());
            }
        }

        Ok(view)
    }

    /// Evaluates the synchronous rules in declaration order; the first failure aborts.
    fn field_records(&self, input: &T, options: &O) -> Result<Vec<Record>> {
        self.rules.iter().map(|rule| rule(input, options)).collect()
    }
}

impl<T, O> Blueprint<T, O, Immediate>
where
    T: Serialize,
{
    /// Renders one object with the given options.
    ///
    /// The view is the kept fields, then every field rule's output in
    /// declaration order; a later source overwrites same-named fields.
    ///
    /// # Errors
    /// * [`BlueprintError::Rule`](crate::BlueprintError::Rule) if a fallible rule fails.
    /// * [`BlueprintError::Serialization`](crate::BlueprintError::Serialization) if the
    ///   input or a rule output cannot be serialized.
    /// * [`BlueprintError::NotARecord`](crate::BlueprintError::NotARecord) if a rule
    ///   output is not an object.
    pub fn render_with(&self, input: &T, options: &O) -> Result<Record> {
        trace!(kept_groups = self.kept.len(), rules = self.rules.len(), "Rendering view");

        let mut view = self.kept_record(input)?;
        for part in self.field_records(input, options)? {
            merge_into(&mut view, part);
        }
        Ok(view)
    }

    /// Renders every object in order with the same options.
    ///
    /// # Errors
    /// Fails on the first object whose render fails; see [`Blueprint::render_with`].
    pub fn render_array_with(&self, inputs: &[T], options: &O) -> Result<Vec<Record>> {
        debug!(count = inputs.len(), "Rendering view array");
        inputs.iter().map(|input| self.render_with(input, options)).collect()
    }
}

impl<T> Blueprint<T, (), Immediate>
where
    T: Serialize,
{
    /// Renders one object with a blueprint that takes no options.
    ///
    /// # Errors
    /// See [`Blueprint::render_with`].
    pub fn render(&self, input: &T) -> Result<Record> {
        self.render_with(input, &())
    }

    /// Renders every object of a blueprint that takes no options.
    ///
    /// # Errors
    /// See [`Blueprint::render_array_with`].
    pub fn render_array(&self, inputs: &[T]) -> Result<Vec<Record>> {
        self.render_array_with(inputs, &())
    }
}

impl<T, O> Blueprint<T, O, Deferred>
where
    T: Serialize + Sync,
    O: Sync,
{
    /// Renders one object with the given options.
    ///
    /// Kept fields are selected and the sync rules evaluated first. Then every
    /// async rule is started and all of them are awaited together. Results are
    /// merged as kept fields, sync outputs, then async outputs, each group in
    /// declaration order, regardless of which future finished first.
    ///
    /// # Errors
    /// The first failing rule fails the whole render; no partial view is returned.
    /// See [`Blueprint::render_with`] for the error kinds.
    pub async fn render_with(&self, input: &T, options: &O) -> Result<Record> {
        trace!(
            kept_groups = self.kept.len(),
            rules = self.rules.len(),
            async_rules = self.async_rules.len(),
            "Rendering view"
        );

        let mut view = self.kept_record(input)?;
        let field_parts = self.field_records(input, options)?;

        let pending = self.async_rules.iter().map(|rule| rule(input, options));
        let async_parts = try_join_all(pending).await?;

        for part in field_parts.into_iter().chain(async_parts) {
            merge_into(&mut view, part);
        }
        Ok(view)
    }

    /// Renders every object concurrently with the same options.
    ///
    /// Views come back in input order. Any failing render fails the whole call.
    ///
    /// # Errors
    /// See [`Blueprint::render_with`].
    pub async fn render_array_with(&self, inputs: &[T], options: &O) -> Result<Vec<Record>> {
        debug!(count = inputs.len(), "Rendering view array");
        try_join_all(inputs.iter().map(|input| self.render_with(input, options))).await
    }
}

impl<T> Blueprint<T, (), Deferred>
where
    T: Serialize + Sync,
{
    /// Renders one object with a blueprint that takes no options.
    ///
    /// # Errors
    /// See [`Blueprint::render_with`].
    pub async fn render(&self, input: &T) -> Result<Record> {
        self.render_with(input, &()).await
    }

    /// Renders every object of a blueprint that takes no options.
    ///
    /// # Errors
    /// See [`Blueprint::render_array_with`].
    pub async fn render_array(&self, inputs: &[T]) -> Result<Vec<Record>> {
        self.render_array_with(inputs, &()).await
    }
}

/// Decodes a rendered view into a typed value.
///
/// # Errors
/// Returns [`BlueprintError::Serialization`](crate::BlueprintError::Serialization)
/// if the record does not match `V`.
pub fn decode<V: DeserializeOwned>(view: Record) -> Result<V> {
    serde_json::from_value(Value::Object(view)).context("Failed to decode rendered view")
}
