//! Compiles loaded definitions into blueprints and renders JSON documents.

use crate::definition::LoadedView;
use crate::join::join_rule;
use crate::transform::field_rule;
use blueprinter::{Blueprint, BlueprintError, Deferred, Immediate, Record};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// A compiled view. Definitions without joins stay synchronous.
#[derive(Debug, Clone)]
pub enum CompiledView {
    Immediate(Blueprint<Value, Record, Immediate>),
    Deferred(Blueprint<Value, Record, Deferred>),
}

/// What a compiled view consists of, as printed by `inspect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewSummary {
    pub name: String,
    pub keep: Vec<String>,
    pub rules: usize,
    pub async_rules: usize,
    pub is_async: bool,
}

impl CompiledView {
    /// Compiles a definition and, after its own rules, each include in order.
    pub fn compile(view: &LoadedView) -> Self {
        let def = &view.definition;
        let base = def
            .fields
            .iter()
            .fold(Blueprint::new().keep_fields(def.keep.clone()), |bp, spec| {
                bp.try_with_fields(field_rule(spec))
            });

        let own = match def.joins.split_first() {
            None => Self::Immediate(base),
            Some((first, rest)) => Self::Deferred(
                rest.iter().fold(base.try_with_async_fields(join_rule(first)), |bp, spec| {
                    bp.try_with_async_fields(join_rule(spec))
                }),
            ),
        };

        view.includes.iter().fold(own, |acc, included| acc.include(&Self::compile(included)))
    }

    fn include(&self, other: &Self) -> Self {
        match (self, other) {
            (Self::Immediate(a), Self::Immediate(b)) => Self::Immediate(a.include_blueprint(b)),
            (Self::Immediate(a), Self::Deferred(b)) => Self::Deferred(a.include_blueprint(b)),
            (Self::Deferred(a), Self::Immediate(b)) => Self::Deferred(a.include_blueprint(b)),
            (Self::Deferred(a), Self::Deferred(b)) => Self::Deferred(a.include_blueprint(b)),
        }
    }

    /// Renders an object, or each element of an array, with the same options.
    ///
    /// # Errors
    /// Any failing rule fails the whole render.
    pub async fn render(&self, input: &Value, options: &Record) -> Result<Value, BlueprintError> {
        let rendered = match (self, input) {
            (Self::Immediate(bp), Value::Array(items)) => {
                records(bp.render_array_with(items, options)?)
            }
            (Self::Immediate(bp), single) => Value::Object(bp.render_with(single, options)?),
            (Self::Deferred(bp), Value::Array(items)) => {
                records(bp.render_array_with(items, options).await?)
            }
            (Self::Deferred(bp), single) => Value::Object(bp.render_with(single, options).await?),
        };
        debug!(is_async = self.is_async(), "View rendered");
        Ok(rendered)
    }

    pub const fn is_async(&self) -> bool {
        matches!(self, Self::Deferred(_))
    }

    pub fn summary(&self, name: impl Into<String>) -> ViewSummary {
        let (keep, rules, async_rules) = match self {
            Self::Immediate(bp) => (bp.kept_fields(), bp.rule_count(), bp.async_rule_count()),
            Self::Deferred(bp) => (bp.kept_fields(), bp.rule_count(), bp.async_rule_count()),
        };
        ViewSummary {
            name: name.into(),
            keep: keep.into_iter().map(str::to_owned).collect(),
            rules,
            async_rules,
            is_async: self.is_async(),
        }
    }
}

fn records(views: Vec<Record>) -> Value {
    Value::Array(views.into_iter().map(Value::Object).collect())
}
