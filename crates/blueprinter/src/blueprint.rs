use crate::error::{BlueprintError, BlueprintErrorExt, RuleError};
use crate::mode::{Deferred, Immediate, Join, Mode};
use crate::rule::{
    AsyncFieldRule, FieldRule, KeptGroup, KeptProjection, KeptSource, into_record,
};
use futures::FutureExt;
use serde::Serialize;
use std::borrow::Cow;
use std::fmt;
use std::future::Future;
use std::iter;
use std::marker::PhantomData;
use std::sync::Arc;

/// An immutable, composable description of a view.
///
/// A blueprint holds three append-only rule lists:
/// * **kept fields**: input fields copied verbatim by name,
/// * **field rules**: synchronous `(input, options) -> partial record` functions,
/// * **async field rules**: the same, completed through a future.
///
/// Every builder method borrows `self` and returns a new blueprint; the receiver
/// stays valid and unchanged. Lists that a call does not extend are shared by
/// reference, so building long chains stays cheap.
///
/// ### Generic Parameters
/// * `T`: the input object type.
/// * `O`: the options value handed to every rule on each render. `()` when no
///   rule needs options.
/// * `M`: the render [`Mode`]. [`Immediate`] until an async rule is added, then
///   [`Deferred`], after which `render` returns a future.
pub struct Blueprint<T, O = (), M = Immediate> {
    pub(crate) kept: Arc<[KeptGroup<T>]>,
    pub(crate) rules: Arc<[FieldRule<T, O>]>,
    pub(crate) async_rules: Arc<[AsyncFieldRule<T, O>]>,
    mode: PhantomData<M>,
}

impl<T, O> Blueprint<T, O, Immediate> {
    /// Creates an empty blueprint: no kept fields and no rules.
    #[must_use]
    pub fn new() -> Self {
        Self::from_parts(Arc::new([]), Arc::new([]), Arc::new([]))
    }
}

impl<T, O> Default for Blueprint<T, O, Immediate> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, O, M> Blueprint<T, O, M> {
    fn from_parts(
        kept: Arc<[KeptGroup<T>]>,
        rules: Arc<[FieldRule<T, O>]>,
        async_rules: Arc<[AsyncFieldRule<T, O>]>,
    ) -> Self {
        Self { kept, rules, async_rules, mode: PhantomData }
    }

    /// Field names copied verbatim from the input, in declaration order.
    #[must_use]
    pub fn kept_fields(&self) -> Vec<&str> {
        self.kept.iter().flat_map(|group| group.names.iter().map(AsRef::as_ref)).collect()
    }

    /// Number of synchronous field rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Number of asynchronous field rules.
    #[must_use]
    pub fn async_rule_count(&self) -> usize {
        self.async_rules.len()
    }

    /// Whether rendering must be awaited. Derived from the async rule list.
    #[must_use]
    pub fn is_async(&self) -> bool {
        !self.async_rules.is_empty()
    }
}

impl<T, O, M> Blueprint<T, O, M>
where
    T: 'static,
    O: 'static,
    M: Mode,
{
    /// Keeps the named input fields in the output, unchanged.
    ///
    /// Names may repeat; a name missing from a rendered object is skipped.
    #[must_use = "Returns a new blueprint; the receiver is left unchanged"]
    pub fn keep_fields<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Cow<'static, str>>,
    {
        let names: Arc<[Cow<'static, str>]> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return self.clone();
        }
        let group = KeptGroup { names, source: KeptSource::Input };
        let kept = self.kept.iter().cloned().chain(iter::once(group)).collect();
        Self::from_parts(kept, Arc::clone(&self.rules), Arc::clone(&self.async_rules))
    }

    /// Adds fields computed synchronously from the input and the options.
    ///
    /// The getter output must serialize to an object (its fields are merged into
    /// the view) or to `null` (contributes nothing).
    #[must_use = "Returns a new blueprint; the receiver is left unchanged"]
    pub fn with_fields<F, R>(&self, getter: F) -> Self
    where
        F: Fn(&T, &O) -> R + Send + Sync + 'static,
        R: Serialize,
    {
        let rule: FieldRule<T, O> =
            Arc::new(move |obj: &T, options: &O| into_record(&getter(obj, options)));
        self.push_rule(rule)
    }

    /// Fallible variant of [`Blueprint::with_fields`].
    ///
    /// A getter error aborts the render and surfaces as
    /// [`BlueprintError::Rule`] with the original error as its source.
    #[must_use = "Returns a new blueprint; the receiver is left unchanged"]
    pub fn try_with_fields<F, R, E>(&self, getter: F) -> Self
    where
        F: Fn(&T, &O) -> Result<R, E> + Send + Sync + 'static,
        R: Serialize,
        E: Into<RuleError>,
    {
        let rule: FieldRule<T, O> = Arc::new(move |obj: &T, options: &O| {
            let output = getter(obj, options).map_err(BlueprintError::rule)?;
            into_record(&output)
        });
        self.push_rule(rule)
    }

    /// Adds fields computed asynchronously. The returned blueprint is [`Deferred`].
    ///
    /// The getter runs when the render starts; the future it returns must own
    /// whatever it needs from the input.
    #[must_use = "Returns a new blueprint; the receiver is left unchanged"]
    pub fn with_async_fields<F, Fut, R>(&self, getter: F) -> Blueprint<T, O, Deferred>
    where
        F: Fn(&T, &O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: Serialize + Send + 'static,
    {
        let rule: AsyncFieldRule<T, O> = Arc::new(move |obj: &T, options: &O| {
            let pending = getter(obj, options);
            async move { into_record(&pending.await) }.boxed()
        });
        self.push_async_rule(rule)
    }

    /// Fallible variant of [`Blueprint::with_async_fields`].
    #[must_use = "Returns a new blueprint; the receiver is left unchanged"]
    pub fn try_with_async_fields<F, Fut, R, E>(&self, getter: F) -> Blueprint<T, O, Deferred>
    where
        F: Fn(&T, &O) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, E>> + Send + 'static,
        R: Serialize + Send + 'static,
        E: Into<RuleError> + Send + 'static,
    {
        let rule: AsyncFieldRule<T, O> = Arc::new(move |obj: &T, options: &O| {
            let pending = getter(obj, options);
            async move {
                let output = pending.await.map_err(BlueprintError::rule)?;
                into_record(&output)
            }
            .boxed()
        });
        self.push_async_rule(rule)
    }

    /// Merges another blueprint into this one.
    ///
    /// Each rule list becomes `self` followed by `other`, so on output-field
    /// collisions the rules of `other` win over those of `self` (async results
    /// still land after all sync results). The result is [`Deferred`] if either
    /// side is.
    #[must_use = "Returns a new blueprint; the receiver is left unchanged"]
    pub fn include_blueprint<M2>(
        &self,
        other: &Blueprint<T, O, M2>,
    ) -> Blueprint<T, O, <M as Join<M2>>::Output>
    where
        M: Join<M2>,
        M2: Mode,
    {
        Blueprint::from_parts(
            concat(&self.kept, &other.kept),
            concat(&self.rules, &other.rules),
            concat(&self.async_rules, &other.async_rules),
        )
    }

    /// Re-targets this blueprint onto a wider input type and options type.
    ///
    /// `input` and `options` project the wider values onto the ones the rules
    /// were written for. Kept fields are selected from the projected input too,
    /// so the lifted blueprint renders the same view as the original one would
    /// on `input(obj)`.
    #[must_use = "Returns a new blueprint; the receiver is left unchanged"]
    pub fn lift<T2, O2, FI, FO>(&self, input: FI, options: FO) -> Blueprint<T2, O2, M>
    where
        T: Serialize,
        T2: 'static,
        O2: 'static,
        FI: Fn(&T2) -> &T + Send + Sync + 'static,
        FO: Fn(&O2) -> &O + Send + Sync + 'static,
    {
        let input = Arc::new(input);
        let options = Arc::new(options);

        let kept = self
            .kept
            .iter()
            .map(|group| {
                let input = Arc::clone(&input);
                let project: KeptProjection<T2> = match &group.source {
                    KeptSource::Input => Arc::new(move |obj: &T2| {
                        serde_json::to_value(input(obj)).context("Failed to serialize lifted input")
                    }),
                    KeptSource::Projected(inner) => {
                        let inner = Arc::clone(inner);
                        Arc::new(move |obj: &T2| inner(input(obj)))
                    }
                };
                KeptGroup { names: Arc::clone(&group.names), source: KeptSource::Projected(project) }
            })
            .collect();

        let rules = self
            .rules
            .iter()
            .map(|rule| {
                let (rule, input, options) =
                    (Arc::clone(rule), Arc::clone(&input), Arc::clone(&options));
                let lifted: FieldRule<T2, O2> =
                    Arc::new(move |obj: &T2, opts: &O2| rule(input(obj), options(opts)));
                lifted
            })
            .collect();

        let async_rules = self
            .async_rules
            .iter()
            .map(|rule| {
                let (rule, input, options) =
                    (Arc::clone(rule), Arc::clone(&input), Arc::clone(&options));
                let lifted: AsyncFieldRule<T2, O2> =
                    Arc::new(move |obj: &T2, opts: &O2| rule(input(obj), options(opts)));
                lifted
            })
            .collect();

        Blueprint::from_parts(kept, rules, async_rules)
    }

    fn push_rule(&self, rule: FieldRule<T, O>) -> Self {
        let rules = self.rules.iter().cloned().chain(iter::once(rule)).collect();
        Self::from_parts(Arc::clone(&self.kept), rules, Arc::clone(&self.async_rules))
    }

    fn push_async_rule(&self, rule: AsyncFieldRule<T, O>) -> Blueprint<T, O, Deferred> {
        let async_rules = self.async_rules.iter().cloned().chain(iter::once(rule)).collect();
        Blueprint::from_parts(Arc::clone(&self.kept), Arc::clone(&self.rules), async_rules)
    }
}

impl<T, O, M> Clone for Blueprint<T, O, M> {
    fn clone(&self) -> Self {
        Self::from_parts(
            Arc::clone(&self.kept),
            Arc::clone(&self.rules),
            Arc::clone(&self.async_rules),
        )
    }
}

impl<T, O, M: Mode> fmt::Debug for Blueprint<T, O, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blueprint")
            .field("kept", &self.kept_fields())
            .field("rules", &self.rules.len())
            .field("async_rules", &self.async_rules.len())
            .field("is_async", &M::IS_ASYNC)
            .finish()
    }
}

fn concat<X: Clone>(head: &Arc<[X]>, tail: &Arc<[X]>) -> Arc<[X]> {
    if tail.is_empty() {
        return Arc::clone(head);
    }
    if head.is_empty() {
        return Arc::clone(tail);
    }
    head.iter().chain(tail.iter()).cloned().collect()
}
