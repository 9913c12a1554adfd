//! Type-level render modes.
//!
//! A blueprint starts out [`Immediate`] and becomes [`Deferred`] as soon as an
//! asynchronous rule enters its rule lists, either directly or through
//! [`include_blueprint`](crate::Blueprint::include_blueprint). The mode decides
//! whether `render` returns a value or a future.

use private::Sealed;

mod private {
    pub trait Sealed {}
}

/// Render mode of a [`Blueprint`](crate::Blueprint).
pub trait Mode: Sealed + Send + Sync + 'static {
    /// `true` when rendering must be awaited.
    const IS_ASYNC: bool;
}

/// No asynchronous rules: rendering returns the record directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Immediate;

/// At least one asynchronous rule: rendering returns a future.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Deferred;

impl Sealed for Immediate {}
impl Sealed for Deferred {}

impl Mode for Immediate {
    const IS_ASYNC: bool = false;
}

impl Mode for Deferred {
    const IS_ASYNC: bool = true;
}

/// Mode of two merged blueprints: deferred if either side is deferred.
pub trait Join<Other: Mode>: Mode {
    /// Resulting mode.
    type Output: Mode;
}

impl Join<Immediate> for Immediate {
    type Output = Immediate;
}

impl Join<Deferred> for Immediate {
    type Output = Deferred;
}

impl<M: Mode> Join<M> for Deferred {
    type Output = Deferred;
}
