//! # Blueprinter
//!
//! Declarative, immutable view descriptors. A [`Blueprint`] describes how to turn a
//! typed input object into a plain output [`Record`]: which fields to keep, which to
//! compute synchronously, which to compute asynchronously, and which other
//! blueprints to fold in.
//!
//! # Core Features
//!
//! - **Immutable Builder**: every builder call returns a new blueprint and leaves
//!   the receiver untouched, so partial blueprints can be shared and reused freely.
//! - **Typed Render Mode**: a blueprint is [`Immediate`] until an async rule is
//!   added, then [`Deferred`]. The mode is part of the type, so `render` returns
//!   the record directly or a future, and merging propagates the async flag.
//! - **Deterministic Merge**: kept fields first, then sync rule outputs, then async
//!   rule outputs, each in declaration order. Later sources overwrite same-named
//!   fields shallowly. Async completion order never affects the result.
//! - **Composition**: [`Blueprint::include_blueprint`] concatenates rule lists;
//!   [`Blueprint::lift`] re-targets a blueprint onto a wider input or options type.
//!
//! # Examples
//!
//! ```rust
//! use blueprinter::{blueprint, BlueprintError};
//! use serde::Serialize;
//! use serde_json::json;
//!
//! #[derive(Serialize)]
//! struct User { id: u32, name: String }
//!
//! # fn main() -> Result<(), BlueprintError> {
//! let user = User { id: 1, name: "ada".into() };
//!
//! let view = blueprint::<User, ()>()
//!     .keep_fields(["id"])
//!     .with_fields(|u: &User, _: &()| json!({ "upper": u.name.to_uppercase() }))
//!     .render(&user)?;
//!
//! assert_eq!(serde_json::Value::Object(view), json!({ "id": 1, "upper": "ADA" }));
//! # Ok(())
//! # }
//! ```
//!
//! Asynchronous fields turn the blueprint into a [`Deferred`] one:
//!
//! ```rust
//! use blueprinter::{blueprint, BlueprintError};
//! use serde::Serialize;
//! use serde_json::json;
//!
//! #[derive(Serialize)]
//! struct User { id: u32 }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), BlueprintError> {
//!     let ids = blueprint::<User, ()>().keep_fields(["id"]);
//!     let messages = blueprint::<User, ()>()
//!         .with_async_fields(|_: &User, _: &()| async { json!({ "messages": [] }) });
//!
//!     let view = ids.include_blueprint(&messages).render(&User { id: 1 }).await?;
//!     assert_eq!(serde_json::Value::Object(view), json!({ "id": 1, "messages": [] }));
//!     Ok(())
//! }
//! ```

mod blueprint;
mod error;
mod mode;
mod render;
mod rule;

pub use blueprint::Blueprint;
pub use error::{BlueprintError, BlueprintErrorExt, Result, RuleError};
pub use mode::{Deferred, Immediate, Join, Mode};
pub use render::decode;
pub use rule::Record;

/// Creates an empty [`Blueprint`] for input type `T` and options type `O`.
///
/// Use `()` for `O` when no rule needs options.
#[must_use]
pub fn blueprint<T, O>() -> Blueprint<T, O> {
    Blueprint::new()
}
