//! Middleware composition.
//!
//! A [`Pipeline`] is an ordered chain of handlers sharing one mutable context.
//! Each handler gets the context and a [`Next`] continuation:
//!
//! ```text
//!   h0 ── before ──▶ h1 ── before ──▶ h2
//!                                      │
//!   h0 ◀── after ─── h1 ◀── after ─────┘
//! ```
//!
//! Code before `next.run(ctx).await` runs on the way in, code after it runs
//! once the whole downstream chain has settled. Not calling `next` ends the
//! chain there.
//!
//! The engine rejects two authoring bugs at runtime instead of letting them
//! reorder side effects: calling `next` twice and returning before `next`
//! completes. Both surface as a [`DispatchError`] through the chain's own error
//! type, which is why every chain error type implements
//! `From<DispatchError>`.
//!
//! ```rust
//! use tether::middleware::{self, Next};
//!
//! type Trail = Vec<&'static str>;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let outer = middleware::from_fn(|ctx: &mut Trail, next: Next<'_, Trail, (), tether::Error>| {
//!     Box::pin(async move {
//!         ctx.push("outer in");
//!         next.run(ctx).await?;
//!         ctx.push("outer out");
//!         Ok(())
//!     })
//! });
//! let inner = middleware::from_fn(|ctx: &mut Trail, _next: Next<'_, Trail, (), tether::Error>| {
//!     Box::pin(async move {
//!         ctx.push("inner");
//!         Ok(())
//!     })
//! });
//!
//! let pipeline = middleware::compose([middleware::shared(outer), middleware::shared(inner)]);
//!
//! let mut trail = Trail::new();
//! pipeline.invoke(&mut trail, None).await.unwrap();
//! assert_eq!(trail, ["outer in", "inner", "outer out"]);
//! # }
//! ```

mod error;
mod handler;
mod pipeline;
mod registry;
mod slot;

pub use error::{ComposeError, DispatchError};
pub use handler::{BoxFuture, FnMiddleware, Middleware, from_fn, shared};
pub use pipeline::{Next, Pipeline, compose};
pub use registry::Registry;
pub use slot::SlotState;
