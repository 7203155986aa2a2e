//! The handler contract and closure adaptation.
//!
//! # How handlers are stored
//!
//! A pipeline holds handlers of *different* concrete types in one ordered
//! list, so every handler is stored behind a trait object:
//!
//! ```text
//! struct Cors; impl Middleware<..> for Cors     ← user writes this
//!        ↓ Arc::new(Cors)
//! Arc<dyn Middleware<C, T, E>>                   ← shared, immutable
//!        ↓ compose([...])
//! Pipeline { handlers: Arc<[...]> }              ← built once at startup
//!        ↓ pipeline.invoke(&mut ctx, None)
//! handler.call(ctx, next)                        ← one vtable call per position
//! ```
//!
//! Closures go through [`from_fn`], which wraps them in [`FnMiddleware`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::pipeline::Next;

/// A heap-allocated, type-erased future borrowing from `'a`.
///
/// Handlers borrow the context for the duration of their future, so unlike a
/// route handler this future is not `'static`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One unit of pipeline logic.
///
/// A handler receives the request-scoped context `C` and the continuation
/// `next`. It may:
///
/// - return without calling `next`, ending the chain early;
/// - call `next.run(ctx).await` exactly once, then post-process;
/// - fail with its own `E`, which unwinds the whole chain.
///
/// Calling `next` twice, or calling it and returning before the downstream
/// future completes, fails the invocation with a
/// [`DispatchError`](super::DispatchError).
///
/// ```rust
/// use tether::middleware::{BoxFuture, Middleware, Next};
///
/// struct Stamp;
///
/// impl Middleware<Vec<&'static str>, (), tether::Error> for Stamp {
///     fn call<'a>(
///         &'a self,
///         ctx: &'a mut Vec<&'static str>,
///         next: Next<'a, Vec<&'static str>, (), tether::Error>,
///     ) -> BoxFuture<'a, Result<(), tether::Error>> {
///         Box::pin(async move {
///             ctx.push("before");
///             next.run(ctx).await?;
///             ctx.push("after");
///             Ok(())
///         })
///     }
/// }
/// ```
pub trait Middleware<C, T, E>: Send + Sync {
    fn call<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C, T, E>) -> BoxFuture<'a, Result<T, E>>;
}

/// Newtype wrapper that turns a closure into a [`Middleware`].
pub struct FnMiddleware<F>(F);

/// Adapts a closure into a [`Middleware`].
///
/// The closure must return a boxed future so the borrow of the context can be
/// tied to the returned future:
///
/// ```rust
/// use tether::middleware;
///
/// let tag = middleware::from_fn::<_, (), tether::Error, _>(|ctx: &mut Vec<u8>, next| {
///     Box::pin(async move {
///         ctx.push(1);
///         next.run(ctx).await
///     })
/// });
/// let pipeline = middleware::compose([middleware::shared(tag)]);
/// # let _ = pipeline;
/// ```
pub fn from_fn<C, T, E, F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut C, Next<'a, C, T, E>) -> BoxFuture<'a, Result<T, E>> + Send + Sync,
{
    FnMiddleware(f)
}

impl<C, T, E, F> Middleware<C, T, E> for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut C, Next<'a, C, T, E>) -> BoxFuture<'a, Result<T, E>> + Send + Sync,
{
    fn call<'a>(&'a self, ctx: &'a mut C, next: Next<'a, C, T, E>) -> BoxFuture<'a, Result<T, E>> {
        (self.0)(ctx, next)
    }
}

/// Moves a handler behind the shared trait object a pipeline stores.
pub fn shared<C, T, E, M>(middleware: M) -> Arc<dyn Middleware<C, T, E>>
where
    M: Middleware<C, T, E> + 'static,
{
    Arc::new(middleware)
}
