//! Composition and dispatch.
//!
//! # Dispatch, step by step
//!
//! For an effective chain `h0 .. hn` (composed handlers plus the optional
//! trailing handler) one invocation allocates `n + 2` slot cells and runs
//! `dispatch(0)`:
//!
//! ```text
//! dispatch(i)
//!   slot i not NotStarted  → NextCalledTwice { index: i - 1 }
//!   i == len(chain)        → Settled, T::default()
//!   otherwise              → Running, chain[i](ctx, next(i + 1)).await
//!       slot i + 1 Running → NotAwaited { index: i }
//!       Ok / Err           → Settled / Failed, outcome returned as-is
//! ```
//!
//! `Next::run` dispatches synchronously: the downstream slot is `Running` as
//! soon as `run` returns, whether or not the future is ever polled. A handler
//! that drops that future, or settles while it is still pending, is caught by
//! the `NotAwaited` check.

use std::future;
use std::sync::Arc;

use super::error::DispatchError;
use super::handler::{BoxFuture, Middleware};
use super::slot::{SlotState, Slots};

/// A composed chain of handlers.
///
/// Built once at startup with [`compose`] and invoked once per request. The
/// pipeline itself holds no per-invocation state, so one value can serve any
/// number of concurrent invocations; cloning shares the handler list.
pub struct Pipeline<C, T, E> {
    handlers: Arc<[Arc<dyn Middleware<C, T, E>>]>,
}

/// Composes an ordered sequence of handlers into a [`Pipeline`].
///
/// Handler order is fixed here. Any handler may end the chain early by not
/// calling `next`.
pub fn compose<C, T, E, I>(handlers: I) -> Pipeline<C, T, E>
where
    I: IntoIterator<Item = Arc<dyn Middleware<C, T, E>>>,
{
    Pipeline { handlers: handlers.into_iter().collect() }
}

impl<C, T, E> Pipeline<C, T, E> {
    /// Number of composed handlers, not counting a trailing handler.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<C, T, E> Pipeline<C, T, E>
where
    C: Send,
    T: Default + Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    /// Runs the chain once against `ctx`.
    ///
    /// `trailing` is appended after the composed handlers for this call only.
    /// Reaching the end of the chain without any handler objecting yields
    /// `T::default()`.
    pub async fn invoke(
        &self,
        ctx: &mut C,
        trailing: Option<&dyn Middleware<C, T, E>>,
    ) -> Result<T, E> {
        let mut chain: Vec<&dyn Middleware<C, T, E>> = Vec::with_capacity(self.handlers.len() + 1);
        for handler in self.handlers.iter() {
            chain.push(handler.as_ref());
        }
        if let Some(trailing) = trailing {
            chain.push(trailing);
        }

        let invocation = Invocation { slots: Slots::new(chain.len() + 1), chain };
        invocation.dispatch(0, ctx).await
    }
}

impl<C, T, E> Clone for Pipeline<C, T, E> {
    fn clone(&self) -> Self {
        Self { handlers: Arc::clone(&self.handlers) }
    }
}

/// State of one `invoke` call. Lives on the invoking future and is dropped
/// with it.
struct Invocation<'a, C, T, E> {
    chain: Vec<&'a dyn Middleware<C, T, E>>,
    slots: Slots,
}

impl<'a, C, T, E> Invocation<'a, C, T, E>
where
    C: Send,
    T: Default + Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    fn dispatch<'b>(&'b self, index: usize, ctx: &'b mut C) -> BoxFuture<'b, Result<T, E>> {
        if self.slots.begin(index).is_err() {
            // Slot 0 is dispatched once by `invoke`; any other slot is only
            // reachable through the continuation of the handler before it.
            let caller = index.saturating_sub(1);
            self.slots.mark_reentered(caller);
            return Box::pin(future::ready(Err(
                DispatchError::NextCalledTwice { index: caller }.into(),
            )));
        }

        let Some(&handler) = self.chain.get(index) else {
            self.slots.finish(index, SlotState::Settled);
            return Box::pin(future::ready(Ok(T::default())));
        };

        let next = Next { invocation: self, index: index + 1 };
        Box::pin(async move {
            let outcome = handler.call(ctx, next).await;

            if self.slots.state(index + 1) == SlotState::Running {
                self.slots.finish(index, SlotState::Failed);
                return Err(DispatchError::NotAwaited { index }.into());
            }
            if self.slots.reentered(index) {
                self.slots.finish(index, SlotState::Failed);
                return Err(DispatchError::NextCalledTwice { index }.into());
            }

            match outcome {
                Ok(value) => {
                    self.slots.finish(index, SlotState::Settled);
                    Ok(value)
                }
                Err(err) => {
                    self.slots.finish(index, SlotState::Failed);
                    Err(err)
                }
            }
        })
    }
}

/// The continuation handed to a handler.
///
/// `run` hands the context to the rest of the chain and resolves once every
/// downstream handler has settled. Call it at most once and await it before
/// returning.
pub struct Next<'a, C, T, E> {
    invocation: &'a Invocation<'a, C, T, E>,
    index: usize,
}

impl<'a, C, T, E> Next<'a, C, T, E>
where
    C: Send,
    T: Default + Send + 'static,
    E: From<DispatchError> + Send + 'static,
{
    /// Dispatches the rest of the chain.
    ///
    /// The downstream position is marked running before this returns, so the
    /// future must be awaited to completion.
    #[must_use = "the rest of the chain is marked running; await the returned future"]
    pub fn run<'b>(&self, ctx: &'b mut C) -> BoxFuture<'b, Result<T, E>>
    where
        'a: 'b,
    {
        self.invocation.dispatch(self.index, ctx)
    }
}

impl<C, T, E> Next<'_, C, T, E> {
    /// Position `run` dispatches; equal to the chain length at the end.
    pub fn position(&self) -> usize {
        self.index
    }

    /// Whether `run` would only reach the end-of-chain sentinel.
    pub fn is_last(&self) -> bool {
        self.index == self.invocation.chain.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::{from_fn, shared};

    type Trail = Vec<String>;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Dispatch(DispatchError),
    }

    impl From<DispatchError> for TestError {
        fn from(e: DispatchError) -> Self {
            Self::Dispatch(e)
        }
    }

    fn mark(name: &'static str) -> Arc<dyn Middleware<Trail, (), TestError>> {
        shared(from_fn(move |ctx: &mut Trail, next: Next<'_, Trail, (), TestError>| {
            Box::pin(async move {
                ctx.push(format!("{name}:{}/{}", next.position(), next.is_last()));
                next.run(ctx).await
            })
        }))
    }

    #[tokio::test]
    async fn next_reports_position_including_trailing() {
        let pipeline = compose([mark("a"), mark("b")]);
        let tail = mark("t");

        let mut trail = Trail::new();
        pipeline.invoke(&mut trail, Some(tail.as_ref())).await.unwrap();
        assert_eq!(trail, ["a:1/false", "b:2/false", "t:3/true"]);
        assert_eq!(pipeline.len(), 2);
    }

    #[tokio::test]
    async fn clones_share_handlers() {
        let pipeline = compose([mark("a")]);
        let copy = pipeline.clone();

        let mut trail = Trail::new();
        copy.invoke(&mut trail, None).await.unwrap();
        assert_eq!(trail, ["a:1/true"]);
        assert!(!copy.is_empty());
    }
}
