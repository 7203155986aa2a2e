/// A pipeline could not be assembled.
///
/// Raised at composition time, never during a request.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum ComposeError {
    #[error("unknown middleware `{0}`")]
    UnknownMiddleware(String),

    #[error("middleware name must not be empty (position {position})")]
    EmptyName { position: usize },

    #[error("middleware `{0}` registered more than once")]
    DuplicateRegistration(String),
}

/// A handler broke the continuation protocol during an invocation.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum DispatchError {
    /// The handler at `index` called its `next` more than once.
    #[error("next() in middleware[{index}] called multiple times")]
    NextCalledTwice { index: usize },

    /// The handler at `index` settled while its `next` was still running.
    #[error("next() in middleware[{index}] should be awaited")]
    NotAwaited { index: usize },
}

impl DispatchError {
    /// Position of the offending handler in the effective chain.
    pub fn index(&self) -> usize {
        match self {
            Self::NextCalledTwice { index } | Self::NotAwaited { index } => *index,
        }
    }
}
