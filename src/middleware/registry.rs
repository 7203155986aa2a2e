//! Named handlers, for chains assembled from configuration.

use std::collections::HashMap;
use std::sync::Arc;

use super::error::ComposeError;
use super::handler::Middleware;
use super::pipeline::{Pipeline, compose};

/// A set of handlers addressable by name.
///
/// [`Registry::compose`] resolves a list of names into a [`Pipeline`], failing
/// before any request is served if a name is empty or unknown.
pub struct Registry<C, T, E> {
    entries: HashMap<String, Arc<dyn Middleware<C, T, E>>>,
}

impl<C, T, E> Registry<C, T, E> {
    pub fn new() -> Self {
        Self { entries: HashMap::new() }
    }

    /// Registers `handler` under `name`. Names are unique.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn Middleware<C, T, E>>,
    ) -> Result<&mut Self, ComposeError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ComposeError::EmptyName { position: self.entries.len() });
        }
        if self.entries.contains_key(&name) {
            return Err(ComposeError::DuplicateRegistration(name));
        }
        self.entries.insert(name, handler);
        Ok(self)
    }

    /// Builds a pipeline from `names`, in order. Surrounding whitespace in a
    /// name is ignored; a name may appear more than once.
    pub fn compose<S: AsRef<str>>(&self, names: &[S]) -> Result<Pipeline<C, T, E>, ComposeError> {
        let mut handlers = Vec::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            let name = name.as_ref().trim();
            if name.is_empty() {
                return Err(ComposeError::EmptyName { position });
            }
            let handler = self
                .entries
                .get(name)
                .ok_or_else(|| ComposeError::UnknownMiddleware(name.to_owned()))?;
            handlers.push(Arc::clone(handler));
        }
        Ok(compose(handlers))
    }
}

impl<C, T, E> Default for Registry<C, T, E> {
    fn default() -> Self {
        Self::new()
    }
}
