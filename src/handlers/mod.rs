//! The service's handler chain.
//!
//! | Name | Handler | |
//! |---|---|---|
//! | `catch` | [`Catch`] | turns any downstream error into a status + message |
//! | `cors` | [`Cors`] | CORS headers; answers preflight requests itself |
//! | `mfkey32`, `mfkey32v2`, `mfkey64` | [`RecoverKey`] | `POST /<name>` key recovery |
//! | `not_found` | [`NotFound`] | terminal `404` |
//!
//! [`registry`] registers all of them so the chain order can come from
//! configuration.

mod catch;
mod cors;
mod mfkey;
mod not_found;

use std::sync::Arc;

pub use catch::Catch;
pub use cors::Cors;
pub use mfkey::RecoverKey;
pub use not_found::NotFound;

use crate::context::HttpContext;
use crate::error::Error;
use crate::middleware::{ComposeError, Next, Pipeline, Registry, shared};
use crate::recovery::{Attack, KeyRecovery};

/// The continuation type of the HTTP chain.
pub type HttpNext<'a> = Next<'a, HttpContext, (), Error>;

/// A composed HTTP chain.
pub type HttpPipeline = Pipeline<HttpContext, (), Error>;

/// Every built-in handler, by name, with `backend` doing key recovery.
pub fn registry(backend: Arc<dyn KeyRecovery>) -> Result<Registry<HttpContext, (), Error>, ComposeError> {
    let mut registry = Registry::new();
    registry.register("catch", shared(Catch))?.register("cors", shared(Cors))?;
    for attack in Attack::ALL {
        registry.register(attack.name(), shared(RecoverKey::new(attack, Arc::clone(&backend))))?;
    }
    registry.register("not_found", shared(NotFound))?;
    Ok(registry)
}
