//! # tether
//!
//! Koa-style middleware for async Rust, and the small HTTP service built on
//! it: MIFARE Classic key recovery behind `POST /mfkey32`, `/mfkey32v2` and
//! `/mfkey64`.
//!
//! ## The contract
//!
//! A request is handled by one ordered chain of handlers sharing one mutable
//! context. Each handler decides whether the rest of the chain runs, and can
//! act again once it has finished:
//!
//! - **Short-circuit**: return without calling `next`
//! - **Delegate**: `next.run(ctx).await`, exactly once, then post-process
//! - **Fail**: return an error; it unwinds every pending handler
//!
//! Calling `next` twice, or returning before `next` completes, is an
//! authoring bug. tether detects both at runtime and fails the request with a
//! [`middleware::DispatchError`] rather than letting side effects run out of
//! order.
//!
//! What tether does not do: routing, payload parsing, retries. Handlers match
//! their own method and path; failures beyond propagation belong to the
//! caller.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tether::{Server, config::Config, handlers, recovery::ToolRecovery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), tether::Error> {
//!     let config = Config::from_env()?;
//!     let backend = Arc::new(ToolRecovery::new(&config.tools_dir));
//!     let pipeline = handlers::registry(backend)?.compose(&config.pipeline)?;
//!
//!     Server::new(config.addr).serve(pipeline).await
//! }
//! ```

mod context;
mod error;
mod request;
mod response;
mod server;

pub mod config;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod recovery;

pub use context::HttpContext;
pub use error::Error;
pub use request::Request;
pub use response::{IntoResponse, Response};
pub use server::Server;
