//! Unified error type.

use http::StatusCode;

use crate::config::ConfigError;
use crate::middleware::{ComposeError, DispatchError};
use crate::response::{IntoResponse, Response};

/// The error type of the HTTP pipeline and of tether's fallible operations.
///
/// [`Error::Http`] carries a status meant for the client (`400 invalid uid`,
/// `404 Not Found`). Every other variant is an infrastructure or programming
/// failure and maps to `500`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Compose(#[from] ComposeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http: {0}")]
    Hyper(#[from] hyper::Error),
}

impl Error {
    /// An error with a client-facing status and message.
    pub fn http(status: StatusCode, message: impl Into<String>) -> Self {
        Self::Http { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::http(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found() -> Self {
        Self::http(StatusCode::NOT_FOUND, "Not Found")
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Http { status, .. } => *status,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short, stable name of the variant, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Dispatch(_) => "dispatch",
            Self::Compose(_) => "compose",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Hyper(_) => "hyper",
        }
    }
}

/// `status` with the error message as a plain-text body.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let mut response = Response::text(self.to_string());
        response.set_status(self.status());
        response
    }
}
