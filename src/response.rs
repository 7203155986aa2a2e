//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! In a pipeline the response is built in place: every handler holds the same
//! [`HttpContext`](crate::HttpContext) and writes into `ctx.res`. Headers set
//! early (CORS, for instance) survive a later error being written over the
//! status and body.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;
use serde::Serialize;

use crate::error::Error;

const JSON: &str = "application/json; charset=utf-8";
const TEXT: &str = "text/plain; charset=utf-8";

/// An outgoing HTTP response.
///
/// ```rust
/// use http::StatusCode;
/// use tether::Response;
///
/// let mut res = Response::default();
/// res.set_status(StatusCode::CREATED);
/// res.send_text("created");
///
/// assert_eq!(res.status_code(), StatusCode::CREATED);
/// assert_eq!(res.body(), b"created");
/// ```
#[derive(Debug)]
pub struct Response {
    body: Bytes,
    headers: HeaderMap,
    status: StatusCode,
}

impl Response {
    /// `200 OK`, `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        let mut response = Self::default();
        response.send_text(body);
        response
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header value, if present and valid visible ASCII.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_status(&mut self, code: StatusCode) -> &mut Self {
        self.status = code;
        self
    }

    /// Sets `name`, replacing any previous values.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Replaces the body with plain text.
    pub fn send_text(&mut self, body: impl Into<String>) -> &mut Self {
        self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT));
        self.body = body.into().into();
        self
    }

    /// Replaces the body with `value` serialized as JSON.
    pub fn send_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<&mut Self, Error> {
        let body = serde_json::to_vec(value)?;
        self.headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON));
        self.body = body.into();
        Ok(self)
    }

    /// Empties the body, keeping status and headers.
    pub fn clear_body(&mut self) -> &mut Self {
        self.body = Bytes::new();
        self
    }

    /// Converts into the hyper response written to the connection.
    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

/// `200 OK` with no headers and an empty body; what `ctx.res` starts as.
impl Default for Response {
    fn default() -> Self {
        Self { body: Bytes::new(), headers: HeaderMap::new(), status: StatusCode::OK }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Used where a pipeline outcome has to become a response outside of any
/// handler, such as an error that escaped every handler.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn send_json_sets_content_type() {
        let mut res = Response::default();
        res.send_json(&json!({ "key": "FFFFFFFFFFFF" })).unwrap();
        assert_eq!(res.header(header::CONTENT_TYPE), Some(JSON));
        assert_eq!(res.body(), br#"{"key":"FFFFFFFFFFFF"}"#.as_slice());
        assert_eq!(res.status_code(), StatusCode::OK);
    }

    #[test]
    fn headers_survive_status_and_body_rewrites() {
        let mut res = Response::default();
        res.set_header(header::VARY, HeaderValue::from_static("Origin"));
        res.set_status(StatusCode::BAD_REQUEST).send_text("invalid uid");

        assert_eq!(res.header(header::VARY), Some("Origin"));
        assert_eq!(res.header(header::CONTENT_TYPE), Some(TEXT));
        assert_eq!(res.body(), b"invalid uid".as_slice());

        res.clear_body();
        assert!(res.body().is_empty());
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn into_inner_carries_everything() {
        let mut res = Response::default();
        res.send_json(&json!({})).unwrap().set_status(StatusCode::CREATED);
        let inner = res.into_inner();
        assert_eq!(inner.status(), StatusCode::CREATED);
        assert_eq!(inner.headers()[header::CONTENT_TYPE], JSON);
    }

    #[test]
    fn text_response_is_ok_plain_text() {
        let res = Response::text("Not Found");
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header(header::CONTENT_TYPE), Some(TEXT));
        assert_eq!(res.body(), b"Not Found".as_slice());
    }
}
