//! Incoming HTTP request type.

use std::error::Error as StdError;

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Body;
use serde_json::{Map, Value};

use crate::error::Error;

const FORM: &str = "application/x-www-form-urlencoded";

/// An incoming HTTP request with its body fully read.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    body: Bytes,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), headers: HeaderMap::new(), body: Bytes::new() }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Reads the whole body of a hyper request, failing with `413` once more
    /// than `limit` bytes arrive.
    pub(crate) async fn from_hyper<B>(req: hyper::Request<B>, limit: usize) -> Result<Self, Error>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let (parts, body) = req.into_parts();
        let body = Limited::new(body, limit).collect().await.map_err(body_error)?.to_bytes();
        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_owned(),
            headers: parts.headers,
            body,
        })
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Header value, if present and valid visible ASCII.
    pub fn header(&self, name: impl http::header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The body as a JSON value, parsed according to `Content-Type`.
    ///
    /// Form bodies become an object of string fields; anything else is read
    /// as JSON. Field validation is the handler's job, so an unreadable body
    /// is `Value::Null`, like a body with every field missing.
    pub fn fields(&self) -> Value {
        if self.is_form() { self.form() } else { self.json() }
    }

    /// The body parsed as JSON, or `Value::Null` when it is empty or not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    /// The body decoded as `application/x-www-form-urlencoded`. A repeated
    /// key keeps its last value.
    pub fn form(&self) -> Value {
        match serde_urlencoded::from_bytes::<Vec<(String, String)>>(&self.body) {
            Ok(pairs) => {
                let fields: Map<String, Value> = pairs.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
                Value::Object(fields)
            }
            Err(_) => Value::Null,
        }
    }

    fn is_form(&self) -> bool {
        self.header(header::CONTENT_TYPE)
            .and_then(|value| value.split(';').next())
            .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM))
    }
}

fn body_error(err: Box<dyn StdError + Send + Sync>) -> Error {
    if err.is::<LengthLimitError>() {
        return Error::http(StatusCode::PAYLOAD_TOO_LARGE, "Payload Too Large");
    }
    match err.downcast::<hyper::Error>() {
        Ok(err) => Error::Hyper(*err),
        Err(err) => Error::bad_request(format!("unreadable body: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;
    use serde_json::json;

    fn hyper_post(body: &'static str) -> hyper::Request<Full<Bytes>> {
        hyper::Request::post("/mfkey64")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = Request::new(Method::GET, "/")
            .with_header(header::ORIGIN, HeaderValue::from_static("https://a.example"));
        assert_eq!(req.header("origin"), Some("https://a.example"));
        assert_eq!(req.header("Origin"), Some("https://a.example"));
        assert_eq!(req.header(header::AUTHORIZATION), None);
    }

    #[test]
    fn json_body_parses() {
        let req = Request::new(Method::POST, "/mfkey64").with_body(r#"{"uid":"01020304"}"#);
        assert_eq!(req.json(), json!({ "uid": "01020304" }));
    }

    #[test]
    fn unreadable_body_is_null() {
        assert!(Request::new(Method::POST, "/").json().is_null());
        assert!(Request::new(Method::POST, "/").with_body("uid=1").json().is_null());
    }

    #[test]
    fn form_body_decodes_into_string_fields() {
        let req = Request::new(Method::POST, "/mfkey64")
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"))
            .with_body("uid=9c599b32&nt=82a4166c&note=a+b%21&uid=01020304");
        assert_eq!(req.fields(), json!({ "uid": "01020304", "nt": "82a4166c", "note": "a b!" }));
    }

    #[test]
    fn content_type_picks_the_parser() {
        let json = Request::new(Method::POST, "/").with_body(r#"{"uid":"01020304"}"#);
        assert_eq!(json.fields(), json!({ "uid": "01020304" }));

        let form_without_header = Request::new(Method::POST, "/").with_body("uid=01020304");
        assert!(form_without_header.fields().is_null());
    }

    #[tokio::test]
    async fn body_up_to_the_limit_is_read() {
        let body = r#"{"uid":"01020304"}"#;
        let req = Request::from_hyper(hyper_post(body), body.len()).await.unwrap();
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/mfkey64");
        assert_eq!(req.body(), body.as_bytes());
    }

    #[tokio::test]
    async fn body_over_the_limit_is_payload_too_large() {
        let body = r#"{"uid":"01020304"}"#;
        let err = Request::from_hyper(hyper_post(body), body.len() - 1).await.unwrap_err();
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "Payload Too Large");
    }
}
