use std::borrow::Cow;
use std::sync::Arc;

use http::Method;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

use super::HttpNext;
use crate::context::HttpContext;
use crate::error::Error;
use crate::middleware::{BoxFuture, Middleware};
use crate::recovery::{Attack, KeyRecovery, format_key};

/// `POST /<attack>`: validates the sniffed words and recovers the key.
///
/// Any other method or path is passed down the chain untouched.
pub struct RecoverKey {
    attack: Attack,
    path: String,
    backend: Arc<dyn KeyRecovery>,
}

#[derive(Serialize)]
struct KeyBody {
    key: String,
}

impl RecoverKey {
    pub fn new(attack: Attack, backend: Arc<dyn KeyRecovery>) -> Self {
        Self { attack, path: format!("/{}", attack.name()), backend }
    }

    fn matches(&self, ctx: &HttpContext) -> bool {
        ctx.req.method() == Method::POST && ctx.req.path() == self.path
    }
}

impl Middleware<HttpContext, (), Error> for RecoverKey {
    fn call<'a>(&'a self, ctx: &'a mut HttpContext, next: HttpNext<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            if !self.matches(ctx) {
                return next.run(ctx).await;
            }

            let args = parse_words(&ctx.req.fields(), self.attack.fields())?;
            let key = self.backend.recover(self.attack, &args).await?;
            info!(attack = %self.attack, "key recovered");

            ctx.res.send_json(&KeyBody { key: format_key(key) })?;
            Ok(())
        })
    }
}

/// Reads each field as exactly eight hex digits, in order.
///
/// A JSON integer is read through its decimal digits, so `12345678` is the
/// word `0x12345678`.
fn parse_words(body: &Value, fields: &[&str]) -> Result<Vec<u32>, Error> {
    fields
        .iter()
        .map(|field| {
            body.get(field)
                .and_then(word_digits)
                .filter(|raw| raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_hexdigit()))
                .and_then(|raw| u32::from_str_radix(&raw, 16).ok())
                .ok_or_else(|| Error::bad_request(format!("invalid {field}")))
        })
        .collect()
}

fn word_digits(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(raw) => Some(Cow::Borrowed(raw)),
        Value::Number(n) if n.is_u64() => Some(Cow::Owned(n.to_string())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const FIELDS: &[&str] = &["uid", "nt", "nr", "ar", "at"];

    #[test]
    fn parses_words_in_field_order() {
        let body = json!({
            "at": "5cadf439", "ar": "6eea41e0", "nr": "a1e458ce", "nt": "82A4166C", "uid": "9c599b32",
        });
        let words = parse_words(&body, FIELDS).unwrap();
        assert_eq!(words, [0x9c599b32, 0x82a4166c, 0xa1e458ce, 0x6eea41e0, 0x5cadf439]);
    }

    #[test]
    fn integer_fields_read_as_hex_digits() {
        let body = json!({ "uid": 12345678, "nt": "82a4166c", "nr": 10000000, "ar": "6eea41e0", "at": 99999999 });
        let words = parse_words(&body, FIELDS).unwrap();
        assert_eq!(words, [0x12345678, 0x82a4166c, 0x10000000, 0x6eea41e0, 0x99999999]);
    }

    #[test]
    fn first_bad_field_is_reported() {
        let cases = [
            (json!({}), "invalid uid"),
            (json!(null), "invalid uid"),
            (json!({ "uid": "9c599b3" }), "invalid uid"),
            (json!({ "uid": "9c599b321" }), "invalid uid"),
            (json!({ "uid": 1234567 }), "invalid uid"),
            (json!({ "uid": -1234567 }), "invalid uid"),
            (json!({ "uid": "9c599b32", "nt": "+2a4166c" }), "invalid nt"),
            (json!({ "uid": "9c599b32", "nt": "82a4166c", "nr": "a1e458cg" }), "invalid nr"),
        ];
        for (body, message) in cases {
            let err = parse_words(&body, FIELDS).unwrap_err();
            assert_eq!(err.to_string(), message, "body: {body}");
            assert_eq!(err.status(), http::StatusCode::BAD_REQUEST);
        }
    }
}
