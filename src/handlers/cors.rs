use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use tracing::debug;

use super::HttpNext;
use crate::context::HttpContext;
use crate::error::Error;
use crate::middleware::{BoxFuture, Middleware};

const ALLOW_HEADERS: &str = "Authorization,Content-Type";
const ALLOW_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";
const MAX_AGE: &str = "3600";

/// Reflecting CORS policy.
///
/// Every response allows the request's `Origin` (or `*` when it is absent or
/// empty) with
/// credentials. `OPTIONS` requests are preflights: answered here with `204`
/// and the rest of the chain never runs.
pub struct Cors;

impl Middleware<HttpContext, (), Error> for Cors {
    fn call<'a>(&'a self, ctx: &'a mut HttpContext, next: HttpNext<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let origin = ctx
                .req
                .headers()
                .get(header::ORIGIN)
                .filter(|origin| !origin.is_empty())
                .cloned()
                .unwrap_or(HeaderValue::from_static("*"));
            ctx.res
                .set_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin)
                .set_header(header::ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));

            if ctx.req.method() != Method::OPTIONS {
                return next.run(ctx).await;
            }

            debug!(path = ctx.req.path(), "answering CORS preflight");
            ctx.res
                .set_header(header::ACCESS_CONTROL_ALLOW_HEADERS, HeaderValue::from_static(ALLOW_HEADERS))
                .set_header(header::ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(ALLOW_METHODS))
                .set_header(header::ACCESS_CONTROL_MAX_AGE, HeaderValue::from_static(MAX_AGE))
                .set_header(header::VARY, HeaderValue::from_static("Origin"))
                .set_status(StatusCode::NO_CONTENT)
                .clear_body();
            Ok(())
        })
    }
}
