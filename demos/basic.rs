//! Minimal tether example: a custom chain with timing, a greeting endpoint
//! and the built-in error boundary, served over HTTP.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/hello
//!   curl -i http://localhost:3000/nope
//!   curl -i -X OPTIONS http://localhost:3000/hello -H 'origin: https://a.example'

use std::time::Instant;

use http::header::HeaderValue;
use http::{HeaderName, Method};
use tether::handlers::{Catch, Cors, HttpNext, NotFound};
use tether::middleware::{BoxFuture, Middleware, compose, shared};
use tether::{Error, HttpContext, Server, config::LogFormat, logging};

#[tokio::main]
async fn main() -> Result<(), Error> {
    logging::init(LogFormat::Pretty);

    let app = compose([
        shared(Catch),
        shared(ResponseTime),
        shared(Cors),
        shared(Hello),
        shared(NotFound),
    ]);

    let addr = "127.0.0.1:3000".parse().expect("valid socket address");
    Server::new(addr).serve(app).await
}

// Adds `x-response-time` once everything downstream has finished.
struct ResponseTime;

impl Middleware<HttpContext, (), Error> for ResponseTime {
    fn call<'a>(&'a self, ctx: &'a mut HttpContext, next: HttpNext<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let started = Instant::now();
            let outcome = next.run(ctx).await;
            let elapsed = format!("{}us", started.elapsed().as_micros());
            if let Ok(value) = HeaderValue::from_str(&elapsed) {
                ctx.res.set_header(HeaderName::from_static("x-response-time"), value);
            }
            outcome
        })
    }
}

// GET /hello
struct Hello;

impl Middleware<HttpContext, (), Error> for Hello {
    fn call<'a>(&'a self, ctx: &'a mut HttpContext, next: HttpNext<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            if ctx.req.method() != Method::GET || ctx.req.path() != "/hello" {
                return next.run(ctx).await;
            }
            ctx.res.send_text("hello from tether");
            Ok(())
        })
    }
}
