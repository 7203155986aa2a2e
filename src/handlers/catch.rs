use tracing::error;

use super::HttpNext;
use crate::context::HttpContext;
use crate::error::Error;
use crate::middleware::{BoxFuture, Middleware};

/// Error boundary. Put it first.
///
/// Awaits the rest of the chain; if it fails, logs the error and writes the
/// error's status and message into the response. Headers already set by
/// downstream handlers are kept.
pub struct Catch;

impl Middleware<HttpContext, (), Error> for Catch {
    fn call<'a>(&'a self, ctx: &'a mut HttpContext, next: HttpNext<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async move {
            let Err(err) = next.run(ctx).await else {
                return Ok(());
            };

            let status = err.status();
            error!(
                method = %ctx.req.method(),
                path = ctx.req.path(),
                status = status.as_u16(),
                kind = err.kind(),
                error = %err,
                "request failed"
            );
            ctx.res.set_status(status).send_text(err.to_string());
            Ok(())
        })
    }
}
