use super::HttpNext;
use crate::context::HttpContext;
use crate::error::Error;
use crate::middleware::{BoxFuture, Middleware};

/// End of the chain: nothing above handled the request.
pub struct NotFound;

impl Middleware<HttpContext, (), Error> for NotFound {
    fn call<'a>(&'a self, _ctx: &'a mut HttpContext, _next: HttpNext<'a>) -> BoxFuture<'a, Result<(), Error>> {
        Box::pin(async { Err(Error::not_found()) })
    }
}
