//! Request-scoped state of the HTTP pipeline.

use crate::request::Request;
use crate::response::Response;

/// One per request, shared by every handler of that request's chain.
///
/// Handlers read `req` and build `res` in place; once the pipeline settles
/// the server writes `res` to the connection.
#[derive(Debug)]
pub struct HttpContext {
    pub req: Request,
    pub res: Response,
}

impl HttpContext {
    pub fn new(req: Request) -> Self {
        Self { req, res: Response::default() }
    }

    pub fn into_response(self) -> Response {
        self.res
    }
}
