//! API version tagging for routes registered under `version(..)`.

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};
use crate::request::Request;

/// The version tag of the group a request was routed through.
///
/// Read it with `req.extensions().get::<ApiVersion>()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiVersion(pub String);

/// Inserts [`ApiVersion`] into the request extensions.
///
/// The router places it after the global middleware and before the route's
/// own middleware for every route registered inside
/// [`RouterBuilder::version`](crate::RouterBuilder::version).
#[derive(Clone, Debug)]
pub struct SetApiVersion(ApiVersion);

impl SetApiVersion {
    pub fn new(tag: &str) -> Self {
        Self(ApiVersion(tag.to_owned()))
    }
}

impl Middleware for SetApiVersion {
    fn handle(&self, mut req: Request, next: Next) -> BoxFuture {
        req.extensions_mut().insert(self.0.clone());
        next.run(req)
    }
}
