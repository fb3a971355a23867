//! The frozen router: dispatch, reverse routing, and introspection.
//!
//! Dispatch is a short state machine, finished by the first response:
//!
//! 1. look the request up in the [`RouteTable`] (first match in registration
//!    order);
//! 2. nothing matched and no fallback → empty `404`, no middleware runs;
//! 3. bind the captured parameters and the [`MatchedRoute`] to the request;
//! 4. run the route's pipeline — global middleware, route middleware,
//!    handler — exactly once and return whatever it yields.
//!
//! The lookup is synchronous and allocation-light; only the pipeline is
//! async. Panics in handlers or middleware are not caught here.

mod builder;
mod group;
mod resource;

pub use builder::{RouteBuilder, RouterBuilder};
pub(crate) use builder::REDIRECTS;
pub use group::Group;
pub use resource::ResourceOptions;

use http::StatusCode;
use tracing::debug;

use crate::error::Error;
use crate::handler::BoxFuture;
use crate::request::Request;
use crate::response::Response;
use crate::route::{MatchedRoute, Route, RouteSummary};
use crate::snapshot::RouteSnapshot;
use crate::table::{Lookup, RouteTable};

/// The application router.
///
/// Built once by [`RouterBuilder::build`] and read-only afterwards, so it can
/// be shared across any number of concurrent requests behind an `Arc`.
pub struct Router {
    table: RouteTable,
}

impl Router {
    pub(crate) fn new(table: RouteTable) -> Self {
        Self { table }
    }

    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    /// Routes one request and produces one response.
    pub fn dispatch(&self, mut req: Request) -> BoxFuture {
        match self.table.lookup(req.method(), req.path()) {
            Lookup::Matched(route, params) => {
                debug!(method = %req.method(), path = req.path(), route = route.uri(), name = route.name(), "matched");
                req.bind(params, matched(route));
                route.pipeline().run(req)
            }
            Lookup::Fallback(fallback) => {
                debug!(method = %req.method(), path = req.path(), "fallback");
                let params = fallback.matcher().captures(req.path()).unwrap_or_default();
                req.bind(params, matched(fallback));
                fallback.pipeline().run(req)
            }
            Lookup::NotFound => {
                debug!(method = %req.method(), path = req.path(), "no route");
                Box::pin(async { Response::status(StatusCode::NOT_FOUND) })
            }
        }
    }

    /// The path of the route named `name`, with `params` filled in.
    ///
    /// Parameters the route's uri does not use become the query string.
    pub fn url_for(&self, name: &str, params: &[(&str, &str)]) -> Result<String, Error> {
        let route = self
            .table
            .by_name(name)
            .ok_or_else(|| Error::RouteNotFound(name.to_owned()))?;
        route.matcher().build_url(name, params)
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.table.has_route(name)
    }

    /// Every route in registration order, then the fallback.
    pub fn list_routes(&self) -> Vec<RouteSummary> {
        self.table
            .routes()
            .iter()
            .chain(self.table.fallback())
            .map(Route::summary)
            .collect()
    }

    /// The cacheable part of the table; see [`RouteSnapshot`].
    pub fn snapshot(&self) -> RouteSnapshot {
        RouteSnapshot::capture(&self.table)
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }
}

fn matched(route: &Route) -> MatchedRoute {
    MatchedRoute {
        name: route.name().map(str::to_owned),
        uri: route.uri().to_owned(),
    }
}
