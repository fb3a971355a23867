//! # switchyard
//!
//! Request routing and middleware dispatch for HTTP services.
//!
//! An application declares its routes once at startup: method sets, URI
//! templates with typed placeholders, names, groups, middleware and
//! actions. [`RouterBuilder::build`] validates and compiles that
//! declaration into an immutable [`Router`], which then turns each incoming
//! [`Request`] into exactly one [`Response`]:
//!
//! - routes are tried **in registration order** and the first match wins;
//! - parameters are captured, constraint-checked and percent-decoded;
//! - the matched route's middleware pipeline runs global middleware first,
//!   then route middleware, then the action, and any layer may answer early;
//! - an unmatched request gets the fallback route or an empty `404`.
//!
//! Named routes support reverse routing ([`Router::url_for`]), and tables
//! built from controller actions and middleware aliases can be cached to
//! disk as a [`RouteSnapshot`].
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use switchyard::{Config, Group, Request, Response, RouterBuilder, Server, StatusCode};
//! use switchyard::middleware::Trace;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), switchyard::Error> {
//!     let mut routes = RouterBuilder::new();
//!     routes.global(Trace);
//!     routes.get("/users/{id}", show_user)?.name("users.show")?.where_number("id");
//!     routes.group(Group::new().prefix("/admin").name("admin."), |r| {
//!         r.post("/users", create_user)?.name("users.store")?;
//!         Ok(())
//!     })?;
//!     routes.permanent_redirect("/people/{id}", "/users")?;
//!
//!     let router = routes.build()?;
//!     assert_eq!(router.url_for("users.show", &[("id", "7")])?, "/users/7");
//!
//!     Server::from_config(&Config::from_env()?).serve(router).await
//! }
//!
//! async fn show_user(req: Request) -> Response {
//!     let id: u64 = req.param_as("id").unwrap_or_default();
//!     Response::json(format!(r#"{{"id":{id}}}"#).into_bytes())
//! }
//!
//! async fn create_user(req: Request) -> Response {
//!     if req.body().is_empty() {
//!         return Response::status(StatusCode::BAD_REQUEST);
//!     }
//!     Response::builder()
//!         .status(StatusCode::CREATED)
//!         .header("location", "/users/99")
//!         .no_body()
//! }
//! ```

mod config;
mod controller;
mod error;
mod handler;
mod method;
mod pattern;
mod request;
mod response;
mod route;
mod router;
mod server;
mod snapshot;
mod table;

pub mod middleware;

pub use config::{ADDR_VAR, Config, ROUTE_CACHE_VAR};
pub use controller::{ControllerAction, Controllers, ResolveAction};
pub use error::Error;
pub use handler::{Action, BoxFuture, BoxedHandler, Handler, IntoAction};
pub use http::{Method, StatusCode};
pub use method::MethodSet;
pub use middleware::{Middleware, MiddlewareRef, Next, Pipeline};
pub use pattern::{CompiledPattern, Constraint};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use route::{MatchedRoute, Route, RouteSummary};
pub use router::{Group, ResourceOptions, RouteBuilder, Router, RouterBuilder};
pub use server::Server;
pub use snapshot::{CachedAction, CachedRoute, RouteSnapshot, SNAPSHOT_FORMAT, UncachedRoute};
pub use table::RouteTable;
