//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured tracing, CORS, authentication, rate
//! limiting, API-version detection.
//!
//! # The onion
//!
//! A route's pipeline is global middleware, then the route's own middleware,
//! then its handler. With global `[A, B]` and route `[C, D]` a request goes
//! `A → B → C → D → handler` and the response comes back
//! `handler → D → C → B → A`.
//!
//! Each middleware receives the request and a [`Next`]. It may
//!
//! - call `next.run(req)` and return the result, optionally editing it,
//! - call `next.run(req)` with an edited request, or
//! - return its own response without calling `next` — a short-circuit. No
//!   later middleware runs and the handler is never invoked.
//!
//! `Next` is consumed by `run`, so a continuation is called at most once.
//!
//! ```rust
//! use switchyard::{Next, Request, Response, StatusCode};
//!
//! async fn require_token(req: Request, next: Next) -> Response {
//!     if req.header("authorization").is_none() {
//!         return Response::status(StatusCode::UNAUTHORIZED);
//!     }
//!     next.run(req).await
//! }
//! ```

mod cors;
mod trace;
mod version;

pub use cors::Cors;
pub use trace::Trace;
pub use version::{ApiVersion, SetApiVersion};

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::handler::{BoxFuture, BoxedHandler, Handler};
use crate::request::Request;
use crate::response::IntoResponse;

// ── Middleware trait ──────────────────────────────────────────────────────────

/// One layer of the onion.
///
/// Implemented automatically for any
/// `async fn(Request, Next) -> impl IntoResponse`; implement it by hand for
/// middleware that carries configuration.
pub trait Middleware: Send + Sync + 'static {
    fn handle(&self, req: Request, next: Next) -> BoxFuture;
}

impl<F, Fut, R> Middleware for F
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let fut = (self)(req, next);
        Box::pin(async move { fut.await.into_response() })
    }
}

// ── Next ──────────────────────────────────────────────────────────────────────

type Chain = Arc<[Arc<dyn Middleware>]>;

/// The rest of the pipeline, from the caller's point of view.
pub struct Next {
    chain: Chain,
    position: usize,
    handler: BoxedHandler,
}

impl Next {
    /// Runs the remaining middleware and the handler.
    pub fn run(self, req: Request) -> BoxFuture {
        let current = self.chain.get(self.position).cloned();
        match current {
            Some(middleware) => {
                let next = Next { position: self.position + 1, ..self };
                middleware.handle(req, next)
            }
            None => self.handler.call(req),
        }
    }
}

// ── MiddlewareRef ─────────────────────────────────────────────────────────────

/// A middleware as written at registration.
///
/// Named references are resolved against the builder's aliases when the
/// router is built, and are the only kind a route snapshot can store.
#[derive(Clone)]
pub enum MiddlewareRef {
    Named(String),
    Inline(Arc<dyn Middleware>),
}

impl MiddlewareRef {
    pub fn inline(middleware: impl Middleware) -> Self {
        Self::Inline(Arc::new(middleware))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Inline(_) => None,
        }
    }
}

impl From<&str> for MiddlewareRef {
    fn from(name: &str) -> Self { Self::Named(name.to_owned()) }
}

impl From<String> for MiddlewareRef {
    fn from(name: String) -> Self { Self::Named(name) }
}

impl fmt::Display for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Inline(_) => f.write_str("Closure"),
        }
    }
}

impl fmt::Debug for MiddlewareRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MiddlewareRef({self})")
    }
}

// ── Pipeline ──────────────────────────────────────────────────────────────────

/// Middleware plus a terminal handler, composed once and run per request.
#[derive(Clone)]
pub struct Pipeline {
    chain: Chain,
    handler: BoxedHandler,
}

impl Pipeline {
    pub(crate) fn new(chain: Vec<Arc<dyn Middleware>>, handler: BoxedHandler) -> Self {
        Self { chain: chain.into(), handler }
    }

    /// Global middleware wraps route middleware wraps `handler`.
    pub fn compose(
        global: &[Arc<dyn Middleware>],
        route: &[Arc<dyn Middleware>],
        handler: impl Handler,
    ) -> Self {
        let chain = global.iter().chain(route).cloned().collect::<Vec<_>>();
        Self::new(chain, handler.into_boxed_handler())
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Executes the pipeline once for `req`.
    pub fn run(&self, req: Request) -> BoxFuture {
        Next {
            chain: Arc::clone(&self.chain),
            position: 0,
            handler: Arc::clone(&self.handler),
        }
        .run(req)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::{Method, StatusCode};

    use super::*;
    use crate::response::Response;

    type Log = Arc<Mutex<Vec<String>>>;

    fn recording(log: &Log, label: &'static str) -> Arc<dyn Middleware> {
        let log = Arc::clone(log);
        Arc::new(move |req: Request, next: Next| {
            let log = Arc::clone(&log);
            async move {
                log.lock().unwrap().push(format!("{label} in"));
                let res = next.run(req).await;
                log.lock().unwrap().push(format!("{label} out"));
                res
            }
        })
    }

    #[tokio::test]
    async fn runs_in_onion_order() {
        let log: Log = Arc::default();
        let handler_log = Arc::clone(&log);
        let handler = move |_req: Request| {
            let log = Arc::clone(&handler_log);
            async move {
                log.lock().unwrap().push("handler".to_owned());
                Response::text("ok")
            }
        };

        let pipeline = Pipeline::compose(
            &[recording(&log, "A"), recording(&log, "B")],
            &[recording(&log, "C"), recording(&log, "D")],
            handler,
        );
        assert_eq!(pipeline.len(), 4);

        let res = pipeline.run(Request::new(Method::GET, "/")).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            ["A in", "B in", "C in", "D in", "handler", "D out", "C out", "B out", "A out"]
        );
    }

    #[tokio::test]
    async fn empty_chain_calls_the_handler_directly() {
        let pipeline = Pipeline::compose(&[], &[], |_req: Request| async { "direct" });
        assert!(pipeline.is_empty());
        let res = pipeline.run(Request::new(Method::GET, "/")).await;
        assert_eq!(res.body(), b"direct");
    }

    #[test]
    fn named_refs_display_their_alias() {
        assert_eq!(MiddlewareRef::from("auth").to_string(), "auth");
        let inline = MiddlewareRef::inline(|req: Request, next: Next| next.run(req));
        assert_eq!(inline.to_string(), "Closure");
        assert!(inline.name().is_none());
    }
}
