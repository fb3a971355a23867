//! CORS preflight handling.
//!
//! A preflight is an `OPTIONS` request carrying both `origin` and
//! `access-control-request-method`. It is answered here with `204` and the
//! allow headers; the route's handler never sees it. Every other request
//! passes through and gets `access-control-allow-origin` on the way out.
//!
//! The router only runs middleware for matched routes, so the routes that
//! should answer preflights must accept `OPTIONS` (`any`, `options`, or
//! `match_` with `OPTIONS` in the set).

use http::{Method, StatusCode};

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, MiddlewareRef, Next};
use crate::request::Request;
use crate::response::Response;

#[derive(Clone, Debug)]
pub struct Cors {
    allow_origin: String,
    allow_methods: String,
    allow_headers: String,
    max_age: Option<u32>,
}

impl Cors {
    /// Any origin, the common verbs, any request header.
    pub fn permissive() -> Self {
        Self {
            allow_origin: "*".to_owned(),
            allow_methods: "GET, HEAD, POST, PUT, PATCH, DELETE, OPTIONS".to_owned(),
            allow_headers: "*".to_owned(),
            max_age: None,
        }
    }

    pub fn allow_origin(mut self, origin: &str) -> Self {
        self.allow_origin = origin.to_owned();
        self
    }

    pub fn allow_methods(mut self, methods: &str) -> Self {
        self.allow_methods = methods.to_owned();
        self
    }

    pub fn allow_headers(mut self, headers: &str) -> Self {
        self.allow_headers = headers.to_owned();
        self
    }

    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    fn is_preflight(req: &Request) -> bool {
        req.method() == Method::OPTIONS
            && req.header("origin").is_some()
            && req.header("access-control-request-method").is_some()
    }

    fn preflight(&self) -> Response {
        let mut builder = Response::builder()
            .status(StatusCode::NO_CONTENT)
            .header("access-control-allow-origin", &self.allow_origin)
            .header("access-control-allow-methods", &self.allow_methods)
            .header("access-control-allow-headers", &self.allow_headers);
        if let Some(max_age) = self.max_age {
            builder = builder.header("access-control-max-age", &max_age.to_string());
        }
        builder.no_body()
    }
}

impl Middleware for Cors {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        if Self::is_preflight(&req) {
            let res = self.preflight();
            return Box::pin(async move { res });
        }

        let origin = self.allow_origin.clone();
        Box::pin(async move {
            let mut res = next.run(req).await;
            res.set_header("access-control-allow-origin", &origin);
            res
        })
    }
}

impl From<Cors> for MiddlewareRef {
    fn from(cors: Cors) -> Self {
        MiddlewareRef::inline(cors)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::middleware::Pipeline;

    fn counting_pipeline(calls: &Arc<AtomicUsize>) -> Pipeline {
        let calls = Arc::clone(calls);
        let cors: Arc<dyn Middleware> = Arc::new(Cors::permissive().max_age(600));
        Pipeline::compose(&[cors], &[], move |_req: Request| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Response::text("payload") }
        })
    }

    #[tokio::test]
    async fn preflight_short_circuits_with_204() {
        let calls = Arc::new(AtomicUsize::new(0));
        let req = Request::new(Method::OPTIONS, "/api/users")
            .with_header("origin", "https://app.example")
            .with_header("access-control-request-method", "POST");

        let res = counting_pipeline(&calls).run(req).await;

        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
        assert_eq!(res.header("access-control-max-age"), Some("600"));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn plain_requests_pass_through_and_are_decorated() {
        let calls = Arc::new(AtomicUsize::new(0));
        let req = Request::new(Method::GET, "/api/users").with_header("origin", "https://app.example");

        let res = counting_pipeline(&calls).run(req).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.header("access-control-allow-origin"), Some("*"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
