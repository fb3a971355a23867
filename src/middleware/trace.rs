//! Per-request tracing span with method, path, status and latency.

use std::time::Instant;

use tracing::{Instrument, info, info_span};

use crate::handler::BoxFuture;
use crate::middleware::{Middleware, MiddlewareRef, Next};
use crate::request::Request;

/// Logs one `info` event per request once the response is known.
///
/// Register it first among the global middleware so its latency covers the
/// whole pipeline.
#[derive(Clone, Copy, Debug, Default)]
pub struct Trace;

impl Middleware for Trace {
    fn handle(&self, req: Request, next: Next) -> BoxFuture {
        let span = info_span!("request", method = %req.method(), path = %req.path());
        Box::pin(
            async move {
                let started = Instant::now();
                let res = next.run(req).await;
                info!(
                    status = res.status_code().as_u16(),
                    latency_us = started.elapsed().as_micros() as u64,
                    "request finished"
                );
                res
            }
            .instrument(span),
        )
    }
}

impl From<Trace> for MiddlewareRef {
    fn from(trace: Trace) -> Self {
        MiddlewareRef::inline(trace)
    }
}
