//! Handler trait, type erasure, and the route action variant.
//!
//! # How async handlers are stored
//!
//! A route table holds handlers of *different* types, so each one is hidden
//! behind a trait object (`dyn ErasedHandler`) and stored uniformly:
//!
//! ```text
//! async fn show(req: Request) -> Response { … }   ← user writes this
//!        ↓ builder.get("/photos/{photo}", show)
//! show.into_boxed_handler()                      ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(show))                      ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(req)  at request time             ← one vtable dispatch
//! ```
//!
//! # Actions
//!
//! What a route *does* is an [`Action`]: a closure, a controller action
//! resolved by name when the router is built, or a built-in redirect. Only
//! the last two can be written to a route snapshot.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use http::StatusCode;

use crate::controller::ControllerAction;
use crate::request::Request;
use crate::response::{IntoResponse, Response};

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future that resolves to a [`Response`].
///
/// `Send + 'static` let tokio move the future across threads.
pub type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// public `BoxedHandler` alias used by [`ResolveAction`](crate::ResolveAction).
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

/// A type-erased handler shared across concurrent requests.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid route handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or closure returning a future) with the signature:
///
/// ```text
/// async fn name(req: Request) -> impl IntoResponse
/// ```
///
/// The trait is **sealed**: only the blanket impl below can satisfy it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrappers ─────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` to the trait-object world.
struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}

/// The terminal handler of a redirect route.
pub(crate) struct RedirectHandler {
    pub(crate) to: String,
    pub(crate) status: StatusCode,
}

impl ErasedHandler for RedirectHandler {
    fn call(&self, _req: Request) -> BoxFuture {
        let res = Response::redirect(&self.to, self.status);
        Box::pin(async move { res })
    }
}

// ── Action ────────────────────────────────────────────────────────────────────

/// What a route runs once its middleware lets the request through.
#[derive(Clone)]
pub enum Action {
    /// A function or closure. Not cacheable.
    Closure(BoxedHandler),
    /// A `Controller@action` pair, resolved when the router is built.
    Controller(ControllerAction),
    /// Unconditional redirect.
    Redirect { to: String, status: StatusCode },
}

impl Action {
    pub fn controller(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self::Controller(ControllerAction::new(controller, action))
    }

    pub fn is_closure(&self) -> bool {
        matches!(self, Self::Closure(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure(_) => f.write_str("Closure"),
            Self::Controller(action) => write!(f, "{action}"),
            Self::Redirect { to, status } => write!(f, "Redirect({} -> {to})", status.as_u16()),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({self})")
    }
}

/// Anything that can be registered as a route action: handlers, controller
/// actions and prebuilt [`Action`]s.
pub trait IntoAction {
    fn into_action(self) -> Action;
}

impl<H: Handler> IntoAction for H {
    fn into_action(self) -> Action {
        Action::Closure(self.into_boxed_handler())
    }
}

impl IntoAction for Action {
    fn into_action(self) -> Action { self }
}

impl IntoAction for ControllerAction {
    fn into_action(self) -> Action { Action::Controller(self) }
}
