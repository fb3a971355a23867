//! Controller actions and their resolution.
//!
//! A route may name its handler instead of holding it: `PhotoController@show`.
//! Named actions are what make a route table cacheable, and they are turned
//! into real handlers exactly once, in [`RouterBuilder::build`], through a
//! [`ResolveAction`] the application supplies. Nothing is looked up per
//! request.
//!
//! [`RouterBuilder::build`]: crate::RouterBuilder::build

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::handler::{BoxedHandler, Handler};

/// A `(controller, action)` pair, displayed as `Controller@action`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerAction {
    pub controller: String,
    pub action: String,
}

impl ControllerAction {
    pub fn new(controller: impl Into<String>, action: impl Into<String>) -> Self {
        Self { controller: controller.into(), action: action.into() }
    }
}

impl fmt::Display for ControllerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.controller, self.action)
    }
}

/// Turns a controller action into the handler that serves it.
///
/// Return `None` for actions you do not know; the build then fails with
/// [`Error::UnresolvedAction`](crate::Error::UnresolvedAction).
pub trait ResolveAction: Send + Sync {
    fn resolve(&self, action: &ControllerAction) -> Option<BoxedHandler>;
}

/// A plain registry of controller actions.
///
/// ```rust
/// use switchyard::{Controllers, Request, Response};
///
/// async fn index(_: Request) -> Response { Response::text("all photos") }
/// async fn show(req: Request) -> Response {
///     let id: u64 = req.param_as("photo").unwrap_or_default();
///     Response::text(format!("photo {id}"))
/// }
///
/// let controllers = Controllers::new()
///     .register("PhotoController", "index", index)
///     .register("PhotoController", "show", show);
/// ```
#[derive(Default)]
pub struct Controllers {
    actions: HashMap<ControllerAction, BoxedHandler>,
}

impl Controllers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` as `controller@action`. Re-registering replaces.
    pub fn register(
        mut self,
        controller: impl Into<String>,
        action: impl Into<String>,
        handler: impl Handler,
    ) -> Self {
        self.actions
            .insert(ControllerAction::new(controller, action), handler.into_boxed_handler());
        self
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }
}

impl ResolveAction for Controllers {
    fn resolve(&self, action: &ControllerAction) -> Option<BoxedHandler> {
        self.actions.get(action).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};

    async fn index(_: Request) -> Response {
        Response::text("index")
    }

    #[test]
    fn resolves_only_registered_pairs() {
        let controllers = Controllers::new().register("PhotoController", "index", index);
        assert!(controllers.resolve(&ControllerAction::new("PhotoController", "index")).is_some());
        assert!(controllers.resolve(&ControllerAction::new("PhotoController", "show")).is_none());
        assert!(controllers.resolve(&ControllerAction::new("VideoController", "index")).is_none());
    }

    #[test]
    fn displays_as_controller_at_action() {
        assert_eq!(ControllerAction::new("PhotoController", "show").to_string(), "PhotoController@show");
    }
}
