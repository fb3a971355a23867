//! Route definitions and frozen routes.
//!
//! A [`RouteDef`] is what registration produces: methods, template, name,
//! action, middleware references and constraints, all still editable by the
//! [`RouteBuilder`](crate::RouteBuilder). [`RouterBuilder::build`] turns each
//! one into a [`Route`], which adds the compiled matcher and the assembled
//! middleware pipeline and is never modified again.
//!
//! [`RouterBuilder::build`]: crate::RouterBuilder::build

use std::collections::BTreeMap;

use crate::handler::Action;
use crate::method::MethodSet;
use crate::middleware::{MiddlewareRef, Pipeline};
use crate::pattern::{CompiledPattern, Constraint, Template};

/// A route as registered, before it is compiled.
#[derive(Clone, Debug)]
pub(crate) struct RouteDef {
    pub(crate) methods: MethodSet,
    pub(crate) uri: String,
    pub(crate) prefix: String,
    pub(crate) name: Option<String>,
    pub(crate) action: Action,
    pub(crate) middleware: Vec<MiddlewareRef>,
    pub(crate) constraints: BTreeMap<String, Constraint>,
    pub(crate) version: Option<String>,
    pub(crate) template: Template,
}

impl RouteDef {
    /// Closures and inline middleware cannot be written to a snapshot.
    pub(crate) fn is_cacheable(&self) -> bool {
        !self.action.is_closure() && self.middleware.iter().all(|m| m.name().is_some())
    }
}

/// One routable endpoint, frozen.
pub struct Route {
    def: RouteDef,
    matcher: CompiledPattern,
    pipeline: Pipeline,
}

impl Route {
    pub(crate) fn new(def: RouteDef, matcher: CompiledPattern, pipeline: Pipeline) -> Self {
        Self { def, matcher, pipeline }
    }

    pub fn methods(&self) -> &MethodSet { &self.def.methods }
    pub fn uri(&self) -> &str { &self.def.uri }
    pub fn prefix(&self) -> &str { &self.def.prefix }
    pub fn name(&self) -> Option<&str> { self.def.name.as_deref() }
    pub fn action(&self) -> &Action { &self.def.action }
    pub fn middleware(&self) -> &[MiddlewareRef] { &self.def.middleware }
    pub fn constraints(&self) -> &BTreeMap<String, Constraint> { &self.def.constraints }
    pub fn version(&self) -> Option<&str> { self.def.version.as_deref() }
    pub fn matcher(&self) -> &CompiledPattern { &self.matcher }

    pub fn is_cacheable(&self) -> bool {
        self.def.is_cacheable()
    }

    pub(crate) fn def(&self) -> &RouteDef { &self.def }
    pub(crate) fn pipeline(&self) -> &Pipeline { &self.pipeline }

    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            methods: self.def.methods.clone(),
            uri: self.def.uri.clone(),
            name: self.def.name.clone(),
            action: self.def.action.to_string(),
            middleware: self.def.middleware.iter().map(ToString::to_string).collect(),
        }
    }
}

/// What `route:list`-style tooling needs to know about a route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteSummary {
    pub methods: MethodSet,
    pub uri: String,
    pub name: Option<String>,
    pub action: String,
    pub middleware: Vec<String>,
}

/// Attached to every dispatched request; see [`Request::route`](crate::Request::route).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchedRoute {
    pub name: Option<String>,
    pub uri: String,
}
