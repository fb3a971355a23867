//! The registration surface.
//!
//! Everything that can be wrong with a route table is reported here, while
//! the application is still bootstrapping: a bad template or constraint and
//! an empty method set fail the registering call, a duplicate name fails
//! `.name(..)`, and unknown middleware aliases or controller actions fail
//! [`RouterBuilder::build`]. Building consumes the builder, so nothing can be
//! registered once requests are being served.
//!
//! A registering call that fails leaves the builder as it was: a route whose
//! `.name(..)` or constraint is rejected is removed again, and so are the
//! routes already added by a failing `resource` or `group`.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::{info, warn};

use crate::controller::ResolveAction;
use crate::error::Error;
use crate::handler::{Action, BoxedHandler, IntoAction, RedirectHandler};
use crate::method::{ANY, MethodSet};
use crate::middleware::{Middleware, MiddlewareRef, Pipeline, SetApiVersion};
use crate::pattern::{Constraint, Template};
use crate::route::{Route, RouteDef};
use crate::router::Router;
use crate::router::group::{Group, Scope, join};
use crate::table::RouteTable;

/// Redirect statuses a redirect route may use.
pub(crate) const REDIRECTS: [StatusCode; 5] = [
    StatusCode::MOVED_PERMANENTLY,
    StatusCode::FOUND,
    StatusCode::SEE_OTHER,
    StatusCode::TEMPORARY_REDIRECT,
    StatusCode::PERMANENT_REDIRECT,
];

/// Collects routes, groups and middleware during bootstrap.
///
/// ```rust
/// use switchyard::{Group, Request, Response, RouterBuilder};
///
/// async fn active(_: Request) -> Response { Response::text("active products") }
/// async fn show(req: Request) -> Response {
///     Response::text(format!("product {}", req.param("id").unwrap_or_default()))
/// }
///
/// # fn main() -> Result<(), switchyard::Error> {
/// let mut routes = RouterBuilder::new();
/// routes.get("/products/active", active)?;
/// routes.get("/products/{id}", show)?.name("products.show")?.where_number("id");
/// routes.group(Group::new().prefix("/admin").name("admin."), |r| {
///     r.get("/products/{id}", show)?.name("products.show")?;
///     Ok(())
/// })?;
/// let router = routes.build()?;
/// assert!(router.has_route("admin.products.show"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct RouterBuilder {
    defs: Vec<RouteDef>,
    /// Table position of each entry of `defs`.
    positions: Vec<usize>,
    /// Positions held for routes a snapshot could not carry.
    placeholders: Vec<Placeholder>,
    next_position: usize,
    /// Positions below this were laid out by a snapshot.
    reserved: usize,
    names: HashMap<String, usize>,
    fallback: Option<RouteDef>,
    groups: Vec<Group>,
    global: Vec<MiddlewareRef>,
    aliases: HashMap<String, Arc<dyn Middleware>>,
    middleware_groups: HashMap<String, Vec<MiddlewareRef>>,
    resolver: Option<Arc<dyn ResolveAction>>,
}

impl RouterBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Middleware and controllers ───────────────────────────────────────────

    /// Appends to the middleware that wraps every route and the fallback.
    pub fn global(&mut self, middleware: impl Into<MiddlewareRef>) -> &mut Self {
        self.global.push(middleware.into());
        self
    }

    /// Makes `middleware` available as `MiddlewareRef::Named(name)`.
    pub fn alias(&mut self, name: &str, middleware: impl Middleware) -> &mut Self {
        self.aliases.insert(name.to_owned(), Arc::new(middleware));
        self
    }

    /// A name standing for several middleware, applied in the given order.
    /// Named entries must be aliases.
    pub fn middleware_group<I, M>(&mut self, name: &str, members: I) -> &mut Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MiddlewareRef>,
    {
        self.middleware_groups
            .insert(name.to_owned(), members.into_iter().map(Into::into).collect());
        self
    }

    /// Where controller actions are resolved at build time.
    pub fn controllers(&mut self, resolver: impl ResolveAction + 'static) -> &mut Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    // ── Routes ───────────────────────────────────────────────────────────────

    /// `GET` and `HEAD`.
    pub fn get(&mut self, uri: &str, action: impl IntoAction) -> Result<RouteBuilder<'_>, Error> {
        self.match_([Method::GET, Method::HEAD], uri, action)
    }

    pub fn post(&mut self, uri: &str, action: impl IntoAction) -> Result<RouteBuilder<'_>, Error> {
        self.match_([Method::POST], uri, action)
    }

    pub fn put(&mut self, uri: &str, action: impl IntoAction) -> Result<RouteBuilder<'_>, Error> {
        self.match_([Method::PUT], uri, action)
    }

    pub fn patch(&mut self, uri: &str, action: impl IntoAction) -> Result<RouteBuilder<'_>, Error> {
        self.match_([Method::PATCH], uri, action)
    }

    pub fn delete(&mut self, uri: &str, action: impl IntoAction) -> Result<RouteBuilder<'_>, Error> {
        self.match_([Method::DELETE], uri, action)
    }

    pub fn options(&mut self, uri: &str, action: impl IntoAction) -> Result<RouteBuilder<'_>, Error> {
        self.match_([Method::OPTIONS], uri, action)
    }

    /// `GET`, `HEAD`, `POST`, `PUT`, `PATCH`, `DELETE` and `OPTIONS`.
    pub fn any(&mut self, uri: &str, action: impl IntoAction) -> Result<RouteBuilder<'_>, Error> {
        self.match_(ANY, uri, action)
    }

    /// Registers `action` for an explicit method set. An empty set is an error.
    pub fn match_(
        &mut self,
        methods: impl IntoIterator<Item = Method>,
        uri: &str,
        action: impl IntoAction,
    ) -> Result<RouteBuilder<'_>, Error> {
        let def = self.define(MethodSet::new(methods), uri, action.into_action())?;
        let position = self.claim(&def);
        let index = self.push(def, position);
        Ok(RouteBuilder { builder: self, index })
    }

    /// A route that answers every `any` method with an empty-bodied redirect.
    ///
    /// `status` must be 301, 302, 303, 307 or 308.
    pub fn redirect(
        &mut self,
        from: &str,
        to: &str,
        status: StatusCode,
    ) -> Result<RouteBuilder<'_>, Error> {
        if !REDIRECTS.contains(&status) {
            return Err(Error::InvalidRedirectStatus(status.as_u16()));
        }
        self.match_(ANY, from, Action::Redirect { to: to.to_owned(), status })
    }

    /// [`redirect`](Self::redirect) with `301 Moved Permanently`.
    pub fn permanent_redirect(&mut self, from: &str, to: &str) -> Result<RouteBuilder<'_>, Error> {
        self.redirect(from, to, StatusCode::MOVED_PERMANENTLY)
    }

    /// The handler run when no route matches. Registering again replaces it.
    ///
    /// The fallback is wrapped by the global middleware and by the middleware
    /// of the groups open when it is registered. Its `fallback` parameter
    /// holds the unmatched path without the leading `/`.
    pub fn fallback(&mut self, action: impl IntoAction) -> Result<(), Error> {
        let scope = Scope::of(&self.groups);
        let uri = "/{fallback}".to_owned();
        let template = Template::parse(&uri)?;
        self.fallback = Some(RouteDef {
            methods: MethodSet::new(ANY),
            uri,
            prefix: String::new(),
            name: None,
            action: action.into_action(),
            middleware: scope.middleware,
            constraints: BTreeMap::from([("fallback".to_owned(), Constraint::Regex(".*".to_owned()))]),
            version: scope.version,
            template,
        });
        Ok(())
    }

    // ── Groups ───────────────────────────────────────────────────────────────

    /// Registers the routes added by `routes` with `group`'s attributes.
    ///
    /// Groups nest. An empty callback registers nothing.
    pub fn group<F>(&mut self, group: Group, routes: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        let mark = self.mark();
        self.groups.push(group);
        let result = routes(self);
        self.groups.pop();
        if result.is_err() {
            self.rollback(mark);
        }
        result
    }

    /// A group prefixed `/{tag}` with name prefix `{tag}.` whose routes carry
    /// [`ApiVersion`](crate::middleware::ApiVersion) in their extensions.
    pub fn version<F>(&mut self, tag: &str, routes: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Self) -> Result<(), Error>,
    {
        let mut group = Group::new().prefix(&format!("/{tag}")).name(&format!("{tag}."));
        group.version = Some(tag.to_owned());
        self.group(group, routes)
    }

    // ── Internals ────────────────────────────────────────────────────────────

    fn define(&self, methods: MethodSet, uri: &str, action: Action) -> Result<RouteDef, Error> {
        let scope = Scope::of(&self.groups);
        let uri = join(&scope.prefix, uri);
        if methods.is_empty() {
            return Err(Error::EmptyMethodSet(uri));
        }
        let template = Template::parse(&uri)?;
        Ok(RouteDef {
            methods,
            uri,
            prefix: scope.prefix,
            name: None,
            action,
            middleware: scope.middleware,
            constraints: scope.constraints,
            version: scope.version,
            template,
        })
    }

    fn push(&mut self, def: RouteDef, position: usize) -> usize {
        self.defs.push(def);
        self.positions.push(position);
        self.defs.len() - 1
    }

    /// The table position for a new route: the slot a snapshot kept for the
    /// same methods and URI, or the next free one.
    fn claim(&mut self, def: &RouteDef) -> usize {
        let held = self
            .placeholders
            .iter()
            .position(|p| p.methods == def.methods && p.uri == def.uri);
        match held {
            Some(i) => self.placeholders.remove(i).position,
            None => {
                self.next_position += 1;
                self.next_position - 1
            }
        }
    }

    /// Number of routes registered so far; pass it to [`rollback`](Self::rollback).
    pub(crate) fn mark(&self) -> usize {
        self.defs.len()
    }

    /// Removes every route registered after `mark`, with its name and
    /// position.
    pub(crate) fn rollback(&mut self, mark: usize) {
        while self.defs.len() > mark {
            let (Some(def), Some(position)) = (self.defs.pop(), self.positions.pop()) else {
                break;
            };
            if let Some(name) = &def.name {
                self.names.remove(name);
            }
            if position >= self.reserved {
                self.next_position = position;
            } else {
                self.placeholders.push(Placeholder { position, methods: def.methods, uri: def.uri });
            }
        }
        self.placeholders.sort_by_key(|p| p.position);
    }

    /// Appends an already complete definition, as read from a snapshot.
    pub(crate) fn push_def(&mut self, def: RouteDef, position: usize) -> Result<(), Error> {
        let name = def.name.clone();
        let index = self.push(def, position);
        if let Some(name) = name {
            self.defs[index].name = None;
            self.assign_name(index, name)?;
        }
        Ok(())
    }

    /// Holds `position` for a route that must be registered again.
    pub(crate) fn hold(&mut self, position: usize, methods: MethodSet, uri: String) {
        self.placeholders.push(Placeholder { position, methods, uri });
    }

    /// Marks positions below `len` as laid out; new routes go after them.
    pub(crate) fn reserve(&mut self, len: usize) {
        self.next_position = len;
        self.reserved = len;
    }

    pub(crate) fn set_fallback_def(&mut self, def: RouteDef) {
        self.fallback = Some(def);
    }

    fn assign_name(&mut self, index: usize, name: String) -> Result<(), Error> {
        match self.names.get(&name) {
            Some(&owner) if owner == index => return Ok(()),
            Some(_) => return Err(Error::DuplicateRouteName(name)),
            None => {}
        }
        if let Some(previous) = self.defs[index].name.take() {
            self.names.remove(&previous);
        }
        self.names.insert(name.clone(), index);
        self.defs[index].name = Some(name);
        Ok(())
    }

    fn resolve_middleware(
        &self,
        middleware: &MiddlewareRef,
        chain: &mut Vec<Arc<dyn Middleware>>,
    ) -> Result<(), Error> {
        let name = match middleware {
            MiddlewareRef::Inline(inline) => {
                chain.push(Arc::clone(inline));
                return Ok(());
            }
            MiddlewareRef::Named(name) => name,
        };
        if let Some(alias) = self.aliases.get(name) {
            chain.push(Arc::clone(alias));
            return Ok(());
        }
        let members = self
            .middleware_groups
            .get(name)
            .ok_or_else(|| Error::UnknownMiddleware(name.clone()))?;
        for member in members {
            match member {
                MiddlewareRef::Inline(inline) => chain.push(Arc::clone(inline)),
                MiddlewareRef::Named(alias) => chain.push(Arc::clone(
                    self.aliases
                        .get(alias)
                        .ok_or_else(|| Error::UnknownMiddleware(alias.clone()))?,
                )),
            }
        }
        Ok(())
    }

    fn resolve_action(&self, action: &Action) -> Result<BoxedHandler, Error> {
        match action {
            Action::Closure(handler) => Ok(Arc::clone(handler)),
            Action::Controller(target) => self
                .resolver
                .as_ref()
                .and_then(|resolver| resolver.resolve(target))
                .ok_or_else(|| Error::UnresolvedAction(target.to_string())),
            Action::Redirect { to, status } => Ok(Arc::new(RedirectHandler {
                to: to.clone(),
                status: *status,
            })),
        }
    }

    fn compile(&self, def: RouteDef, global: &[Arc<dyn Middleware>]) -> Result<Route, Error> {
        let matcher = def.template.compile(&def.constraints)?;
        let handler = self.resolve_action(&def.action)?;

        let mut chain = global.to_vec();
        if let Some(tag) = &def.version {
            chain.push(Arc::new(SetApiVersion::new(tag)));
        }
        for middleware in &def.middleware {
            self.resolve_middleware(middleware, &mut chain)?;
        }

        Ok(Route::new(def, matcher, Pipeline::new(chain, handler)))
    }

    /// Resolves, compiles and freezes everything registered so far.
    pub fn build(mut self) -> Result<Router, Error> {
        let mut global = Vec::new();
        for middleware in &self.global {
            self.resolve_middleware(middleware, &mut global)?;
        }

        for missing in &self.placeholders {
            warn!(uri = %missing.uri, position = missing.position, "cached route was not registered again");
        }
        let mut ordered: Vec<_> = std::mem::take(&mut self.positions)
            .into_iter()
            .zip(std::mem::take(&mut self.defs))
            .collect();
        ordered.sort_by_key(|(position, _)| *position);

        let mut table = RouteTable::new();
        for (_, def) in ordered {
            table.push(self.compile(def, &global)?)?;
        }
        if let Some(def) = self.fallback.take() {
            table.set_fallback(self.compile(def, &global)?);
        }

        info!(routes = table.len(), fallback = table.fallback().is_some(), "router built");
        Ok(Router::new(table))
    }
}

struct Placeholder {
    position: usize,
    methods: MethodSet,
    uri: String,
}

/// Chained configuration of the route just registered.
///
/// The route is already in the table, in registration order; these calls
/// only refine it, or remove it again when they fail.
pub struct RouteBuilder<'a> {
    builder: &'a mut RouterBuilder,
    index: usize,
}

impl RouteBuilder<'_> {
    fn def(&mut self) -> &mut RouteDef {
        &mut self.builder.defs[self.index]
    }

    /// Names the route, after any group name prefix. Names are unique; a
    /// taken name removes the route again.
    pub fn name(mut self, name: &str) -> Result<Self, Error> {
        let full = format!("{}{name}", Scope::of(&self.builder.groups).name);
        if let Err(err) = self.builder.assign_name(self.index, full) {
            self.builder.rollback(self.index);
            return Err(err);
        }
        Ok(self)
    }

    /// Appends route middleware; it runs after global and group middleware.
    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.def().middleware.push(middleware.into());
        self
    }

    pub fn where_number(self, param: &str) -> Self { self.with(param, Constraint::Number) }
    pub fn where_alpha(self, param: &str) -> Self { self.with(param, Constraint::Alpha) }
    pub fn where_alpha_numeric(self, param: &str) -> Self { self.with(param, Constraint::AlphaNumeric) }
    pub fn where_slug(self, param: &str) -> Self { self.with(param, Constraint::Slug) }
    pub fn where_uuid(self, param: &str) -> Self { self.with(param, Constraint::Uuid) }

    /// Accepts exactly one of `values`.
    pub fn where_in<I, S>(self, param: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(param, Constraint::In(values.into_iter().map(Into::into).collect()))
    }

    /// Constrains `param` with a regex. Do not anchor it; that is done for you.
    pub fn where_regex(self, param: &str, pattern: &str) -> Result<Self, Error> {
        self.constrain(param, Constraint::Regex(pattern.to_owned()))
    }

    /// An invalid constraint removes the route again.
    pub fn constrain(mut self, param: &str, constraint: Constraint) -> Result<Self, Error> {
        if let Err(err) = constraint.validator(param) {
            self.builder.rollback(self.index);
            return Err(err);
        }
        Ok(self.with(param, constraint))
    }

    fn with(mut self, param: &str, constraint: Constraint) -> Self {
        self.def().constraints.insert(param.to_owned(), constraint);
        self
    }
}
