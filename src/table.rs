//! The frozen route table.
//!
//! Routes are kept in registration order and matched first-match-wins: the
//! first route whose method set contains the request method and whose
//! matcher accepts the path is chosen, even if a later route would be a
//! "better" fit. Register `/products/active` before `/products/{id}` if the
//! literal must win.
//!
//! A per-method index of route positions (ascending, so still in
//! registration order) keeps a `POST` from being tested against every `GET`
//! route.

use std::collections::HashMap;

use http::Method;

use crate::error::Error;
use crate::route::Route;

/// Result of looking a request up.
pub(crate) enum Lookup<'a> {
    Matched(&'a Route, Vec<(String, String)>),
    Fallback(&'a Route),
    NotFound,
}

#[derive(Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    by_name: HashMap<String, usize>,
    by_method: HashMap<Method, Vec<usize>>,
    fallback: Option<Route>,
}

impl RouteTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, route: Route) -> Result<(), Error> {
        let index = self.routes.len();
        if let Some(name) = route.name() {
            if self.by_name.contains_key(name) {
                return Err(Error::DuplicateRouteName(name.to_owned()));
            }
            self.by_name.insert(name.to_owned(), index);
        }
        for method in route.methods().iter() {
            self.by_method.entry(method.clone()).or_default().push(index);
        }
        self.routes.push(route);
        Ok(())
    }

    /// Replaces any previous fallback.
    pub(crate) fn set_fallback(&mut self, route: Route) {
        self.fallback = Some(route);
    }

    /// First route, in registration order, accepting `method` and `path`.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, Vec<(String, String)>)> {
        self.by_method.get(method)?.iter().find_map(|&index| {
            let route = &self.routes[index];
            route.matcher().captures(path).map(|params| (route, params))
        })
    }

    pub(crate) fn lookup(&self, method: &Method, path: &str) -> Lookup<'_> {
        match (self.find(method, path), &self.fallback) {
            (Some((route, params)), _) => Lookup::Matched(route, params),
            (None, Some(fallback)) => Lookup::Fallback(fallback),
            (None, None) => Lookup::NotFound,
        }
    }

    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.by_name.get(name).map(|&index| &self.routes[index])
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Routes in registration order, fallback excluded.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn fallback(&self) -> Option<&Route> {
        self.fallback.as_ref()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
