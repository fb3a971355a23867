//! Route cache: the serializable form of a route table.
//!
//! Only routes whose action and middleware are referred to by *name* can be
//! written out: closures and inline middleware have no representation
//! outside the running process. Those routes are listed in
//! [`RouteSnapshot::non_cacheable`] with their table position, and must be
//! registered again by the application after loading. A loaded builder holds
//! each such position open, so a route registered again with the same
//! methods and URI takes its old place and first-match order is unchanged.
//!
//! Loading goes back through [`RouterBuilder`], so a snapshot is validated
//! exactly like hand-written registration and still needs controllers and
//! middleware aliases before [`build`](RouterBuilder::build).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use http::{Method, StatusCode};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::controller::ControllerAction;
use crate::error::Error;
use crate::handler::Action;
use crate::method::MethodSet;
use crate::middleware::MiddlewareRef;
use crate::pattern::{Constraint, Template};
use crate::route::{Route, RouteDef};
use crate::router::{REDIRECTS, RouterBuilder};
use crate::table::RouteTable;

/// Bumped whenever the layout changes; older snapshots are rejected.
pub const SNAPSHOT_FORMAT: u32 = 2;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RouteSnapshot {
    pub format: u32,
    pub routes: Vec<CachedRoute>,
    #[serde(default)]
    pub fallback: Option<CachedRoute>,
    #[serde(default)]
    pub non_cacheable: Vec<UncachedRoute>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedRoute {
    pub methods: Vec<String>,
    pub uri: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub name: Option<String>,
    pub action: CachedAction,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub constraints: BTreeMap<String, Constraint>,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CachedAction {
    Controller { controller: String, action: String },
    Redirect { to: String, status: u16 },
}

/// A route left out of a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncachedRoute {
    pub methods: Vec<String>,
    pub uri: String,
    pub name: Option<String>,
    /// Index in the route table; `None` for the fallback.
    #[serde(default)]
    pub position: Option<usize>,
}

impl RouteSnapshot {
    pub(crate) fn capture(table: &RouteTable) -> Self {
        let mut routes = Vec::new();
        let mut non_cacheable = Vec::new();
        for (position, route) in table.routes().iter().enumerate() {
            match CachedRoute::from_def(route.def()) {
                Some(cached) => routes.push(cached),
                None => non_cacheable.push(UncachedRoute::of(route, Some(position))),
            }
        }

        let fallback = table.fallback().and_then(|route| {
            let cached = CachedRoute::from_def(route.def());
            if cached.is_none() {
                non_cacheable.push(UncachedRoute::of(route, None));
            }
            cached
        });

        if !non_cacheable.is_empty() {
            warn!(count = non_cacheable.len(), "routes left out of snapshot");
        }
        Self { format: SNAPSHOT_FORMAT, routes, fallback, non_cacheable }
    }

    pub fn is_complete(&self) -> bool {
        self.non_cacheable.is_empty()
    }

    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, Error> {
        let snapshot: Self = serde_json::from_str(json)?;
        if snapshot.format != SNAPSHOT_FORMAT {
            return Err(invalid(format!(
                "unsupported snapshot format {} (expected {SNAPSHOT_FORMAT})",
                snapshot.format
            )));
        }
        Ok(snapshot)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?)?;
        debug!(path = %path.display(), routes = self.routes.len(), "route snapshot saved");
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let snapshot = Self::from_json(&fs::read_to_string(path)?)?;
        debug!(path = %path.display(), routes = snapshot.routes.len(), "route snapshot loaded");
        Ok(snapshot)
    }
}

impl CachedRoute {
    fn from_def(def: &RouteDef) -> Option<Self> {
        if !def.is_cacheable() {
            return None;
        }
        let action = match &def.action {
            Action::Closure(_) => return None,
            Action::Controller(target) => CachedAction::Controller {
                controller: target.controller.clone(),
                action: target.action.clone(),
            },
            Action::Redirect { to, status } => CachedAction::Redirect {
                to: to.clone(),
                status: status.as_u16(),
            },
        };
        Some(Self {
            methods: def.methods.names(),
            uri: def.uri.clone(),
            prefix: def.prefix.clone(),
            name: def.name.clone(),
            action,
            middleware: def.middleware.iter().filter_map(|m| m.name().map(str::to_owned)).collect(),
            constraints: def.constraints.clone(),
            version: def.version.clone(),
        })
    }

    fn to_def(&self) -> Result<RouteDef, Error> {
        let methods = parse_methods(&self.methods, &self.uri)?;

        let action = match &self.action {
            CachedAction::Controller { controller, action } => {
                Action::Controller(ControllerAction::new(controller, action))
            }
            CachedAction::Redirect { to, status } => {
                let status = StatusCode::from_u16(*status)
                    .ok()
                    .filter(|status| REDIRECTS.contains(status))
                    .ok_or(Error::InvalidRedirectStatus(*status))?;
                Action::Redirect { to: to.clone(), status }
            }
        };

        for (param, constraint) in &self.constraints {
            constraint.validator(param)?;
        }

        Ok(RouteDef {
            methods,
            uri: self.uri.clone(),
            prefix: self.prefix.clone(),
            name: self.name.clone(),
            action,
            middleware: self.middleware.iter().map(|m| MiddlewareRef::from(m.as_str())).collect(),
            constraints: self.constraints.clone(),
            version: self.version.clone(),
            template: Template::parse(&self.uri)?,
        })
    }
}

impl UncachedRoute {
    fn of(route: &Route, position: Option<usize>) -> Self {
        Self {
            methods: route.methods().names(),
            uri: route.uri().to_owned(),
            name: route.name().map(str::to_owned),
            position,
        }
    }
}

fn parse_methods(names: &[String], uri: &str) -> Result<MethodSet, Error> {
    let methods = names
        .iter()
        .map(|name| {
            Method::from_bytes(name.as_bytes())
                .map_err(|_| invalid(format!("invalid method `{name}`")))
        })
        .collect::<Result<MethodSet, Error>>()?;
    if methods.is_empty() {
        return Err(Error::EmptyMethodSet(uri.to_owned()));
    }
    Ok(methods)
}

fn invalid(message: String) -> Error {
    Error::Snapshot(serde_json::Error::custom(message))
}

impl RouterBuilder {
    /// A builder pre-populated with the routes of `snapshot`, in their
    /// original order.
    ///
    /// Register controllers, middleware aliases and the snapshot's
    /// non-cacheable routes before building. Each non-cacheable route
    /// registered again with its old methods and URI goes back to its old
    /// position; other new routes come after every snapshot route.
    pub fn from_snapshot(snapshot: &RouteSnapshot) -> Result<Self, Error> {
        let holes: BTreeMap<usize, &UncachedRoute> = snapshot
            .non_cacheable
            .iter()
            .filter_map(|route| route.position.map(|position| (position, route)))
            .collect();
        let len = snapshot.routes.len() + holes.len();

        let mut builder = Self::new();
        let mut cached = snapshot.routes.iter();
        for position in 0..len {
            if let Some(hole) = holes.get(&position) {
                builder.hold(position, parse_methods(&hole.methods, &hole.uri)?, hole.uri.clone());
                continue;
            }
            let route = cached
                .next()
                .ok_or_else(|| invalid(format!("no route for position {position}")))?;
            builder.push_def(route.to_def()?, position)?;
        }
        builder.reserve(len);

        if let Some(fallback) = &snapshot.fallback {
            builder.set_fallback_def(fallback.to_def()?);
        }
        Ok(builder)
    }
}
