//! Group attributes and how nested groups combine.

use std::collections::BTreeMap;

use crate::error::Error;
use crate::middleware::MiddlewareRef;
use crate::pattern::Constraint;

/// Attributes shared by every route registered inside a
/// [`group`](crate::RouterBuilder::group) callback.
///
/// ```rust
/// use switchyard::Group;
///
/// let admin = Group::new()
///     .prefix("/admin")
///     .middleware("auth")
///     .name("admin.")
///     .where_number("id");
/// ```
#[derive(Clone, Debug, Default)]
pub struct Group {
    pub(crate) prefix: String,
    pub(crate) middleware: Vec<MiddlewareRef>,
    pub(crate) name: String,
    pub(crate) constraints: BTreeMap<String, Constraint>,
    pub(crate) version: Option<String>,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prefix(mut self, prefix: &str) -> Self {
        self.prefix = prefix.to_owned();
        self
    }

    pub fn middleware(mut self, middleware: impl Into<MiddlewareRef>) -> Self {
        self.middleware.push(middleware.into());
        self
    }

    /// Prepended to the name of every route in the group, e.g. `"admin."`.
    pub fn name(mut self, prefix: &str) -> Self {
        self.name = prefix.to_owned();
        self
    }

    pub fn where_number(self, param: &str) -> Self { self.with(param, Constraint::Number) }
    pub fn where_alpha(self, param: &str) -> Self { self.with(param, Constraint::Alpha) }
    pub fn where_alpha_numeric(self, param: &str) -> Self { self.with(param, Constraint::AlphaNumeric) }
    pub fn where_slug(self, param: &str) -> Self { self.with(param, Constraint::Slug) }
    pub fn where_uuid(self, param: &str) -> Self { self.with(param, Constraint::Uuid) }

    pub fn where_in<I, S>(self, param: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with(param, Constraint::In(values.into_iter().map(Into::into).collect()))
    }

    pub fn where_regex(self, param: &str, pattern: &str) -> Result<Self, Error> {
        let constraint = Constraint::Regex(pattern.to_owned());
        constraint.validator(param)?;
        Ok(self.with(param, constraint))
    }

    fn with(mut self, param: &str, constraint: Constraint) -> Self {
        self.constraints.insert(param.to_owned(), constraint);
        self
    }
}

/// The attributes in force for a route registered with `stack` open,
/// outermost group first.
pub(crate) struct Scope {
    pub(crate) prefix: String,
    pub(crate) middleware: Vec<MiddlewareRef>,
    pub(crate) name: String,
    pub(crate) constraints: BTreeMap<String, Constraint>,
    pub(crate) version: Option<String>,
}

impl Scope {
    pub(crate) fn of(stack: &[Group]) -> Self {
        let mut scope = Scope {
            prefix: String::new(),
            middleware: Vec::new(),
            name: String::new(),
            constraints: BTreeMap::new(),
            version: None,
        };
        for group in stack {
            if !group.prefix.is_empty() {
                scope.prefix = join(&scope.prefix, &group.prefix);
            }
            scope.middleware.extend(group.middleware.iter().cloned());
            scope.name.push_str(&group.name);
            scope
                .constraints
                .extend(group.constraints.iter().map(|(k, v)| (k.clone(), v.clone())));
            if group.version.is_some() {
                scope.version.clone_from(&group.version);
            }
        }
        scope
    }
}

/// Joins a prefix and a pattern with exactly one `/` between them.
///
/// A trailing slash on `uri` is kept; `"/"` under a prefix is the prefix.
pub(crate) fn join(prefix: &str, uri: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let uri = uri.trim_start_matches('/');
    match (prefix.is_empty(), uri.is_empty()) {
        (true, true) => "/".to_owned(),
        (true, false) => format!("/{uri}"),
        (false, true) => format!("/{prefix}"),
        (false, false) => format!("/{prefix}/{uri}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_uses_exactly_one_slash() {
        assert_eq!(join("", "/users"), "/users");
        assert_eq!(join("/admin", "/users"), "/admin/users");
        assert_eq!(join("admin/", "users"), "/admin/users");
        assert_eq!(join("/admin", "/"), "/admin");
        assert_eq!(join("", "/"), "/");
        assert_eq!(join("/admin", "/users/"), "/admin/users/");
    }

    #[test]
    fn nested_groups_concatenate_outer_to_inner() {
        let stack = [
            Group::new().prefix("/api").middleware("a").name("api.").where_number("id"),
            Group::new().prefix("/v2").middleware("b").name("v2.").where_slug("id"),
        ];
        let scope = Scope::of(&stack);
        assert_eq!(scope.prefix, "/api/v2");
        assert_eq!(scope.name, "api.v2.");
        let names: Vec<_> = scope.middleware.iter().map(ToString::to_string).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(scope.constraints["id"], Constraint::Slug);
    }
}
