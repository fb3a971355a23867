//! HTTP method sets.
//!
//! A route answers to a *set* of methods. `GET` routes also answer `HEAD`,
//! `any` routes answer the seven verbs browsers and API clients actually
//! send. The set keeps registration order so listings read `GET|HEAD`, not
//! whatever order a hash would pick.
//!
//! Methods are compared exactly — `http::Method` is already case-sensitive
//! per RFC 9110 §9.1, and extension methods (`PURGE`, WebDAV verbs) work
//! through [`match_`](crate::RouterBuilder::match_) like any other.

use std::fmt;

use http::Method;

/// The verbs registered by [`any`](crate::RouterBuilder::any) and by
/// redirect routes.
pub(crate) const ANY: [Method; 7] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

/// An ordered, duplicate-free set of HTTP methods.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MethodSet(Vec<Method>);

impl MethodSet {
    pub fn new(methods: impl IntoIterator<Item = Method>) -> Self {
        let mut set = Self::default();
        for method in methods {
            set.insert(method);
        }
        set
    }

    pub fn insert(&mut self, method: Method) {
        if !self.0.contains(&method) {
            self.0.push(method);
        }
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.0.contains(method)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Wire names in registration order, as stored in route snapshots.
    pub fn names(&self) -> Vec<String> {
        self.0.iter().map(|m| m.as_str().to_owned()).collect()
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, method) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("|")?;
            }
            f.write_str(method.as_str())?;
        }
        Ok(())
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        Self::new(iter)
    }
}
