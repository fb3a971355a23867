//! URI templates, parameter constraints, and the compiled matcher.
//!
//! A template such as `/catalog/{category}/{page}` is split into literal
//! text and `{param}` placeholders once, at registration. When the router is
//! built every route's template and constraints are joined into a single
//! anchored regex with one named group per parameter, so a match either
//! rejects the whole path or yields every parameter at once. A constraint
//! failing on the second parameter rejects the route, not just that
//! parameter.
//!
//! Matching is an exact, case-sensitive comparison against the raw request
//! path. `/users` and `/users/` are different paths; nothing is normalised.
//! Captured values are percent-decoded before they reach the request.
//!
//! Constraints are checked on the same text on both sides of the router.
//! `where_in` lists literal values, so it is checked against the decoded
//! capture and `url_for` checks the value it is given before encoding it. An
//! explicit `where_regex` describes the path text itself: it is embedded in
//! the matcher and `url_for` checks the encoded value. The built-in classes
//! only admit characters that are never percent-encoded, so both views agree.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap, HashSet};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// What a placeholder accepts when no constraint is given: one path segment.
const ANY_SEGMENT: &str = "[^/]+";

const UUID: &str =
    "[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}";

/// Never matches. Used for `where_in` with no values.
const NOTHING: &str = "[^\\s\\S]";

// ── Constraint ────────────────────────────────────────────────────────────────

/// A restriction on the text one placeholder may capture.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Constraint {
    /// `[0-9]+`
    Number,
    /// `[a-zA-Z]+`
    Alpha,
    /// `[a-zA-Z0-9]+`
    AlphaNumeric,
    /// `[a-z0-9-]+`
    Slug,
    /// Canonical 8-4-4-4-12 hex with dashes.
    Uuid,
    /// One of the listed literals, compared exactly.
    In(Vec<String>),
    /// A regex, used verbatim. Anchoring is added internally.
    Regex(String),
}

impl Constraint {
    /// The unanchored regex fragment this constraint stands for.
    pub fn pattern(&self) -> Cow<'_, str> {
        match self {
            Self::Number       => Cow::Borrowed("[0-9]+"),
            Self::Alpha        => Cow::Borrowed("[a-zA-Z]+"),
            Self::AlphaNumeric => Cow::Borrowed("[a-zA-Z0-9]+"),
            Self::Slug         => Cow::Borrowed("[a-z0-9-]+"),
            Self::Uuid         => Cow::Borrowed(UUID),
            Self::In(values) if values.is_empty() => Cow::Borrowed(NOTHING),
            Self::In(values) => Cow::Owned(
                values.iter().map(|v| regex::escape(v)).collect::<Vec<_>>().join("|"),
            ),
            Self::Regex(re) => Cow::Borrowed(re),
        }
    }

    /// Compiles the fragment on its own, anchored at both ends.
    pub(crate) fn validator(&self, param: &str) -> Result<Regex, Error> {
        anchored(&self.pattern()).map_err(|source| Error::InvalidConstraint {
            param: param.to_owned(),
            source,
        })
    }

    /// Whether the constraint is checked against the decoded value rather
    /// than embedded in the matcher.
    fn checks_decoded(&self) -> bool {
        matches!(self, Self::In(_))
    }
}

fn anchored(fragment: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("^(?:{fragment})$"))
}

// ── Template ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param { name: String, optional: bool },
}

/// A parsed URI template.
#[derive(Clone, Debug)]
pub(crate) struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub(crate) fn parse(uri: &str) -> Result<Self, Error> {
        let invalid = |reason: &str| Error::InvalidPattern {
            uri: uri.to_owned(),
            reason: reason.to_owned(),
        };

        if !uri.starts_with('/') {
            return Err(invalid("must start with `/`"));
        }

        let mut segments = Vec::new();
        let mut seen = HashSet::new();
        let mut rest = uri;

        while let Some(open) = rest.find('{') {
            push_literal(&mut segments, &rest[..open]).map_err(|r| invalid(r))?;

            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| invalid("unterminated `{`"))?;
            let raw = &after[..close];
            let (name, optional) = match raw.strip_suffix('?') {
                Some(name) => (name, true),
                None => (raw, false),
            };
            if !is_identifier(name) {
                return Err(invalid("parameter names must be identifiers"));
            }
            if !seen.insert(name.to_owned()) {
                return Err(invalid("duplicate parameter name"));
            }
            segments.push(Segment::Param { name: name.to_owned(), optional });
            rest = &after[close + 1..];
        }
        push_literal(&mut segments, rest).map_err(|r| invalid(r))?;

        // An optional placeholder may only be followed by `/` and further
        // optional placeholders.
        if let Some(first) = segments.iter().position(|s| matches!(s, Segment::Param { optional: true, .. })) {
            let trailing_ok = segments[first..].iter().all(|s| match s {
                Segment::Param { optional, .. } => *optional,
                Segment::Literal(text) => text == "/",
            });
            if !trailing_ok {
                return Err(invalid("optional parameters must come last"));
            }
        }

        Ok(Self { segments })
    }

    /// Placeholder names in declaration order.
    pub(crate) fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, .. } => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Whether the literal at `index` ends in a `/` that belongs to the
    /// optional placeholder right after it.
    fn slash_is_optional(&self, index: usize) -> bool {
        let Some(Segment::Literal(text)) = self.segments.get(index) else {
            return false;
        };
        let next_optional = matches!(
            self.segments.get(index + 1),
            Some(Segment::Param { optional: true, .. })
        );
        // `/{page?}` must still match `/`: a leading root slash is kept.
        next_optional && text.ends_with('/') && !(index == 0 && text == "/")
    }

    /// Joins template and constraints into one anchored matcher.
    ///
    /// Constraints naming a parameter the template does not have are ignored.
    pub(crate) fn compile(
        &self,
        constraints: &BTreeMap<String, Constraint>,
    ) -> Result<CompiledPattern, Error> {
        let mut source = String::from("^");
        let mut validators = HashMap::new();

        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) if self.slash_is_optional(i) => {
                    source.push_str(&regex::escape(&text[..text.len() - 1]));
                }
                Segment::Literal(text) => source.push_str(&regex::escape(text)),
                Segment::Param { name, optional } => {
                    let fragment = match constraints.get(name) {
                        Some(constraint) => {
                            let decoded = constraint.checks_decoded();
                            let regex = constraint.validator(name)?;
                            validators.insert(name.clone(), Validator { regex, decoded });
                            if decoded { Cow::Borrowed(ANY_SEGMENT) } else { constraint.pattern() }
                        }
                        None => Cow::Borrowed(ANY_SEGMENT),
                    };
                    let group = format!("(?P<{name}>(?:{fragment}))");
                    if *optional {
                        let slash = if i > 0 && self.slash_is_optional(i - 1) { "/" } else { "" };
                        source.push_str(&format!("(?:{slash}{group})?"));
                    } else {
                        source.push_str(&group);
                    }
                }
            }
        }
        source.push('$');

        let regex = Regex::new(&source).map_err(|source| Error::InvalidConstraint {
            param: self.param_names().collect::<Vec<_>>().join(","),
            source,
        })?;

        Ok(CompiledPattern { template: self.clone(), regex, validators })
    }
}

fn push_literal(segments: &mut Vec<Segment>, text: &str) -> Result<(), &'static str> {
    if text.contains('}') {
        return Err("unmatched `}`");
    }
    if !text.is_empty() {
        segments.push(Segment::Literal(text.to_owned()));
    }
    Ok(())
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

// ── CompiledPattern ───────────────────────────────────────────────────────────

/// A route's matcher: built once, matched many times, never rebuilt.
#[derive(Clone, Debug)]
pub struct CompiledPattern {
    template: Template,
    regex: Regex,
    validators: HashMap<String, Validator>,
}

#[derive(Clone, Debug)]
struct Validator {
    regex: Regex,
    /// Tested against the percent-decoded value instead of the path text.
    decoded: bool,
}

impl CompiledPattern {
    /// The regex the template compiled to.
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    /// Matches `path`, returning parameters in declaration order.
    ///
    /// An optional parameter that is absent from the path is absent from the
    /// result. A decoded value failing its `where_in` list rejects the whole
    /// path.
    pub fn captures(&self, path: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(path)?;
        let mut params = Vec::new();
        for name in self.template.param_names() {
            let Some(raw) = caps.name(name).map(|m| m.as_str()) else { continue };
            let value = urlencoding::decode(raw)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| raw.to_owned());
            if let Some(check) = self.validators.get(name).filter(|v| v.decoded) {
                if !check.regex.is_match(&value) {
                    return None;
                }
            }
            params.push((name.to_owned(), value));
        }
        Some(params)
    }

    pub fn is_match(&self, path: &str) -> bool {
        self.captures(path).is_some()
    }

    /// Fills the placeholders with `params`.
    ///
    /// Each value is checked against its constraint in the same form the
    /// matcher sees it, then percent encoded, so a URL built here always
    /// dispatches back to this route. Parameters the template does not use
    /// become the query string, in the order given.
    pub(crate) fn build_url(&self, route: &str, params: &[(&str, &str)]) -> Result<String, Error> {
        let mut used = vec![false; params.len()];
        let mut url = String::new();
        let mut pending_slash = false;

        for (i, segment) in self.template.segments.iter().enumerate() {
            match segment {
                Segment::Literal(text) if self.template.slash_is_optional(i) => {
                    url.push_str(&text[..text.len() - 1]);
                    pending_slash = true;
                }
                Segment::Literal(text) => url.push_str(text),
                Segment::Param { name, optional } => {
                    let found = params.iter().position(|(k, _)| k == name);
                    match found {
                        Some(idx) => {
                            used[idx] = true;
                            let value = params[idx].1;
                            let encoded = urlencoding::encode(value);
                            let accepted = match self.validators.get(name) {
                                Some(check) if check.decoded => {
                                    !value.is_empty() && check.regex.is_match(value)
                                }
                                Some(check) => check.regex.is_match(&encoded),
                                None => !value.is_empty(),
                            };
                            if !accepted {
                                return Err(Error::ParameterMismatch {
                                    route: route.to_owned(),
                                    param: name.clone(),
                                    value: value.to_owned(),
                                });
                            }
                            if pending_slash {
                                url.push('/');
                            }
                            url.push_str(&encoded);
                        }
                        None if *optional => {}
                        None => {
                            return Err(Error::MissingParameter {
                                route: route.to_owned(),
                                param: name.clone(),
                            });
                        }
                    }
                    pending_slash = false;
                }
            }
        }

        let query: Vec<String> = params
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|((k, v), _)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(uri: &str, constraints: &[(&str, Constraint)]) -> CompiledPattern {
        let constraints = constraints
            .iter()
            .map(|(k, c)| ((*k).to_owned(), c.clone()))
            .collect();
        Template::parse(uri).unwrap().compile(&constraints).unwrap()
    }

    #[test]
    fn unconstrained_params_take_one_segment() {
        let p = compile("/demo/lookup/catalog/{category}/{page}", &[]);
        let caps = p.captures("/demo/lookup/catalog/books/2").unwrap();
        assert_eq!(caps, vec![
            ("category".to_string(), "books".to_string()),
            ("page".to_string(), "2".to_string()),
        ]);
        assert!(p.captures("/demo/lookup/catalog/books/2/extra").is_none());
        assert!(p.captures("/demo/lookup/catalog/books").is_none());
    }

    #[test]
    fn number_constraint() {
        let p = compile("/users/{id}", &[("id", Constraint::Number)]);
        assert!(p.is_match("/users/42"));
        assert!(!p.is_match("/users/abc"));
    }

    #[test]
    fn uuid_constraint() {
        let p = compile("/orders/{id}", &[("id", Constraint::Uuid)]);
        assert!(p.is_match("/orders/550e8400-e29b-41d4-a716-446655440000"));
        let short = "550e8400-e29b-41d4-a716-44665544000";
        assert_eq!(short.len(), 35);
        assert!(!p.is_match(&format!("/orders/{short}")));
        assert!(!p.is_match("/orders/550e8400e29b41d4a716446655440"));
    }

    #[test]
    fn slug_and_in_constraints() {
        let p = compile("/blog/{slug}", &[("slug", Constraint::Slug)]);
        assert!(p.is_match("/blog/hello-world-2"));
        assert!(!p.is_match("/blog/Hello_World"));

        let p = compile("/sort/{dir}", &[("dir", Constraint::In(vec!["asc".into(), "desc".into()]))]);
        assert!(p.is_match("/sort/asc"));
        assert!(!p.is_match("/sort/ascending"));

        let p = compile("/dot/{v}", &[("v", Constraint::In(vec!["a.b".into()]))]);
        assert!(p.is_match("/dot/a.b"));
        assert!(!p.is_match("/dot/axb"));

        let p = compile("/none/{v}", &[("v", Constraint::In(vec![]))]);
        assert!(!p.is_match("/none/x"));
    }

    #[test]
    fn explicit_regex_is_anchored_internally() {
        let p = compile("/code/{code}", &[("code", Constraint::Regex("[A-Z]{3}|[0-9]{2}".into()))]);
        assert!(p.is_match("/code/ABC"));
        assert!(p.is_match("/code/12"));
        assert!(!p.is_match("/code/ABCD"));
        assert!(!p.is_match("/code/ABC12"));
    }

    #[test]
    fn second_constraint_failure_rejects_the_route() {
        let p = compile(
            "/catalog/{category}/{page}",
            &[("category", Constraint::Slug), ("page", Constraint::Number)],
        );
        assert!(p.is_match("/catalog/books/3"));
        assert!(!p.is_match("/catalog/books/three"));
    }

    #[test]
    fn trailing_slash_and_case_are_significant() {
        let p = compile("/products", &[]);
        assert!(p.is_match("/products"));
        assert!(!p.is_match("/products/"));
        assert!(!p.is_match("/Products"));
    }

    #[test]
    fn optional_parameter_and_its_slash() {
        let p = compile("/posts/{page?}", &[("page", Constraint::Number)]);
        assert!(p.captures("/posts").unwrap().is_empty());
        assert_eq!(p.captures("/posts/3").unwrap(), vec![("page".to_string(), "3".to_string())]);
        assert!(!p.is_match("/posts/"));

        let root = compile("/{lang?}", &[]);
        assert!(root.is_match("/"));
        assert!(root.is_match("/en"));
    }

    #[test]
    fn params_inside_a_segment() {
        let p = compile("/files/{name}.{ext}", &[("ext", Constraint::Alpha)]);
        let caps = p.captures("/files/report.pdf").unwrap();
        assert_eq!(caps[1], ("ext".to_string(), "pdf".to_string()));
    }

    #[test]
    fn captured_values_are_percent_decoded() {
        let p = compile("/tags/{tag}", &[]);
        assert_eq!(p.captures("/tags/rust%20lang").unwrap()[0].1, "rust lang");
    }

    #[test]
    fn compilation_is_deterministic() {
        let a = compile("/a/{x}/{y}", &[("y", Constraint::Number), ("x", Constraint::Slug)]);
        let b = compile("/a/{x}/{y}", &[("x", Constraint::Slug), ("y", Constraint::Number)]);
        assert_eq!(a.as_str(), b.as_str());
    }

    #[test]
    fn malformed_templates_are_rejected() {
        for uri in ["/a/{id", "/a/{}", "/a/{1x}", "/a/{id}/{id}", "/a/}", "a/{id}", "/{a?}/b"] {
            assert!(
                matches!(Template::parse(uri), Err(Error::InvalidPattern { .. })),
                "{uri} should be rejected"
            );
        }
    }

    #[test]
    fn invalid_regex_is_a_constraint_error() {
        let err = Constraint::Regex("[unclosed".into()).validator("id").unwrap_err();
        assert!(matches!(err, Error::InvalidConstraint { ref param, .. } if param == "id"));
    }

    #[test]
    fn in_values_are_compared_after_decoding() {
        let p = compile("/city/{c}", &[("c", Constraint::In(vec!["new york".into(), "a/b".into()]))]);
        assert_eq!(p.captures("/city/new%20york").unwrap()[0].1, "new york");
        assert!(p.is_match("/city/a%2Fb"));
        assert!(!p.is_match("/city/boston"));

        let url = p.build_url("r", &[("c", "new york")]).unwrap();
        assert_eq!(url, "/city/new%20york");
        assert!(p.is_match(&url));
    }

    #[test]
    fn explicit_regex_is_checked_on_the_path_text() {
        let p = compile("/q/{term}", &[("term", Constraint::Regex("[a-z%0-9]+".into()))]);
        assert!(p.is_match("/q/caf%c3%a9"));
        assert!(matches!(
            p.build_url("r", &[("term", "two words")]),
            Err(Error::ParameterMismatch { .. })
        ));
        assert_eq!(p.build_url("r", &[("term", "plain")]).unwrap(), "/q/plain");
    }

    #[test]
    fn empty_values_cannot_fill_a_segment() {
        let p = compile("/tags/{tag}", &[]);
        assert!(matches!(p.build_url("r", &[("tag", "")]), Err(Error::ParameterMismatch { .. })));
    }

    #[test]
    fn build_url_fills_checks_and_appends_query() {
        let p = compile("/users/{id}/posts/{page?}", &[("id", Constraint::Number)]);
        assert_eq!(p.build_url("r", &[("id", "7")]).unwrap(), "/users/7/posts");
        assert_eq!(p.build_url("r", &[("id", "7"), ("page", "2")]).unwrap(), "/users/7/posts/2");
        assert_eq!(
            p.build_url("r", &[("id", "7"), ("sort", "new est")]).unwrap(),
            "/users/7/posts?sort=new%20est"
        );
        assert!(matches!(p.build_url("r", &[]), Err(Error::MissingParameter { .. })));
        assert!(matches!(
            p.build_url("r", &[("id", "x")]),
            Err(Error::ParameterMismatch { .. })
        ));
    }
}
