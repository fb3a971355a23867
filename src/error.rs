//! Unified error type.

/// The error type returned by switchyard's fallible operations.
///
/// Application-level outcomes (404, redirects, a middleware refusing a
/// request) are expressed as [`Response`](crate::Response) values, not as
/// `Error`s. This type surfaces configuration mistakes caught while the
/// route table is being built, reverse-routing failures, route-cache I/O and
/// infrastructure failures such as binding to a port.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("route name `{0}` is already registered")]
    DuplicateRouteName(String),

    #[error("route `{0}` was registered with an empty method set")]
    EmptyMethodSet(String),

    #[error("invalid uri template `{uri}`: {reason}")]
    InvalidPattern { uri: String, reason: String },

    #[error("invalid constraint for parameter `{param}`: {source}")]
    InvalidConstraint {
        param: String,
        #[source]
        source: regex::Error,
    },

    #[error("status {0} is not a redirect status")]
    InvalidRedirectStatus(u16),

    #[error("no middleware registered under `{0}`")]
    UnknownMiddleware(String),

    #[error("cannot resolve controller action `{0}`")]
    UnresolvedAction(String),

    #[error("no route named `{0}`")]
    RouteNotFound(String),

    #[error("route `{route}` requires parameter `{param}`")]
    MissingParameter { route: String, param: String },

    #[error("value `{value}` for parameter `{param}` of route `{route}` violates its constraint")]
    ParameterMismatch {
        route: String,
        param: String,
        value: String,
    },

    #[error("route snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("config: {0}")]
    Config(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
