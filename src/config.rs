//! Process configuration from the environment.
//!
//! - `SWITCHYARD_ADDR`: `host:port` to listen on (default `0.0.0.0:3000`)
//! - `SWITCHYARD_ROUTE_CACHE`: path of a route snapshot to load at startup
//!   and write after building (unset: no caching)
//!
//! Log filtering is left to `RUST_LOG` and whatever subscriber the
//! application installs.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use tracing::info;

use crate::error::Error;

pub const ADDR_VAR: &str = "SWITCHYARD_ADDR";
pub const ROUTE_CACHE_VAR: &str = "SWITCHYARD_ROUTE_CACHE";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
    pub route_cache: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            route_cache: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let raw_addr = non_empty(lookup(ADDR_VAR));
        let addr = match &raw_addr {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| Error::Config(format!("{ADDR_VAR}=`{raw}`: {e}")))?,
            None => Self::default().addr,
        };
        let route_cache = non_empty(lookup(ROUTE_CACHE_VAR)).map(PathBuf::from);

        info!(addr = %addr, route_cache = ?route_cache, "configuration loaded");
        Ok(Self { addr, route_cache })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn reads_both_variables() {
        let config = Config::from_lookup(lookup(&[
            (ADDR_VAR, "127.0.0.1:8080"),
            (ROUTE_CACHE_VAR, "/tmp/routes.json"),
        ]))
        .unwrap();
        assert_eq!(config.addr.port(), 8080);
        assert_eq!(config.route_cache, Some(PathBuf::from("/tmp/routes.json")));
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config = Config::from_lookup(lookup(&[(ADDR_VAR, "  "), (ROUTE_CACHE_VAR, "")])).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn bad_address_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[(ADDR_VAR, "localhost")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains(ADDR_VAR)));
    }
}
