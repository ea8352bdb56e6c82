use crate::error::GatewayError;
use serde::{Deserialize, Serialize};
use url::Url;

/// A registered backend API.
///
/// The `target` is the reverse-proxy handle: the URL parsed from `path` at
/// registration time. It lives only in memory — the flat [`RouteRecord`] is
/// what gets persisted, and a route rehydrated from the cache rebuilds the
/// handle from the stored `path`.
#[derive(Debug, Clone)]
pub struct Route {
    pub label: String,
    pub domain: String,
    pub path: String,
    pub prefix: String,
    pub target: Url,
}

/// The flattened route attributes as stored in the key cache under
/// `route:<label>` and served by the management API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub label: String,
    pub domain: String,
    pub path: String,
    pub prefix: String,
}

impl Route {
    /// Build a route from its registration attributes.
    ///
    /// The prefix is always `"/" + label`. The target URL parses from
    /// `path`, defaulting the scheme to `http` when none is given.
    pub fn new(label: &str, domain: &str, path: &str) -> Result<Self, GatewayError> {
        if label.is_empty() {
            return Err(GatewayError::InvalidTarget("empty route label".into()));
        }
        let target = parse_target(path)?;
        Ok(Self {
            label: label.to_string(),
            domain: domain.to_string(),
            path: path.to_string(),
            prefix: format!("/{label}"),
            target,
        })
    }

    /// Rebuild a route (and its proxy handle) from a cached record.
    pub fn from_record(record: &RouteRecord) -> Result<Self, GatewayError> {
        Self::new(&record.label, &record.domain, &record.path)
    }

    pub fn record(&self) -> RouteRecord {
        RouteRecord {
            label: self.label.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
            prefix: self.prefix.clone(),
        }
    }
}

/// Parse an upstream base URL, defaulting the scheme to `http`.
pub fn parse_target(path: &str) -> Result<Url, GatewayError> {
    let candidate = if path.contains("://") {
        path.to_string()
    } else {
        format!("http://{path}")
    };
    let url = Url::parse(&candidate)
        .map_err(|e| GatewayError::InvalidTarget(format!("{path}: {e}")))?;
    if url.host_str().is_none() {
        return Err(GatewayError::InvalidTarget(format!("{path}: no host")));
    }
    Ok(url)
}
