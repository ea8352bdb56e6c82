//! Per-request pipeline: form parse, authenticate, look up, rewrite, proxy.

use crate::forward::{status_response, ReverseProxy};
use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::response::Response;
use http::header::CONTENT_TYPE;
use http::request::Parts;
use http::StatusCode;
use portico_core::auth;
use portico_core::route::Route;
use portico_core::table::{extract_label, rewrite_path, RouteTable};
use portico_store::KeyStore;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shared data-plane state.
pub struct Gateway {
    table: Arc<RouteTable>,
    store: Arc<dyn KeyStore>,
    proxy: ReverseProxy,
}

impl Gateway {
    pub fn new(table: Arc<RouteTable>, store: Arc<dyn KeyStore>) -> Self {
        Self {
            table,
            store,
            proxy: ReverseProxy::new(),
        }
    }

    /// Resolve a request path to a route.
    ///
    /// The in-memory table is primary. On a miss, the key cache's
    /// `route:<label>` record rehydrates the table, rebuilding the proxy
    /// handle from the stored path. A cache outage here reads as a miss.
    pub async fn resolve(&self, path: &str) -> Option<Route> {
        if let Some(route) = self.table.lookup(path) {
            return Some(route);
        }

        let label = extract_label(path)?;
        match self.store.route_record(label).await {
            Ok(Some(record)) => match Route::from_record(&record) {
                Ok(route) => {
                    info!(label = %label, "route rehydrated from cache");
                    self.table.register(route.clone());
                    Some(route)
                }
                Err(e) => {
                    warn!(label = %label, error = %e, "cached route record is unusable");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(label = %label, error = %e, "route record lookup failed");
                None
            }
        }
    }
}

/// Build the data-plane router: every method and path funnels into the
/// dispatch pipeline.
pub fn router(gateway: Arc<Gateway>) -> axum::Router {
    axum::Router::new().fallback(dispatch).with_state(gateway)
}

async fn dispatch(State(gateway): State<Arc<Gateway>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    // Buffer the body so form fields can be read from it while it is still
    // forwarded upstream untouched.
    let body = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "failed to read request body");
            return status_response(StatusCode::BAD_REQUEST);
        }
    };

    let form = FormFields::parse(&parts, &body);
    let path = parts.uri.path().to_string();
    let method = parts.method.as_str().to_string();

    // Load the private key; a missing entry or an unreachable cache both
    // fail closed.
    let private_key = match gateway.store.private_key(&form.key).await {
        Ok(Some(private_key)) => private_key,
        Ok(None) => {
            debug!(path = %path, "no keypair for supplied public key");
            return status_response(StatusCode::UNAUTHORIZED);
        }
        Err(e) => {
            warn!(error = %e, "key cache unavailable, failing closed");
            return status_response(StatusCode::UNAUTHORIZED);
        }
    };

    if !auth::authenticate(&form.digest, &form.key, &private_key, &form.now, &path, &method) {
        debug!(path = %path, method = %method, "invalid message signature");
        return status_response(StatusCode::UNAUTHORIZED);
    }

    let Some(route) = gateway.resolve(&path).await else {
        return status_response(StatusCode::NOT_FOUND);
    };

    let forwarded_path = rewrite_path(&path);
    debug!(label = %route.label, path = %forwarded_path, "dispatching to upstream");
    gateway.proxy.forward(&route, &parts, body, &forwarded_path).await
}

/// The authentication fields of a request, taken from the query string and,
/// for urlencoded bodies, from the body (body values win).
#[derive(Debug, Default, PartialEq, Eq)]
struct FormFields {
    digest: String,
    key: String,
    now: String,
}

impl FormFields {
    fn parse(parts: &Parts, body: &[u8]) -> Self {
        let mut fields: HashMap<String, String> = HashMap::new();

        if let Some(query) = parts.uri.query() {
            for (k, v) in url::form_urlencoded::parse(query.as_bytes()) {
                fields.insert(k.into_owned(), v.into_owned());
            }
        }

        if is_urlencoded(parts) {
            for (k, v) in url::form_urlencoded::parse(body) {
                fields.insert(k.into_owned(), v.into_owned());
            }
        }

        Self {
            digest: fields.remove("digest").unwrap_or_default(),
            key: fields.remove("key").unwrap_or_default(),
            now: fields.remove("now").unwrap_or_default(),
        }
    }
}

fn is_urlencoded(parts: &Parts) -> bool {
    parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}
