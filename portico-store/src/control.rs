//! Route registration control plane.
//!
//! A registration succeeds when the in-memory table upsert and the cache
//! write both complete. The route-change publication that follows is
//! best-effort: a missing or unresponsive store downgrades the gateway to
//! operating from its own table and cache, never to rejecting the
//! registration.

use crate::cache::KeyStore;
use crate::publisher::RoutePublisher;
use portico_core::error::GatewayError;
use portico_core::hosts::HostEntry;
use portico_core::route::{parse_target, Route};
use portico_core::table::RouteTable;
use std::sync::Arc;
use tracing::info;

pub struct ControlPlane {
    table: Arc<RouteTable>,
    store: Arc<dyn KeyStore>,
    publisher: RoutePublisher,
}

impl ControlPlane {
    pub fn new(table: Arc<RouteTable>, store: Arc<dyn KeyStore>, publisher: RoutePublisher) -> Self {
        Self {
            table,
            store,
            publisher,
        }
    }

    /// Register a route: table upsert, cache write, then best-effort
    /// publication. Returns the registered route.
    pub async fn register(
        &self,
        label: &str,
        domain: &str,
        path: &str,
    ) -> Result<Route, GatewayError> {
        let route = Route::new(label, domain, path)?;

        self.table.register(route.clone());
        self.store.put_route_record(&route.record()).await?;
        self.publisher.publish_update(&route.record()).await;

        Ok(route)
    }

    /// Register one route per host-list entry. Called once at startup,
    /// before the gateway begins to serve traffic.
    pub async fn seed(&self, entries: &[HostEntry]) -> Result<usize, GatewayError> {
        for entry in entries {
            let target = parse_target(&entry.url)?;
            let domain = domain_of(&target);
            self.register(&entry.label, &domain, &entry.url).await?;
        }
        info!(count = entries.len(), "route table seeded");
        Ok(entries.len())
    }
}

/// The authority portion of a target URL, used as the forwarded `Host`.
fn domain_of(url: &url::Url) -> String {
    match (url.host_str(), url.port()) {
        (Some(host), Some(port)) => format!("{host}:{port}"),
        (Some(host), None) => host.to_string(),
        _ => String::new(),
    }
}
