use crate::route::{Route, RouteRecord};
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::info;

/// In-memory routing table mapping labels to routes.
///
/// Single writer, many readers. Writers hold the write lock only for the map
/// upsert; readers hold the read lock across the map read and the field copy.
pub struct RouteTable {
    inner: RwLock<HashMap<String, Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    /// Upsert a route under its label. Re-registration under the same label
    /// replaces the prior entry (last writer wins).
    pub fn register(&self, route: Route) {
        info!(label = %route.label, domain = %route.domain, "registering route");
        let mut hosts = self.inner.write().expect("route table lock poisoned");
        hosts.insert(route.label.clone(), route);
    }

    /// Resolve a request path to a route by its leading path segment.
    pub fn lookup(&self, request_path: &str) -> Option<Route> {
        let label = extract_label(request_path)?;
        let hosts = self.inner.read().expect("route table lock poisoned");
        hosts.get(label).cloned()
    }

    /// All registered routes, flattened for the management API.
    pub fn snapshot(&self) -> HashMap<String, RouteRecord> {
        let hosts = self.inner.read().expect("route table lock poisoned");
        hosts
            .iter()
            .map(|(label, route)| (label.clone(), route.record()))
            .collect()
    }

    pub fn get(&self, label: &str) -> Option<Route> {
        let hosts = self.inner.read().expect("route table lock poisoned");
        hosts.get(label).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().expect("route table lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract the candidate route label from a request path.
///
/// Splitting on `/` leaves a leading empty element; the label is the element
/// at index 1. Paths with no such element (`""`, `"/"`) yield no label.
pub fn extract_label(path: &str) -> Option<&str> {
    let mut segments = path.split('/');
    segments.next()?;
    match segments.next() {
        Some(label) if !label.is_empty() => Some(label),
        _ => None,
    }
}

/// Build the forwarded path by stripping the label segment.
///
/// The result is `"/" + segments[2..]` joined on `/`, or `/` when nothing
/// remains. Empty segments past the label are preserved.
pub fn rewrite_path(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.len() <= 2 {
        return "/".to_string();
    }
    format!("/{}", segments[2..].join("/"))
}
