//! Key cache adapter.
//!
//! The cache is shared with other services and holds two namespaces:
//! `key:<public>` → private key string, and `route:<label>` → the flattened
//! route record. The gateway reads `key:*` and reads/writes `route:*`.

use async_trait::async_trait;
use dashmap::DashMap;
use portico_core::error::GatewayError;
use portico_core::route::RouteRecord;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::info;

/// Storage backend for keypairs and route records.
///
/// Entries may be absent or malformed at any time; both are treated as a
/// miss by callers, never as a hard failure of the gateway.
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn private_key(&self, public_key: &str) -> Result<Option<String>, GatewayError>;

    async fn put_keypair(&self, public_key: &str, private_key: &str) -> Result<(), GatewayError>;

    async fn route_record(&self, label: &str) -> Result<Option<RouteRecord>, GatewayError>;

    async fn put_route_record(&self, record: &RouteRecord) -> Result<(), GatewayError>;
}

pub fn keypair_key(public_key: &str) -> String {
    format!("key:{public_key}")
}

pub fn route_key(label: &str) -> String {
    format!("route:{label}")
}

/// Rebuild a route record from a cache hash. A missing field means the
/// entry is malformed and reads as a miss.
pub fn record_from_hash(hash: &HashMap<String, String>) -> Option<RouteRecord> {
    Some(RouteRecord {
        label: hash.get("label")?.clone(),
        domain: hash.get("domain")?.clone(),
        path: hash.get("path")?.clone(),
        prefix: hash.get("prefix")?.clone(),
    })
}

fn cache_err(e: impl Display) -> GatewayError {
    GatewayError::CacheError(e.to_string())
}

// ── Redis backend ─────────────────────────────────────────────

/// Redis-backed key cache using a multiplexed connection.
#[derive(Clone)]
pub struct RedisCache {
    manager: ConnectionManager,
}

impl RedisCache {
    /// Connect to the cache. Failure here is a fatal bootstrap error for
    /// the gateway process.
    pub async fn connect(url: &str) -> Result<Self, GatewayError> {
        let client = redis::Client::open(url).map_err(cache_err)?;
        let manager = ConnectionManager::new(client).await.map_err(cache_err)?;
        info!(url = %url, "connected to key cache");
        Ok(Self { manager })
    }
}

#[async_trait]
impl KeyStore for RedisCache {
    async fn private_key(&self, public_key: &str) -> Result<Option<String>, GatewayError> {
        let mut conn = self.manager.clone();
        let value: Option<String> = conn
            .get(keypair_key(public_key))
            .await
            .map_err(cache_err)?;
        Ok(value.filter(|v| !v.is_empty()))
    }

    async fn put_keypair(&self, public_key: &str, private_key: &str) -> Result<(), GatewayError> {
        let mut conn = self.manager.clone();
        let _: () = conn
            .set(keypair_key(public_key), private_key)
            .await
            .map_err(cache_err)?;
        Ok(())
    }

    async fn route_record(&self, label: &str) -> Result<Option<RouteRecord>, GatewayError> {
        let mut conn = self.manager.clone();
        let hash: HashMap<String, String> = conn
            .hgetall(route_key(label))
            .await
            .map_err(cache_err)?;
        Ok(record_from_hash(&hash))
    }

    async fn put_route_record(&self, record: &RouteRecord) -> Result<(), GatewayError> {
        let mut conn = self.manager.clone();
        let _: () = redis::cmd("HMSET")
            .arg(route_key(&record.label))
            .arg("label")
            .arg(&record.label)
            .arg("domain")
            .arg(&record.domain)
            .arg("path")
            .arg(&record.path)
            .arg("prefix")
            .arg(&record.prefix)
            .query_async(&mut conn)
            .await
            .map_err(cache_err)?;
        Ok(())
    }
}

// ── In-process backend ────────────────────────────────────────

/// In-process key cache. Used by tests and by deployments that run without
/// a shared cache.
#[derive(Clone, Default)]
pub struct MemoryCache {
    keys: Arc<DashMap<String, String>>,
    routes: Arc<DashMap<String, RouteRecord>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyStore for MemoryCache {
    async fn private_key(&self, public_key: &str) -> Result<Option<String>, GatewayError> {
        Ok(self.keys.get(public_key).map(|v| v.clone()))
    }

    async fn put_keypair(&self, public_key: &str, private_key: &str) -> Result<(), GatewayError> {
        self.keys
            .insert(public_key.to_string(), private_key.to_string());
        Ok(())
    }

    async fn route_record(&self, label: &str) -> Result<Option<RouteRecord>, GatewayError> {
        Ok(self.routes.get(label).map(|v| v.clone()))
    }

    async fn put_route_record(&self, record: &RouteRecord) -> Result<(), GatewayError> {
        self.routes.insert(record.label.clone(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(label: &str) -> RouteRecord {
        RouteRecord {
            label: label.to_string(),
            domain: format!("{label}.example"),
            path: format!("http://{label}.example/{label}"),
            prefix: format!("/{label}"),
        }
    }

    #[test]
    fn cache_keys_use_separate_namespaces() {
        assert_eq!(keypair_key("pk1"), "key:pk1");
        assert_eq!(route_key("foo"), "route:foo");
        assert_ne!(keypair_key("foo"), route_key("foo"));
    }

    #[test]
    fn record_from_hash_requires_every_field() {
        let mut hash = HashMap::new();
        hash.insert("label".to_string(), "foo".to_string());
        hash.insert("domain".to_string(), "api.example".to_string());
        hash.insert("path".to_string(), "http://api.example/foo".to_string());
        assert!(record_from_hash(&hash).is_none());

        hash.insert("prefix".to_string(), "/foo".to_string());
        let rec = record_from_hash(&hash).unwrap();
        assert_eq!(rec.label, "foo");
        assert_eq!(rec.prefix, "/foo");
    }

    #[test]
    fn record_from_hash_empty_is_miss() {
        assert!(record_from_hash(&HashMap::new()).is_none());
    }

    #[tokio::test]
    async fn memory_cache_keypair_round_trip() {
        let cache = MemoryCache::new();
        assert_eq!(cache.private_key("pk1").await.unwrap(), None);

        cache.put_keypair("pk1", "sk1").await.unwrap();
        assert_eq!(
            cache.private_key("pk1").await.unwrap(),
            Some("sk1".to_string())
        );
    }

    #[tokio::test]
    async fn memory_cache_keypair_update_converges_to_last_write() {
        let cache = MemoryCache::new();
        cache.put_keypair("pk1", "sk1").await.unwrap();
        cache.put_keypair("pk1", "sk1-rotated").await.unwrap();
        assert_eq!(
            cache.private_key("pk1").await.unwrap(),
            Some("sk1-rotated".to_string())
        );
    }

    #[tokio::test]
    async fn memory_cache_route_record_round_trip() {
        let cache = MemoryCache::new();
        assert!(cache.route_record("foo").await.unwrap().is_none());

        cache.put_route_record(&record("foo")).await.unwrap();
        assert_eq!(cache.route_record("foo").await.unwrap(), Some(record("foo")));
    }
}
