use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Top-level gateway configuration.
///
/// Every field is optional in the environment; bind addresses accept the
/// bare `:port` shorthand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Data-plane listener address
    #[serde(default = "default_router_bind")]
    pub router_bind: String,

    /// Management API listener address
    #[serde(default = "default_coreapi_bind")]
    pub coreapi_bind: String,

    /// Key cache address
    #[serde(default = "default_redis_bind")]
    pub redis_bind: String,

    /// Event bus subscribe endpoint
    #[serde(default = "default_event_bind")]
    pub event_bind: String,

    /// Event bus request/reply publish endpoint
    #[serde(default = "default_publish_bind")]
    pub publish_bind: String,

    /// Startup host-list file
    #[serde(default = "default_hosts_file")]
    pub hosts_file: PathBuf,

    /// Receive timeout for route-change acknowledgements (milliseconds)
    #[serde(default = "default_publish_timeout_ms")]
    pub publish_timeout_ms: u64,
}

impl GatewayConfig {
    /// Load configuration from an optional YAML file plus the environment.
    ///
    /// Environment variables use the flat names from the deployment contract:
    /// `ROUTER_BIND`, `COREAPI_BIND`, `REDIS_BIND`, `EVENT_BIND`,
    /// `PUBLISH_BIND`, `HOSTS_FILE`, `PUBLISH_TIMEOUT_MS`.
    pub fn load(config_path: Option<&str>) -> anyhow::Result<Self> {
        let mut figment = Figment::new();

        if let Some(path) = config_path {
            figment = figment.merge(Yaml::file(path));
        }

        figment = figment.merge(Env::raw().only(&[
            "router_bind",
            "coreapi_bind",
            "redis_bind",
            "event_bind",
            "publish_bind",
            "hosts_file",
            "publish_timeout_ms",
        ]));

        let config: Self = figment.extract()?;
        Ok(config)
    }

    pub fn router_addr(&self) -> anyhow::Result<SocketAddr> {
        bind_addr(&self.router_bind)
    }

    pub fn coreapi_addr(&self) -> anyhow::Result<SocketAddr> {
        bind_addr(&self.coreapi_bind)
    }

    /// Connection URL for the key cache.
    pub fn redis_url(&self) -> String {
        if let Some(port) = self.redis_bind.strip_prefix(':') {
            format!("redis://127.0.0.1:{port}")
        } else if self.redis_bind.contains("://") {
            self.redis_bind.clone()
        } else {
            format!("redis://{}", self.redis_bind)
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            router_bind: default_router_bind(),
            coreapi_bind: default_coreapi_bind(),
            redis_bind: default_redis_bind(),
            event_bind: default_event_bind(),
            publish_bind: default_publish_bind(),
            hosts_file: default_hosts_file(),
            publish_timeout_ms: default_publish_timeout_ms(),
        }
    }
}

/// Parse a listener address, expanding the `:port` shorthand to all
/// interfaces.
pub fn bind_addr(bind: &str) -> anyhow::Result<SocketAddr> {
    let full = if bind.starts_with(':') {
        format!("0.0.0.0{bind}")
    } else {
        bind.to_string()
    };
    Ok(full.parse()?)
}

// Serde default functions

fn default_router_bind() -> String {
    ":8080".to_string()
}

fn default_coreapi_bind() -> String {
    ":8081".to_string()
}

fn default_redis_bind() -> String {
    ":6379".to_string()
}

fn default_event_bind() -> String {
    "tcp://127.0.0.1:6666".to_string()
}

fn default_publish_bind() -> String {
    "tcp://127.0.0.1:6667".to_string()
}

fn default_hosts_file() -> PathBuf {
    PathBuf::from("hosts.conf")
}

fn default_publish_timeout_ms() -> u64 {
    2000
}
