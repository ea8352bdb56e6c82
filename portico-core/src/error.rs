use thiserror::Error;

/// Unified error type for the gateway.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Auth failed: {0}")]
    AuthFailed(String),

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Invalid target URL: {0}")]
    InvalidTarget(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Event bus error: {0}")]
    EventBusError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Internal: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Map to HTTP status code.
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::AuthFailed(_) => 401,
            GatewayError::RouteNotFound(_) => 404,
            GatewayError::InvalidTarget(_) => 400,
            GatewayError::CacheError(_) => 503,
            _ => 500,
        }
    }
}
