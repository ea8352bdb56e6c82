pub mod auth;
pub mod config;
pub mod error;
pub mod hosts;
pub mod route;
pub mod table;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use route::{Route, RouteRecord};
pub use table::RouteTable;
