pub mod cache;
pub mod control;
pub mod events;
pub mod listener;
pub mod publisher;

pub use cache::{KeyStore, MemoryCache, RedisCache};
pub use control::ControlPlane;
pub use listener::EventListener;
pub use publisher::RoutePublisher;
