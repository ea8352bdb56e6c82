pub mod dispatch;
pub mod forward;

pub use dispatch::{router, Gateway};
pub use forward::ReverseProxy;
