//! Wire records carried on the event bus.
//!
//! Messages are two-frame `[topic, payload]`; the payload is a protobuf
//! record. The structs below are hand-derived with the field tags of the
//! producing services' schema, so no build-time codegen is needed.

use prost::Message;

/// Event verb shared by every topic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum Verb {
    Update = 0,
    Delete = 1,
}

/// Identity-provisioning event on the `auth` topic.
#[derive(Clone, PartialEq, Message)]
pub struct AuthEvent {
    #[prost(enumeration = "Verb", tag = "1")]
    pub verb: i32,
    #[prost(string, tag = "2")]
    pub email: String,
    #[prost(string, tag = "3")]
    pub public_key: String,
    #[prost(string, tag = "4")]
    pub private_key: String,
}

/// Route-change event on the `route` topic.
#[derive(Clone, PartialEq, Message)]
pub struct RouteEvent {
    #[prost(enumeration = "Verb", tag = "1")]
    pub verb: i32,
    #[prost(string, tag = "2")]
    pub id: String,
    #[prost(string, tag = "3")]
    pub label: String,
    #[prost(string, tag = "4")]
    pub path: String,
    #[prost(string, tag = "5")]
    pub prefix: String,
    #[prost(string, tag = "6")]
    pub domain: String,
}

impl AuthEvent {
    /// The decoded verb, or `None` for values this revision does not know.
    /// Unknown verbs are ignored by consumers.
    pub fn verb(&self) -> Option<Verb> {
        Verb::try_from(self.verb).ok()
    }
}

impl RouteEvent {
    pub fn verb(&self) -> Option<Verb> {
        Verb::try_from(self.verb).ok()
    }
}
