//! Event ingress: the long-running subscriber that feeds the key cache.
//!
//! Identity events arrive on the `auth` topic; each UPDATE writes
//! `key:<public>` → `<private>`. The write is idempotent and keyed by the
//! public key, so duplicate or out-of-order deliveries converge to the last
//! value written. Decode failures and unknown topics are dropped without
//! stopping the loop; only a transport failure ends the task.

use crate::cache::KeyStore;
use crate::events::{AuthEvent, Verb};
use portico_core::error::GatewayError;
use prost::Message;
use std::sync::Arc;
use tracing::{debug, error, info};
use zeromq::{Socket, SocketRecv, ZmqMessage};

const TOPICS: [&str; 2] = ["auth", "route"];

pub struct EventListener {
    endpoint: String,
    store: Arc<dyn KeyStore>,
}

impl EventListener {
    pub fn new(endpoint: impl Into<String>, store: Arc<dyn KeyStore>) -> Self {
        Self {
            endpoint: endpoint.into(),
            store,
        }
    }

    /// Subscribe and process events until the transport fails.
    ///
    /// The rest of the gateway keeps serving when this task exits; restart
    /// loses events delivered while the subscriber was down.
    pub async fn run(self) -> Result<(), GatewayError> {
        let mut sock = zeromq::SubSocket::new();
        sock.connect(&self.endpoint)
            .await
            .map_err(|e| GatewayError::EventBusError(e.to_string()))?;

        for topic in TOPICS {
            sock.subscribe(topic)
                .await
                .map_err(|e| GatewayError::EventBusError(e.to_string()))?;
        }
        info!(endpoint = %self.endpoint, "event listener subscribed");

        loop {
            let message = match sock.recv().await {
                Ok(m) => m,
                Err(e) => {
                    error!(error = %e, "event listener transport failure");
                    return Err(GatewayError::EventBusError(e.to_string()));
                }
            };
            self.dispatch(message).await;
        }
    }

    async fn dispatch(&self, message: ZmqMessage) {
        let (Some(topic), Some(payload)) = (message.get(0), message.get(1)) else {
            error!(frames = message.len(), "dropping event with missing frames");
            return;
        };
        self.apply(topic.as_ref(), payload.as_ref()).await;
    }

    /// Apply a single `[topic, payload]` event.
    pub async fn apply(&self, topic: &[u8], payload: &[u8]) {
        match topic {
            b"auth" => self.apply_auth(payload).await,
            b"route" => debug!("route event on ingress topic ignored"),
            other => error!(topic = %String::from_utf8_lossy(other), "dropping event on unknown topic"),
        }
    }

    async fn apply_auth(&self, payload: &[u8]) {
        let event = match AuthEvent::decode(payload) {
            Ok(event) => event,
            Err(e) => {
                error!(error = %e, "failed to decode auth event");
                return;
            }
        };

        match event.verb() {
            Some(Verb::Update) => {
                if let Err(e) = self
                    .store
                    .put_keypair(&event.public_key, &event.private_key)
                    .await
                {
                    error!(error = %e, "failed to store keypair");
                } else {
                    info!("keypair added to cache");
                }
            }
            Some(Verb::Delete) => {
                // Reserved by the producing service; nothing deletes yet.
                debug!("auth DELETE verb ignored");
            }
            None => error!(verb = event.verb, "dropping auth event with unknown verb"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;

    fn listener(store: &MemoryCache) -> EventListener {
        EventListener::new("tcp://127.0.0.1:6666", Arc::new(store.clone()))
    }

    fn auth_event(verb: i32, public_key: &str, private_key: &str) -> Vec<u8> {
        AuthEvent {
            verb,
            email: "svc@example.edu".to_string(),
            public_key: public_key.to_string(),
            private_key: private_key.to_string(),
        }
        .encode_to_vec()
    }

    #[tokio::test]
    async fn auth_update_populates_key_cache() {
        let store = MemoryCache::new();
        let l = listener(&store);

        l.apply(b"auth", &auth_event(Verb::Update as i32, "pk2", "sk2"))
            .await;

        assert_eq!(
            store.private_key("pk2").await.unwrap(),
            Some("sk2".to_string())
        );
    }

    #[tokio::test]
    async fn duplicate_updates_are_idempotent() {
        let store = MemoryCache::new();
        let l = listener(&store);
        let payload = auth_event(Verb::Update as i32, "pk2", "sk2");

        l.apply(b"auth", &payload).await;
        l.apply(b"auth", &payload).await;

        assert_eq!(
            store.private_key("pk2").await.unwrap(),
            Some("sk2".to_string())
        );
    }

    #[tokio::test]
    async fn auth_delete_is_a_no_op() {
        let store = MemoryCache::new();
        let l = listener(&store);

        l.apply(b"auth", &auth_event(Verb::Update as i32, "pk2", "sk2"))
            .await;
        l.apply(b"auth", &auth_event(Verb::Delete as i32, "pk2", ""))
            .await;

        assert_eq!(
            store.private_key("pk2").await.unwrap(),
            Some("sk2".to_string())
        );
    }

    #[tokio::test]
    async fn undecodable_payload_is_dropped() {
        let store = MemoryCache::new();
        let l = listener(&store);

        l.apply(b"auth", b"\xff\xff\xff\xff").await;

        assert_eq!(store.private_key("pk2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn unknown_topic_is_dropped() {
        let store = MemoryCache::new();
        let l = listener(&store);

        l.apply(b"metrics", &auth_event(Verb::Update as i32, "pk2", "sk2"))
            .await;

        assert_eq!(store.private_key("pk2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn route_topic_does_not_touch_key_cache() {
        let store = MemoryCache::new();
        let l = listener(&store);

        l.apply(b"route", b"anything").await;

        assert_eq!(store.private_key("pk2").await.unwrap(), None);
    }
}
