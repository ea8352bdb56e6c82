//! Route-change publication to the external store.
//!
//! Each registration opens a fresh request/reply socket, sends the
//! two-frame `["route", payload]` message, and waits for any reply frame as
//! acknowledgement. A fresh socket per registration keeps registrations
//! independent; the wire format carries no correlation id, so a shared
//! socket could not tell acks apart.

use crate::events::{RouteEvent, Verb};
use bytes::Bytes;
use portico_core::route::RouteRecord;
use prost::Message;
use std::time::Duration;
use tracing::{debug, warn};
use zeromq::{Socket, SocketRecv, SocketSend, ZmqMessage};

pub const ROUTE_TOPIC: &str = "route";

pub struct RoutePublisher {
    endpoint: String,
    timeout: Duration,
}

impl RoutePublisher {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout,
        }
    }

    /// Publish a route UPDATE and await acknowledgement.
    ///
    /// Best-effort: timeout or transport failure is logged as a degradation
    /// and reported as `false`; the registration that triggered it still
    /// stands. Dropping the socket discards any unsent frames.
    pub async fn publish_update(&self, record: &RouteRecord) -> bool {
        let event = RouteEvent {
            verb: Verb::Update as i32,
            id: "0".to_string(),
            label: record.label.clone(),
            path: record.path.clone(),
            prefix: record.prefix.clone(),
            domain: record.domain.clone(),
        };

        match tokio::time::timeout(self.timeout, self.send_and_ack(&event)).await {
            Ok(Ok(())) => {
                debug!(label = %record.label, "route event acknowledged");
                true
            }
            Ok(Err(e)) => {
                warn!(label = %record.label, error = %e, "route event publish failed, operating without store");
                false
            }
            Err(_) => {
                warn!(label = %record.label, "route event acknowledgement timed out, operating without store");
                false
            }
        }
    }

    async fn send_and_ack(&self, event: &RouteEvent) -> Result<(), zeromq::ZmqError> {
        let mut sock = zeromq::ReqSocket::new();
        sock.connect(&self.endpoint).await?;

        let mut message = ZmqMessage::from(ROUTE_TOPIC);
        message.push_back(Bytes::from(event.encode_to_vec()));
        sock.send(message).await?;

        sock.recv().await?;
        Ok(())
    }
}
