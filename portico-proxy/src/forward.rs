//! Reverse-proxy handoff to the backend API.
//!
//! The upstream request targets the route's parsed base URL with the
//! rewritten path, carries the original method, query, headers, and body,
//! and sets `Host` to the route's domain. The upstream response is streamed
//! back verbatim; connection pooling is handled by the shared client, keyed
//! by upstream authority.

use axum::body::Body;
use axum::response::Response;
use bytes::Bytes;
use http::header::{HeaderName, CONTENT_LENGTH, HOST};
use http::request::Parts;
use http::StatusCode;
use portico_core::route::Route;
use tracing::warn;

pub struct ReverseProxy {
    client: reqwest::Client,
}

impl ReverseProxy {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("reqwest client");
        Self { client }
    }

    /// Forward a request to the route's backend and stream the response.
    ///
    /// Upstream connect failures surface as 502, upstream timeouts as 504;
    /// there are no retries.
    pub async fn forward(
        &self,
        route: &Route,
        parts: &Parts,
        body: Bytes,
        forwarded_path: &str,
    ) -> Response {
        let mut target = route.target.clone();
        target.set_path(forwarded_path);
        target.set_query(parts.uri.query());

        let mut headers = parts.headers.clone();
        headers.remove(HOST);
        headers.remove(CONTENT_LENGTH);
        let hop: Vec<HeaderName> = headers
            .keys()
            .filter(|name| is_hop_by_hop(name))
            .cloned()
            .collect();
        for name in hop {
            headers.remove(name);
        }

        let upstream = match self
            .client
            .request(parts.method.clone(), target)
            .headers(headers)
            .header(HOST, route.domain.as_str())
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) if e.is_timeout() => {
                warn!(label = %route.label, error = %e, "upstream timed out");
                return status_response(StatusCode::GATEWAY_TIMEOUT);
            }
            Err(e) => {
                warn!(label = %route.label, error = %e, "upstream request failed");
                return status_response(StatusCode::BAD_GATEWAY);
            }
        };

        let mut builder = Response::builder().status(upstream.status());
        if let Some(response_headers) = builder.headers_mut() {
            for (name, value) in upstream.headers() {
                if !is_hop_by_hop(name) {
                    response_headers.append(name.clone(), value.clone());
                }
            }
        }
        builder
            .body(Body::from_stream(upstream.bytes_stream()))
            .unwrap_or_else(|_| status_response(StatusCode::BAD_GATEWAY))
    }
}

impl Default for ReverseProxy {
    fn default() -> Self {
        Self::new()
    }
}

fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection" | "keep-alive" | "transfer-encoding" | "upgrade"
    )
}

/// A bare status response; request-level failures carry no body detail.
pub fn status_response(status: StatusCode) -> Response {
    Response::builder()
        .status(status)
        .body(Body::empty())
        .expect("static response")
}
