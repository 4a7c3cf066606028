//! Outbound forwarding to the downstream relay service.
//!
//! Accepted deliveries are re-posted to the configured relay URL with the
//! original body bytes, verbatim. The call is awaited inline in the handler,
//! so an inbound disconnect drops the future and cancels the outbound
//! request instead of leaking it.

use axum::body::Bytes;
use reqwest::{header, Client};
use thiserror::Error;
use tracing::{debug, info};

/// User-Agent sent on every forwarded request.
pub const FORWARD_USER_AGENT: &str = "hookfilter-relay";

/// Failure modes of a forward attempt. Both map to 502 for the caller.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("error sending request to relay: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("relay returned status: {0}")]
    UpstreamStatus(u16),
}

/// Forward the raw delivery body to the relay target.
///
/// Returns the downstream status code on success. A transport failure or a
/// downstream status outside [200, 300) is terminal for this request; there
/// is no retry, the upstream sender owns retry policy.
pub async fn forward(client: &Client, relay_url: &str, body: Bytes) -> Result<u16, RelayError> {
    let response = client
        .post(relay_url)
        .header(header::USER_AGENT, FORWARD_USER_AGENT)
        .header(header::CONTENT_TYPE, "application/json")
        .body(body)
        .send()
        .await?;

    let status = response.status().as_u16();
    info!(downstream_status = status, "relay_responded");

    // Drain the response so the connection can be released for reuse.
    if let Err(e) = response.bytes().await {
        debug!(error = %e, "relay_response_drain_failed");
    }

    if !(200..300).contains(&status) {
        return Err(RelayError::UpstreamStatus(status));
    }

    Ok(status)
}
