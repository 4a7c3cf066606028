//! Request pipeline handlers.
//!
//! The whole service is one pipeline: authenticate the delivery, inspect the
//! package type, and either forward the untouched body to the relay or drop
//! the event. The body bytes used for signature verification are the same
//! bytes parsed as JSON and later forwarded; nothing re-encodes them.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::web::relay::forward;
use crate::web::signature::verify_signature;

/// The one package category that passes the filter and gets forwarded.
pub const ACCEPTED_PACKAGE_TYPE: &str = "CONTAINER";

/// Response header carrying the drop reason on filtered (204) responses.
pub const MESSAGE_HEADER: &str = "Message";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay_client: Client,
}

impl AppState {
    pub fn new(config: Config, relay_client: Client) -> Self {
        Self {
            config: Arc::new(config),
            relay_client,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Liveness endpoint; bypasses the pipeline entirely.
pub async fn health() -> &'static str {
    "OK"
}

// =============================================================================
// Root: probe / delivery dispatch
// =============================================================================

/// Minimal view of a GitHub package event payload.
///
/// Only the category field is decoded; unknown fields are ignored and absent
/// fields default to empty so payload evolution upstream never breaks us.
#[derive(Debug, Default, Deserialize)]
pub struct PackageEvent {
    #[serde(default)]
    pub package: Package,
}

#[derive(Debug, Default, Deserialize)]
pub struct Package {
    #[serde(default)]
    pub package_type: String,
}

/// Entry point for `/`: read-only probes get a 200 after header logging,
/// everything else is treated as a webhook delivery.
pub async fn root(State(state): State<AppState>, request: Request) -> Response {
    info!(
        method = %request.method(),
        uri = %request.uri(),
        "request_received"
    );

    let method = request.method();
    if method == Method::GET || method == Method::HEAD {
        probe(request.headers())
    } else {
        deliver(state, request).await
    }
}

/// Read-only probe: log every header for observability, touch nothing else.
fn probe(headers: &HeaderMap) -> Response {
    for (name, value) in headers {
        info!(
            header = %name,
            value = %String::from_utf8_lossy(value.as_bytes()),
            "probe_header"
        );
    }
    StatusCode::OK.into_response()
}

/// Webhook delivery pipeline: header check, signature verification, payload
/// decode, filter decision, conditional forward.
async fn deliver(state: AppState, request: Request) -> Response {
    let (parts, body) = request.into_parts();

    // Cheap pre-filter: a delivery without its identity headers is not
    // webhook traffic, so reject before paying for body I/O and HMAC.
    let delivery_id = header_str(&parts.headers, "X-GitHub-Delivery");
    let event_type = header_str(&parts.headers, "X-GitHub-Event");
    let (delivery_id, event_type) = match (delivery_id, event_type) {
        (Some(id), Some(event)) if !id.is_empty() && !event.is_empty() => (id, event),
        (id, event) => {
            let message = format!(
                "either missing delivery id ({}) or event type ({}), request not processed",
                id.unwrap_or(""),
                event.unwrap_or("")
            );
            return reject(StatusCode::BAD_REQUEST, message);
        }
    };
    info!(
        delivery_id = delivery_id,
        event_type = event_type,
        "delivery_identified"
    );

    let body = read_body(body).await;

    let header_signature = header_str(&parts.headers, "X-Hub-Signature-256").unwrap_or("");
    if !verify_signature(state.config.webhook_secret.as_bytes(), header_signature, &body) {
        return reject(StatusCode::UNAUTHORIZED, "invalid signature".to_string());
    }
    info!(signature = header_signature, "signature_verified");

    let event: PackageEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            return reject(StatusCode::BAD_REQUEST, format!("failed to parse JSON: {e}"));
        }
    };

    let package_type = event.package.package_type;
    if package_type != ACCEPTED_PACKAGE_TYPE {
        return filtered(&package_type);
    }

    info!(package_type = %package_type, "filter_passed");

    match forward(
        &state.relay_client,
        state.config.relay_url.as_str(),
        body,
    )
    .await
    {
        Ok(status) => {
            info!(
                downstream_status = status,
                package_type = %package_type,
                "delivery_forwarded"
            );
            (
                StatusCode::OK,
                format!("forwarded {package_type} package event to relay\n"),
            )
                .into_response()
        }
        Err(e) => {
            // Terminal for this request: one decision, one status, no retry.
            error!(error = %e, "relay_forward_failed");
            (StatusCode::BAD_GATEWAY, format!("{e}\n")).into_response()
        }
    }
}

/// Read the whole body into memory as exact bytes.
///
/// A read failure is logged and yields what was read so far (or nothing);
/// the truncated body then fails signature verification deterministically
/// instead of aborting the pipeline mid-flight.
async fn read_body(body: Body) -> Bytes {
    match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!(error = %e, "body_read_failed");
            Bytes::new()
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Filtered-out is the expected common case, not an error: 204 with the drop
/// reason in a response header so the sender can see the decision.
fn filtered(package_type: &str) -> Response {
    let message = format!("filtered out package_type {package_type}, not forwarded to relay");
    info!(package_type = package_type, "delivery_filtered");
    (
        StatusCode::NO_CONTENT,
        [(MESSAGE_HEADER, message)],
    )
        .into_response()
}

fn reject(status: StatusCode, message: String) -> Response {
    warn!(status = status.as_u16(), message = %message, "delivery_rejected");
    (status, format!("{message}\n")).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_event_decodes_category() {
        let event: PackageEvent =
            serde_json::from_str(r#"{"package":{"package_type":"CONTAINER"}}"#).unwrap();
        assert_eq!(event.package.package_type, "CONTAINER");
    }

    #[test]
    fn test_package_event_ignores_unknown_fields() {
        let event: PackageEvent = serde_json::from_str(
            r#"{"action":"published","package":{"package_type":"MAVEN","name":"demo"},"sender":{}}"#,
        )
        .unwrap();
        assert_eq!(event.package.package_type, "MAVEN");
    }

    #[test]
    fn test_package_event_tolerates_absent_fields() {
        let event: PackageEvent = serde_json::from_str(r#"{"action":"published"}"#).unwrap();
        assert_eq!(event.package.package_type, "");

        let event: PackageEvent = serde_json::from_str(r#"{"package":{}}"#).unwrap();
        assert_eq!(event.package.package_type, "");
    }

    #[test]
    fn test_filtered_response_carries_message_header() {
        let response = filtered("MAVEN");
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let message = response.headers().get(MESSAGE_HEADER).unwrap();
        assert!(message.to_str().unwrap().contains("MAVEN"));
    }
}
