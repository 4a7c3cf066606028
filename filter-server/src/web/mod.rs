//! Web server module: the whole request pipeline.
//!
//! Single-endpoint surface:
//! - `GET/HEAD /health` — liveness, bypasses the pipeline
//! - `GET/HEAD /` — probe, logs headers and returns 200
//! - anything else on `/` — webhook delivery: verify, filter, forward

use axum::{
    routing::{any, get},
    Router,
};
use tower_http::trace::TraceLayer;

pub mod handlers;
pub mod relay;
pub mod signature;

pub use handlers::{health, root, AppState, ACCEPTED_PACKAGE_TYPE, MESSAGE_HEADER};
pub use relay::{RelayError, FORWARD_USER_AGENT};
pub use signature::{sign, verify_signature, SIGNATURE_PREFIX};

/// Build the application router over the given state.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", any(root))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
