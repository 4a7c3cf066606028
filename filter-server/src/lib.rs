//! Hookfilter - GitHub webhook filter relay.
//!
//! A single-endpoint HTTP relay that authenticates inbound GitHub webhook
//! deliveries, inspects the `package.package_type` payload field, and
//! forwards container package events to one downstream relay URL. Everything
//! else is dropped before forwarding, so duplicate and fan-out events stop
//! burning relay quota.
//!
//! ## Architecture
//!
//! ```text
//! GitHub → verify signature → filter package_type → relay target
//! ```

pub mod config;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use web::{app, AppState};
