//! Configuration module for environment variable parsing.
//!
//! Reads all configuration from environment variables, matching the deploy
//! environment of the relay service. The shared secret and relay URL are
//! required; everything else has a default.

use std::env;

use anyhow::{bail, Context, Result};
use tracing::warn;
use url::Url;

/// Name of the local env file loaded when `--env-file` is passed.
pub const ENV_FILE: &str = "variables.env";

/// Application configuration loaded once at startup.
///
/// Immutable after construction; shared with the handlers behind an `Arc`.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Shared secret used to verify GitHub webhook signatures
    pub webhook_secret: String,

    /// Downstream relay endpoint accepted deliveries are forwarded to
    pub relay_url: Url,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A missing or empty `GITHUB_WEBHOOK_SECRET` or `WEBHOOKRELAY_URL` is a
    /// fatal startup condition.
    pub fn from_env() -> Result<Self> {
        let webhook_secret = env::var("GITHUB_WEBHOOK_SECRET")
            .context("GITHUB_WEBHOOK_SECRET must be set")?;
        if webhook_secret.is_empty() {
            bail!("GITHUB_WEBHOOK_SECRET must not be empty");
        }

        let relay_url = env::var("WEBHOOKRELAY_URL").context("WEBHOOKRELAY_URL must be set")?;
        if relay_url.is_empty() {
            bail!("WEBHOOKRELAY_URL must not be empty");
        }
        let relay_url =
            Url::parse(&relay_url).context("WEBHOOKRELAY_URL is not a valid URL")?;

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        Ok(Config {
            port,
            webhook_secret,
            relay_url,
        })
    }
}

/// Pre-populate the environment from the local env file.
///
/// Failure to read the file is logged but never fatal; the environment may
/// already carry everything needed.
pub fn load_env_file() {
    if let Err(e) = dotenvy::from_filename(ENV_FILE) {
        warn!(file = ENV_FILE, error = %e, "env_file_load_failed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::{Mutex, MutexGuard};

    // Env-var tests share process state, so they run under one lock.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn set_required() {
        env::set_var("GITHUB_WEBHOOK_SECRET", "test-secret");
        env::set_var("WEBHOOKRELAY_URL", "https://relay.example.com/hook");
    }

    fn clear_all() {
        env::remove_var("GITHUB_WEBHOOK_SECRET");
        env::remove_var("WEBHOOKRELAY_URL");
        env::remove_var("PORT");
    }

    #[test]
    fn test_from_env_defaults() {
        let _guard = env_guard();
        set_required();
        env::remove_var("PORT");
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.webhook_secret, "test-secret");
        assert_eq!(config.relay_url.as_str(), "https://relay.example.com/hook");
        clear_all();
    }

    #[test]
    fn test_from_env_port_override() {
        let _guard = env_guard();
        set_required();
        env::set_var("PORT", "9999");
        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 9999);
        clear_all();
    }

    #[test]
    fn test_from_env_missing_secret_is_fatal() {
        let _guard = env_guard();
        clear_all();
        env::set_var("WEBHOOKRELAY_URL", "https://relay.example.com/hook");
        assert!(Config::from_env().is_err());
        clear_all();
    }

    #[test]
    fn test_from_env_empty_secret_is_fatal() {
        let _guard = env_guard();
        set_required();
        env::set_var("GITHUB_WEBHOOK_SECRET", "");
        assert!(Config::from_env().is_err());
        clear_all();
    }

    #[test]
    fn test_from_env_invalid_relay_url_is_fatal() {
        let _guard = env_guard();
        set_required();
        env::set_var("WEBHOOKRELAY_URL", "not a url");
        assert!(Config::from_env().is_err());
        clear_all();
    }
}
