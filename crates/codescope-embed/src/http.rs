//! Shared HTTP client construction for the remote providers.

use std::time::Duration;

use crate::error::EmbedError;

/// Create an HTTP client with the standard codescope configuration.
///
/// Config: 30s connect timeout, 60s request timeout, rustls TLS,
/// `codescope/{version}` user-agent, redirect limit 10.
///
/// # Errors
///
/// Returns `EmbedError::Http` if the TLS backend cannot be initialized.
pub fn default_client() -> Result<reqwest::Client, EmbedError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(30))
        .timeout(Duration::from_secs(60))
        .user_agent(concat!("codescope/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(EmbedError::Http)
}
