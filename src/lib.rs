//! Slack OAuth callback service
//!
//! Hosts the redirect target of Slack's OAuth v2 flow for a single-page app.
//! The service exchanges the authorization code for a user token and
//! redirects the browser back to the app with the result in the URL fragment:
//!
//! - `#slack_token=<token>&slack_user_id=<id>` on success
//! - `#slack_error=<reason>` on any failure of the exchange
//!
//! Tokens are never stored, refreshed, or placed in a query string.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod service;
pub mod slack;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    let result = match format {
        Some("json") => subscriber.with(fmt::layer().json()).try_init(),
        _ => subscriber.with(fmt::layer()).try_init(),
    };

    result.map_err(|e| Error::Internal(format!("Failed to initialise tracing: {e}")))
}
