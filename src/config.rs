//! Configuration management

use std::{env, fmt, path::Path};

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::{Error, Result};

/// Slack's OAuth v2 token endpoint
pub const SLACK_TOKEN_ENDPOINT: &str = "https://slack.com/api/oauth.v2.access";

/// Path the callback handler is mounted on
pub const DEFAULT_CALLBACK_PATH: &str = "/api/slack-callback";

/// Prefix for environment overrides (`SLACK_CALLBACK_SERVER__PORT=8080`)
pub const ENV_PREFIX: &str = "SLACK_CALLBACK_";

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Environment files to load before resolving credentials.
    /// Paths support ~ expansion. Loaded in order; variables already present
    /// in the process environment are not overridden.
    pub env_files: Vec<String>,
    /// Server configuration
    pub server: ServerConfig,
    /// Slack OAuth configuration
    pub slack: SlackConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Slack OAuth configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    /// Client ID. Supports a literal value or `env:VAR_NAME`
    pub client_id: Option<String>,
    /// Client secret. Supports a literal value or `env:VAR_NAME`
    pub client_secret: Option<String>,
    /// Token endpoint the authorization code is exchanged at
    pub token_endpoint: String,
    /// Path the callback handler is served on. Also the path part of the
    /// `redirect_uri` sent to Slack, so it must match the app registration.
    pub callback_path: String,
    /// Path of the single-page app the browser is sent back to.
    /// Empty means the bare origin.
    pub app_path: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            client_id: Some("env:SLACK_CLIENT_ID".to_string()),
            client_secret: Some("env:SLACK_CLIENT_SECRET".to_string()),
            token_endpoint: SLACK_TOKEN_ENDPOINT.to_string(),
            callback_path: DEFAULT_CALLBACK_PATH.to_string(),
            app_path: String::new(),
        }
    }
}

// Literal secrets may live in the config file, so keep them out of logs.
impl fmt::Debug for SlackConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlackConfig")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_deref().map(redact_reference),
            )
            .field("token_endpoint", &self.token_endpoint)
            .field("callback_path", &self.callback_path)
            .field("app_path", &self.app_path)
            .finish()
    }
}

/// Show `env:` references as-is, hide literal values
fn redact_reference(value: &str) -> &str {
    if value.starts_with("env:") {
        value
    } else {
        "<redacted>"
    }
}

/// Resolve a configured value: `env:VAR_NAME` reads the variable, anything
/// else is taken literally. Unset and empty values resolve to `None`.
fn resolve_value(value: Option<&str>) -> Option<String> {
    let value = value?;
    let resolved = match value.strip_prefix("env:") {
        Some(var_name) => env::var(var_name).ok()?,
        None => value.to_string(),
    };
    if resolved.is_empty() {
        None
    } else {
        Some(resolved)
    }
}

/// Slack app credentials, resolved once at startup and immutable afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderCredentials {
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret. Sent to Slack only.
    pub client_secret: String,
}

impl fmt::Debug for ProviderCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl SlackConfig {
    /// Resolve the credentials. `None` unless both are present and non-empty.
    #[must_use]
    pub fn resolve_credentials(&self) -> Option<ProviderCredentials> {
        let client_id = resolve_value(self.client_id.as_deref())?;
        let client_secret = resolve_value(self.client_secret.as_deref())?;
        Some(ProviderCredentials {
            client_id,
            client_secret,
        })
    }
}

impl Config {
    /// Load configuration from an optional YAML file and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
        }

        let config: Self = Self::figment(path).extract()?;

        if config.env_files.is_empty() {
            config.validate()?;
            return Ok(config);
        }

        // Env files may carry SLACK_CALLBACK_* overrides too, so extract again
        config.load_env_files();
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();

        if let Some(p) = path {
            figment = figment.merge(Yaml::file(p));
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load environment files into the process environment.
    /// Supports ~ expansion. Files that don't exist are silently skipped.
    fn load_env_files(&self) {
        for path_str in &self.env_files {
            let expanded = if path_str.starts_with('~') {
                if let Some(home) = dirs::home_dir() {
                    path_str.replacen('~', &home.display().to_string(), 1)
                } else {
                    path_str.clone()
                }
            } else {
                path_str.clone()
            };

            let path = Path::new(&expanded);
            if !path.exists() {
                tracing::debug!("Env file not found, skipping: {expanded}");
                continue;
            }
            match dotenvy::from_path(path) {
                Ok(()) => tracing::info!("Loaded env file: {expanded}"),
                Err(e) => tracing::warn!("Failed to load env file {expanded}: {e}"),
            }
        }
    }

    /// Check values that would otherwise only fail at request time
    pub fn validate(&self) -> Result<()> {
        let endpoint = Url::parse(&self.slack.token_endpoint).map_err(|e| {
            Error::Config(format!(
                "Invalid token endpoint '{}': {e}",
                self.slack.token_endpoint
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Token endpoint must be http(s): {}",
                self.slack.token_endpoint
            )));
        }

        if !self.slack.callback_path.starts_with('/') {
            return Err(Error::Config(format!(
                "Callback path must start with '/': {}",
                self.slack.callback_path
            )));
        }

        if !self.slack.app_path.is_empty() && !self.slack.app_path.starts_with('/') {
            return Err(Error::Config(format!(
                "App path must be empty or start with '/': {}",
                self.slack.app_path
            )));
        }

        Ok(())
    }
}
