//! Token exchange
//!
//! Posts the authorization code to Slack's `oauth.v2.access` endpoint and
//! decodes the reply. The exchange is attempted exactly once.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ProviderCredentials;

/// Form body of the `oauth.v2.access` request
#[derive(Clone, Serialize)]
pub struct TokenExchangeRequest {
    /// Slack app client ID
    pub client_id: String,
    /// Slack app client secret
    pub client_secret: String,
    /// Authorization code from the callback query
    pub code: String,
    /// Redirect URI used for the authorization request
    pub redirect_uri: String,
}

impl TokenExchangeRequest {
    /// Build the request from the app credentials and the callback inputs
    #[must_use]
    pub fn new(credentials: &ProviderCredentials, code: &str, redirect_uri: String) -> Self {
        Self {
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            code: code.to_string(),
            redirect_uri,
        }
    }
}

impl std::fmt::Debug for TokenExchangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenExchangeRequest")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .finish_non_exhaustive()
    }
}

/// Decoded `oauth.v2.access` reply. Only the fields the callback needs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenExchangeResponse {
    /// Whether Slack accepted the exchange. Missing means no.
    #[serde(default)]
    pub ok: bool,
    /// Error code when `ok` is false (e.g. `invalid_code`)
    #[serde(default)]
    pub error: Option<String>,
    /// The user the token was issued for
    #[serde(default)]
    pub authed_user: Option<AuthedUser>,
}

/// `authed_user` object of the reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthedUser {
    /// Slack user ID
    #[serde(default)]
    pub id: Option<String>,
    /// User token (`xoxp-...`)
    #[serde(default)]
    pub access_token: Option<String>,
}

/// Why an exchange produced no usable reply.
///
/// Both variants display the bare message, which is what ends up in the
/// `slack_error` fragment.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Request could not be sent or the body could not be read
    #[error("{0}")]
    Transport(String),

    /// Body was not the expected JSON
    #[error("{0}")]
    Decode(String),
}

/// Performs the code-for-token exchange
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Send one exchange request and decode the reply
    async fn exchange(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<TokenExchangeResponse, ExchangeError>;
}

/// [`TokenExchanger`] that talks to Slack over HTTP
pub struct SlackTokenClient {
    http_client: Client,
    token_endpoint: String,
}

impl SlackTokenClient {
    /// Create a client posting to `token_endpoint`
    #[must_use]
    pub fn new(http_client: Client, token_endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            token_endpoint: token_endpoint.into(),
        }
    }
}

#[async_trait]
impl TokenExchanger for SlackTokenClient {
    async fn exchange(
        &self,
        request: &TokenExchangeRequest,
    ) -> Result<TokenExchangeResponse, ExchangeError> {
        debug!(endpoint = %self.token_endpoint, "Exchanging authorization code");

        let response = self
            .http_client
            .post(&self.token_endpoint)
            .form(request)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;

        // Slack reports failures in the body with `ok: false`, so the status
        // code is informational only.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::Transport(e.to_string()))?;
        debug!(%status, bytes = body.len(), "Token endpoint replied");

        serde_json::from_str(&body).map_err(|e| ExchangeError::Decode(e.to_string()))
    }
}
