//! Slack OAuth callback handler
//!
//! Slack sends the browser here with `?code=...` once the user has approved
//! the app. The handler trades the code for a user token and sends the
//! browser back to the app with the result in the URL fragment.

use std::sync::Arc;

use axum::{
    Json,
    extract::{RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, info, warn};

use super::exchange::{TokenExchangeRequest, TokenExchanger};
use super::redirect::{ExchangeOutcome, Origin, RedirectOutcome};
use crate::config::ProviderCredentials;

/// Body message for a callback without `code`
pub const MISSING_CODE: &str = "Missing code parameter";

/// Body message for a callback without a usable `Host` header
pub const MISSING_HOST: &str = "Missing host header";

/// Body message when the app credentials were not configured
pub const NOT_CONFIGURED: &str = "Slack credentials not configured";

/// OAuth callback query parameters
#[derive(Debug, Default)]
pub struct CallbackParams {
    /// Authorization code
    pub code: Option<String>,
}

impl CallbackParams {
    /// Read the parameters from a raw query string.
    ///
    /// A repeated `code` does not reject the request: the first non-empty
    /// value wins. Other parameters (`state` included) are ignored.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_default();
        let code = pairs
            .into_iter()
            .find(|(key, value)| key == "code" && !value.is_empty())
            .map(|(_, value)| value);
        Self { code }
    }
}

/// Everything the callback needs, fixed at startup
pub struct CallbackState {
    /// App credentials; `None` when not configured
    pub credentials: Option<ProviderCredentials>,
    /// Performs the code-for-token exchange
    pub exchanger: Arc<dyn TokenExchanger>,
    /// Path the callback is served on (`redirect_uri` path)
    pub callback_path: String,
    /// Path of the app the browser is sent back to
    pub app_path: String,
}

/// Handle the OAuth callback
pub async fn handle_callback(
    State(state): State<Arc<CallbackState>>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
) -> Response {
    let params = CallbackParams::from_query(query.as_deref().unwrap_or_default());
    let Some(code) = params.code else {
        debug!("Callback without authorization code");
        return json_error(StatusCode::BAD_REQUEST, MISSING_CODE);
    };

    let Some(credentials) = state.credentials.as_ref() else {
        warn!("Callback received but Slack credentials are not configured");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, NOT_CONFIGURED);
    };

    let Some(origin) = Origin::from_headers(&headers) else {
        debug!("Callback without Host header");
        return json_error(StatusCode::BAD_REQUEST, MISSING_HOST);
    };

    let request = TokenExchangeRequest::new(
        credentials,
        &code,
        origin.redirect_uri(&state.callback_path),
    );
    let outcome = ExchangeOutcome::from_result(state.exchanger.exchange(&request).await);

    let kind = outcome.kind();
    match &outcome {
        ExchangeOutcome::Success { user_id, .. } => {
            info!(
                %origin,
                outcome = kind,
                user_id = user_id.as_deref().unwrap_or("-"),
                "Slack user token issued"
            );
        }
        ExchangeOutcome::ProviderError(code) => {
            warn!(%origin, outcome = kind, error = %code, "Slack rejected the code exchange");
        }
        ExchangeOutcome::MissingToken => {
            warn!(%origin, outcome = kind, "Slack reply carried no user token");
        }
        ExchangeOutcome::TransportError(message) => {
            warn!(%origin, outcome = kind, error = %message, "Code exchange failed");
        }
    }

    let fragment = RedirectOutcome::from(outcome).fragment();
    found(&origin.location(&state.app_path, &fragment))
}

/// `302 Found` to `location`
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
