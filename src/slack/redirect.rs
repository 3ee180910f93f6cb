//! Redirect construction
//!
//! Every outcome of the exchange becomes a `302` back to the app with the
//! result in the URL fragment. Fragments are never sent to servers, so the
//! token stays out of access logs and `Referer` headers.

use std::fmt;

use axum::http::{HeaderMap, header};

use super::exchange::{ExchangeError, TokenExchangeResponse};

/// Scheme used when no `x-forwarded-proto` header is present
pub const DEFAULT_PROTO: &str = "https";

/// Header set by TLS-terminating proxies
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Fragment error code for a successful exchange that carried no user token
pub const NO_USER_TOKEN: &str = "no_user_token";

/// `<proto>://<host>` of the inbound request as the browser sees it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    proto: String,
    host: String,
}

impl Origin {
    /// Create an origin from its parts
    #[must_use]
    pub fn new(proto: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            proto: proto.into(),
            host: host.into(),
        }
    }

    /// Derive the origin from request headers.
    ///
    /// Returns `None` when there is no usable `Host` header.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let host = headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|h| !h.is_empty())?;

        // Proxy chains may append: "https, http". The first hop is the client's.
        let proto = headers
            .get(FORWARDED_PROTO_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROTO);

        Some(Self::new(proto, host))
    }

    /// Redirect URI registered with Slack for this origin
    #[must_use]
    pub fn redirect_uri(&self, callback_path: &str) -> String {
        format!("{self}{callback_path}")
    }

    /// `Location` value sending the browser to `app_path` with `fragment`
    #[must_use]
    pub fn location(&self, app_path: &str, fragment: &str) -> String {
        format!("{self}{app_path}#{fragment}")
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.proto, self.host)
    }
}

/// Result of one token exchange
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeOutcome {
    /// Slack issued a user token
    Success {
        /// User token
        access_token: String,
        /// Slack user ID, if Slack sent one
        user_id: Option<String>,
    },
    /// Slack rejected the exchange with this error code
    ProviderError(String),
    /// Slack accepted the exchange but returned no user token
    MissingToken,
    /// The exchange never produced a decodable reply
    TransportError(String),
}

impl ExchangeOutcome {
    /// Interpret a decoded Slack reply
    #[must_use]
    pub fn from_response(response: TokenExchangeResponse) -> Self {
        if !response.ok {
            let code = response
                .error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| "unknown_error".to_string());
            return Self::ProviderError(code);
        }

        let Some(user) = response.authed_user else {
            return Self::MissingToken;
        };
        match user.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => Self::Success {
                access_token,
                user_id: user.id,
            },
            None => Self::MissingToken,
        }
    }

    /// Interpret the result of [`TokenExchanger::exchange`](super::TokenExchanger::exchange)
    #[must_use]
    pub fn from_result(result: Result<TokenExchangeResponse, ExchangeError>) -> Self {
        match result {
            Ok(response) => Self::from_response(response),
            Err(e) => Self::TransportError(e.to_string()),
        }
    }

    /// Short label for logs. Never contains the token.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::ProviderError(_) => "provider_error",
            Self::MissingToken => "missing_token",
            Self::TransportError(_) => "transport_error",
        }
    }
}

/// What the app receives in the fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// `slack_token=<token>&slack_user_id=<id>`
    Token {
        /// User token
        token: String,
        /// Slack user ID; empty when Slack omitted it
        user_id: String,
    },
    /// `slack_error=<code>`
    Error {
        /// Error code or message
        code: String,
    },
}

impl From<ExchangeOutcome> for RedirectOutcome {
    fn from(outcome: ExchangeOutcome) -> Self {
        match outcome {
            ExchangeOutcome::Success {
                access_token,
                user_id,
            } => Self::Token {
                token: access_token,
                user_id: user_id.unwrap_or_default(),
            },
            ExchangeOutcome::ProviderError(code) | ExchangeOutcome::TransportError(code) => {
                Self::Error { code }
            }
            ExchangeOutcome::MissingToken => Self::Error {
                code: NO_USER_TOKEN.to_string(),
            },
        }
    }
}

impl RedirectOutcome {
    /// Fragment (without `#`) with every value percent-encoded
    ///
    /// The token and user ID are encoded too, not just the error. Slack tokens
    /// and IDs only use unreserved characters, so for them this is a no-op; a
    /// value containing `&` or `#` can not add or cut fragment parameters.
    #[must_use]
    pub fn fragment(&self) -> String {
        match self {
            Self::Token { token, user_id } => format!(
                "slack_token={}&slack_user_id={}",
                urlencoding::encode(token),
                urlencoding::encode(user_id)
            ),
            Self::Error { code } => format!("slack_error={}", urlencoding::encode(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slack::exchange::AuthedUser;
    use axum::http::HeaderValue;
    use pretty_assertions::assert_eq;

    fn headers(host: Option<&str>, proto: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(h) = host {
            headers.insert(header::HOST, HeaderValue::from_str(h).unwrap());
        }
        if let Some(p) = proto {
            headers.insert(FORWARDED_PROTO_HEADER, HeaderValue::from_str(p).unwrap());
        }
        headers
    }

    fn success(token: Option<&str>, id: Option<&str>) -> TokenExchangeResponse {
        TokenExchangeResponse {
            ok: true,
            error: None,
            authed_user: Some(AuthedUser {
                id: id.map(String::from),
                access_token: token.map(String::from),
            }),
        }
    }

    #[test]
    fn origin_defaults_to_https() {
        let origin = Origin::from_headers(&headers(Some("example.com"), None)).unwrap();
        assert_eq!(origin.to_string(), "https://example.com");
    }

    #[test]
    fn origin_uses_forwarded_proto() {
        let origin = Origin::from_headers(&headers(Some("example.com"), Some("http"))).unwrap();
        assert_eq!(origin.to_string(), "http://example.com");
    }

    #[test]
    fn origin_takes_first_forwarded_proto() {
        let origin =
            Origin::from_headers(&headers(Some("example.com:8443"), Some("https, http"))).unwrap();
        assert_eq!(origin.to_string(), "https://example.com:8443");
    }

    #[test]
    fn empty_forwarded_proto_falls_back() {
        let origin = Origin::from_headers(&headers(Some("example.com"), Some(""))).unwrap();
        assert_eq!(origin.to_string(), "https://example.com");
    }

    #[test]
    fn origin_requires_host() {
        assert!(Origin::from_headers(&headers(None, Some("https"))).is_none());
        assert!(Origin::from_headers(&headers(Some(""), None)).is_none());
    }

    #[test]
    fn redirect_uri_and_location() {
        let origin = Origin::new("https", "app.example.com");
        assert_eq!(
            origin.redirect_uri("/api/slack-callback"),
            "https://app.example.com/api/slack-callback"
        );
        assert_eq!(
            origin.location("", "slack_error=x"),
            "https://app.example.com#slack_error=x"
        );
        assert_eq!(
            origin.location("/", "slack_error=x"),
            "https://app.example.com/#slack_error=x"
        );
    }

    #[test]
    fn outcome_provider_error() {
        let outcome = ExchangeOutcome::from_response(TokenExchangeResponse {
            ok: false,
            error: Some("access_denied".to_string()),
            authed_user: None,
        });
        assert_eq!(outcome, ExchangeOutcome::ProviderError("access_denied".to_string()));
        assert_eq!(
            RedirectOutcome::from(outcome).fragment(),
            "slack_error=access_denied"
        );
    }

    #[test]
    fn outcome_provider_error_without_code() {
        let outcome = ExchangeOutcome::from_response(TokenExchangeResponse::default());
        assert_eq!(outcome, ExchangeOutcome::ProviderError("unknown_error".to_string()));
    }

    #[test]
    fn outcome_missing_token() {
        let outcome = ExchangeOutcome::from_response(success(None, Some("U1")));
        assert_eq!(outcome, ExchangeOutcome::MissingToken);
        assert_eq!(
            RedirectOutcome::from(outcome).fragment(),
            "slack_error=no_user_token"
        );

        let no_user = TokenExchangeResponse {
            ok: true,
            ..TokenExchangeResponse::default()
        };
        assert_eq!(ExchangeOutcome::from_response(no_user), ExchangeOutcome::MissingToken);
    }

    #[test]
    fn outcome_success() {
        let outcome = ExchangeOutcome::from_response(success(Some("xoxp-1"), Some("U1")));
        assert_eq!(outcome.kind(), "success");
        assert_eq!(
            RedirectOutcome::from(outcome).fragment(),
            "slack_token=xoxp-1&slack_user_id=U1"
        );
    }

    #[test]
    fn outcome_success_without_user_id() {
        let outcome = ExchangeOutcome::from_response(success(Some("xoxp-1"), None));
        assert_eq!(
            RedirectOutcome::from(outcome).fragment(),
            "slack_token=xoxp-1&slack_user_id="
        );
    }

    #[test]
    fn transport_error_is_percent_encoded() {
        let outcome =
            ExchangeOutcome::from_result(Err(ExchangeError::Transport("network down".to_string())));
        assert_eq!(outcome, ExchangeOutcome::TransportError("network down".to_string()));
        assert_eq!(
            RedirectOutcome::from(outcome).fragment(),
            "slack_error=network%20down"
        );
    }

    #[test]
    fn fragment_values_cannot_inject_parameters() {
        let fragment = RedirectOutcome::Error {
            code: "a&slack_token=evil#x".to_string(),
        }
        .fragment();
        assert_eq!(fragment, "slack_error=a%26slack_token%3Devil%23x");
    }
}
