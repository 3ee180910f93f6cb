//! Slack OAuth v2 callback
//!
//! Completes the "Sign in with Slack" authorization code flow for a
//! single-page app:
//!
//! 1. Slack redirects the browser to the callback with `?code=...`
//! 2. The code is exchanged once at `oauth.v2.access`
//! 3. The browser is redirected back to the app with either
//!    `#slack_token=...&slack_user_id=...` or `#slack_error=...`
//!
//! Tokens are not stored or refreshed here, and the OAuth `state`
//! parameter is not checked.

mod callback;
mod exchange;
mod redirect;

pub use callback::{
    CallbackParams, CallbackState, MISSING_CODE, MISSING_HOST, NOT_CONFIGURED, handle_callback,
};
pub use exchange::{
    AuthedUser, ExchangeError, SlackTokenClient, TokenExchangeRequest, TokenExchangeResponse,
    TokenExchanger,
};
pub use redirect::{
    DEFAULT_PROTO, ExchangeOutcome, FORWARDED_PROTO_HEADER, NO_USER_TOKEN, Origin,
    RedirectOutcome,
};
