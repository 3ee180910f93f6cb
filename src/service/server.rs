//! Callback server

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use super::router::create_router;
use crate::config::Config;
use crate::slack::{CallbackState, SlackTokenClient};
use crate::{Error, Result};

/// Slack OAuth callback server
pub struct CallbackServer {
    /// Configuration
    config: Config,
    /// State shared by every request
    state: Arc<CallbackState>,
}

impl CallbackServer {
    /// Create a new server. Credentials are resolved here, once.
    pub fn new(config: Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("slack-callback/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let exchanger = Arc::new(SlackTokenClient::new(
            http_client,
            config.slack.token_endpoint.clone(),
        ));

        let credentials = config.slack.resolve_credentials();
        if credentials.is_none() {
            warn!("Slack credentials not configured - callbacks will answer 500");
        }

        let state = Arc::new(CallbackState {
            credentials,
            exchanger,
            callback_path: config.slack.callback_path.clone(),
            app_path: config.slack.app_path.clone(),
        });

        Ok(Self { config, state })
    }

    /// Address the server binds to
    pub fn addr(&self) -> Result<SocketAddr> {
        let ip = self
            .config
            .server
            .host
            .parse()
            .map_err(|e| Error::Config(format!("Invalid host: {e}")))?;
        Ok(SocketAddr::new(ip, self.config.server.port))
    }

    /// Run until Ctrl+C or SIGTERM
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr()?).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` completes
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = create_router(Arc::clone(&self.state));
        let local_addr = listener.local_addr()?;

        info!(
            addr = %local_addr,
            callback = %self.state.callback_path,
            token_endpoint = %self.config.slack.token_endpoint,
            credentials = self.state.credentials.is_some(),
            "Slack callback server listening"
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| Error::Internal(e.to_string()))?;

        info!("Server stopped");
        Ok(())
    }
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}
