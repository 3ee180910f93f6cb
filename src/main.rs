//! Slack OAuth callback service

use std::process::ExitCode;

use clap::Parser;
use serde_json::json;
use tracing::{error, info};

use slack_callback::{
    cli::{Cli, Command},
    config::Config,
    service::CallbackServer,
    setup_tracing,
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = setup_tracing(&cli.log_level, cli.log_format.as_deref()) {
        eprintln!("Failed to setup tracing: {e}");
        return ExitCode::FAILURE;
    }

    match &cli.command {
        Some(Command::Check { json }) => run_check(&cli, *json),
        Some(Command::Serve) | None => run_server(&cli).await,
    }
}

/// Load configuration and apply CLI overrides
fn load_config(cli: &Cli) -> slack_callback::Result<Config> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(ref host) = cli.host {
        config.server.host.clone_from(host);
    }
    Ok(config)
}

/// Validate configuration without starting the server
fn run_check(cli: &Cli, as_json: bool) -> ExitCode {
    let config = match load_config(cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("❌ {e}");
            return ExitCode::FAILURE;
        }
    };
    let credentials = config.slack.resolve_credentials().is_some();

    if as_json {
        match check_report(&config, credentials) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("❌ Failed to serialize report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("✅ Configuration valid");
        println!("   Listen: {}:{}", config.server.host, config.server.port);
        println!("   Callback: {}", config.slack.callback_path);
        println!("   Token endpoint: {}", config.slack.token_endpoint);
        if credentials {
            println!("   Credentials: configured");
        } else {
            println!(
                "   Credentials: NOT configured (set SLACK_CLIENT_ID and SLACK_CLIENT_SECRET)"
            );
        }
    }

    if credentials {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// JSON form of the `check` report
fn check_report(config: &Config, credentials: bool) -> slack_callback::Result<String> {
    let report = json!({
        "valid": true,
        "listen": format!("{}:{}", config.server.host, config.server.port),
        "callback_path": config.slack.callback_path,
        "app_path": config.slack.app_path,
        "token_endpoint": config.slack.token_endpoint,
        "credentials_configured": credentials,
    });
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Run the callback server
async fn run_server(cli: &Cli) -> ExitCode {
    let config = match load_config(cli) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.server.port,
        "Starting Slack callback service"
    );

    let server = match CallbackServer::new(config) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create server: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = server.run().await {
        error!("Server error: {e}");
        return ExitCode::FAILURE;
    }

    info!("Shutdown complete");
    ExitCode::SUCCESS
}
