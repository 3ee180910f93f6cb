//! Command-line interface

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Slack OAuth callback service - exchanges the authorization code and hands
/// the user token back to the app in a URL fragment
#[derive(Parser, Debug)]
#[command(name = "slack-callback")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short, long, env = "SLACK_CALLBACK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "SLACK_CALLBACK_PORT")]
    pub port: Option<u16>,

    /// Host to bind to
    #[arg(long, env = "SLACK_CALLBACK_HOST")]
    pub host: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(
        long,
        default_value = "info",
        env = "SLACK_CALLBACK_LOG_LEVEL",
        global = true
    )]
    pub log_level: String,

    /// Log format (text, json)
    #[arg(long, env = "SLACK_CALLBACK_LOG_FORMAT", global = true)]
    pub log_format: Option<String>,

    /// Subcommand (optional - defaults to server mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the callback server (default)
    Serve,

    /// Validate configuration and report whether credentials are set
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_serve_mode() {
        let cli = Cli::try_parse_from(["slack-callback", "--port", "8080"]).unwrap();
        assert_eq!(cli.port, Some(8080));
        assert!(cli.command.is_none());
    }

    #[test]
    fn check_subcommand_parses() {
        let cli =
            Cli::try_parse_from(["slack-callback", "check", "--json", "--config", "cb.yaml"])
                .unwrap();
        assert!(matches!(cli.command, Some(Command::Check { json: true })));
        assert_eq!(cli.config, Some(PathBuf::from("cb.yaml")));
    }
}
