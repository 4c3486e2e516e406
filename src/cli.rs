//! Command-line and environment configuration.
//!
//! Every option has an environment variable and a default, so a bare
//! `ai_news_relay` (e.g. from cron) picks everything up from the
//! environment or a `.env` file.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Everything from the environment
/// DISCORD_WEBHOOK_URL=https://discord.com/api/webhooks/... GEMINI_API_KEY=... ai_news_relay
///
/// # See what would be sent without touching history or the webhook
/// ai_news_relay --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Discord webhook URL; messages are skipped when unset
    #[arg(long, env = "DISCORD_WEBHOOK_URL")]
    pub webhook_url: Option<String>,

    /// Gemini API key used for translation
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = crate::translate::DEFAULT_MODEL)]
    pub gemini_model: String,

    /// Path of the processed-link history file
    #[arg(long, env = "HISTORY_FILE", default_value = "data/history.json")]
    pub history_file: PathBuf,

    /// Timeout in seconds for every HTTP request
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,

    /// Fetch and report new items without translating, recording or sending them
    #[arg(long)]
    pub dry_run: bool,
}

/// Process-wide settings, built once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub history_file: PathBuf,
    pub request_timeout: Duration,
    pub dry_run: bool,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            webhook_url: cli.webhook_url,
            gemini_api_key: cli.gemini_api_key,
            gemini_model: cli.gemini_model,
            history_file: cli.history_file,
            request_timeout: Duration::from_secs(cli.timeout_secs),
            dry_run: cli.dry_run,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_flags() {
        let cli = Cli::parse_from([
            "ai_news_relay",
            "--webhook-url",
            "https://discord.example/hook",
            "--gemini-api-key",
            "k",
            "--history-file",
            "/tmp/h.json",
            "--timeout-secs",
            "3",
            "--dry-run",
        ]);

        let config = Config::from(cli);
        assert_eq!(config.webhook_url.as_deref(), Some("https://discord.example/hook"));
        assert_eq!(config.gemini_api_key.as_deref(), Some("k"));
        assert_eq!(config.history_file, PathBuf::from("/tmp/h.json"));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert!(config.dry_run);
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["ai_news_relay"]).unwrap();
        assert_eq!(cli.timeout_secs, 10);
        assert!(!cli.dry_run);
        assert!(!cli.gemini_model.is_empty());
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
