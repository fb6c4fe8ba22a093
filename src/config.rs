//! Configuration for JustShake
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

use crate::session::MAX_SESSION_TTL;

/// Largest list page a chat keyboard can hold next to its navigation rows
pub const MAX_PAGE_SIZE: u64 = 90;

/// JustShake - cocktail catalog API and Telegram bot
#[derive(Parser, Debug, Clone)]
#[command(name = "justshake")]
#[command(about = "Cocktail catalog with a JSON API and a Telegram bot front-end")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "justshake")]
    pub mongodb_db: String,

    /// Telegram bot token. The bot is not started without one.
    #[arg(long, env = "BOT_TOKEN")]
    pub bot_token: Option<String>,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Long-poll timeout for getUpdates, in seconds
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value = "30")]
    pub poll_timeout_secs: u64,

    /// Cocktails per page in the bot's list views
    #[arg(long, env = "PAGE_SIZE", default_value = "10")]
    pub page_size: u64,

    /// Maximum cocktails shown for a name search
    #[arg(long, env = "SEARCH_LIMIT", default_value = "20")]
    pub search_limit: u64,

    /// How long the bot waits for a search text after prompting, in seconds
    #[arg(long, env = "SESSION_TTL_SECS", default_value = "600")]
    pub session_ttl_secs: u64,

    /// Bound on every store call made for one request, in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Development mode: fall back to in-memory stores when MongoDB is unreachable
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_timeout(&self) -> Duration {
        Duration::from_secs(self.poll_timeout_secs)
    }

    /// Bot token, ignoring blank values
    pub fn bot_token(&self) -> Option<&str> {
        self.bot_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.page_size == 0 {
            return Err("PAGE_SIZE must be greater than zero".to_string());
        }

        if self.page_size > MAX_PAGE_SIZE {
            return Err(format!("PAGE_SIZE must not exceed {}", MAX_PAGE_SIZE));
        }

        if self.search_limit == 0 {
            return Err("SEARCH_LIMIT must be greater than zero".to_string());
        }

        if self.session_ttl_secs == 0 {
            return Err("SESSION_TTL_SECS must be greater than zero".to_string());
        }

        if self.session_ttl_secs > MAX_SESSION_TTL.as_secs() {
            return Err(format!(
                "SESSION_TTL_SECS must not exceed {}",
                MAX_SESSION_TTL.as_secs()
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let mut argv = vec!["justshake"];
        argv.extend_from_slice(args);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults_are_valid() {
        let args = parse(&[]);
        assert_eq!(args.page_size, 10);
        assert_eq!(args.session_ttl(), Duration::from_secs(600));
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_sizes() {
        assert!(parse(&["--page-size", "0"]).validate().is_err());
        assert!(parse(&["--page-size", "91"]).validate().is_err());
        assert!(parse(&["--search-limit", "0"]).validate().is_err());
        assert!(parse(&["--session-ttl-secs", "0"]).validate().is_err());
        assert!(parse(&["--session-ttl-secs", "86400"]).validate().is_ok());
        assert!(parse(&["--session-ttl-secs", "86401"]).validate().is_err());
        assert!(parse(&["--session-ttl-secs", "18446744073709551615"])
            .validate()
            .is_err());
    }

    #[test]
    fn test_blank_bot_token_disables_bot() {
        assert_eq!(parse(&["--bot-token", "  "]).bot_token(), None);
        assert_eq!(parse(&["--bot-token", "123:abc"]).bot_token(), Some("123:abc"));
    }
}
