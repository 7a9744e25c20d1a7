//! Runtime settings loaded once at startup.
//!
//! The token, prefix and database URL come from the environment (after `.env` is applied).
//! Tunables such as the daily reward range and ticket timeouts can be overridden from an
//! optional TOML file; a missing file means defaults, a malformed one is a configuration error.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::{path::Path, time::Duration};

/// Default command prefix when `PREFIX` is unset
pub const DEFAULT_PREFIX: &str = "!";

/// Default storage location when `DATABASE_URL` is unset
pub const DEFAULT_DATABASE_URL: &str = "sqlite://bot_database.db?mode=rwc";

/// Default location of the optional tunables file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Everything the bot needs besides the token.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Prefix for text commands
    pub prefix: String,
    /// `SeaORM` connection string; `postgres://` selects the networked backend
    pub database_url: String,
    /// Tunables from the TOML file
    pub tunables: Tunables,
}

/// Values that can be tuned from `config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Tunables {
    /// Economy settings
    pub economy: EconomyConfig,
    /// Ticket settings
    pub tickets: TicketConfig,
    /// Activity logging settings
    pub logging: LoggingConfig,
}

/// `[economy]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Smallest daily reward
    pub daily_min: i64,
    /// Largest daily reward
    pub daily_max: i64,
    /// Time between daily rewards for one member
    pub daily_cooldown_secs: u64,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            daily_min: 200,
            daily_max: 1000,
            daily_cooldown_secs: 86_400,
        }
    }
}

impl EconomyConfig {
    /// Daily reward range
    #[must_use]
    pub const fn daily_range(&self) -> std::ops::RangeInclusive<i64> {
        self.daily_min..=self.daily_max
    }

    /// Cooldown between daily rewards
    #[must_use]
    pub const fn daily_cooldown(&self) -> Duration {
        Duration::from_secs(self.daily_cooldown_secs)
    }
}

/// `[tickets]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TicketConfig {
    /// Delay between posting the transcript and deleting the channel
    pub close_grace_secs: u64,
    /// How long the close confirmation stays usable
    pub confirm_timeout_secs: u64,
    /// How long the "ticket opened" notice stays visible
    pub notice_ttl_secs: u64,
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            close_grace_secs: 5,
            confirm_timeout_secs: 60,
            notice_ttl_secs: 10,
        }
    }
}

impl TicketConfig {
    /// Grace period before a confirmed ticket is deleted
    #[must_use]
    pub const fn close_grace(&self) -> Duration {
        Duration::from_secs(self.close_grace_secs)
    }

    /// Lifetime of the close confirmation control
    #[must_use]
    pub const fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    /// Lifetime of the transient "opened" notice
    #[must_use]
    pub const fn notice_ttl(&self) -> Duration {
        Duration::from_secs(self.notice_ttl_secs)
    }
}

/// `[logging]` table
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Window during which a repeated delete/edit event is suppressed
    pub dedup_window_secs: u64,
    /// How many recent messages are remembered for delete logging
    pub recent_message_capacity: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dedup_window_secs: 5,
            recent_message_capacity: 1000,
        }
    }
}

/// Parses tunables from TOML text.
pub fn parse_tunables(contents: &str) -> Result<Tunables> {
    let tunables: Tunables = toml::from_str(contents)?;
    if tunables.economy.daily_min <= 0 || tunables.economy.daily_min > tunables.economy.daily_max {
        return Err(Error::Config {
            message: format!(
                "economy.daily_min ({}) must be positive and not above economy.daily_max ({})",
                tunables.economy.daily_min, tunables.economy.daily_max
            ),
        });
    }
    Ok(tunables)
}

/// Loads tunables from `path`, returning defaults if the file does not exist.
pub fn load_tunables<P: AsRef<Path>>(path: P) -> Result<Tunables> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::info!("No config file at {}, using defaults", path.display());
        return Ok(Tunables::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read {}: {e}", path.display()),
    })?;
    parse_tunables(&contents)
}

/// Builds the application configuration from the environment.
pub fn load_app_config() -> Result<AppConfig> {
    let prefix = std::env::var("PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string());
    if prefix.trim().is_empty() {
        return Err(Error::Config {
            message: "PREFIX cannot be empty".to_string(),
        });
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
    let config_path =
        std::env::var("BOT_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    Ok(AppConfig {
        prefix,
        database_url,
        tunables: load_tunables(config_path)?,
    })
}

/// Reads the bot token. Its absence is fatal.
pub fn load_token() -> Result<String> {
    std::env::var("DISCORD_TOKEN")
        .ok()
        .filter(|token| !token.trim().is_empty())
        .ok_or(Error::MissingToken)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let tunables = parse_tunables("").unwrap();
        assert_eq!(tunables.economy.daily_min, 200);
        assert_eq!(tunables.economy.daily_max, 1000);
        assert_eq!(tunables.economy.daily_cooldown(), Duration::from_secs(86_400));
        assert_eq!(tunables.tickets.close_grace(), Duration::from_secs(5));
        assert_eq!(tunables.tickets.confirm_timeout(), Duration::from_secs(60));
        assert_eq!(tunables.logging.dedup_window_secs, 5);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_str = r"
            [economy]
            daily_max = 5000

            [tickets]
            close_grace_secs = 2
        ";

        let tunables = parse_tunables(toml_str).unwrap();
        assert_eq!(tunables.economy.daily_min, 200, "unset keys keep defaults");
        assert_eq!(tunables.economy.daily_max, 5000);
        assert_eq!(tunables.tickets.close_grace_secs, 2);
        assert_eq!(tunables.tickets.notice_ttl_secs, 10);
    }

    #[test]
    fn test_parse_rejects_inverted_daily_range() {
        let toml_str = r"
            [economy]
            daily_min = 900
            daily_max = 100
        ";

        let result = parse_tunables(toml_str);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_parse_rejects_malformed_toml() {
        let result = parse_tunables("[economy\ndaily_min = ");
        assert!(matches!(result, Err(Error::Toml(_))));
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let tunables = load_tunables("definitely/not/here.toml").unwrap();
        assert_eq!(tunables.economy.daily_min, 200);
    }
}
