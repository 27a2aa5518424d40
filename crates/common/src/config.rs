//! Application configuration.

use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Battle, feed and leaderboard tuning.
    #[serde(default)]
    pub battle: BattleConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// What to do when only one half of a two-caption comparison persists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartialFailurePolicy {
    /// Restore the succeeded half so a comparison is all-or-nothing.
    #[default]
    Compensate,
    /// Keep the succeeded half and accept the asymmetric score.
    Tolerate,
}

/// Battle, feed and leaderboard tuning.
#[derive(Debug, Clone, Deserialize)]
pub struct BattleConfig {
    /// Hard ceiling on pairs generated for one session.
    #[serde(default = "default_max_pairs")]
    pub max_pairs: usize,
    /// Number of captions on the leaderboard.
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    /// Delay before a battle advances to the next pair, in milliseconds.
    #[serde(default = "default_battle_advance_ms")]
    pub battle_advance_ms: u64,
    /// Delay before the feed game advances, in milliseconds.
    #[serde(default = "default_feed_advance_ms")]
    pub feed_advance_ms: u64,
    /// Partial failure handling for two-sided comparisons.
    #[serde(default)]
    pub partial_failure: PartialFailurePolicy,
    /// Only serve images flagged as common-use.
    #[serde(default = "default_true")]
    pub common_use_only: bool,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_pairs: default_max_pairs(),
            leaderboard_size: default_leaderboard_size(),
            battle_advance_ms: default_battle_advance_ms(),
            feed_advance_ms: default_feed_advance_ms(),
            partial_failure: PartialFailurePolicy::default(),
            common_use_only: default_true(),
        }
    }
}

impl BattleConfig {
    /// Advance delay for two-caption battles.
    #[must_use]
    pub const fn battle_advance(&self) -> Duration {
        Duration::from_millis(self.battle_advance_ms)
    }

    /// Advance delay for the single-caption feed game.
    #[must_use]
    pub const fn feed_advance(&self) -> Duration {
        Duration::from_millis(self.feed_advance_ms)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_max_pairs() -> usize {
    300
}

const fn default_leaderboard_size() -> usize {
    100
}

const fn default_battle_advance_ms() -> u64 {
    1200
}

// 520ms plus the exit animation on the client side.
const fn default_feed_advance_ms() -> u64 {
    520
}

const fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `.env` (if present)
    /// 2. `config/default.toml`
    /// 3. `config/{environment}.toml` (based on `CAPTIONBATTLE_ENV`)
    /// 4. Environment variables with `CAPTIONBATTLE_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let env =
            std::env::var("CAPTIONBATTLE_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("CAPTIONBATTLE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(toml: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_battle_section_defaults() {
        let config = parse(
            r#"
            [server]
            [database]
            url = "postgres://localhost/captionbattle"
            "#,
        );

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.battle.max_pairs, 300);
        assert_eq!(config.battle.leaderboard_size, 100);
        assert_eq!(config.battle.battle_advance(), Duration::from_millis(1200));
        assert_eq!(config.battle.feed_advance(), Duration::from_millis(520));
        assert_eq!(config.battle.partial_failure, PartialFailurePolicy::Compensate);
        assert!(config.battle.common_use_only);
    }

    #[test]
    fn test_partial_failure_policy_parses_lowercase() {
        let config = parse(
            r#"
            [server]
            port = 8080
            [database]
            url = "postgres://localhost/captionbattle"
            [battle]
            partial_failure = "tolerate"
            max_pairs = 50
            "#,
        );

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.battle.partial_failure, PartialFailurePolicy::Tolerate);
        assert_eq!(config.battle.max_pairs, 50);
    }
}
