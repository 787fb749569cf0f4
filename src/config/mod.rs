use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, ConfigError, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    pub discord: DiscordConfig,
    pub database: DatabaseConfig,
    pub resolver: ResolverConfig,
    pub governance: GovernanceConfig,
    pub cache: CacheConfig,
}

impl BotConfig {
    pub fn load() -> Result<Self> {
        let configured_path = std::env::var("COUNCILLOR_CONFIG")
            .unwrap_or_else(|_| "config/councillor.toml".to_string());
        assert!(
            !configured_path.is_empty(),
            "Configuration path must be non-empty"
        );
        assert!(
            configured_path.len() < 4096,
            "Configuration path length exceeds hard limit"
        );

        let mut builder = Config::builder()
            .add_source(File::new(&configured_path, FileFormat::Toml).required(true));

        if let Ok(env_override) = std::env::var("COUNCILLOR_ENV") {
            if !env_override.is_empty() {
                let env_file = format!("config/councillor.{}.toml", env_override);
                if Path::new(&env_file).exists() {
                    builder = builder.add_source(File::new(&env_file, FileFormat::Toml));
                }
            }
        }

        let settings = builder
            .build()
            .map_err(|err| map_config_error(err, &configured_path))?;
        let config: Self = settings
            .try_deserialize()
            .context("Failed to deserialize bot configuration")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        assert!(
            !self.discord.token.is_empty(),
            "Discord bot token must be specified"
        );
        assert!(
            !self.database.url.is_empty(),
            "Database URL must be specified"
        );
        assert!(
            self.database.max_connections >= self.database.min_connections.unwrap_or(1),
            "Max connections must be >= min connections"
        );
        assert!(
            self.database.max_connections <= 128,
            "Connection pool oversized"
        );
        self.resolver.ensure_bounds()?;
        self.governance.ensure_bounds()?;
        self.cache.ensure_bounds()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    pub token: String,
    /// Bot operator; passes every authorization check.
    pub admin_user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    #[serde(default = "ResolverConfig::default_run_hour")]
    pub run_hour: u32,
    #[serde(default = "ResolverConfig::default_run_minute")]
    pub run_minute: u32,
    /// When set, the daily wall-clock wait is replaced by a short poll.
    #[serde(default)]
    pub debug_mode: bool,
    #[serde(default = "ResolverConfig::default_debug_poll_interval_ms")]
    pub debug_poll_interval_ms: u64,
}

impl ResolverConfig {
    pub fn debug_poll_interval(&self) -> Duration {
        assert!(
            self.debug_poll_interval_ms >= 100,
            "Debug poll interval must be >= 100ms"
        );
        assert!(
            self.debug_poll_interval_ms <= 3_600_000,
            "Debug poll interval must be <= one hour"
        );
        Duration::from_millis(self.debug_poll_interval_ms)
    }

    pub fn ensure_bounds(&self) -> Result<()> {
        assert!(self.run_hour < 24, "Resolver run hour out of range");
        assert!(self.run_minute < 60, "Resolver run minute out of range");
        assert!(
            self.debug_poll_interval_ms >= 100,
            "Debug poll interval must be >= 100ms"
        );
        Ok(())
    }

    const fn default_run_hour() -> u32 {
        0
    }

    const fn default_run_minute() -> u32 {
        5
    }

    const fn default_debug_poll_interval_ms() -> u64 {
        30_000
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GovernanceConfig {
    #[serde(default = "GovernanceConfig::default_days_requirement")]
    pub default_days_requirement: i32,
    #[serde(default = "GovernanceConfig::default_max_councillors")]
    pub default_max_councillors: i32,
}

impl GovernanceConfig {
    pub fn ensure_bounds(&self) -> Result<()> {
        assert!(
            self.default_days_requirement >= 0,
            "Days requirement cannot be negative"
        );
        assert!(
            self.default_days_requirement <= 3_650,
            "Days requirement exceeds defensive limit"
        );
        assert!(
            self.default_max_councillors >= 1,
            "Council must have at least one seat"
        );
        assert!(
            self.default_max_councillors <= 100,
            "Council seat count exceeds defensive limit"
        );
        Ok(())
    }

    const fn default_days_requirement() -> i32 {
        180
    }

    const fn default_max_councillors() -> i32 {
        9
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub guilds_max_capacity: u64,
    pub guilds_ttl_seconds: u64,
}

impl CacheConfig {
    fn ensure_bounds(&self) -> Result<()> {
        assert!(
            self.guilds_max_capacity >= 10,
            "Guild cache capacity must be at least 10"
        );
        assert!(
            self.guilds_ttl_seconds >= 1,
            "Guild cache TTL must be positive"
        );
        assert!(
            self.guilds_ttl_seconds <= 86_400,
            "Guild cache TTL cannot exceed one day"
        );
        Ok(())
    }
}

fn map_config_error(err: ConfigError, path: &str) -> ConfigError {
    match err {
        ConfigError::NotFound(_) => ConfigError::NotFound(path.to_string()),
        other => other,
    }
}
