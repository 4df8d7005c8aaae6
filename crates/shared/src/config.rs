//! Application configuration management.

use serde::Deserialize;

use crate::types::money::DEFAULT_MONEY_SCALE;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Posting engine configuration.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Report configuration.
    #[serde(default)]
    pub reports: ReportConfig,
}

/// Posting engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How many times a commit-log append is attempted before the posting
    /// fails with a persistence error.
    #[serde(default = "default_commit_attempts")]
    pub commit_attempts: u32,
    /// Delay between commit attempts, in milliseconds.
    #[serde(default = "default_commit_backoff_ms")]
    pub commit_backoff_ms: u64,
    /// Maximum fractional digits accepted on monetary amounts.
    #[serde(default = "default_amount_scale")]
    pub amount_scale: u32,
    /// Chart-of-account code credited by unclassified deposits.
    #[serde(default = "default_deposit_account_code")]
    pub default_deposit_account_code: String,
    /// Number of entries returned alongside an account lookup.
    #[serde(default = "default_recent_entries_limit")]
    pub recent_entries_limit: usize,
    /// How long a completed idempotency key replays, in seconds.
    #[serde(default = "default_idempotency_ttl")]
    pub idempotency_key_ttl_secs: u64,
    /// Maximum number of completed idempotency keys remembered.
    #[serde(default = "default_idempotency_capacity")]
    pub idempotency_key_capacity: u64,
}

fn default_commit_attempts() -> u32 {
    3
}

fn default_commit_backoff_ms() -> u64 {
    10
}

fn default_amount_scale() -> u32 {
    DEFAULT_MONEY_SCALE
}

fn default_deposit_account_code() -> String {
    "3900".to_string()
}

fn default_recent_entries_limit() -> usize {
    10
}

fn default_idempotency_ttl() -> u64 {
    86_400 // 24 hours
}

fn default_idempotency_capacity() -> u64 {
    100_000
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            commit_attempts: default_commit_attempts(),
            commit_backoff_ms: default_commit_backoff_ms(),
            amount_scale: default_amount_scale(),
            default_deposit_account_code: default_deposit_account_code(),
            recent_entries_limit: default_recent_entries_limit(),
            idempotency_key_ttl_secs: default_idempotency_ttl(),
            idempotency_key_capacity: default_idempotency_capacity(),
        }
    }
}

/// Report configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Maximum number of cached trial balance reports.
    #[serde(default = "default_cache_capacity")]
    pub trial_balance_cache_capacity: u64,
    /// Time-to-live for cached trial balance reports, in seconds.
    #[serde(default = "default_cache_ttl")]
    pub trial_balance_cache_ttl_secs: u64,
}

fn default_cache_capacity() -> u64 {
    64
}

fn default_cache_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            trial_balance_cache_capacity: default_cache_capacity(),
            trial_balance_cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("HISAB").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
