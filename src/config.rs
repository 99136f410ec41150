//! Application configuration loaded from environment variables.

use crate::error::{AppError, Result};
use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Server bind address (host:port)
    pub bind_address: String,

    /// Log level
    pub log_level: String,

    /// CI server base URL (Jenkins-style REST API)
    pub ci_base_url: String,

    /// CI API username (optional, for basic auth)
    pub ci_username: Option<String>,

    /// CI API token (optional, paired with ci_username)
    pub ci_api_token: Option<String>,

    /// Per-request timeout for CI API calls in seconds
    pub ci_timeout_secs: u64,

    /// NAS transport mode: "local" or "smb"
    pub nas_mode: String,

    /// Root of the artifact tree on the NAS, e.g. "/release/product"
    pub nas_base_path: String,

    /// Local directory standing in for the NAS share (nas_mode = "local")
    pub nas_local_root: String,

    /// SMB host (nas_mode = "smb")
    pub smb_host: Option<String>,

    /// SMB share name
    pub smb_share: Option<String>,

    /// SMB username
    pub smb_username: Option<String>,

    /// SMB password
    pub smb_password: Option<String>,

    /// Per-operation timeout for NAS calls in seconds
    pub nas_timeout_secs: u64,

    /// Hard ceiling on a whole resolve call in seconds
    pub resolve_ceiling_secs: u64,

    /// Days of adjacent-date candidates when the CI timestamp is unavailable
    pub candidate_date_spread: i64,

    /// Shared secret for build-event webhook signatures (unset = skip verification)
    pub webhook_secret: Option<String>,

    /// Duplicate-event retention window in seconds
    pub dedup_ttl_secs: u64,

    /// Consecutive-failure alert threshold
    pub alert_consecutive_threshold: u32,

    /// Failure-rate alert threshold (0.0 - 1.0)
    pub alert_rate_threshold: f64,

    /// Minimum samples before the rate trigger may fire
    pub alert_min_samples: usize,

    /// Cooldown between alerts in minutes
    pub alert_cooldown_minutes: i64,

    /// Outbound webhook URL for alerts (optional)
    pub alert_webhook_url: Option<String>,

    /// Cached record retention in days
    pub retention_days: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| AppError::Config("DATABASE_URL not set".into()))?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            ci_base_url: env::var("CI_BASE_URL")
                .map_err(|_| AppError::Config("CI_BASE_URL not set".into()))?,
            ci_username: env::var("CI_USERNAME").ok(),
            ci_api_token: env::var("CI_API_TOKEN").ok(),
            ci_timeout_secs: parse_env("CI_TIMEOUT_SECS", 10),
            nas_mode: env::var("NAS_MODE").unwrap_or_else(|_| "smb".into()),
            nas_base_path: env::var("NAS_BASE_PATH")
                .unwrap_or_else(|_| "/release/product".into()),
            nas_local_root: env::var("NAS_LOCAL_ROOT").unwrap_or_else(|_| "/mnt/release".into()),
            smb_host: env::var("SMB_HOST").ok(),
            smb_share: env::var("SMB_SHARE").ok(),
            smb_username: env::var("SMB_USERNAME").ok(),
            smb_password: env::var("SMB_PASSWORD").ok(),
            nas_timeout_secs: parse_env("NAS_TIMEOUT_SECS", 8),
            resolve_ceiling_secs: parse_env("RESOLVE_CEILING_SECS", 30),
            candidate_date_spread: parse_env("CANDIDATE_DATE_SPREAD", 3),
            webhook_secret: env::var("WEBHOOK_SECRET").ok(),
            dedup_ttl_secs: parse_env("DEDUP_TTL_SECS", 300),
            alert_consecutive_threshold: parse_env("ALERT_CONSECUTIVE_THRESHOLD", 5),
            alert_rate_threshold: parse_env("ALERT_RATE_THRESHOLD", 0.8),
            alert_min_samples: parse_env("ALERT_MIN_SAMPLES", 5),
            alert_cooldown_minutes: parse_env("ALERT_COOLDOWN_MINUTES", 60),
            alert_webhook_url: env::var("ALERT_WEBHOOK_URL").ok(),
            retention_days: parse_env("RETENTION_DAYS", 90),
        })
    }

    /// Hard ceiling on a whole resolve call.
    pub fn resolve_ceiling(&self) -> Duration {
        Duration::from_secs(self.resolve_ceiling_secs)
    }

    /// Per-operation NAS timeout.
    pub fn nas_timeout(&self) -> Duration {
        Duration::from_secs(self.nas_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_to_default() {
        assert_eq!(parse_env("NOT_A_REAL_VAR_12345", 30u64), 30);
        assert_eq!(parse_env("NOT_A_REAL_VAR_12345", 0.8f64), 0.8);
    }
}
