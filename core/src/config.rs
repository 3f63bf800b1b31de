//! Suite configuration: service hosts, logging switches and poll budget.
//!
//! Values come from environment variables (`Config::from_env`) or a JSON
//! document (`Config::from_json`); anything missing falls back to defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};
use crate::retry::{Backoff, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Account service base URL (default: "http://localhost:5051")
    #[serde(default = "default_account_host")]
    pub account_host: String,

    /// MailHog base URL (default: "http://localhost:5025")
    #[serde(default = "default_mailhog_host")]
    pub mailhog_host: String,

    /// Environment name attached to log output (default: "local")
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Log account service traffic (default: true)
    #[serde(default = "default_true")]
    pub account_log: bool,

    /// Log MailHog traffic; listings are large and noisy (default: false)
    #[serde(default)]
    pub mailhog_log: bool,

    /// Reject non-2xx responses inside the REST layer (default: false)
    #[serde(default)]
    pub raise_for_status: bool,

    /// Page size of mailbox listings (default: 50)
    #[serde(default = "default_mailbox_limit")]
    pub mailbox_limit: u32,

    #[serde(default)]
    pub retry: RetrySettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    Linear,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    /// Mailbox polls before giving up (default: 10)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay in milliseconds (default: 1000)
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Delay growth (default: linear)
    #[serde(default = "default_backoff")]
    pub backoff: BackoffKind,
}

fn default_account_host() -> String {
    "http://localhost:5051".to_string()
}

fn default_mailhog_host() -> String {
    "http://localhost:5025".to_string()
}

fn default_environment() -> String {
    "local".to_string()
}

fn default_true() -> bool {
    true
}

fn default_mailbox_limit() -> u32 {
    50
}

fn default_max_attempts() -> u32 {
    10
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_backoff() -> BackoffKind {
    BackoffKind::Linear
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account_host: default_account_host(),
            mailhog_host: default_mailhog_host(),
            environment: default_environment(),
            account_log: true,
            mailhog_log: false,
            raise_for_status: false,
            mailbox_limit: default_mailbox_limit(),
            retry: RetrySettings::default(),
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff: default_backoff(),
        }
    }
}

impl RetrySettings {
    pub fn policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.base_delay_ms);
        let backoff = match self.backoff {
            BackoffKind::Fixed => Backoff::Fixed(base),
            BackoffKind::Linear => Backoff::Linear(base),
        };
        RetryPolicy::new(self.max_attempts, backoff)
    }
}

impl Config {
    /// Load configuration from `DM_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let backoff = match get_env("DM_RETRY_BACKOFF").as_deref() {
            Some("fixed") => BackoffKind::Fixed,
            Some("linear") => BackoffKind::Linear,
            _ => defaults.retry.backoff,
        };

        Self {
            account_host: get_env_or("DM_ACCOUNT_HOST", &defaults.account_host),
            mailhog_host: get_env_or("DM_MAILHOG_HOST", &defaults.mailhog_host),
            environment: get_env_or("DM_ENV", &defaults.environment),
            account_log: get_env_flag("DM_ACCOUNT_LOG", defaults.account_log),
            mailhog_log: get_env_flag("DM_MAILHOG_LOG", defaults.mailhog_log),
            raise_for_status: get_env_flag("DM_RAISE_FOR_STATUS", defaults.raise_for_status),
            mailbox_limit: get_env_parse("DM_MAILBOX_LIMIT", defaults.mailbox_limit),
            retry: RetrySettings {
                max_attempts: get_env_parse("DM_RETRY_MAX_ATTEMPTS", defaults.retry.max_attempts),
                base_delay_ms: get_env_parse("DM_RETRY_BASE_DELAY_MS", defaults.retry.base_delay_ms),
                backoff,
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ApiError::Config(e.to_string()))
    }
}

/// Read an environment variable, treating empty values as unset.
pub fn get_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_env_or(name: &str, default: &str) -> String {
    get_env(name).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset or
/// unparsable.
pub fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    match get_env(name) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Environment variable '{}' has invalid value '{}', using default", name, raw);
            default
        }),
        None => default,
    }
}

/// `true/1/yes/on` and `false/0/no/off`, case-insensitive.
pub fn get_env_flag(name: &str, default: bool) -> bool {
    get_env(name)
        .and_then(|value| parse_flag(&value))
        .unwrap_or(default)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
