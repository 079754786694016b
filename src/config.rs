// src/config.rs
// =============================================================================
// Runtime settings for the navigator.
//
// Values come from the CLI (see cli.rs), which falls back to environment
// variables through clap's `env` support:
//
//   GITHUB_TOKEN             access token (required for any remote call)
//   GITHUB_API_URL           API base, default https://api.github.com
//   REPO_NAV_TIMEOUT_SECS    per-request timeout, default 15
//   REPO_NAV_RETRY_UNIT_MS   one backoff "time unit", default 1000
//
// The CLI is the only place that reads the environment. Library users build
// `Settings` directly, starting from `Settings::default()`.
// =============================================================================

use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_RETRY_UNIT_MS: u64 = 1000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Everything needed to build a client and a retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub token: Option<String>,
    pub api_base: String,
    pub timeout: Duration,
    pub retry_unit: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            token: None,
            api_base: DEFAULT_API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_unit: Duration::from_millis(DEFAULT_RETRY_UNIT_MS),
        }
    }
}

impl Settings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            unit: self.retry_unit,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

/// How hard to retry when GitHub rate-limits us.
///
/// `unit` is the base delay; the fetcher doubles it per attempt (capped at
/// 8 units) while the file reader walks a fixed 1, 2, 4 table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub unit: Duration,
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            unit: Duration::from_millis(DEFAULT_RETRY_UNIT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps. Handy for tests and dry runs.
    pub fn immediate() -> Self {
        RetryPolicy {
            unit: Duration::ZERO,
            ..RetryPolicy::default()
        }
    }
}
