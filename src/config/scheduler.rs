//! Scheduler configuration structures.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Longest single timer wait; longer waits are split (one week).
pub const DEFAULT_MAX_SLEEP_CHUNK_SECS: u64 = 7 * 24 * 60 * 60;

/// Offset added to "now" when it is the cron reference instant.
///
/// Without it, asking for the next minute at hh:mm:00.xxx could yield the
/// current minute again.
pub const DEFAULT_REFERENCE_OFFSET_MS: u64 = 1000;

/// Root scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Longest single timer wait, in seconds.
    pub max_sleep_chunk_secs: u64,
    /// Offset added to "now" when computing the next run from the present.
    pub reference_offset_ms: u64,
    /// Map of group name to maximum concurrency.
    pub groups: HashMap<String, usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_sleep_chunk_secs: DEFAULT_MAX_SLEEP_CHUNK_SECS,
            reference_offset_ms: DEFAULT_REFERENCE_OFFSET_MS,
            groups: HashMap::new(),
        }
    }
}

impl SchedulerConfig {
    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Describes the first invalid value.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_sleep_chunk_secs == 0 {
            return Err("max_sleep_chunk_secs must be greater than 0".into());
        }
        for (name, concurrency) in &self.groups {
            if name.trim().is_empty() {
                return Err("group names must not be empty".into());
            }
            if *concurrency == 0 {
                return Err(format!("group `{name}` concurrency must be greater than 0"));
            }
        }
        Ok(())
    }

    /// Parse scheduler configuration from a JSON string and validate.
    ///
    /// # Errors
    ///
    /// Parse or validation failure.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read configuration from the environment, loading `.env` if present.
    ///
    /// Recognised variables: `SCHEDULER_MAX_SLEEP_CHUNK_SECS`,
    /// `SCHEDULER_REFERENCE_OFFSET_MS` and `SCHEDULER_GROUPS`
    /// (`name=n,name=n`). Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Unparseable or invalid values.
    pub fn from_env() -> Result<Self, String> {
        // a missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Unparseable or invalid values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(raw) = lookup("SCHEDULER_MAX_SLEEP_CHUNK_SECS") {
            cfg.max_sleep_chunk_secs = raw
                .trim()
                .parse()
                .map_err(|e| format!("SCHEDULER_MAX_SLEEP_CHUNK_SECS: {e}"))?;
        }
        if let Some(raw) = lookup("SCHEDULER_REFERENCE_OFFSET_MS") {
            cfg.reference_offset_ms = raw
                .trim()
                .parse()
                .map_err(|e| format!("SCHEDULER_REFERENCE_OFFSET_MS: {e}"))?;
        }
        if let Some(raw) = lookup("SCHEDULER_GROUPS") {
            cfg.groups = parse_groups(&raw)?;
        }
        cfg.validate()?;
        Ok(cfg)
    }

    /// Longest single timer wait.
    #[must_use]
    pub const fn max_sleep_chunk(&self) -> Duration {
        Duration::from_secs(self.max_sleep_chunk_secs)
    }

    /// Offset added to "now" as a cron reference.
    #[must_use]
    pub const fn reference_offset(&self) -> Duration {
        Duration::from_millis(self.reference_offset_ms)
    }
}

/// Parse `name=n,name=n` into a group concurrency map.
///
/// # Errors
///
/// Malformed entries.
pub fn parse_groups(raw: &str) -> Result<HashMap<String, usize>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (name, concurrency) = entry
                .split_once('=')
                .ok_or_else(|| format!("group entry `{entry}` must look like name=n"))?;
            let concurrency = concurrency
                .trim()
                .parse()
                .map_err(|e| format!("group `{}` concurrency: {e}", name.trim()))?;
            Ok((name.trim().to_string(), concurrency))
        })
        .collect()
}
