//! Polling settings for the bridge.
//!
//! Usually embedded as the `[bridge]` table of a host application's TOML
//! config; every field has a default so an empty table is valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::poll::PollPolicy;

/// Readiness-wait settings, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Spacing between capability checks.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Total time to wait for the capability before giving up.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    50
}
fn default_timeout_ms() -> u64 {
    5000
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    /// Apply `PRIVACY_*` environment variable overrides.
    ///
    /// | Variable | Field |
    /// |---|---|
    /// | `PRIVACY_POLL_INTERVAL_MS` | `poll_interval_ms` |
    /// | `PRIVACY_TIMEOUT_MS` | `timeout_ms` |
    ///
    /// Values that do not parse as an integer are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PRIVACY_POLL_INTERVAL_MS")
            && let Ok(ms) = v.parse::<u64>()
        {
            self.poll_interval_ms = ms;
        }
        if let Ok(v) = std::env::var("PRIVACY_TIMEOUT_MS")
            && let Ok(ms) = v.parse::<u64>()
        {
            self.timeout_ms = ms;
        }
    }

    /// Convert into a [`PollPolicy`].  A zero interval is raised to 1 ms so
    /// the wait always yields between checks.
    pub fn policy(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(self.poll_interval_ms.max(1)),
            Duration::from_millis(self.timeout_ms),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_poll_policy_defaults() {
        assert_eq!(BridgeConfig::default().policy(), PollPolicy::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let cfg: BridgeConfig = serde_json::from_str(r#"{"timeout_ms": 250}"#).unwrap();
        assert_eq!(cfg.poll_interval_ms, 50);
        assert_eq!(cfg.timeout_ms, 250);
    }

    #[test]
    fn zero_interval_is_clamped() {
        let cfg = BridgeConfig {
            poll_interval_ms: 0,
            timeout_ms: 100,
        };
        assert_eq!(cfg.policy().interval, Duration::from_millis(1));
    }

    #[test]
    fn env_overrides_apply_and_ignore_garbage() {
        // SAFETY: the only test in this crate touching these variables.
        unsafe {
            std::env::set_var("PRIVACY_POLL_INTERVAL_MS", "20");
            std::env::set_var("PRIVACY_TIMEOUT_MS", "soon");
        }
        let mut cfg = BridgeConfig::default();
        cfg.apply_env_overrides();
        assert_eq!(cfg.poll_interval_ms, 20);
        assert_eq!(cfg.timeout_ms, 5000);
        unsafe {
            std::env::remove_var("PRIVACY_POLL_INTERVAL_MS");
            std::env::remove_var("PRIVACY_TIMEOUT_MS");
        }
    }
}
