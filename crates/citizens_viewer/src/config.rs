//! Viewer runtime configuration. Defaults match the reference
//! deployment; every knob can be overridden programmatically or from
//! the environment. Malformed env values fall back to the default
//! rather than aborting startup.

use std::time::Duration;

use crate::motion::MotionTuning;

pub const DEFAULT_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 33;
pub const DEFAULT_DETAIL_REFRESH_DEBOUNCE_SECS: f64 = 0.5;
pub const DEFAULT_RECONNECT_BASE_SECS: f64 = 1.5;
pub const DEFAULT_RECONNECT_CAP_SECS: f64 = 30.0;

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    /// HTTP base of the simulation server, no trailing slash needed.
    pub api_base: String,
    /// Target cadence of the advance/render loop.
    pub frame_interval: Duration,
    pub motion: MotionTuning,
    /// Quiet window before an open detail view refetches after a
    /// relevant event.
    pub detail_refresh_debounce_secs: f64,
    /// First reconnect delay after a socket drop; doubles per failure.
    pub reconnect_base_secs: f64,
    pub reconnect_cap_secs: f64,
    /// Disabled in tests and one-shot diagnostics.
    pub reconnect_enabled: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            frame_interval: Duration::from_millis(DEFAULT_FRAME_INTERVAL_MS),
            motion: MotionTuning::default(),
            detail_refresh_debounce_secs: DEFAULT_DETAIL_REFRESH_DEBOUNCE_SECS,
            reconnect_base_secs: DEFAULT_RECONNECT_BASE_SECS,
            reconnect_cap_secs: DEFAULT_RECONNECT_CAP_SECS,
            reconnect_enabled: true,
        }
    }
}

impl ViewerConfig {
    /// Default config with `CITIZENS_*` env overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(api_base) = std::env::var("CITIZENS_API_BASE") {
            if !api_base.trim().is_empty() {
                config.api_base = api_base.trim().trim_end_matches('/').to_string();
            }
        }
        if let Some(ms) = env_u64("CITIZENS_FRAME_INTERVAL_MS") {
            if ms > 0 {
                config.frame_interval = Duration::from_millis(ms);
            }
        }
        if let Some(secs) = env_f64("CITIZENS_DETAIL_DEBOUNCE_SECS") {
            if secs >= 0.0 {
                config.detail_refresh_debounce_secs = secs;
            }
        }
        if let Some(secs) = env_f64("CITIZENS_RECONNECT_BASE_SECS") {
            if secs > 0.0 {
                config.reconnect_base_secs = secs;
            }
        }
        if let Some(flag) = env_bool("CITIZENS_RECONNECT") {
            config.reconnect_enabled = flag;
        }
        config
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_reconnect(mut self, enabled: bool) -> Self {
        self.reconnect_enabled = enabled;
        self
    }

    /// Reconnect delay for the n-th consecutive failure (0-based),
    /// exponential with a ceiling.
    pub fn reconnect_delay(&self, failures: u32) -> Duration {
        let exp = failures.min(16);
        let secs = self.reconnect_base_secs * f64::powi(2.0, exp as i32);
        Duration::from_secs_f64(secs.min(self.reconnect_cap_secs))
    }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok()?.trim().parse().ok()
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok()?.trim().parse().ok()
}

fn env_bool(key: &str) -> Option<bool> {
    match std::env::var(key).ok()?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_deployment() {
        let config = ViewerConfig::default();
        assert_eq!(config.api_base, "http://127.0.0.1:8000");
        assert_eq!(config.detail_refresh_debounce_secs, 0.5);
        assert!(config.reconnect_enabled);
    }

    #[test]
    fn reconnect_delay_doubles_and_caps() {
        let config = ViewerConfig::default();
        assert_eq!(config.reconnect_delay(0), Duration::from_secs_f64(1.5));
        assert_eq!(config.reconnect_delay(1), Duration::from_secs_f64(3.0));
        assert_eq!(config.reconnect_delay(2), Duration::from_secs_f64(6.0));
        assert_eq!(config.reconnect_delay(10), Duration::from_secs_f64(30.0));
        // Huge failure counts must not overflow the exponent.
        assert_eq!(config.reconnect_delay(1000), Duration::from_secs_f64(30.0));
    }

    #[test]
    fn builder_overrides_apply() {
        let config = ViewerConfig::default()
            .with_api_base("http://sim.internal:9000")
            .with_reconnect(false);
        assert_eq!(config.api_base, "http://sim.internal:9000");
        assert!(!config.reconnect_enabled);
    }
}
