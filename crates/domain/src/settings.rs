//! Compile settings: constants folded into every generated program.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::brightness::Preset;
use crate::error::ConfigError;

/// Hardware ceiling on concurrent outbound calls per controller.
pub const MAX_CONCURRENT_CALLS: usize = 5;

/// Local-time window in which the night presets apply.
///
/// `start_hour > end_hour` wraps around midnight (the default 20–6 does).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NightWindow {
    pub start_hour: u8,
    pub end_hour: u8,
}

impl NightWindow {
    /// Whether `hour` (0–23, local) falls inside the window.
    #[must_use]
    pub fn contains(&self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

impl Default for NightWindow {
    fn default() -> Self {
        Self {
            start_hour: 20,
            end_hour: 6,
        }
    }
}

/// The four named brightness levels, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessPresets {
    pub low: u8,
    pub mid: u8,
    pub high: u8,
    pub max: u8,
}

impl BrightnessPresets {
    #[must_use]
    pub fn level(&self, preset: Preset) -> u8 {
        match preset {
            Preset::Low => self.low,
            Preset::Mid => self.mid,
            Preset::High => self.high,
            Preset::Max => self.max,
        }
    }
}

impl Default for BrightnessPresets {
    fn default() -> Self {
        Self {
            low: 20,
            mid: 50,
            high: 80,
            max: 100,
        }
    }
}

/// Limits for the runtime call dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchSettings {
    pub concurrency_limit: usize,
    pub queue_capacity: usize,
    pub drain_interval_ms: u64,
    pub call_timeout_secs: u64,
}

impl DispatchSettings {
    #[must_use]
    pub fn drain_interval(&self) -> Duration {
        Duration::from_millis(self.drain_interval_ms)
    }

    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            concurrency_limit: MAX_CONCURRENT_CALLS,
            queue_capacity: 40,
            drain_interval_ms: 200,
            call_timeout_secs: 10,
        }
    }
}

/// Everything the compiler needs besides the facts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileSettings {
    pub night: NightWindow,
    pub presets: BrightnessPresets,
    /// Delay between "motion stopped" and the off call.
    pub debounce_secs: u64,
    pub dispatch: DispatchSettings,
    /// Collapse both outputs of a dimmer into one `Light.SetAll` call.
    pub group_set_all: bool,
    /// Reject two blocks guarding the same input and event.
    pub strict_triggers: bool,
}

impl CompileSettings {
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSettings`] describing the first
    /// out-of-range value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidSettings(msg));
        if self.night.start_hour > 23 || self.night.end_hour > 23 {
            return invalid("night window hours must be within 0..=23".to_string());
        }
        for (name, level) in [
            ("low", self.presets.low),
            ("mid", self.presets.mid),
            ("high", self.presets.high),
            ("max", self.presets.max),
        ] {
            if level > 100 {
                return invalid(format!("preset `{name}` must be within 0..=100, got {level}"));
            }
        }
        let dispatch = &self.dispatch;
        if dispatch.concurrency_limit == 0 || dispatch.concurrency_limit > MAX_CONCURRENT_CALLS {
            return invalid(format!(
                "concurrency limit must be within 1..={MAX_CONCURRENT_CALLS}, got {}",
                dispatch.concurrency_limit
            ));
        }
        if dispatch.queue_capacity == 0 {
            return invalid("queue capacity must be at least 1".to_string());
        }
        if dispatch.drain_interval_ms == 0 {
            return invalid("drain interval must be non-zero".to_string());
        }
        if !(2..=10).contains(&dispatch.call_timeout_secs) {
            return invalid(format!(
                "call timeout must be within 2..=10 seconds, got {}",
                dispatch.call_timeout_secs
            ));
        }
        Ok(())
    }
}

impl Default for CompileSettings {
    fn default() -> Self {
        Self {
            night: NightWindow::default(),
            presets: BrightnessPresets::default(),
            debounce_secs: 300,
            dispatch: DispatchSettings::default(),
            group_set_all: false,
            strict_triggers: true,
        }
    }
}
