//! The fixed runtime skeleton every program embeds.

use relaylogic_domain::settings::CompileSettings;

/// Bumped whenever `assets/runtime.js` changes behaviour.
pub const RUNTIME_VERSION: u32 = 2;

const SKELETON: &str = include_str!("../../assets/runtime.js");

/// Skeleton text plus the constant header folded from the settings.
#[derive(Debug, Clone, Copy, Default)]
pub struct Template;

impl Template {
    #[must_use]
    pub fn skeleton(&self) -> &'static str {
        SKELETON
    }

    /// Constant declarations the skeleton expects, for `owner`.
    #[must_use]
    pub fn header(&self, owner: &str, settings: &CompileSettings) -> String {
        let presets = &settings.presets;
        let dispatch = &settings.dispatch;
        let debounce_ms = settings.debounce().as_millis();
        let constants = [
            ("NIGHT_START", settings.night.start_hour.to_string()),
            ("NIGHT_END", settings.night.end_hour.to_string()),
            ("LOW", presets.low.to_string()),
            ("MID", presets.mid.to_string()),
            ("HIGH", presets.high.to_string()),
            ("MAX", presets.max.to_string()),
            ("DEBOUNCE_MS", debounce_ms.to_string()),
            ("CALL_LIMIT", dispatch.concurrency_limit.to_string()),
            ("QUEUE_CAPACITY", dispatch.queue_capacity.to_string()),
            ("DRAIN_MS", dispatch.drain_interval_ms.to_string()),
            ("CALL_TIMEOUT_S", dispatch.call_timeout_secs.to_string()),
        ];

        let mut header = format!(
            "// Generated by relaylogic (runtime v{RUNTIME_VERSION}). Do not edit.\n\
             var OWNER = {};\n",
            quote(owner)
        );
        for (name, value) in constants {
            header.push_str(&format!("var {name} = {value};\n"));
        }
        header
    }
}

/// JavaScript string literal for `value`.
pub(crate) fn quote(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}
