//! Input event: what a controller reports when one of its inputs changes.
//!
//! Controllers report `{ "component": "input:N", "event": "...", "state": bool? }`.
//! Button-type inputs carry an event name such as `single_push`; switch-type
//! inputs (motion sensors) report `toggle` with the new `state`.

use serde::{Deserialize, Serialize};

/// Event name reported for switch-type inputs.
pub const TOGGLE_EVENT: &str = "toggle";

/// One notification from an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Component id, e.g. `"input:0"`.
    pub component: String,
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<bool>,
}

impl InputEvent {
    /// A named event (button push, long push, …) on input `index`.
    #[must_use]
    pub fn named(index: u8, event: impl Into<String>) -> Self {
        Self {
            component: component_id(index),
            event: event.into(),
            state: None,
        }
    }

    /// A switch-type state change on input `index`.
    #[must_use]
    pub fn toggle(index: u8, state: bool) -> Self {
        Self {
            component: component_id(index),
            event: TOGGLE_EVENT.to_string(),
            state: Some(state),
        }
    }

    /// Input index parsed from the component id, if it names an input.
    #[must_use]
    pub fn input_index(&self) -> Option<u8> {
        self.component.strip_prefix("input:")?.parse().ok()
    }
}

/// An input event delivered some time after the previous one, as listed in a
/// dry-run replay file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStep {
    /// Delay since the previous step, in milliseconds.
    #[serde(default)]
    pub after_ms: u64,
    #[serde(flatten)]
    pub event: InputEvent,
}

/// Component id for input `index`.
#[must_use]
pub fn component_id(index: u8) -> String {
    format!("input:{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_input_index_from_component() {
        assert_eq!(InputEvent::named(3, "single_push").input_index(), Some(3));
        let other = InputEvent {
            component: "switch:0".to_string(),
            event: "toggle".to_string(),
            state: None,
        };
        assert_eq!(other.input_index(), None);
    }

    #[test]
    fn should_deserialize_controller_notification() {
        let event: InputEvent = serde_json::from_value(serde_json::json!({
            "component": "input:1",
            "event": "toggle",
            "state": true
        }))
        .unwrap();
        assert_eq!(event, InputEvent::toggle(1, true));
    }

    #[test]
    fn should_deserialize_replay_step_with_default_delay() {
        let steps: Vec<ReplayStep> = serde_json::from_value(serde_json::json!([
            {"component": "input:0", "event": "single_push"},
            {"after_ms": 1500, "component": "input:1", "event": "toggle", "state": false}
        ]))
        .unwrap();
        assert_eq!(steps[0].after_ms, 0);
        assert_eq!(steps[0].event, InputEvent::named(0, "single_push"));
        assert_eq!(steps[1].after_ms, 1500);
        assert_eq!(steps[1].event, InputEvent::toggle(1, false));
    }
}
