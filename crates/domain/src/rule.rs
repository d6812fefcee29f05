//! Rule: "when input X on device D fires event E, set these outputs".

use serde::{Deserialize, Serialize};

use crate::brightness::BrightnessSpec;

/// Sets one output of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Target device name.
    pub device: String,
    /// Target output index.
    pub output: u8,
    pub brightness: BrightnessSpec,
}

impl Action {
    #[must_use]
    pub fn new(device: impl Into<String>, output: u8, brightness: BrightnessSpec) -> Self {
        Self {
            device: device.into(),
            output,
            brightness,
        }
    }
}

/// Daylight condition a trigger case can be restricted to.
///
/// Evaluated against the night window at fire time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ambient {
    /// Inside the night window.
    Dark,
    /// Outside the night window.
    Light,
}

impl Ambient {
    #[must_use]
    pub fn admits(self, night: bool) -> bool {
        match self {
            Self::Dark => night,
            Self::Light => !night,
        }
    }
}

impl std::fmt::Display for Ambient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dark => f.write_str("dark"),
            Self::Light => f.write_str("light"),
        }
    }
}

/// The actions to run for one event name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCase {
    /// Raw event name, e.g. `"single_push"`, `"toggle_on"`.
    pub trigger: String,
    /// Only fire when it is dark (or light); always fire when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<Ambient>,
    #[serde(default)]
    pub set: Vec<Action>,
}

impl TriggerCase {
    #[must_use]
    pub fn new(trigger: impl Into<String>, set: Vec<Action>) -> Self {
        Self {
            trigger: trigger.into(),
            when: None,
            set,
        }
    }

    /// Restrict this case to `ambient`.
    #[must_use]
    pub fn when(mut self, ambient: Ambient) -> Self {
        self.when = Some(ambient);
        self
    }
}

/// All trigger cases bound to one input of one device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Source device name.
    pub device: String,
    /// Source input index.
    pub input: u8,
    #[serde(default)]
    pub actions: Vec<TriggerCase>,
}

/// Edge reported by a motion-sensor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotionEdge {
    Active,
    Inactive,
}

impl MotionEdge {
    /// Map a declared trigger name to a motion edge.
    ///
    /// Accepts the canonical names and the `toggle_on`/`toggle_off` names the
    /// controllers report for a switch-type input.
    #[must_use]
    pub fn from_trigger(trigger: &str) -> Option<Self> {
        match trigger {
            "motion-active" | "toggle_on" => Some(Self::Active),
            "motion-inactive" | "toggle_off" => Some(Self::Inactive),
            _ => None,
        }
    }

    /// Value of the input's `state` flag for this edge.
    #[must_use]
    pub fn state(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for MotionEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("motion-active"),
            Self::Inactive => f.write_str("motion-inactive"),
        }
    }
}

/// Ordered collection of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Rules whose source is `device`, in declaration order.
    pub fn for_device<'a>(&'a self, device: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |rule| rule.device == device)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
