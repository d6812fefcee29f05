//! Brightness: what an action asks an output to do.
//!
//! The rule files carry brightness as either a number or a string tag. Both
//! are parsed into the closed [`BrightnessSpec`] enum; an unrecognised tag
//! fails parsing instead of falling through to some default.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Named brightness level, folded to a percentage at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Low,
    Mid,
    High,
    Max,
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => f.write_str("low"),
            Self::Mid => f.write_str("mid"),
            Self::High => f.write_str("high"),
            Self::Max => f.write_str("max"),
        }
    }
}

/// Brightness requested by a single action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawBrightness", into = "RawBrightness")]
pub enum BrightnessSpec {
    /// Literal percentage. Range is checked by the resolver, not the parser.
    Level(i64),
    On,
    Off,
    /// Mid preset inside the night window, high preset outside it.
    Adaptive,
    /// Low preset inside the night window, off outside it.
    NightOnlyLow,
    Preset(Preset),
}

impl BrightnessSpec {
    /// Whether the action switches the output off.
    #[must_use]
    pub fn is_off(&self) -> bool {
        matches!(self, Self::Off)
    }
}

impl fmt::Display for BrightnessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "{level}"),
            Self::On => f.write_str("on"),
            Self::Off => f.write_str("off"),
            Self::Adaptive => f.write_str("adaptive"),
            Self::NightOnlyLow => f.write_str("night-only-low"),
            Self::Preset(preset) => preset.fmt(f),
        }
    }
}

/// A brightness tag outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "unknown brightness `{0}`: expected a number, \"on\", \"off\", \"adaptive\", \
     \"night-only-low\", \"low\", \"mid\", \"high\" or \"max\""
)]
pub struct UnknownBrightness(pub String);

impl FromStr for BrightnessSpec {
    type Err = UnknownBrightness;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spec = match s.trim() {
            "on" => Self::On,
            "off" => Self::Off,
            "adaptive" => Self::Adaptive,
            "night-only-low" | "nightonlylow" => Self::NightOnlyLow,
            "low" | "lowLight" => Self::Preset(Preset::Low),
            "mid" | "midLight" => Self::Preset(Preset::Mid),
            "high" | "highLight" => Self::Preset(Preset::High),
            "max" | "maxLight" => Self::Preset(Preset::Max),
            other => match other.parse::<i64>() {
                Ok(level) => Self::Level(level),
                Err(_) => return Err(UnknownBrightness(other.to_string())),
            },
        };
        Ok(spec)
    }
}

/// Wire shape: a bare number or a string tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawBrightness {
    Level(i64),
    Tag(String),
}

impl TryFrom<RawBrightness> for BrightnessSpec {
    type Error = UnknownBrightness;

    fn try_from(raw: RawBrightness) -> Result<Self, Self::Error> {
        match raw {
            RawBrightness::Level(level) => Ok(Self::Level(level)),
            RawBrightness::Tag(tag) => tag.parse(),
        }
    }
}

impl From<BrightnessSpec> for RawBrightness {
    fn from(spec: BrightnessSpec) -> Self {
        match spec {
            BrightnessSpec::Level(level) => Self::Level(level),
            other => Self::Tag(other.to_string()),
        }
    }
}
