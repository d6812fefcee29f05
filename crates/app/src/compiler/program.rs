//! Program IR: the guarded blocks of one device, before rendering.

use relaylogic_domain::event::{InputEvent, TOGGLE_EVENT};
use relaylogic_domain::rule::{Ambient, MotionEdge};

use super::router::RoutedCalls;

/// Which event a block reacts to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventMatch {
    /// Raw event name (button inputs).
    Named(String),
    /// `toggle` with the state flag of the edge (motion-sensor inputs).
    Motion(MotionEdge),
}

impl std::fmt::Display for EventMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Motion(edge) => edge.fmt(f),
        }
    }
}

/// Input, event and daylight condition of a block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Guard {
    pub input: u8,
    pub event: EventMatch,
    pub when: Option<Ambient>,
}

impl Guard {
    /// Whether `event` fires this block, `night` being the current state of
    /// the night window.
    #[must_use]
    pub fn matches(&self, event: &InputEvent, night: bool) -> bool {
        if event.input_index() != Some(self.input) {
            return false;
        }
        if self.when.is_some_and(|ambient| !ambient.admits(night)) {
            return false;
        }
        match &self.event {
            EventMatch::Named(name) => event.event == *name,
            EventMatch::Motion(edge) => {
                event.event == TOGGLE_EVENT && event.state == Some(edge.state())
            }
        }
    }

    /// Whether this guard, declared before `other`, catches every event
    /// `other` accepts.
    #[must_use]
    pub fn shadows(&self, other: &Guard) -> bool {
        self.input == other.input
            && self.event == other.event
            && (self.when.is_none() || self.when == other.when)
    }

    /// Whether some event could satisfy both guards.
    #[must_use]
    pub fn overlaps(&self, other: &Guard) -> bool {
        self.shadows(other) || other.shadows(self)
    }
}

impl std::fmt::Display for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.when {
            Some(ambient) => write!(f, "{} when {ambient}", self.event),
            None => self.event.fmt(f),
        }
    }
}

/// A guard and the calls it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardedBlock {
    pub guard: Guard,
    pub body: RoutedCalls,
}

/// Every block of one device, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub owner: String,
    /// Address of the owner, used for its direct calls.
    pub address: String,
    pub blocks: Vec<GuardedBlock>,
}

impl Program {
    /// First block whose guard accepts `event`.
    #[must_use]
    pub fn first_match(&self, event: &InputEvent, night: bool) -> Option<&GuardedBlock> {
        self.blocks
            .iter()
            .find(|block| block.guard.matches(event, night))
    }
}
