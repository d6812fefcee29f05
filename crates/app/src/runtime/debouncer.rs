//! Motion debouncer: one idle/active/pending-off machine per sensor input.
//!
//! Timers are represented by [`TimerToken`]s. Every arm draws a fresh
//! generation, so a fire whose token is no longer current is stale and
//! ignored.

use std::collections::BTreeMap;

use relaylogic_domain::rule::MotionEdge;

/// Debounce phase of one input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MotionPhase {
    #[default]
    Idle,
    Active,
    /// Motion stopped; the off timer is running.
    PendingOff,
}

/// Identity of one armed off timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken {
    pub input: u8,
    pub generation: u64,
}

/// Side effects the caller must carry out after an edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Transition {
    /// Fire the calls of this edge's block now.
    pub issue: Option<MotionEdge>,
    /// Cancel this timer (always reported before `arm`).
    pub cancel: Option<TimerToken>,
    /// Start the off timer with this token.
    pub arm: Option<TimerToken>,
}

#[derive(Debug, Clone, Copy, Default)]
struct InputState {
    phase: MotionPhase,
    timer: Option<TimerToken>,
}

/// Per-input debounce state.
#[derive(Debug, Default)]
pub struct MotionDebouncer {
    inputs: BTreeMap<u8, InputState>,
    generation: u64,
}

impl MotionDebouncer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one sensor edge.
    pub fn motion(&mut self, input: u8, edge: MotionEdge) -> Transition {
        let state = self.inputs.entry(input).or_default();
        let mut transition = Transition::default();

        match (state.phase, edge) {
            (MotionPhase::Idle, MotionEdge::Active) => {
                transition.issue = Some(MotionEdge::Active);
                state.phase = MotionPhase::Active;
            }
            (MotionPhase::Active, MotionEdge::Active) | (MotionPhase::Idle, MotionEdge::Inactive) => {}
            (MotionPhase::PendingOff, MotionEdge::Active) => {
                transition.cancel = state.timer.take();
                state.phase = MotionPhase::Active;
            }
            (MotionPhase::Active | MotionPhase::PendingOff, MotionEdge::Inactive) => {
                transition.cancel = state.timer.take();
                self.generation += 1;
                let token = TimerToken {
                    input,
                    generation: self.generation,
                };
                state.timer = Some(token);
                state.phase = MotionPhase::PendingOff;
                transition.arm = Some(token);
            }
        }
        transition
    }

    /// Handle an off-timer expiry. Returns `true` when the off calls must be
    /// issued; stale tokens return `false` and change nothing.
    pub fn timer_fired(&mut self, token: TimerToken) -> bool {
        let Some(state) = self.inputs.get_mut(&token.input) else {
            return false;
        };
        if state.timer != Some(token) {
            return false;
        }
        state.timer = None;
        state.phase = MotionPhase::Idle;
        true
    }

    #[must_use]
    pub fn phase(&self, input: u8) -> MotionPhase {
        self.inputs
            .get(&input)
            .map(|state| state.phase)
            .unwrap_or_default()
    }

    /// Currently armed timer of `input`.
    #[must_use]
    pub fn pending_timer(&self, input: u8) -> Option<TimerToken> {
        self.inputs.get(&input).and_then(|state| state.timer)
    }
}
