//! Host runtime for compiled programs.
//!
//! [`CallDispatcher`] and [`MotionDebouncer`] are pure state machines with
//! the same semantics as the routines in `assets/runtime.js`;
//! [`ControllerRuntime`] drives them from a tokio task.

pub mod controller;
pub mod debouncer;
pub mod dispatcher;

pub use controller::{Continuation, ControllerHandle, ControllerRuntime, RuntimeStats};
pub use debouncer::{MotionDebouncer, MotionPhase, TimerToken, Transition};
pub use dispatcher::{Admission, CallDispatcher, DrainTick, Rejected};
