//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`RelayLogicError`] via `#[from]`. Fact adapter errors are boxed into the
//! [`Facts`](RelayLogicError::Facts) variant so the domain never names an IO
//! crate; transports report [`CallError`] directly.

use std::time::Duration;

/// Top-level error shared by every crate in the workspace.
#[derive(Debug, thiserror::Error)]
pub enum RelayLogicError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("dispatcher capacity exceeded")]
    Capacity(#[from] CapacityError),

    #[error("call failed")]
    Call(#[from] CallError),

    /// Loading or writing facts/programs failed (boxed adapter error).
    #[error("fact storage error")]
    Facts(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The runtime event loop is gone.
    #[error("controller runtime stopped")]
    RuntimeStopped,
}

/// Compile-time configuration errors.
///
/// Raised synchronously while compiling one device; they abort that device's
/// emission only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown device `{device}`")]
    UnknownDevice { device: String },

    #[error("device `{device}` is declared more than once")]
    DuplicateDevice { device: String },

    #[error("device {field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("device name `{device}` is not a plain file name")]
    InvalidDeviceName { device: String },

    #[error("brightness out of range: {value} (expected 0..=100)")]
    BrightnessOutOfRange { value: i64 },

    #[error("relay `{device}` cannot take a brightness")]
    RelayBrightness { device: String },

    #[error("malformed PIR triggers on `{device}` input {input}: {reason}")]
    MalformedPirTriggers {
        device: String,
        input: u8,
        reason: String,
    },

    #[error("trigger `{event}` on `{device}` input {input} is declared more than once")]
    OverlappingTrigger {
        device: String,
        input: u8,
        event: String,
    },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

/// The dispatcher's pending queue is full; the call was dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("too many calls in flight, dropping {call}")]
pub struct CapacityError {
    /// Human-readable description of the dropped call.
    pub call: String,
}

/// Failure of a single outbound call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("call timed out after {0:?} (wrong address or device offline?)")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(String),

    #[error("peer answered with status {0}")]
    Status(u16),

    #[error(transparent)]
    Capacity(#[from] CapacityError),
}
