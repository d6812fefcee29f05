//! Transport setup errors.

use relaylogic_domain::error::CallError;

/// Errors raised while building or using the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The client could not be constructed.
    #[error("cannot build HTTP client")]
    Client(#[source] reqwest::Error),
}

/// Map a request failure onto the call taxonomy.
pub(crate) fn call_error(err: &reqwest::Error, timeout: std::time::Duration) -> CallError {
    if err.is_timeout() {
        return CallError::Timeout(timeout);
    }
    if let Some(status) = err.status() {
        return CallError::Status(status.as_u16());
    }
    CallError::Network(err.to_string())
}
