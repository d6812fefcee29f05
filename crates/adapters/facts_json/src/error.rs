//! Fact-file error type wrapping IO and JSON errors.

use std::path::PathBuf;

use relaylogic_domain::error::RelayLogicError;

/// Errors originating from the fact files or the output directory.
#[derive(Debug, thiserror::Error)]
pub enum FactsError {
    /// Reading or writing a file failed.
    #[error("cannot access {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A fact file is not valid JSON or does not match the expected shape.
    #[error("invalid facts in {path}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl From<FactsError> for RelayLogicError {
    fn from(err: FactsError) -> Self {
        Self::Facts(Box::new(err))
    }
}
