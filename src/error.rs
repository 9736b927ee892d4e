//! Error types and handling
//!
//! Every failure the engine can report, and the uniform `{code, message}`
//! payload they are converted into at the service boundary.

use crate::constants::ERROR_DOMAIN;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Which bounded wait of a materialization ran out of time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaterializePhase {
    Fetch,
    Export,
}

impl fmt::Display for MaterializePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaterializePhase::Fetch => write!(f, "loading remote audio"),
            MaterializePhase::Export => write!(f, "exporting remote audio"),
        }
    }
}

/// Remote asset could not be fetched or converted within bounds
#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("Timeout {0}")]
    Timeout(MaterializePhase),

    #[error("Failed to load remote audio: {0}")]
    LoadFailed(String),

    #[error("Failed to export remote audio: {0}")]
    ExportFailed(String),
}

/// Engine-wide error type
#[derive(Error, Debug)]
pub enum WaveformError {
    #[error("Failed to decode audio source: {0}")]
    Decode(String),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),

    #[error("Couldn't read into buffer. {0}")]
    Read(String),

    #[error("{0}")]
    Range(String),

    #[error("{0}")]
    Merge(String),

    #[error("{0}")]
    Locator(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction worker failed: {0}")]
    Worker(String),
}

impl WaveformError {
    pub fn code(&self) -> &'static str {
        match self {
            WaveformError::Decode(_) => "DECODE_ERROR",
            WaveformError::Materialize(MaterializeError::Timeout(_)) => "MATERIALIZE_TIMEOUT",
            WaveformError::Materialize(MaterializeError::LoadFailed(_)) => {
                "MATERIALIZE_LOAD_FAILED"
            }
            WaveformError::Materialize(MaterializeError::ExportFailed(_)) => {
                "MATERIALIZE_EXPORT_FAILED"
            }
            WaveformError::Read(_) => "READ_ERROR",
            WaveformError::Range(_) => "RANGE_ERROR",
            WaveformError::Merge(_) => "MERGE_ERROR",
            WaveformError::Locator(_) => "LOCATOR_ERROR",
            WaveformError::Io(_) => "IO_ERROR",
            WaveformError::Worker(_) => "WORKER_ERROR",
        }
    }
}

impl From<hound::Error> for WaveformError {
    fn from(error: hound::Error) -> Self {
        match error {
            hound::Error::IoError(e) => WaveformError::Read(e.to_string()),
            other => WaveformError::Decode(other.to_string()),
        }
    }
}

impl From<claxon::Error> for WaveformError {
    fn from(error: claxon::Error) -> Self {
        match error {
            claxon::Error::IoError(e) => WaveformError::Read(e.to_string()),
            other => WaveformError::Decode(other.to_string()),
        }
    }
}

/// Error response handed to the caller's failure channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    pub domain: String,
}

impl From<WaveformError> for ErrorPayload {
    fn from(error: WaveformError) -> Self {
        ErrorPayload {
            code: error.code().to_string(),
            message: error.to_string(),
            domain: ERROR_DOMAIN.to_string(),
        }
    }
}

impl fmt::Display for ErrorPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for ErrorPayload {}

/// Result type alias using WaveformError
pub type WaveformResult<T> = Result<T, WaveformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_codes() {
        let payload = ErrorPayload::from(WaveformError::Range("too far".to_string()));
        assert_eq!(payload.code, "RANGE_ERROR");
        assert_eq!(payload.message, "too far");
        assert_eq!(payload.domain, ERROR_DOMAIN);

        let payload = ErrorPayload::from(WaveformError::from(MaterializeError::Timeout(
            MaterializePhase::Fetch,
        )));
        assert_eq!(payload.code, "MATERIALIZE_TIMEOUT");
        assert_eq!(payload.message, "Timeout loading remote audio");
    }

    #[test]
    fn test_materialize_codes() {
        let load = WaveformError::from(MaterializeError::LoadFailed("404".to_string()));
        assert_eq!(load.code(), "MATERIALIZE_LOAD_FAILED");

        let export = WaveformError::from(MaterializeError::ExportFailed("disk".to_string()));
        assert_eq!(export.code(), "MATERIALIZE_EXPORT_FAILED");
    }

    #[test]
    fn test_hound_io_error_is_read_error() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short");
        let err = WaveformError::from(hound::Error::IoError(io));
        assert_eq!(err.code(), "READ_ERROR");

        let err = WaveformError::from(hound::Error::Unsupported);
        assert_eq!(err.code(), "DECODE_ERROR");
    }

    #[test]
    fn test_payload_serializes_code_and_message() {
        let payload = ErrorPayload::from(WaveformError::Merge("no channel data".to_string()));
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["code"], "MERGE_ERROR");
        assert_eq!(json["message"], "no channel data");
    }
}
