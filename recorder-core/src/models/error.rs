use thiserror::Error;

/// Errors that can occur while configuring, running or finalizing a recording.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    #[error("permission denied")]
    PermissionDenied,

    #[error("device not available")]
    DeviceNotAvailable,

    #[error("configuration failed: {0}")]
    ConfigurationFailed(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("capture failed: {0}")]
    CaptureFailed(String),

    #[error("encoding failed: {0}")]
    EncodingFailed(String),

    #[error("storage error: {0}")]
    StorageError(String),

    #[error("cancelled")]
    Cancelled,

    #[error("unknown error: {0}")]
    Unknown(String),
}

impl CaptureError {
    pub(crate) fn storage(context: &str, err: impl std::fmt::Display) -> Self {
        Self::StorageError(format!("{}: {}", context, err))
    }
}
