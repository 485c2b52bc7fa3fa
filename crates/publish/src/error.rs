//! Publish error types.

/// Errors produced while publishing a report.
///
/// The orchestrator never returns these to its caller; they end up in
/// [`UploadState::last_error`](crate::UploadState::last_error).
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("compression failed: {0}")]
    Compression(#[source] std::io::Error),

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("transfer error: {0}")]
    Transfer(#[from] reportshare_transfer::TransferError),

    #[error("invalid result URL: {0}")]
    ResultUrl(String),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("cancelled")]
    Cancelled,
}
