//! In-memory chunked upload with progress reporting and cancellation.
//!
//! The publish flow hands a fully compressed payload to [`HttpUploader`],
//! which streams it to the report store in fixed-size chunks and resolves
//! with the content identifier the store assigned.

mod chunked;
mod http;
mod progress;
mod types;

pub use chunked::{Chunks, checksum_bytes, chunks};
pub use http::{CHECKSUM_HEADER, HttpUploader};
pub use progress::SpeedCalculator;
pub use types::{Chunk, UploadResponse, UploaderConfig};

/// Default chunk size: 256 KiB.
///
/// Small enough that progress ticks stay frequent for multi-megabyte reports.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("store returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("invalid store response: {0}")]
    InvalidResponse(String),

    #[error("cancelled")]
    Cancelled,
}
