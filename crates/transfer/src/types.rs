use std::time::Duration;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A slice of the upload payload.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Byte offset within the payload.
    pub offset: u64,
    /// Chunk contents (shares the payload allocation).
    pub data: Bytes,
}

impl Chunk {
    /// Offset one past the last byte of this chunk.
    pub fn end(&self) -> u64 {
        self.offset + self.data.len() as u64
    }
}

/// Settings for [`HttpUploader`](crate::HttpUploader).
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    /// Store endpoint that accepts the payload via `POST`.
    pub endpoint: String,
    /// Optional bearer token sent with every upload.
    pub token: Option<String>,
    /// Chunk size for the streaming body (0 = default).
    pub chunk_size: usize,
    /// Whole-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl UploaderConfig {
    /// Config with defaults for everything but the endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: None,
            chunk_size: crate::DEFAULT_CHUNK_SIZE,
            timeout: None,
        }
    }
}

/// Body returned by the store after a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Content identifier (hash) of the stored payload.
    pub id: String,
}
