//! HTTP upload primitive.
//!
//! Streams a payload to the report store as a single `POST` with a chunked
//! body, reporting fractional progress as each chunk is handed to the
//! transport. Cancellation is cooperative via [`CancellationToken`].

use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::chunked::{checksum_bytes, chunks};
use crate::progress::SpeedCalculator;
use crate::types::{UploadResponse, UploaderConfig};
use crate::TransferError;

/// Header carrying the SHA-256 hex digest of the whole payload.
pub const CHECKSUM_HEADER: &str = "x-content-sha256";

/// Uploads payloads to the report store.
pub struct HttpUploader {
    http: reqwest::Client,
    config: UploaderConfig,
}

impl HttpUploader {
    /// Creates an uploader for the given store endpoint.
    pub fn new(config: UploaderConfig) -> Result<Self, TransferError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        // Tests talk to loopback servers; ignore any proxy from the environment.
        #[cfg(test)]
        {
            builder = builder.no_proxy();
        }
        Ok(Self {
            http: builder.build()?,
            config,
        })
    }

    /// Uploads `data` and returns the content identifier assigned by the store.
    ///
    /// `on_progress` receives the fraction of the payload handed to the
    /// transport so far; values are non-decreasing and end at 1.0. An empty
    /// payload reports 1.0 once before the request is sent.
    pub async fn upload<F>(
        &self,
        data: Vec<u8>,
        cancel: CancellationToken,
        on_progress: F,
    ) -> Result<String, TransferError>
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        if cancel.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        let checksum = checksum_bytes(&data);
        let parts = chunks(Bytes::from(data), self.config.chunk_size);
        let total = parts.total_len();
        let speed = Arc::new(SpeedCalculator::new(None, None));

        if total == 0 {
            on_progress(1.0);
        }

        let body_speed = Arc::clone(&speed);
        let body = futures_util::stream::iter(parts).map(move |chunk| {
            let sent = chunk.end();
            body_speed.record(sent);
            on_progress(sent as f64 / total as f64);
            debug!(
                sent,
                total,
                eta = ?body_speed.eta(total - sent),
                "chunk queued"
            );
            Ok::<Bytes, std::io::Error>(chunk.data)
        });

        let mut request = self
            .http
            .post(&self.config.endpoint)
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, total.to_string())
            .header(CHECKSUM_HEADER, checksum.as_str())
            .body(reqwest::Body::wrap_stream(body));
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(endpoint = %self.config.endpoint, "upload cancelled");
                return Err(TransferError::Cancelled);
            }
            result = send(request) => result?,
        };

        info!(
            bytes = total,
            bytes_per_sec = speed.bytes_per_second() as u64,
            id = %response.id,
            "upload complete"
        );
        Ok(response.id)
    }
}

async fn send(request: reqwest::RequestBuilder) -> Result<UploadResponse, TransferError> {
    let resp = request.send().await?;
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        return Err(TransferError::Api {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).into_owned(),
        });
    }

    let parsed: UploadResponse = serde_json::from_slice(&body)
        .map_err(|e| TransferError::InvalidResponse(e.to_string()))?;
    if parsed.id.trim().is_empty() {
        return Err(TransferError::InvalidResponse("empty content id".into()));
    }
    Ok(parsed)
}
