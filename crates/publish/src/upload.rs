//! Upload stage trait and the HTTP implementation.
//!
//! A session is opened before compression starts so that an abort can be
//! honored at any point of the attempt; the transfer itself only begins once
//! the compressed payload is ready.

use std::fmt;
use std::sync::Arc;

use reportshare_transfer::{HttpUploader, TransferError};
use tokio_util::sync::CancellationToken;

use crate::BoxFuture;
use crate::error::PublishError;
use crate::state::CancelHandle;

/// Progress callback handed to a [`Transfer`]; receives a fraction in `[0.0, 1.0]`.
pub type ProgressFn = Box<dyn Fn(f64) + Send + Sync>;

/// Content identifier (hash) assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentId(String);

impl ContentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ContentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The not-yet-started half of an upload session.
pub trait Transfer: Send {
    /// Sends `data`, calling `on_progress` zero or more times before resolving.
    fn start(
        self: Box<Self>,
        data: Vec<u8>,
        on_progress: ProgressFn,
    ) -> BoxFuture<'static, Result<ContentId, PublishError>>;
}

/// A cancellable upload, opened once per publish attempt.
pub struct UploadSession {
    pub handle: CancelHandle,
    pub transfer: Box<dyn Transfer>,
}

/// Source of upload sessions.
pub trait UploadStage: Send + Sync {
    fn begin_upload(&self) -> UploadSession;
}

/// Upload stage backed by [`HttpUploader`].
pub struct HttpUploadStage {
    uploader: Arc<HttpUploader>,
}

impl HttpUploadStage {
    pub fn new(uploader: HttpUploader) -> Self {
        Self {
            uploader: Arc::new(uploader),
        }
    }
}

impl UploadStage for HttpUploadStage {
    fn begin_upload(&self) -> UploadSession {
        let token = CancellationToken::new();
        UploadSession {
            handle: CancelHandle::new(token.clone()),
            transfer: Box::new(HttpTransfer {
                uploader: Arc::clone(&self.uploader),
                token,
            }),
        }
    }
}

struct HttpTransfer {
    uploader: Arc<HttpUploader>,
    token: CancellationToken,
}

impl Transfer for HttpTransfer {
    fn start(
        self: Box<Self>,
        data: Vec<u8>,
        on_progress: ProgressFn,
    ) -> BoxFuture<'static, Result<ContentId, PublishError>> {
        let HttpTransfer { uploader, token } = *self;
        Box::pin(async move {
            match uploader.upload(data, token, on_progress).await {
                Ok(id) => Ok(ContentId(id)),
                Err(TransferError::Cancelled) => Err(PublishError::Cancelled),
                Err(e) => Err(e.into()),
            }
        })
    }
}
