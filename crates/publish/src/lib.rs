//! Report publish flow: serialize, compress, upload, share URL.
//!
//! This crate implements the **publish state machine** that turns an
//! in-memory report into a shareable link. It owns no UI; callers drive it
//! through [`PublishOrchestrator`] and observe it through [`StateStore`].
//!
//! # Pipeline
//!
//! 1. **Begin**: mint a generation, open a cancellable upload session
//! 2. **Serialize**: artifact to bytes
//! 3. **Compress**: gzip or zstd off the async executor
//! 4. **Upload**: stream to the store with progress ticks
//! 5. **Share**: build the viewer URL and present it
//!
//! Every step after a suspension point re-checks the store's phase and
//! generation, so an abort or a newer attempt silently retires older ones.

pub mod analytics;
pub mod compress;
pub mod error;
pub mod orchestrator;
pub mod present;
pub mod serializer;
pub mod state;
pub mod store;
pub mod upload;
pub mod url;

use std::future::Future;
use std::pin::Pin;

pub use analytics::{AnalyticsSink, ChannelAnalytics, NoopAnalytics, PublishEvent, TracingAnalytics};
pub use compress::{Compression, Compressor, GzipCompressor, ZstdCompressor, compressor_for};
pub use error::PublishError;
pub use orchestrator::{Collaborators, PublishOrchestrator};
pub use present::{BrowserPresenter, NoopPresenter, ResultPresenter};
pub use serializer::{JsonSerializer, Serializer};
pub use state::{Cancel, CancelHandle, Phase, StateChange, UploadState};
pub use store::{StateStore, StoreSnapshot};
pub use upload::{ContentId, HttpUploadStage, ProgressFn, Transfer, UploadSession, UploadStage};
pub use url::{SHARE_KEYS, UrlBuilder, UrlState, ViewerUrlBuilder};

/// Boxed future returned by collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
