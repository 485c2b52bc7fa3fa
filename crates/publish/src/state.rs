//! Upload state model.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::PublishError;

/// Coarse lifecycle stage of the publish state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Nothing published, or the last result was dismissed.
    #[default]
    Local,
    /// An attempt is compressing or transferring.
    Uploading,
    /// The last attempt produced a result URL.
    Uploaded,
    /// The last attempt failed.
    Error,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Local => "local",
            Phase::Uploading => "uploading",
            Phase::Uploaded => "uploaded",
            Phase::Error => "error",
        };
        f.write_str(s)
    }
}

/// Capability that asks an in-flight transfer to stop.
///
/// Implementations must tolerate being called after the transfer finished
/// and being called more than once.
pub trait Cancel: Send + Sync {
    fn cancel(&self);
}

impl Cancel for tokio_util::sync::CancellationToken {
    fn cancel(&self) {
        tokio_util::sync::CancellationToken::cancel(self);
    }
}

struct FnCancel<F>(F);

impl<F: Fn() + Send + Sync> Cancel for FnCancel<F> {
    fn cancel(&self) {
        (self.0)();
    }
}

/// Shared handle to a [`Cancel`] capability, issued once per attempt.
///
/// Not part of [`UploadState`] equality.
#[derive(Clone)]
pub struct CancelHandle(Arc<dyn Cancel>);

impl CancelHandle {
    pub fn new(cancel: impl Cancel + 'static) -> Self {
        Self(Arc::new(cancel))
    }

    /// Wraps a closure as a cancellation handle.
    pub fn from_fn(f: impl Fn() + Send + Sync + 'static) -> Self {
        Self(Arc::new(FnCancel(f)))
    }

    pub fn cancel(&self) {
        self.0.cancel();
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancelHandle(..)")
    }
}

/// Current publish state, owned by the [`StateStore`](crate::StateStore).
///
/// The store keeps `cancellation`, `result_url` and `last_error` consistent
/// with `phase`: each is only populated in the phase that owns it.
#[derive(Debug, Clone, Default)]
pub struct UploadState {
    pub phase: Phase,
    /// Fraction in `[0.0, 1.0]`; meaningful only while uploading.
    pub upload_progress: f64,
    pub cancellation: Option<CancelHandle>,
    pub result_url: Option<String>,
    pub last_error: Option<Arc<PublishError>>,
}

impl PartialEq for UploadState {
    fn eq(&self, other: &Self) -> bool {
        self.phase == other.phase
            && self.upload_progress == other.upload_progress
            && self.result_url == other.result_url
            && self.last_error.as_ref().map(ToString::to_string)
                == other.last_error.as_ref().map(ToString::to_string)
    }
}

impl UploadState {
    /// Clears fields that `phase` does not own.
    pub(crate) fn normalize(&mut self) {
        if self.phase != Phase::Uploading {
            self.cancellation = None;
        }
        if self.phase != Phase::Uploaded {
            self.result_url = None;
        }
        if self.phase != Phase::Error {
            self.last_error = None;
        }
    }
}

/// Partial update merged into the state by [`StateStore::apply`](crate::StateStore::apply).
///
/// Only `Some` fields are written.
#[derive(Debug, Clone, Default)]
pub struct StateChange {
    pub phase: Option<Phase>,
    pub upload_progress: Option<f64>,
    pub cancellation: Option<CancelHandle>,
    pub result_url: Option<String>,
    pub last_error: Option<Arc<PublishError>>,
}

impl StateChange {
    pub fn phase(phase: Phase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }

    pub fn progress(fraction: f64) -> Self {
        Self {
            upload_progress: Some(fraction),
            ..Self::default()
        }
    }

    pub fn with_progress(mut self, fraction: f64) -> Self {
        self.upload_progress = Some(fraction);
        self
    }

    pub fn with_cancellation(mut self, handle: CancelHandle) -> Self {
        self.cancellation = Some(handle);
        self
    }

    pub fn with_result_url(mut self, url: String) -> Self {
        self.result_url = Some(url);
        self
    }

    pub fn with_error(mut self, error: Arc<PublishError>) -> Self {
        self.last_error = Some(error);
        self
    }

    pub(crate) fn merge_into(self, state: &mut UploadState) {
        if let Some(phase) = self.phase {
            state.phase = phase;
        }
        if let Some(progress) = self.upload_progress {
            state.upload_progress = progress;
        }
        if let Some(handle) = self.cancellation {
            state.cancellation = Some(handle);
        }
        if let Some(url) = self.result_url {
            state.result_url = Some(url);
        }
        if let Some(error) = self.last_error {
            state.last_error = Some(error);
        }
        state.normalize();
    }
}
