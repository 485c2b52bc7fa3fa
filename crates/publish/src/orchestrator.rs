//! Publish orchestrator: sequences serialize, compress, upload and share.
//!
//! Each attempt is tagged with a generation minted by the [`StateStore`].
//! After every suspension point the attempt re-reads the store and quietly
//! gives up unless the phase is still `Uploading` and the generation is
//! still its own. That single check covers both an explicit [`abort`] and
//! supersession by a newer attempt.
//!
//! Progress ticks are written without that check. A superseded transfer can
//! therefore briefly move the progress bar of its successor; it can never
//! reach a terminal phase.
//!
//! [`abort`]: PublishOrchestrator::abort

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::analytics::{AnalyticsSink, PublishEvent};
use crate::compress::Compressor;
use crate::error::PublishError;
use crate::present::ResultPresenter;
use crate::serializer::Serializer;
use crate::state::{Phase, StateChange, UploadState};
use crate::store::StateStore;
use crate::upload::{ContentId, ProgressFn, Transfer, UploadStage};
use crate::url::{UrlBuilder, UrlState};

/// External stages the orchestrator drives.
pub struct Collaborators<A: ?Sized> {
    pub serializer: Arc<dyn Serializer<A>>,
    pub compressor: Arc<dyn Compressor>,
    pub uploader: Arc<dyn UploadStage>,
    pub url_builder: Arc<dyn UrlBuilder>,
    pub analytics: Arc<dyn AnalyticsSink>,
    pub presenter: Arc<dyn ResultPresenter>,
}

impl<A: ?Sized> Clone for Collaborators<A> {
    fn clone(&self) -> Self {
        Self {
            serializer: Arc::clone(&self.serializer),
            compressor: Arc::clone(&self.compressor),
            uploader: Arc::clone(&self.uploader),
            url_builder: Arc::clone(&self.url_builder),
            analytics: Arc::clone(&self.analytics),
            presenter: Arc::clone(&self.presenter),
        }
    }
}

/// Drives publish attempts for artifacts of type `A`.
pub struct PublishOrchestrator<A: ?Sized> {
    store: Arc<StateStore>,
    collaborators: Collaborators<A>,
}

impl<A: ?Sized> PublishOrchestrator<A> {
    pub fn new(store: Arc<StateStore>, collaborators: Collaborators<A>) -> Self {
        Self {
            store,
            collaborators,
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> UploadState {
        self.store.read().state
    }

    /// Publishes `artifact`, superseding any attempt still in flight.
    ///
    /// Never fails: errors land in the `Error` phase. Resolves once this
    /// attempt reached a terminal phase or was abandoned.
    pub async fn attempt_publish(&self, artifact: &A, url_state: &UrlState) {
        let session = self.collaborators.uploader.begin_upload();
        let generation = self.store.begin_attempt(
            StateChange::phase(Phase::Uploading)
                .with_progress(0.0)
                .with_cancellation(session.handle),
        );
        info!(generation, "publish attempt started");
        self.collaborators
            .analytics
            .emit(&PublishEvent::Started { generation });

        let result = match self.run(generation, artifact, session.transfer).await {
            Ok(Some(id)) => self
                .collaborators
                .url_builder
                .build_result_url(&id, url_state),
            Ok(None) => return,
            Err(e) => Err(e),
        };
        self.finish(generation, result);
    }

    /// Stops the in-flight attempt, if any, and returns to `Local`.
    pub fn abort(&self) {
        let snapshot = self.store.read();
        let was_uploading = snapshot.state.phase == Phase::Uploading;

        if let Some(handle) = snapshot.state.cancellation {
            handle.cancel();
        }

        let change = StateChange::phase(Phase::Local);
        self.store.apply(if was_uploading {
            change.with_progress(0.0)
        } else {
            change
        });

        info!(generation = snapshot.generation, was_uploading, "publish aborted");
        self.collaborators.analytics.emit(&PublishEvent::Aborted);
    }

    /// Dismisses a terminal result so the user can start over.
    pub fn reset_upload_state(&self) {
        self.store.apply(StateChange::phase(Phase::Local));
        debug!("upload state reset");
    }

    async fn run(
        &self,
        generation: u64,
        artifact: &A,
        transfer: Box<dyn Transfer>,
    ) -> Result<Option<ContentId>, PublishError> {
        let raw = self.collaborators.serializer.serialize(artifact)?;
        let raw_len = raw.len();
        let compressed = self.collaborators.compressor.compress(raw).await?;

        if !self.is_current(generation) {
            debug!(generation, "attempt abandoned after compression");
            return Ok(None);
        }

        debug!(
            generation,
            raw_len,
            compressed_len = compressed.len(),
            "starting transfer"
        );
        let store = Arc::clone(&self.store);
        let on_progress: ProgressFn =
            Box::new(move |fraction| store.apply(StateChange::progress(fraction)));
        let id = transfer.start(compressed, on_progress).await?;
        Ok(Some(id))
    }

    /// Single exit for every attempt outcome.
    fn finish(&self, generation: u64, result: Result<String, PublishError>) {
        if !self.is_current(generation) {
            match &result {
                Ok(url) => debug!(generation, %url, "stale attempt result dropped"),
                Err(e) => debug!(generation, error = %e, "stale attempt failure dropped"),
            }
            return;
        }

        match result {
            Ok(url) => {
                self.store
                    .apply(StateChange::phase(Phase::Uploaded).with_result_url(url.clone()));
                info!(generation, %url, "report published");
                self.collaborators.analytics.emit(&PublishEvent::Succeeded {
                    generation,
                    url: url.clone(),
                });
                self.collaborators.presenter.present(&url);
            }
            Err(e) => {
                warn!(generation, error = %e, "publish failed");
                let error = Arc::new(e);
                self.store
                    .apply(StateChange::phase(Phase::Error).with_error(Arc::clone(&error)));
                self.collaborators.analytics.emit(&PublishEvent::Failed {
                    generation,
                    error: error.to_string(),
                });
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        let snapshot = self.store.read();
        snapshot.state.phase == Phase::Uploading && snapshot.generation == generation
    }
}
