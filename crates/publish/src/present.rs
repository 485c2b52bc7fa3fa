//! Terminal "present result" effect.

use tracing::{info, warn};

/// Shows a published result to the user. Must not fail.
pub trait ResultPresenter: Send + Sync {
    fn present(&self, url: &str);
}

/// Opens the result URL in the system browser.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPresenter;

impl ResultPresenter for BrowserPresenter {
    fn present(&self, url: &str) {
        match open::that_detached(url) {
            Ok(()) => info!(%url, "opened result in browser"),
            Err(e) => warn!(%url, error = %e, "failed to open result in browser"),
        }
    }
}

/// Leaves presentation to the caller (e.g. a CLI that prints the URL).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPresenter;

impl ResultPresenter for NoopPresenter {
    fn present(&self, _url: &str) {}
}
