use indicatif::{ProgressBar, ProgressStyle};
use reportshare_publish::{Phase, UploadState};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Terminal progress bar fed from the state store.
pub struct UploadProgressBar {
    pb: ProgressBar,
    task: JoinHandle<()>,
}

impl UploadProgressBar {
    /// Starts rendering every state the store publishes.
    pub fn spawn(mut rx: watch::Receiver<UploadState>) -> Self {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg:>10} [{bar:40.cyan/blue}] {pos}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let bar = pb.clone();
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let state = rx.borrow_and_update().clone();
                match state.phase {
                    Phase::Uploading => {
                        bar.set_message("uploading");
                        bar.set_position(percent(state.upload_progress));
                    }
                    Phase::Local | Phase::Uploaded | Phase::Error => break,
                }
            }
        });

        Self { pb, task }
    }

    /// Stops rendering and clears the bar.
    pub fn finish(self) {
        self.task.abort();
        self.pb.finish_and_clear();
    }
}

fn percent(fraction: f64) -> u64 {
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u64
}
