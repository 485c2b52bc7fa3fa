//! reportshare entry point.

mod config;
mod progress;

use std::future::Future;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use reportshare_publish::{
    BrowserPresenter, Collaborators, Compression, HttpUploadStage, JsonSerializer, NoopPresenter,
    Phase, PublishOrchestrator, ResultPresenter, StateStore, TracingAnalytics, UrlState,
    ViewerUrlBuilder, compressor_for,
};
use reportshare_transfer::{HttpUploader, UploaderConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::PublishConfig;
use crate::progress::UploadProgressBar;

/// Exit code for a run interrupted with Ctrl-C.
const EXIT_ABORTED: u8 = 130;

/// Log filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn,reportshare=info";

#[derive(Parser)]
#[command(name = "reportshare", about = "Publish a report and print its share URL")]
struct Cli {
    /// Report file (JSON)
    report: PathBuf,

    /// Store endpoint that accepts uploads
    #[arg(long)]
    upload_url: Option<String>,

    /// Viewer base URL for the result link
    #[arg(long)]
    viewer_url: Option<String>,

    /// Compression codec: gzip or zstd
    #[arg(long)]
    compression: Option<Compression>,

    /// Print the URL without opening a browser
    #[arg(long)]
    no_open: bool,

    /// View state carried into the result URL (repeatable)
    #[arg(long = "state", value_name = "KEY=VALUE", value_parser = parse_state_pair)]
    state: Vec<(String, String)>,

    /// Config file (default: ~/.config/reportshare/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective settings back to the config file
    #[arg(long)]
    save_config: bool,
}

fn parse_state_pair(s: &str) -> Result<(String, String), String> {
    UrlState::parse_pair(s).ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))
}

impl Cli {
    fn resolve_config(&self) -> Result<PublishConfig> {
        let mut cfg = match &self.config {
            Some(path) => PublishConfig::load_from(path)?,
            None => PublishConfig::load()?,
        };
        if let Some(url) = &self.upload_url {
            cfg.upload_url = url.clone();
        }
        if let Some(url) = &self.viewer_url {
            cfg.viewer_url = url.clone();
        }
        if let Some(compression) = self.compression {
            cfg.compression = compression;
        }
        if self.no_open {
            cfg.open_result = false;
        }
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let cfg = cli.resolve_config()?;
    if cfg.upload_url.trim().is_empty() {
        bail!("no upload URL configured (use --upload-url or the config file)");
    }
    if cli.save_config {
        let written = match &cli.config {
            Some(path) => cfg.save_to(path).map(|()| path.clone())?,
            None => cfg.save()?,
        };
        info!(path = %written.display(), "configuration saved");
    }

    let raw = std::fs::read(&cli.report)
        .with_context(|| format!("failed to read {}", cli.report.display()))?;
    let report: serde_json::Value = serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not valid JSON", cli.report.display()))?;
    let url_state: UrlState = cli.state.iter().cloned().collect();

    let uploader = HttpUploader::new(UploaderConfig {
        endpoint: cfg.upload_url.clone(),
        token: cfg.api_token.clone(),
        chunk_size: cfg.chunk_size,
        timeout: cfg.timeout(),
    })
    .context("failed to build HTTP client")?;

    let presenter: Arc<dyn ResultPresenter> = if cfg.open_result {
        Arc::new(BrowserPresenter)
    } else {
        Arc::new(NoopPresenter)
    };

    let store = Arc::new(StateStore::new());
    let orchestrator = PublishOrchestrator::new(
        Arc::clone(&store),
        Collaborators {
            serializer: Arc::new(JsonSerializer),
            compressor: compressor_for(cfg.compression, cfg.compression_level),
            uploader: Arc::new(HttpUploadStage::new(uploader)),
            url_builder: Arc::new(ViewerUrlBuilder::new(cfg.viewer_url.as_str())),
            analytics: Arc::new(TracingAnalytics),
            presenter,
        },
    );

    info!(
        report = %cli.report.display(),
        bytes = raw.len(),
        compression = ?cfg.compression,
        endpoint = %cfg.upload_url,
        "publishing report"
    );

    let bar = UploadProgressBar::spawn(store.subscribe());
    let end = drive(
        orchestrator.attempt_publish(&report, &url_state),
        ctrl_c,
        || orchestrator.abort(),
    )
    .await;
    bar.finish();

    if end == RunEnd::ForcedExit {
        warn!("second interrupt, exiting before the attempt wound down");
        eprintln!("publish aborted");
        return Ok(ExitCode::from(EXIT_ABORTED));
    }

    let state = store.read().state;
    Ok(match state.phase {
        Phase::Uploaded => {
            println!("{}", state.result_url.unwrap_or_default());
            ExitCode::SUCCESS
        }
        Phase::Error => {
            let reason = state
                .last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "unknown error".into());
            eprintln!("publish failed: {reason}");
            ExitCode::FAILURE
        }
        Phase::Local => {
            eprintln!("publish aborted");
            ExitCode::from(EXIT_ABORTED)
        }
        Phase::Uploading => {
            warn!("attempt ended while still uploading");
            ExitCode::FAILURE
        }
    })
}

/// How [`drive`] returned.
#[derive(Debug, PartialEq, Eq)]
enum RunEnd {
    /// The attempt ran to completion, possibly after an abort.
    Settled,
    /// A second interrupt arrived while the aborted attempt was still busy.
    ForcedExit,
}

/// Runs `attempt`, calling `abort` on the first interrupt.
///
/// Stages such as compression cannot observe an abort until they finish, so
/// a second interrupt stops waiting for the attempt.
async fn drive<F, I, Fut>(attempt: F, mut interrupted: I, abort: impl FnOnce()) -> RunEnd
where
    F: Future<Output = ()>,
    I: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    tokio::pin!(attempt);
    tokio::select! {
        () = &mut attempt => return RunEnd::Settled,
        () = interrupted() => abort(),
    }
    tokio::select! {
        () = &mut attempt => RunEnd::Settled,
        () = interrupted() => RunEnd::ForcedExit,
    }
}

/// Resolves on Ctrl-C; never resolves if the signal handler cannot be installed.
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}
