//! Lifecycle notifications.
//!
//! Sinks are fire-and-forget: `emit` never blocks the attempt and never fails.

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Publish lifecycle event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PublishEvent {
    Started { generation: u64 },
    Succeeded { generation: u64, url: String },
    Failed { generation: u64, error: String },
    Aborted,
}

impl PublishEvent {
    /// Stable event name for analytics backends.
    pub fn name(&self) -> &'static str {
        match self {
            PublishEvent::Started { .. } => "publish_started",
            PublishEvent::Succeeded { .. } => "publish_succeeded",
            PublishEvent::Failed { .. } => "publish_failed",
            PublishEvent::Aborted => "publish_aborted",
        }
    }
}

pub trait AnalyticsSink: Send + Sync {
    fn emit(&self, event: &PublishEvent);
}

/// Logs events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl AnalyticsSink for TracingAnalytics {
    fn emit(&self, event: &PublishEvent) {
        match event {
            PublishEvent::Failed { generation, error } => {
                info!(event = event.name(), generation, %error, "analytics");
            }
            PublishEvent::Started { generation } | PublishEvent::Succeeded { generation, .. } => {
                info!(event = event.name(), generation, "analytics");
            }
            PublishEvent::Aborted => info!(event = event.name(), "analytics"),
        }
    }
}

/// Forwards events to a bounded channel, dropping them when it is full.
#[derive(Debug, Clone)]
pub struct ChannelAnalytics {
    tx: mpsc::Sender<PublishEvent>,
}

impl ChannelAnalytics {
    /// Creates the sink and the receiver that drains it.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PublishEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl AnalyticsSink for ChannelAnalytics {
    fn emit(&self, event: &PublishEvent) {
        if let Err(e) = self.tx.try_send(event.clone()) {
            debug!(event = event.name(), error = %e, "analytics event dropped");
        }
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn emit(&self, _event: &PublishEvent) {}
}
