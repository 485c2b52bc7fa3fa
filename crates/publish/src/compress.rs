//! Compression stages.
//!
//! Both codecs are CPU-bound and run on the blocking pool so a large report
//! never stalls the executor driving progress updates.

use std::io::{Cursor, Write};
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::task::spawn_blocking;
use tracing::debug;

use crate::BoxFuture;
use crate::error::PublishError;

/// Asynchronous compression with no cancellation hook.
pub trait Compressor: Send + Sync {
    fn compress(&self, data: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, PublishError>>;
}

/// Codec selection, as written in the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Gzip,
    Zstd,
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gzip" | "gz" => Ok(Compression::Gzip),
            "zstd" | "zst" => Ok(Compression::Zstd),
            other => Err(format!("unknown compression '{other}' (expected gzip or zstd)")),
        }
    }
}

/// Builds the compressor for `kind`; `level` falls back to the codec default.
pub fn compressor_for(kind: Compression, level: Option<i32>) -> Arc<dyn Compressor> {
    match kind {
        Compression::Gzip => Arc::new(GzipCompressor::new(
            level.map_or(GzipCompressor::DEFAULT_LEVEL, |l| l.clamp(0, 9) as u32),
        )),
        Compression::Zstd => Arc::new(ZstdCompressor::new(
            level.unwrap_or(ZstdCompressor::DEFAULT_LEVEL),
        )),
    }
}

/// gzip via `flate2`.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    level: u32,
}

impl GzipCompressor {
    pub const DEFAULT_LEVEL: u32 = 6;

    pub fn new(level: u32) -> Self {
        Self { level }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEVEL)
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, data: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, PublishError>> {
        let level = self.level;
        Box::pin(async move {
            let input_len = data.len();
            let compressed = spawn_blocking(move || {
                let mut encoder = flate2::write::GzEncoder::new(
                    Vec::with_capacity(input_len / 4),
                    flate2::Compression::new(level),
                );
                encoder.write_all(&data)?;
                encoder.finish()
            })
            .await?
            .map_err(PublishError::Compression)?;

            debug!(input_len, output_len = compressed.len(), "gzip compressed");
            Ok(compressed)
        })
    }
}

/// zstd via the `zstd` crate.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCompressor {
    level: i32,
}

impl ZstdCompressor {
    pub const DEFAULT_LEVEL: i32 = 3;

    pub fn new(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCompressor {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEVEL)
    }
}

impl Compressor for ZstdCompressor {
    fn compress(&self, data: Vec<u8>) -> BoxFuture<'_, Result<Vec<u8>, PublishError>> {
        let level = self.level;
        Box::pin(async move {
            let input_len = data.len();
            let compressed = spawn_blocking(move || zstd::encode_all(Cursor::new(data), level))
                .await?
                .map_err(PublishError::Compression)?;

            debug!(input_len, output_len = compressed.len(), "zstd compressed");
            Ok(compressed)
        })
    }
}
