//! Artifact serialization.

use serde::Serialize;

use crate::error::PublishError;

/// Turns an artifact into the raw bytes that get compressed.
pub trait Serializer<A: ?Sized>: Send + Sync {
    fn serialize(&self, artifact: &A) -> Result<Vec<u8>, PublishError>;
}

/// Compact JSON encoding via `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl<A: Serialize + ?Sized> Serializer<A> for JsonSerializer {
    fn serialize(&self, artifact: &A) -> Result<Vec<u8>, PublishError> {
        Ok(serde_json::to_vec(artifact)?)
    }
}
