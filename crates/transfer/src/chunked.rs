use bytes::Bytes;
use sha2::{Digest, Sha256};

use crate::DEFAULT_CHUNK_SIZE;
use crate::types::Chunk;

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Splits `data` into fixed-size chunks without copying.
///
/// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used. The last chunk may
/// be shorter; an empty payload yields no chunks.
pub fn chunks(data: Bytes, chunk_size: usize) -> Chunks {
    let chunk_size = if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    };
    Chunks {
        data,
        chunk_size,
        offset: 0,
    }
}

/// Iterator over the chunks of an in-memory payload.
#[derive(Debug, Clone)]
pub struct Chunks {
    data: Bytes,
    chunk_size: usize,
    offset: usize,
}

impl Chunks {
    /// Total payload size in bytes.
    pub fn total_len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Bytes not yet yielded.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }
}

impl Iterator for Chunks {
    type Item = Chunk;

    fn next(&mut self) -> Option<Chunk> {
        if self.remaining() == 0 {
            return None;
        }
        let end = std::cmp::min(self.offset + self.chunk_size, self.data.len());
        let chunk = Chunk {
            offset: self.offset as u64,
            data: self.data.slice(self.offset..end),
        };
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining().div_ceil(self.chunk_size);
        (n, Some(n))
    }
}

impl ExactSizeIterator for Chunks {}
