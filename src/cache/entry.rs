//! Pre-serialized, pre-compressed cache entries.
//!
//! Serving a result is a byte copy: serialization and gzip happen once, when
//! a snapshot enters the cache, not per request. An entry is replaced
//! wholesale when a newer version arrives and is never partially updated.

use std::io::Write;
use std::sync::Arc;

use flate2::write::GzEncoder;
use flate2::Compression;
use thiserror::Error;

use crate::store::StoreError;
use crate::types::{ComputedSnapshot, ConversationId, MathTick};

use super::validator::ValidatorToken;

/// Errors raised while building or refreshing cache entries.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("store failure while refreshing cache: {0}")]
    Store(#[from] StoreError),

    #[error("snapshot serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("payload compression failed: {0}")]
    Compress(#[from] std::io::Error),
}

/// One conversation's cached result.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub conversation: ConversationId,
    pub math_tick: MathTick,

    /// The decoded snapshot, kept for index resolution.
    pub snapshot: Arc<ComputedSnapshot>,

    /// The snapshot serialized as JSON.
    pub body: Vec<u8>,

    /// `body`, gzip-compressed; this is what the result endpoint serves.
    pub gzipped: Vec<u8>,

    /// Token served with the payload and echoed back in conditional requests.
    pub validator: ValidatorToken,
}

impl CacheEntry {
    /// Serializes and compresses a snapshot into a servable entry.
    pub fn build(snapshot: ComputedSnapshot) -> Result<Self, CacheError> {
        let body = serde_json::to_vec(&snapshot)?;

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&body)?;
        let gzipped = encoder.finish()?;

        Ok(CacheEntry {
            conversation: snapshot.conversation,
            math_tick: snapshot.math_tick,
            validator: ValidatorToken::for_tick(snapshot.math_tick),
            snapshot: Arc::new(snapshot),
            body,
            gzipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use crate::test_utils::snapshot_with;

    #[test]
    fn entry_carries_compressed_body_and_matching_validator() {
        let snapshot = snapshot_with(
            ConversationId(3),
            MathTick(11),
            vec![10],
            vec![vec![1, 2]],
            vec![(100, vec![0])],
        );
        let entry = CacheEntry::build(snapshot).unwrap();

        assert_eq!(entry.math_tick, MathTick(11));
        assert_eq!(entry.validator.as_str(), "\"mt-11\"");

        // Decompressing the served bytes yields the serialized body.
        let mut decoder = flate2::read::GzDecoder::new(entry.gzipped.as_slice());
        let mut decompressed = Vec::new();
        decoder.read_to_end(&mut decompressed).unwrap();
        assert_eq!(decompressed, entry.body);

        let value: serde_json::Value = serde_json::from_slice(&entry.body).unwrap();
        assert_eq!(value["math_tick"], 11);
    }
}
