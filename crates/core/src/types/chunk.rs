//! Metadata of an uploaded oplog slice

use super::compression::CompressionType;
use super::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// One contiguous, already uploaded slice of a replica set's oplog.
///
/// Covers the half-open window `[start_ts, end_ts)`. Chunks of a replica set
/// form a gapless sequence: each `start_ts` equals the previous `end_ts`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Replica set the oplog belongs to
    pub replset: String,
    /// Object name in the storage
    pub file_name: String,
    /// Codec the object was written with
    pub compression: CompressionType,
    /// Inclusive lower bound
    pub start_ts: Timestamp,
    /// Exclusive upper bound
    pub end_ts: Timestamp,
}

impl Chunk {
    /// Whether the window is non-empty
    pub fn is_well_formed(&self) -> bool {
        self.start_ts < self.end_ts
    }

    /// Whether this chunk continues `prev` without a gap or overlap
    pub fn follows(&self, prev: &Chunk) -> bool {
        self.replset == prev.replset && self.start_ts == prev.end_ts && self.is_well_formed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(start: u32, end: u32) -> Chunk {
        Chunk {
            replset: "rs0".to_string(),
            file_name: format!("{start}-{end}"),
            compression: CompressionType::Gzip,
            start_ts: Timestamp::new(start, 0),
            end_ts: Timestamp::new(end, 0),
        }
    }

    #[test]
    fn test_follows() {
        assert!(chunk(200, 250).follows(&chunk(100, 200)));
        assert!(!chunk(201, 250).follows(&chunk(100, 200)));
        assert!(!chunk(150, 250).follows(&chunk(100, 200)));
        assert!(!chunk(200, 200).follows(&chunk(100, 200)));
    }

    #[test]
    fn test_follows_requires_same_replset() {
        let mut next = chunk(200, 250);
        next.replset = "rs1".to_string();
        assert!(!next.follows(&chunk(100, 200)));
    }
}
