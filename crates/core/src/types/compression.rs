//! Compression codecs a chunk can be written with

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};
use std::str::FromStr;

/// Codec applied to an uploaded oplog chunk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionType {
    /// Stored as-is
    None,
    /// Single-threaded gzip
    #[default]
    Gzip,
    /// Parallel gzip; same on-disk format as `Gzip`
    Pgzip,
    /// LZ4 frame format
    Lz4,
    /// Snappy framed stream
    Snappy,
    /// S2, a Snappy-compatible extension
    S2,
    /// Zstandard
    Zstd,
}

impl CompressionType {
    /// All known codecs
    pub const ALL: [CompressionType; 7] = [
        CompressionType::None,
        CompressionType::Gzip,
        CompressionType::Pgzip,
        CompressionType::Lz4,
        CompressionType::Snappy,
        CompressionType::S2,
        CompressionType::Zstd,
    ];

    /// File name suffix for objects written with this codec
    pub fn suffix(&self) -> &'static str {
        match self {
            CompressionType::Gzip | CompressionType::Pgzip => ".gz",
            CompressionType::Lz4 => ".lz4",
            CompressionType::Snappy | CompressionType::S2 => ".snappy",
            CompressionType::Zstd => ".zst",
            CompressionType::None => "",
        }
    }

    /// Canonical lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            CompressionType::None => "none",
            CompressionType::Gzip => "gzip",
            CompressionType::Pgzip => "pgzip",
            CompressionType::Lz4 => "lz4",
            CompressionType::Snappy => "snappy",
            CompressionType::S2 => "s2",
            CompressionType::Zstd => "zstd",
        }
    }
}

impl Display for CompressionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CompressionType::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::configuration(format!("unknown compression type '{s}'")))
    }
}
