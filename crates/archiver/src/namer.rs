//! Deterministic object names for oplog chunks
//!
//! `<prefix>/<rs>/<YYYYMMDD>/<YYYYMMDDhhmmss>.<YYYYMMDDhhmmss>.oplog<ext>`
//!
//! The restore side re-derives names from chunk metadata, so the format must
//! not change.

use pitr_core::{Chunk, CompressionType, Timestamp};

const DAY_FORMAT: &str = "%Y%m%d";
const TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// Build the object name of the chunk covering `[first, last)` seconds
pub fn chunk_path(
    prefix: &str,
    replset: &str,
    first: u32,
    last: u32,
    compression: CompressionType,
) -> String {
    let ft = Timestamp::new(first, 0).to_datetime();
    let lt = Timestamp::new(last, 0).to_datetime();

    let mut name = String::with_capacity(prefix.len() + replset.len() + 48);
    if !prefix.is_empty() {
        name.push_str(prefix);
        name.push('/');
    }
    name.push_str(replset);
    name.push('/');
    name.push_str(&ft.format(DAY_FORMAT).to_string());
    name.push('/');
    name.push_str(&ft.format(TIME_FORMAT).to_string());
    name.push('.');
    name.push_str(&lt.format(TIME_FORMAT).to_string());
    name.push_str(".oplog");
    name.push_str(compression.suffix());
    name
}

/// Re-derive the object name of an indexed chunk
pub fn path_of(prefix: &str, chunk: &Chunk) -> String {
    chunk_path(
        prefix,
        &chunk.replset,
        chunk.start_ts.t,
        chunk.end_ts.t,
        chunk.compression,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_gzip_chunk_path() {
        let path = chunk_path("pbmPitr", "rs0", 1_700_000_000, 1_700_003_600, CompressionType::Gzip);
        assert_eq!(
            path,
            "pbmPitr/rs0/20231114/20231114221320.20231114231320.oplog.gz"
        );
    }

    #[test]
    fn test_suffixes_and_empty_prefix() {
        assert!(chunk_path("p", "rs0", 1, 2, CompressionType::Lz4).ends_with(".oplog.lz4"));
        assert!(chunk_path("p", "rs0", 1, 2, CompressionType::S2).ends_with(".oplog.snappy"));
        assert!(chunk_path("p", "rs0", 1, 2, CompressionType::None).ends_with(".oplog"));
        assert_eq!(
            chunk_path("", "cfg", 0, 86_400, CompressionType::None),
            "cfg/19700101/19700101000000.19700102000000.oplog"
        );
    }

    #[test]
    fn test_path_of_matches_upload_name() {
        let chunk = Chunk {
            replset: "rs1".to_string(),
            file_name: chunk_path("pbmPitr", "rs1", 100, 200, CompressionType::Snappy),
            compression: CompressionType::Snappy,
            start_ts: Timestamp::new(100, 3),
            end_ts: Timestamp::new(200, 1),
        };
        assert_eq!(path_of("pbmPitr", &chunk), chunk.file_name);
    }

    proptest! {
        #[test]
        fn distinct_windows_get_distinct_names(
            rs in "[a-z][a-z0-9]{0,7}",
            start in 1u32..2_000_000_000,
            len_a in 1u32..100_000,
            len_b in 1u32..100_000,
        ) {
            let a = chunk_path("pbmPitr", &rs, start, start + len_a, CompressionType::Gzip);
            let b = chunk_path("pbmPitr", &rs, start, start + len_b, CompressionType::Gzip);
            prop_assert_eq!(a == b, len_a == len_b);
            prop_assert_eq!(
                a.clone(),
                chunk_path("pbmPitr", &rs, start, start + len_a, CompressionType::Gzip)
            );
            let rs_segment = format!("/{rs}/");
            prop_assert!(a.contains(&rs_segment));
        }
    }
}
