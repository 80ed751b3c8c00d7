//! Chunk continuity over many timer ticks

use pitr_archiver::memory::{MemoryMetadataStore, MemoryOplog, StaticMembership};
use pitr_archiver::{MemoryStorage, PitrStream, StreamExit};
use pitr_config::ArchiverConfig;
use pitr_core::{CompressionType, LockData, LockHeader, NodeId, Timestamp};
use proptest::prelude::*;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Run one tick per entry of `advances`, each moving the last write forward
/// by that many seconds and landing on the given ordinal. Returns the indexed
/// chunks, the final checkpoint and the number of stored objects.
fn run_ticks(advances: &[(u32, u32)]) -> (Vec<pitr_core::Chunk>, Timestamp, usize) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .unwrap();

    runtime.block_on(async {
        let store = Arc::new(MemoryMetadataStore::new());
        let membership = Arc::new(StaticMembership::new("node-a:27017"));
        let oplog = Arc::new(MemoryOplog::new());
        store.set_lock(
            "rs0",
            Some(LockData::pitr(
                LockHeader::new("rs0"),
                NodeId::new("node-a:27017"),
            )),
        );

        let mut write = 1_000u32;
        let writes: Vec<Timestamp> = advances
            .iter()
            .map(|(step, ordinal)| {
                write += step;
                Timestamp::new(write, *ordinal)
            })
            .collect();
        oplog.script_last_writes(writes);

        let config = ArchiverConfig::default();
        let span = config.slice_span;
        let mut stream = PitrStream::new("rs0", config, store.clone(), membership, oplog);
        stream.start_from(Timestamp::new(1_000, 1));

        let storage = MemoryStorage::new();
        let (_tx, mut rx) = mpsc::channel(1);
        let ticks = u32::try_from(advances.len()).unwrap();
        let exit = stream
            .stream(
                tokio::time::sleep(span * ticks + span / 2),
                &mut rx,
                &storage,
                CompressionType::Gzip,
            )
            .await
            .unwrap();
        assert_eq!(exit, StreamExit::Cancelled);

        (store.chunks("rs0"), stream.last_ts(), storage.len())
    })
}

/// Checkpoint expected after `advances`: the last write that moved to a new
/// second
fn expected_last(advances: &[(u32, u32)]) -> (Timestamp, usize) {
    let mut write = 1_000u32;
    let mut last = Timestamp::new(1_000, 1);
    let mut chunks = 0;
    for (step, ordinal) in advances {
        write += step;
        if *step > 0 {
            last = Timestamp::new(write, *ordinal);
            chunks += 1;
        }
    }
    (last, chunks)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn chunks_tile_the_timeline(
        advances in prop::collection::vec((0u32..120, 0u32..16), 1..8)
    ) {
        let (chunks, last_ts, objects) = run_ticks(&advances);
        let (expected_ts, expected_chunks) = expected_last(&advances);

        prop_assert_eq!(chunks.len(), expected_chunks);
        prop_assert_eq!(objects, expected_chunks);
        prop_assert_eq!(last_ts, expected_ts);

        for chunk in &chunks {
            prop_assert!(chunk.is_well_formed());
            prop_assert!(chunk.start_ts.t < chunk.end_ts.t);
        }
        for pair in chunks.windows(2) {
            prop_assert!(pair[1].follows(&pair[0]));
            prop_assert_ne!(&pair[1].file_name, &pair[0].file_name);
        }
        if let Some(first) = chunks.first() {
            prop_assert_eq!(first.start_ts, Timestamp::new(1_000, 1));
        }
    }
}

#[test]
fn idle_ticks_write_nothing() {
    let (chunks, last_ts, _) = run_ticks(&[(0, 0), (0, 5), (0, 9)]);
    assert!(chunks.is_empty());
    assert_eq!(last_ts, Timestamp::new(1_000, 1));
}
