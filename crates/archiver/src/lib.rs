//! Continuous point-in-time archiving of a replica set oplog
//!
//! One [`PitrStream`] runs per replica set. It resumes from the last durable
//! point ([`catchup`]), then saves the oplog in consecutive chunks, each one
//! named by [`chunk_path`] and indexed in the [`MetadataStore`]. The
//! replica set lock record decides how far each chunk goes and when to hand
//! off to a full backup ([`LockArbiter`]).

pub mod arbiter;
pub mod catchup;
pub mod memory;
pub mod namer;
pub mod storage;
pub mod stream;
pub mod traits;
pub mod upload;
pub mod waiters;

pub use arbiter::{Decision, LockArbiter};
pub use catchup::catchup;
pub use namer::{chunk_path, path_of};
pub use storage::{FsStorage, MemoryStorage, Storage};
pub use stream::{PitrStream, StreamExit};
pub use traits::{Membership, MetadataStore, OplogSource, WindowReader};
pub use upload::upload;
pub use waiters::{wait_for_backup_start, wait_for_lock};
