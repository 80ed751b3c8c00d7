//! Domain types for oplog archiving.
//!
//! - **`timestamp`**: the source database's logical clock
//! - **`compression`**: codecs and their file suffixes
//! - **`chunk`**: metadata of an uploaded oplog slice
//! - **`lock`**: the shared lock record and its kinds
//! - **`meta`**: backup and restore records
//! - **`node`**: replica set member identity

pub mod chunk;
pub mod compression;
pub mod lock;
pub mod meta;
pub mod node;
pub mod timestamp;

pub use chunk::*;
pub use compression::*;
pub use lock::*;
pub use meta::*;
pub use node::*;
pub use timestamp::*;
