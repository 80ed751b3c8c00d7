/// Constants shared across the archiver
use std::time::Duration;

// Operation tag carried by every archiving log event
pub const PITR_OP: &str = "pitr";

// Leading path segment of every chunk object
pub const DEFAULT_PATH_PREFIX: &str = "pbmPitr";

// Time covered by an ordinary chunk
pub const DEFAULT_SLICE_SPAN: Duration = Duration::from_secs(10 * 60);

// Cadence of the lock and backup-start waits
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

// Budget of the lock and backup-start waits: action start (15s) plus
// the backup's pitr check range (30s) with a 20% margin
pub const DEFAULT_WAIT_BACKUP_START: Duration = Duration::from_secs(15 + 30 * 12 / 10);

// Environment variable names
pub const PITR_LOG_VAR: &str = "PITR_LOG";
pub const PITR_SLICE_SPAN_VAR: &str = "PITR_SLICE_SPAN_SECS";
pub const PITR_PATH_PREFIX_VAR: &str = "PITR_PATH_PREFIX";
pub const PITR_COMPRESSION_VAR: &str = "PITR_COMPRESSION";
pub const PITR_POLL_INTERVAL_VAR: &str = "PITR_POLL_INTERVAL_SECS";
pub const PITR_WAIT_BACKUP_START_VAR: &str = "PITR_WAIT_BACKUP_START_SECS";
