//! Logical clock values assigned by the source database

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// A cluster time: seconds since the epoch plus an ordinal within that second.
///
/// Ordering compares seconds first and the ordinal second. A zero seconds
/// component means the value was never set.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Seconds since the Unix epoch
    pub t: u32,
    /// Ordinal of the operation within `t`
    pub i: u32,
}

impl Timestamp {
    /// The unset timestamp
    pub const ZERO: Timestamp = Timestamp { t: 0, i: 0 };

    /// Create a timestamp from its two components
    pub const fn new(t: u32, i: u32) -> Self {
        Self { t, i }
    }

    /// Whether the seconds component is unset
    pub fn is_zero(&self) -> bool {
        self.t == 0
    }

    /// Wall-clock time of the seconds component
    pub fn to_datetime(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(i64::from(self.t), 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.t, self.i)
    }
}

impl From<(u32, u32)> for Timestamp {
    fn from((t, i): (u32, u32)) -> Self {
        Self { t, i }
    }
}
