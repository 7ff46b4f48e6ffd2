use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A bare instant, expressed as epoch seconds.
///
/// Kept as a raw integer rather than [`time::OffsetDateTime`] because the
/// wire contract uses sentinel magnitudes (`INTERVAL_OPEN = i64::MAX`) that
/// do not correspond to a representable date.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    #[must_use]
    pub const fn from_unix_seconds(seconds: i64) -> Self {
        Self(seconds)
    }

    /// The current wall-clock instant, used as the default for `edit_time`
    /// and `disable_time` parameters throughout the domain layer.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc().unix_timestamp())
    }

    #[must_use]
    pub const fn unix_seconds(self) -> i64 {
        self.0
    }
}

impl From<i64> for Timestamp {
    fn from(seconds: i64) -> Self {
        Self(seconds)
    }
}

impl From<Timestamp> for i64 {
    fn from(timestamp: Timestamp) -> Self {
        timestamp.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}
