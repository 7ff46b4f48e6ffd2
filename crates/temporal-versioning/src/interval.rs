use serde::{Deserialize, Serialize};

use crate::{constants::INTERVAL_OPEN, EditStamp, Timestamp};

/// A half-open interval `[start.time, end.time)` on a temporal edge.
///
/// Every temporal edge (`rel_property`, `rel_connection`) carries exactly one
/// of these. The interval is always left-closed; the right bound is either a
/// finite instant or the open sentinel (§6, `INTERVAL_OPEN`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    pub start: EditStamp,
    pub end: EditStamp,
}

impl Interval {
    #[must_use]
    pub fn new(start: EditStamp, end: EditStamp) -> Self {
        Self { start, end }
    }

    /// An interval that starts at `start` and has no end yet.
    #[must_use]
    pub fn open_ended(start: EditStamp) -> Self {
        let end = EditStamp::new(
            Timestamp::from_unix_seconds(INTERVAL_OPEN),
            String::new(),
            Timestamp::from_unix_seconds(crate::constants::EDIT_OPEN),
            String::new(),
        );
        Self { start, end }
    }

    #[must_use]
    pub fn is_end_open(&self) -> bool {
        self.end.time.unix_seconds() == INTERVAL_OPEN
    }

    /// A `rel_property` edge whose end was recorded by a later edit rather
    /// than left open; ignored by [`crate history scans`](Self::is_end_open).
    #[must_use]
    pub fn is_superseded_edit(&self) -> bool {
        !self.end.is_edit_open()
    }

    /// Does this interval contain the instant `at`?
    #[must_use]
    pub fn contains_instant(&self, at: Timestamp) -> bool {
        self.start.time <= at && at < self.end.time
    }

    /// Does this interval overlap the half-open window `[from, to)`?
    /// `to == INTERVAL_OPEN` means an unbounded upper edge.
    #[must_use]
    pub fn overlaps(&self, from: Timestamp, to: Timestamp) -> bool {
        self.start.time < to && from < self.end.time
    }

    /// Close this interval at `end`, in place.
    pub fn close(&mut self, end: EditStamp) {
        self.end = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(time: i64) -> EditStamp {
        EditStamp::new(Timestamp::from_unix_seconds(time), "u", Timestamp::from_unix_seconds(0), "")
    }

    #[test]
    fn contains_instant_is_half_open() {
        let interval = Interval::new(stamp(1000), stamp(2000));
        assert!(!interval.contains_instant(Timestamp::from_unix_seconds(999)));
        assert!(interval.contains_instant(Timestamp::from_unix_seconds(1000)));
        assert!(interval.contains_instant(Timestamp::from_unix_seconds(1999)));
        assert!(!interval.contains_instant(Timestamp::from_unix_seconds(2000)));
    }

    #[test]
    fn open_ended_has_no_upper_bound() {
        let interval = Interval::open_ended(stamp(1000));
        assert!(interval.is_end_open());
        assert!(interval.contains_instant(Timestamp::from_unix_seconds(1_000_000_000)));
    }

    #[test]
    fn overlaps_treats_open_upper_bound_as_unbounded() {
        let interval = Interval::open_ended(stamp(1000));
        assert!(interval.overlaps(
            Timestamp::from_unix_seconds(500),
            Timestamp::from_unix_seconds(INTERVAL_OPEN)
        ));
        assert!(!Interval::new(stamp(0), stamp(500))
            .overlaps(Timestamp::from_unix_seconds(500), Timestamp::from_unix_seconds(INTERVAL_OPEN)));
    }
}
