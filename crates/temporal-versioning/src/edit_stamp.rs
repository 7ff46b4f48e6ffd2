use serde::{Deserialize, Serialize};

use crate::{constants::EDIT_OPEN, Timestamp};

/// The four-tuple attached to either end of a temporal edge's interval:
/// *when* the fact became true (or stopped being true), *who* recorded it,
/// *when* they recorded it, and a free-text note.
///
/// An end `EditStamp` with `edit_time == EDIT_OPEN` has never been closed by
/// a later edit; one with a finite `edit_time` is a *superseded edit* and is
/// skipped by history scans (see [`crate::Interval::is_superseded_edit`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditStamp {
    pub time: Timestamp,
    pub uid: String,
    pub edit_time: Timestamp,
    pub comments: String,
}

impl EditStamp {
    #[must_use]
    pub fn new(time: Timestamp, uid: impl Into<String>, edit_time: Timestamp, comments: impl Into<String>) -> Self {
        Self {
            time,
            uid: uid.into(),
            edit_time,
            comments: comments.into(),
        }
    }

    /// Build a stamp recorded right now (`edit_time = Timestamp::now()`).
    #[must_use]
    pub fn recorded_now(time: Timestamp, uid: impl Into<String>, comments: impl Into<String>) -> Self {
        Self::new(time, uid, Timestamp::now(), comments)
    }

    #[must_use]
    pub fn is_edit_open(&self) -> bool {
        self.edit_time.unix_seconds() == EDIT_OPEN
    }
}
