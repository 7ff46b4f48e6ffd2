//! Timestamp, edit-stamp and interval primitives underlying every temporal
//! edge (`rel_property`, `rel_connection`) in the configuration graph.
//!
//! An interval's bounds are always a start and end [`EditStamp`] rather than
//! a bare instant: every fact in the graph is attributed to a user and to the
//! moment it was recorded, not just to the moment it became true.

mod constants;
mod edit_stamp;
mod interval;
mod timestamp;

pub use self::{
    constants::{DISABLED_NEVER, EDIT_OPEN, INTERVAL_OPEN},
    edit_stamp::EditStamp,
    interval::Interval,
    timestamp::Timestamp,
};
