/// Sentinel `end.time` for an interval that is still open.
///
/// Chosen to be `i64::MAX` so every finite instant compares less than it;
/// bit-exact with the wire contract (§6 of the design spec).
pub const INTERVAL_OPEN: i64 = i64::MAX;

/// Sentinel `edit_time` meaning "this end-stamp has never been overwritten by
/// a later edit". A `rel_property` edge whose `end.edit_time != EDIT_OPEN` is
/// a *superseded edit* and is ignored by history-scanning queries.
pub const EDIT_OPEN: i64 = -1;

/// Sentinel `time_disabled` meaning "still active".
pub const DISABLED_NEVER: i64 = -1;
