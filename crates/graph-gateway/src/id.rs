use std::fmt;

use serde::{Deserialize, Serialize};

/// Sentinel id of an entity constructed client-side but not yet persisted.
pub const VIRTUAL_ID: i64 = -1;

/// An opaque graph-database vertex or edge id.
///
/// Ids are never interpreted by any layer above the gateway; they flow
/// through unchanged, as required by §4.1.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayId(i64);

impl GatewayId {
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn virtual_id() -> Self {
        Self(VIRTUAL_ID)
    }

    #[must_use]
    pub const fn is_virtual(self) -> bool {
        self.0 == VIRTUAL_ID
    }

    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }
}

impl fmt::Display for GatewayId {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(fmt, "{}", self.0)
    }
}
