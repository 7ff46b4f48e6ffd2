//! Client-side domain layer over an external graph database's
//! traversal-style query interface: the identity cache (§4.2), the eleven
//! entity kinds and their add/replace/disable lifecycle (§3, §4.3), filtered
//! listing (§4.4), and the `Component` temporal operations — properties,
//! connections, sub/super-component hierarchy, flags, and point-in-time
//! snapshots (§4.5–§4.6).
//!
//! `temporal-versioning` and `graph-gateway` are their own crates in this
//! workspace; this crate composes them into the domain layer itself.

pub mod cache;
pub mod entities;
pub mod error;
pub mod logging;
mod ops;
mod support;

pub use ops::ComponentSnapshot;
