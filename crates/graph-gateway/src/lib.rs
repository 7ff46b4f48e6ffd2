//! A thin typed wrapper over an external graph traversal interface.
//!
//! This crate speaks the only dialect the rest of the workspace is allowed
//! to know about: opaque vertex/edge ids, `add_vertex`/`add_edge`, property
//! updates, and a declarative [`query::QuerySpec`] for filtered, paginated
//! enumeration (§6). The concrete traversal backend (a Gremlin-style graph
//! database in production) is an external collaborator;
//! [`memory::InMemoryGateway`] is a reference implementation used by tests
//! and by the demo CLI.

mod category;
mod error;
mod gateway;
mod id;
pub mod memory;
pub mod query;
mod value;

pub use self::{
    category::Category,
    error::GatewayError,
    gateway::{AbortToken, GraphGateway, VertexRecord},
    id::{GatewayId, VIRTUAL_ID},
    value::{AttrMap, AttrValue},
};
