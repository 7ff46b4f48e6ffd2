use error_stack::Result;
use tokio_util::sync::CancellationToken;

use crate::{category::Category, error::GatewayError, id::GatewayId, query::QuerySpec, value::AttrMap};

/// Cancellation handle for a potentially long-running traversal (§5).
///
/// A plain [`CancellationToken`] works without pulling in an async runtime:
/// callers `cancel()` it from another thread, and the gateway polls
/// `is_cancelled()` between traversal steps.
pub type AbortToken = CancellationToken;

/// A vertex or edge as returned by the gateway. `endpoints` is `Some` for
/// edges (the `(out, in)` pair given to [`GraphGateway::add_edge`]) and
/// `None` for vertices.
#[derive(Debug, Clone)]
pub struct VertexRecord {
    pub id: GatewayId,
    pub category: Category,
    pub attrs: AttrMap,
    pub endpoints: Option<(GatewayId, GatewayId)>,
}

/// The only place that speaks the underlying traversal dialect (§4.1).
///
/// Every method takes an [`AbortToken`]; on cancellation the call returns
/// `Err(GatewayError::Aborted)` and commits no client-visible state (§5).
pub trait GraphGateway {
    fn add_vertex(
        &self,
        category: Category,
        attrs: AttrMap,
        abort: &AbortToken,
    ) -> Result<GatewayId, GatewayError>;

    fn add_edge(
        &self,
        category: Category,
        out_id: GatewayId,
        in_id: GatewayId,
        attrs: AttrMap,
        abort: &AbortToken,
    ) -> Result<GatewayId, GatewayError>;

    fn set_vertex_properties(
        &self,
        id: GatewayId,
        attrs: AttrMap,
        abort: &AbortToken,
    ) -> Result<(), GatewayError>;

    fn set_edge_properties(
        &self,
        id: GatewayId,
        attrs: AttrMap,
        abort: &AbortToken,
    ) -> Result<(), GatewayError>;

    fn get_vertex(&self, id: GatewayId, abort: &AbortToken) -> Result<VertexRecord, GatewayError>;

    fn get_edge(&self, id: GatewayId, abort: &AbortToken) -> Result<VertexRecord, GatewayError>;

    /// Filtered, paginated enumeration. Used by both entity uniqueness checks
    /// (`added_to_db`) and by `get_list`/`get_count` (§4.4).
    fn query(&self, spec: &QuerySpec, abort: &AbortToken) -> Result<Vec<VertexRecord>, GatewayError>;

    /// All edges of any of `categories` touching `vertex`, in either
    /// direction. Used by `disable()` (all incident edges) and `replace()`
    /// (eligible incident edges) — the traversal-backend equivalent of
    /// `g.V(vertex).bothE(categories)`.
    fn incident_edges(
        &self,
        vertex: GatewayId,
        categories: &[Category],
        abort: &AbortToken,
    ) -> Result<Vec<VertexRecord>, GatewayError>;
}
