//! `Component`-level temporal workflows built on top of the entity contract
//! (§4.5–§4.6): property and connection history, sub/super-component
//! hierarchy, flag attachment, and point-in-time snapshots.

mod connections;
mod properties;
mod snapshot;
mod subcomponents;

pub use snapshot::ComponentSnapshot;

use graph_gateway::{AbortToken, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use temporal_versioning::Interval;

use crate::{error::from_gateway, support::interval_from_attrs};

/// One active temporal edge of `component_id`, resolved to the endpoint on
/// the other side (a `Property` id for `rel_property`, another `Component`
/// id for `rel_connection`).
pub(crate) struct TemporalEdge {
    pub id: GatewayId,
    pub interval: Interval,
    pub other_endpoint: GatewayId,
}

/// Loads every *active* edge of `category` incident to `component_id`,
/// resolving each to the endpoint that isn't `component_id` (edges of these
/// categories are logically undirected between a component and whatever it
/// is paired with). Inactive edges — history superseded by `replace()` or
/// closed by `disable_connection` — are skipped; shared by every property
/// and connection operation in this module.
pub(crate) fn temporal_edges(
    gateway: &dyn GraphGateway,
    component_id: GatewayId,
    category: Category,
    abort: &AbortToken,
) -> crate::error::Result<Vec<TemporalEdge>> {
    let edges = from_gateway(gateway.incident_edges(component_id, &[category], abort))?;
    Ok(edges
        .into_iter()
        .filter_map(|edge: VertexRecord| {
            let active = edge.attrs.get("active").and_then(AttrValue::as_bool).unwrap_or(true);
            if !active {
                return None;
            }
            let (out_id, in_id) = edge.endpoints?;
            let other_endpoint = if out_id == component_id { in_id } else { out_id };
            Some(TemporalEdge {
                id: edge.id,
                interval: interval_from_attrs(&edge.attrs),
                other_endpoint,
            })
        })
        .collect())
}
