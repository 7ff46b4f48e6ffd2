use graph_gateway::{AbortToken, AttrValue, Category, GraphGateway};
use temporal_versioning::{Interval, Timestamp};
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::{Component, ComponentType, ComponentVersion, Flag, Property},
    error::{from_gateway, Result},
    ops::temporal_edges,
};

/// A composite point-in-time (or full-history, if `time` was `None`) view of
/// a component, as returned by `Component::as_dict` (§4.5).
#[derive(Debug, Clone)]
pub struct ComponentSnapshot {
    pub name: String,
    pub time_added: Timestamp,
    pub component_type: ComponentType,
    pub version: Option<ComponentVersion>,
    pub properties: Vec<(Property, Interval)>,
    pub connections: Vec<(Component, Interval)>,
    pub flags: Vec<Flag>,
    pub subcomponents: Vec<Component>,
    pub supercomponents: Vec<Component>,
}

impl Component {
    /// Composite snapshot of this component (§4.5). `time = None` returns
    /// the full history of every temporal collection; `Some(t)` filters each
    /// to the interval containing `t`.
    #[instrument(skip(self, cache, gateway, abort), fields(component = %self.name()))]
    pub fn as_dict(&self, time: Option<Timestamp>, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<ComponentSnapshot> {
        let property_edges = temporal_edges(gateway, self.id(), Category::RelProperty, abort)?;
        let mut properties = Vec::with_capacity(property_edges.len());
        for edge in property_edges {
            if time.is_some_and(|at| !edge.interval.contains_instant(at)) {
                continue;
            }
            properties.push((Property::from_id(cache, gateway, edge.other_endpoint, abort)?, edge.interval));
        }

        let connection_edges = temporal_edges(gateway, self.id(), Category::RelConnection, abort)?;
        let mut connections = Vec::with_capacity(connection_edges.len());
        for edge in connection_edges {
            if time.is_some_and(|at| !edge.interval.contains_instant(at)) {
                continue;
            }
            connections.push((Component::from_id(cache, gateway, edge.other_endpoint, abort)?, edge.interval));
        }

        Ok(ComponentSnapshot {
            name: self.name(),
            time_added: self.time_added(),
            component_type: self.component_type(),
            version: self.version(),
            properties,
            connections,
            flags: self.flags_at(time, cache, gateway, abort)?,
            subcomponents: self.subcomponents(cache, gateway, abort)?,
            supercomponents: self.supercomponents(cache, gateway, abort)?,
        })
    }

    /// The other component of every active `rel_connection` edge containing
    /// `time`, or all active connections if `time` is `None` (§3 SUPPLEMENT).
    pub fn connections_at(&self, time: Option<Timestamp>, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<Vec<Component>> {
        let edges = temporal_edges(gateway, self.id(), Category::RelConnection, abort)?;
        edges
            .into_iter()
            .filter(|edge| match time {
                Some(at) => edge.interval.contains_instant(at),
                None => true,
            })
            .map(|edge| Component::from_id(cache, gateway, edge.other_endpoint, abort))
            .collect()
    }

    /// Flags attached to this component whose interval contains `time`, or
    /// every attached flag if `time` is `None` (§3 SUPPLEMENT).
    pub fn flags_at(&self, time: Option<Timestamp>, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<Vec<Flag>> {
        let edges = from_gateway(gateway.incident_edges(self.id(), &[Category::RelFlagComponent], abort))?;
        let mut flags = Vec::new();
        for edge in edges {
            let active = edge.attrs.get("active").and_then(AttrValue::as_bool).unwrap_or(true);
            if !active {
                continue;
            }
            let Some((out_id, in_id)) = edge.endpoints else {
                continue;
            };
            let flag_id = if out_id == self.id() { in_id } else { out_id };
            let flag = Flag::from_id(cache, gateway, flag_id, abort)?;
            if time.is_some_and(|at| !flag.interval().contains_instant(at)) {
                continue;
            }
            flags.push(flag);
        }
        Ok(flags)
    }
}
