use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GraphGateway};
use temporal_versioning::{EditStamp, Interval, Timestamp, EDIT_OPEN, INTERVAL_OPEN};
use tracing::instrument;

use crate::{
    entities::Component,
    error::{domain_err, from_gateway, DomainError, Result},
    ops::temporal_edges,
    support::interval_to_attrs,
};

fn open_end_stamp() -> EditStamp {
    EditStamp::new(
        Timestamp::from_unix_seconds(INTERVAL_OPEN),
        String::new(),
        Timestamp::from_unix_seconds(EDIT_OPEN),
        String::new(),
    )
}

impl Component {
    /// Opens a `rel_connection` edge to `other` starting at `time` (§4.5).
    /// `ConnectToSelf` if `other == self`. An active connection already
    /// containing `time` is `ComponentsAlreadyConnected` unconditionally
    /// (unlike `set_property`, connect never closes-and-proceeds — §8
    /// scenario 6); a later connection blocks the write unless `force`
    /// caps the new interval at that connection's start.
    #[instrument(skip(self, other, gateway, abort), fields(a = %self.name(), b = %other.name()))]
    #[allow(clippy::too_many_arguments)]
    pub fn connect(
        &self,
        other: &Component,
        time: Timestamp,
        uid: &str,
        end_time: Option<Timestamp>,
        edit_time: Timestamp,
        comments: &str,
        force: bool,
        gateway: &dyn GraphGateway,
        abort: &AbortToken,
    ) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        if self == other {
            return domain_err(DomainError::ConnectToSelf);
        }
        let edges = temporal_edges(gateway, self.id(), Category::RelConnection, abort)?;
        let between: Vec<_> = edges.into_iter().filter(|edge| edge.other_endpoint == other.id()).collect();

        let mut end_stamp = match end_time {
            Some(end) => EditStamp::new(end, uid, edit_time, comments),
            None => open_end_stamp(),
        };

        if between.iter().any(|edge| edge.interval.contains_instant(time)) {
            return domain_err(DomainError::ComponentsAlreadyConnected);
        } else if let Some(future_edge) = between
            .iter()
            .filter(|edge| edge.interval.start.time > time)
            .min_by_key(|edge| edge.interval.start.time)
        {
            if !force {
                return domain_err(DomainError::ConnectBeforeExistingConnection);
            }
            if end_time.is_some() {
                return domain_err(DomainError::ConnectionsOverlapping);
            }
            end_stamp = EditStamp::new(future_edge.interval.start.time, uid, edit_time, comments);
        }

        let interval = Interval::new(EditStamp::new(time, uid, edit_time, comments), end_stamp);
        from_gateway(gateway.add_edge(Category::RelConnection, self.id(), other.id(), interval_to_attrs(&interval), abort))?;
        Ok(())
    }

    /// Closes the active connection to `other` containing `time`.
    /// `ComponentsAlreadyDisconnected` if none is active at `time`, or if it
    /// is already closed (§4.5).
    pub fn disconnect(
        &self,
        other: &Component,
        time: Timestamp,
        uid: &str,
        edit_time: Timestamp,
        comments: &str,
        gateway: &dyn GraphGateway,
        abort: &AbortToken,
    ) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        let edges = temporal_edges(gateway, self.id(), Category::RelConnection, abort)?;
        let Some(edge) = edges
            .into_iter()
            .find(|edge| edge.other_endpoint == other.id() && edge.interval.contains_instant(time))
        else {
            return domain_err(DomainError::ComponentsAlreadyDisconnected);
        };
        if !edge.interval.is_end_open() {
            return domain_err(DomainError::ComponentsAlreadyDisconnected);
        }
        let mut closed = edge.interval.clone();
        closed.close(EditStamp::new(time, uid, edit_time, comments));
        from_gateway(gateway.set_edge_properties(edge.id, interval_to_attrs(&closed), abort))
    }

    /// Closes the connection active at `time` (if any) and opens a fresh one
    /// to `other` in its place (§4.5).
    pub fn replace_connection(
        &self,
        other: &Component,
        time: Timestamp,
        uid: &str,
        comments: &str,
        edit_time: Timestamp,
        gateway: &dyn GraphGateway,
        abort: &AbortToken,
    ) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        let edges = temporal_edges(gateway, self.id(), Category::RelConnection, abort)?;
        if let Some(edge) = edges
            .into_iter()
            .find(|edge| edge.other_endpoint == other.id() && edge.interval.contains_instant(time))
        {
            let mut attrs = AttrMap::new();
            attrs.insert("active".to_owned(), AttrValue::Bool(false));
            attrs.insert("time_disabled".to_owned(), AttrValue::Int(time.unix_seconds()));
            from_gateway(gateway.set_edge_properties(edge.id, attrs, abort))?;
        }
        self.connect(other, time, uid, None, edit_time, comments, false, gateway, abort)
    }

    /// Administratively kills the connection to `other` outright — unlike
    /// `disconnect`, this does not require `time` to fall inside the edge's
    /// interval, and disables the edge the same way `Component::disable`
    /// disables an incident edge (§4.3).
    pub fn disable_connection(&self, other: &Component, disable_time: Timestamp, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        let edges = temporal_edges(gateway, self.id(), Category::RelConnection, abort)?;
        let Some(edge) = edges.into_iter().find(|edge| edge.other_endpoint == other.id()) else {
            return domain_err(DomainError::ComponentsAlreadyDisconnected);
        };
        let mut attrs = AttrMap::new();
        attrs.insert("active".to_owned(), AttrValue::Bool(false));
        attrs.insert("time_disabled".to_owned(), AttrValue::Int(disable_time.unix_seconds()));
        from_gateway(gateway.set_edge_properties(edge.id, attrs, abort))
    }
}
