use graph_gateway::{AbortToken, Category, GraphGateway};
use temporal_versioning::{EditStamp, Interval, Timestamp, EDIT_OPEN, INTERVAL_OPEN};
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::{Component, Property, PropertyType},
    error::{domain_err, from_gateway, DomainError, Result},
    ops::temporal_edges,
    support::interval_to_attrs,
};

/// An end `EditStamp` with no caller-supplied bound: open forever, matching
/// `Interval::open_ended`'s convention for the end stamp.
fn open_end_stamp() -> EditStamp {
    EditStamp::new(
        Timestamp::from_unix_seconds(INTERVAL_OPEN),
        String::new(),
        Timestamp::from_unix_seconds(EDIT_OPEN),
        String::new(),
    )
}

impl Component {
    /// The at-most-one `Property` of `property_type` active on this
    /// component at `time` (§4.5). More than one match is an invariant
    /// violation (§8 invariant 1); the first is returned and the violation
    /// is only asserted in debug builds, since it reflects corrupted stored
    /// state rather than a caller error this crate's closed taxonomy names.
    #[instrument(skip(self, cache, gateway, abort), fields(component = %self.name()))]
    pub fn get_property(
        &self,
        property_type: &PropertyType,
        time: Timestamp,
        cache: &Cache,
        gateway: &dyn GraphGateway,
        abort: &AbortToken,
    ) -> Result<Option<Property>> {
        let edges = temporal_edges(gateway, self.id(), Category::RelProperty, abort)?;
        let mut matches = Vec::new();
        for edge in edges {
            if !edge.interval.contains_instant(time) {
                continue;
            }
            let property = Property::from_id(cache, gateway, edge.other_endpoint, abort)?;
            if property.property_type() == *property_type {
                matches.push(property);
            }
        }
        debug_assert!(matches.len() <= 1, "at most one active property of a type may contain a given instant");
        Ok(matches.into_iter().next())
    }

    /// Every `rel_property` edge of `property_type` overlapping
    /// `[from_time, to_time)`, ordered by `start.time` ascending, excluding
    /// edges superseded by a later edit (§4.5).
    pub fn get_all_properties_of_type(
        &self,
        property_type: &PropertyType,
        from_time: Timestamp,
        to_time: Timestamp,
        cache: &Cache,
        gateway: &dyn GraphGateway,
        abort: &AbortToken,
    ) -> Result<Vec<(Property, Interval)>> {
        let edges = temporal_edges(gateway, self.id(), Category::RelProperty, abort)?;
        let mut result = Vec::new();
        for edge in edges {
            if edge.interval.is_superseded_edit() {
                continue;
            }
            if !edge.interval.overlaps(from_time, to_time) {
                continue;
            }
            let property = Property::from_id(cache, gateway, edge.other_endpoint, abort)?;
            if property.property_type() == *property_type {
                result.push((property, edge.interval));
            }
        }
        result.sort_by_key(|(_, interval)| interval.start.time);
        Ok(result)
    }

    /// Attaches a deep copy of `property` starting at `time` (§4.5). See the
    /// module-level policy table: an active property already covering `time`
    /// is closed and superseded unless its values are identical
    /// (`PropertyIsSame`); a later property of the same type blocks the
    /// write unless `force` is set, in which case the new interval is capped
    /// at that property's start (a finite `end_time` together with `force`
    /// is always rejected as `PropertiesOverlapping`, since the caller is
    /// asking for two contradictory end bounds at once).
    #[instrument(skip(self, property, cache, gateway, abort), fields(component = %self.name()))]
    #[allow(clippy::too_many_arguments)]
    pub fn set_property(
        &self,
        property: &Property,
        time: Timestamp,
        uid: &str,
        end_time: Option<Timestamp>,
        edit_time: Timestamp,
        comments: &str,
        force: bool,
        cache: &Cache,
        gateway: &dyn GraphGateway,
        abort: &AbortToken,
    ) -> Result<Property> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        let property_type = property.property_type();
        let edges = temporal_edges(gateway, self.id(), Category::RelProperty, abort)?;
        let mut same_type = Vec::new();
        for edge in edges {
            let candidate = Property::from_id(cache, gateway, edge.other_endpoint, abort)?;
            if candidate.property_type() == property_type {
                same_type.push((edge, candidate));
            }
        }

        let mut end_stamp = match end_time {
            Some(end) => EditStamp::new(end, uid, edit_time, comments),
            None => open_end_stamp(),
        };

        if let Some((edge, existing)) = same_type.iter().find(|(edge, _)| edge.interval.contains_instant(time)) {
            if existing.values() == property.values() {
                return domain_err(DomainError::PropertyIsSame);
            }
            let mut closed = edge.interval.clone();
            closed.close(EditStamp::new(time, uid, edit_time, comments));
            from_gateway(gateway.set_edge_properties(edge.id, interval_to_attrs(&closed), abort))?;
        } else if let Some((future_edge, _)) = same_type
            .iter()
            .filter(|(edge, _)| edge.interval.start.time > time)
            .min_by_key(|(edge, _)| edge.interval.start.time)
        {
            if !force {
                return domain_err(DomainError::SetPropertyBeforeExistingProperty);
            }
            if end_time.is_some() {
                return domain_err(DomainError::PropertiesOverlapping);
            }
            end_stamp = EditStamp::new(future_edge.interval.start.time, uid, edit_time, comments);
        }

        let new_property = property.deep_copy();
        new_property.add(cache, gateway, abort)?;
        let interval = Interval::new(EditStamp::new(time, uid, edit_time, comments), end_stamp);
        from_gateway(gateway.add_edge(Category::RelProperty, self.id(), new_property.id(), interval_to_attrs(&interval), abort))?;
        Ok(new_property)
    }

    /// Closes the currently-open property edge of `property_type` active at
    /// `time`. `PropertyNotAdded` if none is active at `time`;
    /// `PropertyIsSame` if that edge already has a finite end (§4.5).
    pub fn unset_property(
        &self,
        property_type: &PropertyType,
        time: Timestamp,
        uid: &str,
        edit_time: Timestamp,
        comments: &str,
        cache: &Cache,
        gateway: &dyn GraphGateway,
        abort: &AbortToken,
    ) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        let edges = temporal_edges(gateway, self.id(), Category::RelProperty, abort)?;
        let mut target = None;
        for edge in edges {
            if !edge.interval.contains_instant(time) {
                continue;
            }
            let candidate = Property::from_id(cache, gateway, edge.other_endpoint, abort)?;
            if candidate.property_type() == *property_type {
                target = Some(edge);
                break;
            }
        }
        let Some(edge) = target else {
            return domain_err(DomainError::PropertyNotAdded);
        };
        if !edge.interval.is_end_open() {
            return domain_err(DomainError::PropertyIsSame);
        }
        let mut closed = edge.interval.clone();
        closed.close(EditStamp::new(time, uid, edit_time, comments));
        from_gateway(gateway.set_edge_properties(edge.id, interval_to_attrs(&closed), abort))
    }

    /// Retires the property currently active at `time` (`Property::disable`,
    /// not an interval close) and attaches `new_property` in its place
    /// (§4.5) — distinct from `unset_property`, which only closes the
    /// interval without disabling the vertex.
    #[allow(clippy::too_many_arguments)]
    pub fn replace_property(
        &self,
        property_type: &PropertyType,
        new_property: &Property,
        time: Timestamp,
        uid: &str,
        comments: &str,
        edit_time: Timestamp,
        cache: &Cache,
        gateway: &dyn GraphGateway,
        abort: &AbortToken,
    ) -> Result<Property> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        if let Some(existing) = self.get_property(property_type, time, cache, gateway, abort)? {
            existing.disable(gateway, time, abort)?;
        }
        self.set_property(new_property, time, uid, None, edit_time, comments, false, cache, gateway, abort)
    }
}
