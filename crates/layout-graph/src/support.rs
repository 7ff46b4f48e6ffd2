//! Plumbing shared by every entity module in [`crate::entities`]: lifecycle
//! attribute (de)serialization, active-uniqueness lookups, and the disable /
//! replace edge-migration machinery common to the whole entity contract
//! (§4.3).

use graph_gateway::{
    query::{OrderDirection, Predicate, QuerySpec, Range},
    AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord,
};
use temporal_versioning::{EditStamp, Interval, Timestamp, DISABLED_NEVER};

use crate::error::{from_gateway, Result};

const REPLACEMENT_NONE: i64 = 0;

/// The four lifecycle attributes every vertex and edge carries (§3).
#[derive(Debug, Clone, Copy)]
pub(crate) struct Lifecycle {
    pub time_added: Timestamp,
    pub time_disabled: Timestamp,
    pub active: bool,
    pub replacement: Option<GatewayId>,
}

impl Lifecycle {
    pub fn new_active(time_added: Timestamp) -> Self {
        Self {
            time_added,
            time_disabled: Timestamp::from_unix_seconds(DISABLED_NEVER),
            active: true,
            replacement: None,
        }
    }

    pub fn from_attrs(attrs: &AttrMap) -> Self {
        let time_added = attrs.get("time_added").and_then(AttrValue::as_int).unwrap_or(0);
        let time_disabled = attrs
            .get("time_disabled")
            .and_then(AttrValue::as_int)
            .unwrap_or(DISABLED_NEVER);
        let active = attrs.get("active").and_then(AttrValue::as_bool).unwrap_or(true);
        let replacement = attrs
            .get("replacement")
            .and_then(AttrValue::as_int)
            .filter(|raw| *raw != REPLACEMENT_NONE)
            .map(GatewayId::new);
        Self {
            time_added: Timestamp::from_unix_seconds(time_added),
            time_disabled: Timestamp::from_unix_seconds(time_disabled),
            active,
            replacement,
        }
    }

    pub fn write_to(&self, attrs: &mut AttrMap) {
        attrs.insert("time_added".to_owned(), AttrValue::Int(self.time_added.unix_seconds()));
        attrs.insert(
            "time_disabled".to_owned(),
            AttrValue::Int(self.time_disabled.unix_seconds()),
        );
        attrs.insert("active".to_owned(), AttrValue::Bool(self.active));
        attrs.insert(
            "replacement".to_owned(),
            AttrValue::Int(self.replacement.map_or(REPLACEMENT_NONE, GatewayId::raw)),
        );
    }
}

/// Finds every active vertex of `category` whose `field` attribute equals
/// `value` exactly. Used both by `added_to_db()` (§4.3) and by `from_name`
/// loaders — `field` is `"name"` for most kinds, `"uname"` for `User`.
pub(crate) fn find_active_by_field(
    gateway: &dyn GraphGateway,
    category: Category,
    field: &str,
    value: &str,
    abort: &AbortToken,
) -> Result<Vec<VertexRecord>> {
    let spec = QuerySpec::new(Predicate::and([
        Predicate::CategoryIs(category),
        Predicate::Eq(field.to_owned(), AttrValue::from(value)),
        Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
    ]));
    from_gateway(gateway.query(&spec, abort))
}

pub(crate) fn count_active(gateway: &dyn GraphGateway, category: Category, abort: &AbortToken) -> Result<usize> {
    let spec = QuerySpec::new(Predicate::and([
        Predicate::CategoryIs(category),
        Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
    ]));
    Ok(from_gateway(gateway.query(&spec, abort))?.len())
}

pub(crate) fn list_active(
    gateway: &dyn GraphGateway,
    category: Category,
    extra: Predicate,
    range: Option<Range>,
    abort: &AbortToken,
) -> Result<Vec<VertexRecord>> {
    let mut spec = QuerySpec::new(Predicate::and([
        Predicate::CategoryIs(category),
        Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
        extra,
    ]))
    .order_by("name", OrderDirection::Asc);
    if let Some(range) = range {
        spec = spec.range(range);
    }
    from_gateway(gateway.query(&spec, abort))
}

/// Sets `active = false` / `time_disabled` on a single vertex, without
/// touching its incident edges. The first step of `replace()` (§4.3): the
/// eligible edges get migrated separately, and the ineligible ones are left
/// exactly as they are, still attached to the now-disabled vertex, as
/// history.
pub(crate) fn disable_vertex_only(
    gateway: &dyn GraphGateway,
    id: GatewayId,
    disable_time: Timestamp,
    abort: &AbortToken,
) -> Result<()> {
    let mut attrs = AttrMap::new();
    attrs.insert("active".to_owned(), AttrValue::Bool(false));
    attrs.insert("time_disabled".to_owned(), AttrValue::Int(disable_time.unix_seconds()));
    from_gateway(gateway.set_vertex_properties(id, attrs, abort))
}

pub(crate) fn set_replacement(
    gateway: &dyn GraphGateway,
    id: GatewayId,
    replacement: GatewayId,
    abort: &AbortToken,
) -> Result<()> {
    let mut attrs = AttrMap::new();
    attrs.insert("replacement".to_owned(), AttrValue::Int(replacement.raw()));
    from_gateway(gateway.set_vertex_properties(id, attrs, abort))
}

/// Disables a vertex (`active = false`) and every incident edge in
/// `incident_categories`, all at `disable_time`. No successor is created
/// (§4.3 `disable()`).
pub(crate) fn disable_vertex_and_incident_edges(
    gateway: &dyn GraphGateway,
    id: GatewayId,
    incident_categories: &[Category],
    disable_time: Timestamp,
    abort: &AbortToken,
) -> Result<()> {
    let mut attrs = AttrMap::new();
    attrs.insert("active".to_owned(), AttrValue::Bool(false));
    attrs.insert("time_disabled".to_owned(), AttrValue::Int(disable_time.unix_seconds()));

    from_gateway(gateway.set_vertex_properties(id, attrs.clone(), abort))?;

    let edges = from_gateway(gateway.incident_edges(id, incident_categories, abort))?;
    for edge in edges {
        from_gateway(gateway.set_edge_properties(edge.id, attrs.clone(), abort))?;
    }
    Ok(())
}

/// Recreates, on `new_id`, every active edge of `transferable_categories`
/// incident to `old_id`, preserving direction and attributes, then disables
/// the originals — batched per category so no concurrent reader ever
/// observes one category half-migrated against another (§9 REDESIGN).
pub(crate) fn migrate_incident_edges(
    gateway: &dyn GraphGateway,
    old_id: GatewayId,
    new_id: GatewayId,
    transferable_categories: &[Category],
    disable_time: Timestamp,
    abort: &AbortToken,
) -> Result<()> {
    for &category in transferable_categories {
        let edges = from_gateway(gateway.incident_edges(old_id, &[category], abort))?;
        let mut disable_attrs = AttrMap::new();
        disable_attrs.insert("active".to_owned(), AttrValue::Bool(false));
        disable_attrs.insert(
            "time_disabled".to_owned(),
            AttrValue::Int(disable_time.unix_seconds()),
        );

        for edge in edges {
            let Some((out_id, in_id)) = edge.endpoints else {
                continue;
            };
            let (new_out, new_in) = if out_id == old_id {
                (new_id, in_id)
            } else {
                (out_id, new_id)
            };
            let new_edge_id = from_gateway(gateway.add_edge(category, new_out, new_in, edge.attrs.clone(), abort))?;

            let mut original_attrs = disable_attrs.clone();
            original_attrs.insert("replacement".to_owned(), AttrValue::Int(new_edge_id.raw()));
            from_gateway(gateway.set_edge_properties(edge.id, original_attrs, abort))?;
        }
    }
    Ok(())
}

pub(crate) fn interval_to_attrs(interval: &Interval) -> AttrMap {
    let mut attrs = AttrMap::new();
    write_edit_stamp(&mut attrs, "start", &interval.start);
    write_edit_stamp(&mut attrs, "end", &interval.end);
    attrs
}

pub(crate) fn interval_from_attrs(attrs: &AttrMap) -> Interval {
    Interval::new(read_edit_stamp(attrs, "start"), read_edit_stamp(attrs, "end"))
}

fn write_edit_stamp(attrs: &mut AttrMap, prefix: &str, stamp: &EditStamp) {
    attrs.insert(format!("{prefix}_time"), AttrValue::Int(stamp.time.unix_seconds()));
    attrs.insert(format!("{prefix}_uid"), AttrValue::from(stamp.uid.clone()));
    attrs.insert(
        format!("{prefix}_edit_time"),
        AttrValue::Int(stamp.edit_time.unix_seconds()),
    );
    attrs.insert(format!("{prefix}_comments"), AttrValue::from(stamp.comments.clone()));
}

fn read_edit_stamp(attrs: &AttrMap, prefix: &str) -> EditStamp {
    let time = attrs.get(&format!("{prefix}_time")).and_then(AttrValue::as_int).unwrap_or(0);
    let uid = attrs
        .get(&format!("{prefix}_uid"))
        .and_then(AttrValue::as_text)
        .unwrap_or_default()
        .to_owned();
    let edit_time = attrs
        .get(&format!("{prefix}_edit_time"))
        .and_then(AttrValue::as_int)
        .unwrap_or(0);
    let comments = attrs
        .get(&format!("{prefix}_comments"))
        .and_then(AttrValue::as_text)
        .unwrap_or_default()
        .to_owned();
    EditStamp::new(
        Timestamp::from_unix_seconds(time),
        uid,
        Timestamp::from_unix_seconds(edit_time),
        comments,
    )
}
