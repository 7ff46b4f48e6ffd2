use std::sync::{Arc, Mutex, PoisonError};

use graph_gateway::query::{OrderDirection, Predicate, QuerySpec, Range};
use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use temporal_versioning::Timestamp;
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::ComponentType,
    error::{domain_err, from_gateway, DomainError, Result},
    support::{disable_vertex_and_incident_edges, find_active_by_field, Lifecycle},
};

const INCIDENT_EDGES: &[Category] = &[Category::RelVersionAllowedType, Category::RelVersion];

#[derive(Debug)]
struct State {
    id: GatewayId,
    name: String,
    comments: String,
    allowed_type: ComponentType,
    lifecycle: Lifecycle,
}

/// One version of a `ComponentType` (e.g. `"antenna"` v2). Points at exactly
/// one allowed type via `rel_version_allowed_type` (§3).
#[derive(Debug, Clone)]
pub struct ComponentVersion(Arc<Mutex<State>>);

impl PartialEq for ComponentVersion {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for ComponentVersion {}

impl ComponentVersion {
    #[must_use]
    pub fn new(name: impl Into<String>, comments: impl Into<String>, allowed_type: ComponentType) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: GatewayId::virtual_id(),
            name: name.into(),
            comments: comments.into(),
            allowed_type,
            lifecycle: Lifecycle::new_active(Timestamp::now()),
        })))
    }

    #[must_use]
    pub fn id(&self) -> GatewayId {
        self.lock().id
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    #[must_use]
    pub fn comments(&self) -> String {
        self.lock().comments.clone()
    }

    #[must_use]
    pub fn allowed_type(&self) -> ComponentType {
        self.lock().allowed_type.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attrs(&self) -> AttrMap {
        let state = self.lock();
        let mut attrs = AttrMap::new();
        attrs.insert("name".to_owned(), AttrValue::from(state.name.clone()));
        attrs.insert("comments".to_owned(), AttrValue::from(state.comments.clone()));
        state.lifecycle.write_to(&mut attrs);
        attrs
    }

    fn from_record(cache: &Cache, gateway: &dyn GraphGateway, record: &VertexRecord, abort: &AbortToken) -> Result<Self> {
        let edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelVersionAllowedType], abort))?;
        let Some(type_id) = edges.first().and_then(|edge| edge.endpoints).map(|(_, in_id)| in_id) else {
            return domain_err(DomainError::ComponentTypeNotAdded);
        };
        let allowed_type = ComponentType::from_id(cache, gateway, type_id, abort)?;
        Ok(Self(Arc::new(Mutex::new(State {
            id: record.id,
            name: record.attrs.get("name").and_then(AttrValue::as_text).unwrap_or_default().to_owned(),
            comments: record
                .attrs
                .get("comments")
                .and_then(AttrValue::as_text)
                .unwrap_or_default()
                .to_owned(),
            allowed_type,
            lifecycle: Lifecycle::from_attrs(&record.attrs),
        }))))
    }

    pub fn added_to_db(&self, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<bool> {
        if !self.id().is_virtual() {
            return Ok(true);
        }
        let name = self.name();
        Ok(!find_active_by_field(gateway, Category::ComponentVersion, "name", &name, abort)?.is_empty())
    }

    #[instrument(skip(self, cache, gateway, abort), fields(name = %self.name()))]
    pub fn add(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.added_to_db(gateway, abort)? {
            return domain_err(DomainError::VertexAlreadyAdded);
        }
        let allowed_type = self.allowed_type();
        if allowed_type.id().is_virtual() {
            allowed_type.add(cache, gateway, abort)?;
        }
        self.lock().lifecycle = Lifecycle::new_active(Timestamp::now());
        let id = from_gateway(gateway.add_vertex(Category::ComponentVersion, self.attrs(), abort))?;
        from_gateway(gateway.add_edge(Category::RelVersionAllowedType, id, allowed_type.id(), AttrMap::new(), abort))?;
        self.lock().id = id;
        cache.component_versions.get_or_insert_with(id, || self.clone());
        Ok(())
    }

    /// No incident edge of a `ComponentVersion` is eligible for transfer:
    /// `rel_version_allowed_type` and `rel_version` are both structural
    /// typing edges (§4.3).
    pub fn disable(&self, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentVersionNotAdded);
        }
        disable_vertex_and_incident_edges(gateway, self.id(), INCIDENT_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        Ok(())
    }

    pub fn replace(&self, new_version: &Self, cache: &Cache, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentVersionNotAdded);
        }
        crate::support::disable_vertex_only(gateway, self.id(), disable_time, abort)?;
        new_version.add(cache, gateway, abort)?;
        crate::support::set_replacement(gateway, self.id(), new_version.id(), abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        state.lifecycle.replacement = Some(new_version.id());
        Ok(())
    }

    pub fn from_id(cache: &Cache, gateway: &dyn GraphGateway, id: GatewayId, abort: &AbortToken) -> Result<Self> {
        if let Some(existing) = cache.component_versions.get(id) {
            return Ok(existing);
        }
        let record = from_gateway(gateway.get_vertex(id, abort))?;
        if let Some(existing) = cache.component_versions.get(id) {
            return Ok(existing);
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(cache.component_versions.get_or_insert_with(id, || built.clone()))
    }

    pub fn from_name(cache: &Cache, gateway: &dyn GraphGateway, name: &str, abort: &AbortToken) -> Result<Option<Self>> {
        let Some(record) = find_active_by_field(gateway, Category::ComponentVersion, "name", name, abort)?.into_iter().next() else {
            return Ok(None);
        };
        if let Some(existing) = cache.component_versions.get(record.id) {
            return Ok(Some(existing));
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(Some(cache.component_versions.get_or_insert_with(record.id, || built.clone())))
    }

    pub fn get_list(
        cache: &Cache,
        gateway: &dyn GraphGateway,
        name_substring: &str,
        direction: OrderDirection,
        range: Option<Range>,
        abort: &AbortToken,
    ) -> Result<Vec<Self>> {
        let mut spec = QuerySpec::new(Predicate::and([
            Predicate::CategoryIs(Category::ComponentVersion),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
            Predicate::Substring("name".to_owned(), name_substring.to_owned()),
        ]))
        .order_by("name", direction);
        if let Some(range) = range {
            spec = spec.range(range);
        }
        let records = from_gateway(gateway.query(&spec, abort))?;
        records
            .into_iter()
            .map(|record| Self::from_id(cache, gateway, record.id, abort))
            .collect()
    }

    pub fn get_count(gateway: &dyn GraphGateway, name_substring: &str, abort: &AbortToken) -> Result<usize> {
        let spec = QuerySpec::new(Predicate::and([
            Predicate::CategoryIs(Category::ComponentVersion),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
            Predicate::Substring("name".to_owned(), name_substring.to_owned()),
        ]));
        Ok(from_gateway(gateway.query(&spec, abort))?.len())
    }
}
