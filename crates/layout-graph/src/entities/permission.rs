use std::sync::{Arc, Mutex, PoisonError};

use graph_gateway::query::{OrderDirection, Predicate, QuerySpec, Range};
use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use temporal_versioning::Timestamp;

use crate::{
    cache::Cache,
    error::{domain_err, from_gateway, DomainError, Result},
    support::{disable_vertex_and_incident_edges, find_active_by_field, Lifecycle},
};

const INCIDENT_EDGES: &[Category] = &[Category::RelGroupPermission];

#[derive(Debug)]
struct State {
    id: GatewayId,
    name: String,
    comments: String,
    lifecycle: Lifecycle,
}

/// A named capability a `UserGroup` can grant (§3).
#[derive(Debug, Clone)]
pub struct Permission(Arc<Mutex<State>>);

impl PartialEq for Permission {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Permission {}

impl Permission {
    #[must_use]
    pub fn new(name: impl Into<String>, comments: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: GatewayId::virtual_id(),
            name: name.into(),
            comments: comments.into(),
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

    fn from_record(record: &VertexRecord) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: record.id,
            name: record.attrs.get("name").and_then(AttrValue::as_text).unwrap_or_default().to_owned(),
            comments: record
                .attrs
                .get("comments")
                .and_then(AttrValue::as_text)
                .unwrap_or_default()
                .to_owned(),
            lifecycle: Lifecycle::from_attrs(&record.attrs),
        })))
    }

    pub fn added_to_db(&self, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<bool> {
        if !self.id().is_virtual() {
            return Ok(true);
        }
        let name = self.name();
        Ok(!find_active_by_field(gateway, Category::Permission, "name", &name, abort)?.is_empty())
    }

    pub fn add(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.added_to_db(gateway, abort)? {
            return domain_err(DomainError::VertexAlreadyAdded);
        }
        self.lock().lifecycle = Lifecycle::new_active(Timestamp::now());
        let id = from_gateway(gateway.add_vertex(Category::Permission, self.attrs(), abort))?;
        self.lock().id = id;
        cache.permissions.get_or_insert_with(id, || self.clone());
        Ok(())
    }

    pub fn disable(&self, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::PermissionNotAdded);
        }
        disable_vertex_and_incident_edges(gateway, self.id(), INCIDENT_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        Ok(())
    }

    pub fn replace(&self, new_permission: &Self, cache: &Cache, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::PermissionNotAdded);
        }
        crate::support::disable_vertex_only(gateway, self.id(), disable_time, abort)?;
        new_permission.add(cache, gateway, abort)?;
        crate::support::set_replacement(gateway, self.id(), new_permission.id(), abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        state.lifecycle.replacement = Some(new_permission.id());
        Ok(())
    }

    pub fn from_id(cache: &Cache, gateway: &dyn GraphGateway, id: GatewayId, abort: &AbortToken) -> Result<Self> {
        if let Some(existing) = cache.permissions.get(id) {
            return Ok(existing);
        }
        let record = from_gateway(gateway.get_vertex(id, abort))?;
        Ok(cache.permissions.get_or_insert_with(id, || Self::from_record(&record)))
    }

    pub fn from_name(cache: &Cache, gateway: &dyn GraphGateway, name: &str, abort: &AbortToken) -> Result<Option<Self>> {
        let Some(record) = find_active_by_field(gateway, Category::Permission, "name", name, abort)?.into_iter().next() else {
            return Ok(None);
        };
        if let Some(existing) = cache.permissions.get(record.id) {
            return Ok(Some(existing));
        }
        Ok(Some(cache.permissions.get_or_insert_with(record.id, || Self::from_record(&record))))
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
            Predicate::CategoryIs(Category::Permission),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
            Predicate::Substring("name".to_owned(), name_substring.to_owned()),
        ]))
        .order_by("name", direction);
        if let Some(range) = range {
            spec = spec.range(range);
        }
        let records = from_gateway(gateway.query(&spec, abort))?;
        Ok(records
            .into_iter()
            .map(|record| {
                cache
                    .permissions
                    .get(record.id)
                    .unwrap_or_else(|| cache.permissions.get_or_insert_with(record.id, || Self::from_record(&record)))
            })
            .collect())
    }

    pub fn get_count(gateway: &dyn GraphGateway, name_substring: &str, abort: &AbortToken) -> Result<usize> {
        let spec = QuerySpec::new(Predicate::and([
            Predicate::CategoryIs(Category::Permission),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
            Predicate::Substring("name".to_owned(), name_substring.to_owned()),
        ]));
        Ok(from_gateway(gateway.query(&spec, abort))?.len())
    }
}
