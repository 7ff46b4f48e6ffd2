use std::sync::{Arc, Mutex, PoisonError};

use graph_gateway::query::{OrderDirection, Predicate, QuerySpec, Range};
use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use temporal_versioning::Timestamp;
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::Permission,
    error::{domain_err, from_gateway, DomainError, Result},
    support::{disable_vertex_and_incident_edges, find_active_by_field, Lifecycle},
};

const INCIDENT_EDGES: &[Category] = &[Category::RelGroupPermission, Category::RelUserGroup];

#[derive(Debug)]
struct State {
    id: GatewayId,
    name: String,
    comments: String,
    permissions: Vec<Permission>,
    lifecycle: Lifecycle,
}

/// A named group granting one or more `Permission`s to its `User` members
/// (§3).
#[derive(Debug, Clone)]
pub struct UserGroup(Arc<Mutex<State>>);

impl PartialEq for UserGroup {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for UserGroup {}

impl UserGroup {
    #[must_use]
    pub fn new(name: impl Into<String>, comments: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: GatewayId::virtual_id(),
            name: name.into(),
            comments: comments.into(),
            permissions,
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
    pub fn permissions(&self) -> Vec<Permission> {
        self.lock().permissions.clone()
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
        let edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelGroupPermission], abort))?;
        let mut permissions = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some((_, permission_id)) = edge.endpoints {
                permissions.push(Permission::from_id(cache, gateway, permission_id, abort)?);
            }
        }
        Ok(Self(Arc::new(Mutex::new(State {
            id: record.id,
            name: record.attrs.get("name").and_then(AttrValue::as_text).unwrap_or_default().to_owned(),
            comments: record
                .attrs
                .get("comments")
                .and_then(AttrValue::as_text)
                .unwrap_or_default()
                .to_owned(),
            permissions,
            lifecycle: Lifecycle::from_attrs(&record.attrs),
        }))))
    }

    pub fn added_to_db(&self, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<bool> {
        if !self.id().is_virtual() {
            return Ok(true);
        }
        let name = self.name();
        Ok(!find_active_by_field(gateway, Category::UserGroup, "name", &name, abort)?.is_empty())
    }

    #[instrument(skip(self, cache, gateway, abort), fields(name = %self.name()))]
    pub fn add(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.added_to_db(gateway, abort)? {
            return domain_err(DomainError::VertexAlreadyAdded);
        }
        let permissions = self.permissions();
        if permissions.is_empty() {
            return domain_err(DomainError::UserGroupZeroPermission);
        }
        for permission in &permissions {
            if permission.id().is_virtual() {
                permission.add(cache, gateway, abort)?;
            }
        }
        self.lock().lifecycle = Lifecycle::new_active(Timestamp::now());
        let id = from_gateway(gateway.add_vertex(Category::UserGroup, self.attrs(), abort))?;
        for permission in &permissions {
            from_gateway(gateway.add_edge(Category::RelGroupPermission, id, permission.id(), AttrMap::new(), abort))?;
        }
        self.lock().id = id;
        cache.user_groups.get_or_insert_with(id, || self.clone());
        Ok(())
    }

    pub fn disable(&self, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::UserGroupNotAdded);
        }
        disable_vertex_and_incident_edges(gateway, self.id(), INCIDENT_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        Ok(())
    }

    pub fn replace(&self, new_group: &Self, cache: &Cache, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::UserGroupNotAdded);
        }
        crate::support::disable_vertex_only(gateway, self.id(), disable_time, abort)?;
        new_group.add(cache, gateway, abort)?;
        crate::support::set_replacement(gateway, self.id(), new_group.id(), abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        state.lifecycle.replacement = Some(new_group.id());
        Ok(())
    }

    pub fn from_id(cache: &Cache, gateway: &dyn GraphGateway, id: GatewayId, abort: &AbortToken) -> Result<Self> {
        if let Some(existing) = cache.user_groups.get(id) {
            return Ok(existing);
        }
        let record = from_gateway(gateway.get_vertex(id, abort))?;
        if let Some(existing) = cache.user_groups.get(id) {
            return Ok(existing);
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(cache.user_groups.get_or_insert_with(id, || built.clone()))
    }

    pub fn from_name(cache: &Cache, gateway: &dyn GraphGateway, name: &str, abort: &AbortToken) -> Result<Option<Self>> {
        let Some(record) = find_active_by_field(gateway, Category::UserGroup, "name", name, abort)?.into_iter().next() else {
            return Ok(None);
        };
        if let Some(existing) = cache.user_groups.get(record.id) {
            return Ok(Some(existing));
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(Some(cache.user_groups.get_or_insert_with(record.id, || built.clone())))
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
            Predicate::CategoryIs(Category::UserGroup),
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
            Predicate::CategoryIs(Category::UserGroup),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
            Predicate::Substring("name".to_owned(), name_substring.to_owned()),
        ]));
        Ok(from_gateway(gateway.query(&spec, abort))?.len())
    }
}
