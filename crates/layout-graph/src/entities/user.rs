use std::sync::{Arc, Mutex, PoisonError};

use graph_gateway::query::{OrderDirection, Predicate, QuerySpec, Range};
use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use temporal_versioning::Timestamp;
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::UserGroup,
    error::{domain_err, from_gateway, DomainError, Result},
    support::{disable_vertex_and_incident_edges, find_active_by_field, Lifecycle},
};

const INCIDENT_EDGES: &[Category] = &[Category::RelUserGroup];

#[derive(Debug)]
struct State {
    id: GatewayId,
    uname: String,
    pwd_hash: String,
    institution: String,
    groups: Vec<UserGroup>,
    lifecycle: Lifecycle,
}

/// A login identity, its membership in zero or more `UserGroup`s
/// determining the permissions it holds transitively (§3).
///
/// `uname` is treated as unique among active users — it is the login
/// identifier — even though the §3 table does not tag it `(unique)`
/// explicitly, consistent with invariant 4's intent (resolved open point).
#[derive(Debug, Clone)]
pub struct User(Arc<Mutex<State>>);

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for User {}

impl User {
    #[must_use]
    pub fn new(uname: impl Into<String>, pwd_hash: impl Into<String>, institution: impl Into<String>, groups: Vec<UserGroup>) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: GatewayId::virtual_id(),
            uname: uname.into(),
            pwd_hash: pwd_hash.into(),
            institution: institution.into(),
            groups,
            lifecycle: Lifecycle::new_active(Timestamp::now()),
        })))
    }

    #[must_use]
    pub fn id(&self) -> GatewayId {
        self.lock().id
    }

    #[must_use]
    pub fn uname(&self) -> String {
        self.lock().uname.clone()
    }

    #[must_use]
    pub fn institution(&self) -> String {
        self.lock().institution.clone()
    }

    #[must_use]
    pub fn groups(&self) -> Vec<UserGroup> {
        self.lock().groups.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attrs(&self) -> AttrMap {
        let state = self.lock();
        let mut attrs = AttrMap::new();
        attrs.insert("uname".to_owned(), AttrValue::from(state.uname.clone()));
        attrs.insert("pwd_hash".to_owned(), AttrValue::from(state.pwd_hash.clone()));
        attrs.insert("institution".to_owned(), AttrValue::from(state.institution.clone()));
        state.lifecycle.write_to(&mut attrs);
        attrs
    }

    fn from_record(cache: &Cache, gateway: &dyn GraphGateway, record: &VertexRecord, abort: &AbortToken) -> Result<Self> {
        let edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelUserGroup], abort))?;
        let mut groups = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some((_, group_id)) = edge.endpoints {
                groups.push(UserGroup::from_id(cache, gateway, group_id, abort)?);
            }
        }
        Ok(Self(Arc::new(Mutex::new(State {
            id: record.id,
            uname: record.attrs.get("uname").and_then(AttrValue::as_text).unwrap_or_default().to_owned(),
            pwd_hash: record.attrs.get("pwd_hash").and_then(AttrValue::as_text).unwrap_or_default().to_owned(),
            institution: record
                .attrs
                .get("institution")
                .and_then(AttrValue::as_text)
                .unwrap_or_default()
                .to_owned(),
            groups,
            lifecycle: Lifecycle::from_attrs(&record.attrs),
        }))))
    }

    pub fn added_to_db(&self, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<bool> {
        if !self.id().is_virtual() {
            return Ok(true);
        }
        let uname = self.uname();
        Ok(!find_active_by_field(gateway, Category::User, "uname", &uname, abort)?.is_empty())
    }

    #[instrument(skip(self, cache, gateway, abort), fields(uname = %self.uname()))]
    pub fn add(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.added_to_db(gateway, abort)? {
            return domain_err(DomainError::VertexAlreadyAdded);
        }
        let groups = self.groups();
        for group in &groups {
            if group.id().is_virtual() {
                group.add(cache, gateway, abort)?;
            }
        }
        self.lock().lifecycle = Lifecycle::new_active(Timestamp::now());
        let id = from_gateway(gateway.add_vertex(Category::User, self.attrs(), abort))?;
        for group in &groups {
            from_gateway(gateway.add_edge(Category::RelUserGroup, id, group.id(), AttrMap::new(), abort))?;
        }
        self.lock().id = id;
        cache.users.get_or_insert_with(id, || self.clone());
        Ok(())
    }

    pub fn disable(&self, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::UserNotAdded);
        }
        disable_vertex_and_incident_edges(gateway, self.id(), INCIDENT_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        Ok(())
    }

    pub fn replace(&self, new_user: &Self, cache: &Cache, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::UserNotAdded);
        }
        crate::support::disable_vertex_only(gateway, self.id(), disable_time, abort)?;
        new_user.add(cache, gateway, abort)?;
        crate::support::set_replacement(gateway, self.id(), new_user.id(), abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        state.lifecycle.replacement = Some(new_user.id());
        Ok(())
    }

    pub fn from_id(cache: &Cache, gateway: &dyn GraphGateway, id: GatewayId, abort: &AbortToken) -> Result<Self> {
        if let Some(existing) = cache.users.get(id) {
            return Ok(existing);
        }
        let record = from_gateway(gateway.get_vertex(id, abort))?;
        if let Some(existing) = cache.users.get(id) {
            return Ok(existing);
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(cache.users.get_or_insert_with(id, || built.clone()))
    }

    pub fn from_name(cache: &Cache, gateway: &dyn GraphGateway, uname: &str, abort: &AbortToken) -> Result<Option<Self>> {
        let Some(record) = find_active_by_field(gateway, Category::User, "uname", uname, abort)?.into_iter().next() else {
            return Ok(None);
        };
        if let Some(existing) = cache.users.get(record.id) {
            return Ok(Some(existing));
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(Some(cache.users.get_or_insert_with(record.id, || built.clone())))
    }

    pub fn get_list(
        cache: &Cache,
        gateway: &dyn GraphGateway,
        uname_substring: &str,
        direction: OrderDirection,
        range: Option<Range>,
        abort: &AbortToken,
    ) -> Result<Vec<Self>> {
        let mut spec = QuerySpec::new(Predicate::and([
            Predicate::CategoryIs(Category::User),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
            Predicate::Substring("uname".to_owned(), uname_substring.to_owned()),
        ]))
        .order_by("uname", direction);
        if let Some(range) = range {
            spec = spec.range(range);
        }
        let records = from_gateway(gateway.query(&spec, abort))?;
        records
            .into_iter()
            .map(|record| Self::from_id(cache, gateway, record.id, abort))
            .collect()
    }

    pub fn get_count(gateway: &dyn GraphGateway, uname_substring: &str, abort: &AbortToken) -> Result<usize> {
        let spec = QuerySpec::new(Predicate::and([
            Predicate::CategoryIs(Category::User),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
            Predicate::Substring("uname".to_owned(), uname_substring.to_owned()),
        ]));
        Ok(from_gateway(gateway.query(&spec, abort))?.len())
    }
}
