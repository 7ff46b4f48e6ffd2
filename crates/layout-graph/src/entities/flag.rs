use std::sync::{Arc, Mutex, PoisonError};

use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use temporal_versioning::{EditStamp, Interval, Timestamp};
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::{Component, FlagSeverity, FlagType},
    error::{domain_err, from_gateway, DomainError, Result},
    support::{disable_vertex_and_incident_edges, interval_from_attrs, interval_to_attrs, Lifecycle},
};

const INCIDENT_EDGES: &[Category] = &[Category::RelFlagType, Category::RelFlagSeverity, Category::RelFlagComponent];
const TRANSFERABLE_EDGES: &[Category] = &[Category::RelFlagComponent];

#[derive(Debug)]
struct State {
    id: GatewayId,
    name: String,
    comments: String,
    flag_type: FlagType,
    severity: FlagSeverity,
    components: Vec<Component>,
    interval: Interval,
    lifecycle: Lifecycle,
}

/// A first-class vertex (not an edge, unlike `rel_property`/`rel_connection`)
/// because it can target several components at once and carries its own
/// `[start, end)` interval (§3, §4.6).
#[derive(Debug, Clone)]
pub struct Flag(Arc<Mutex<State>>);

impl PartialEq for Flag {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Flag {}

impl Flag {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        comments: impl Into<String>,
        flag_type: FlagType,
        severity: FlagSeverity,
        components: Vec<Component>,
        start: EditStamp,
    ) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: GatewayId::virtual_id(),
            name: name.into(),
            comments: comments.into(),
            flag_type,
            severity,
            components,
            interval: Interval::open_ended(start),
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
    pub fn flag_type(&self) -> FlagType {
        self.lock().flag_type.clone()
    }

    #[must_use]
    pub fn severity(&self) -> FlagSeverity {
        self.lock().severity.clone()
    }

    #[must_use]
    pub fn components(&self) -> Vec<Component> {
        self.lock().components.clone()
    }

    #[must_use]
    pub fn interval(&self) -> Interval {
        self.lock().interval.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attrs(&self) -> AttrMap {
        let state = self.lock();
        let mut attrs = AttrMap::new();
        attrs.insert("name".to_owned(), AttrValue::from(state.name.clone()));
        attrs.insert("comments".to_owned(), AttrValue::from(state.comments.clone()));
        attrs.extend(interval_to_attrs(&state.interval));
        state.lifecycle.write_to(&mut attrs);
        attrs
    }

    fn from_record(cache: &Cache, gateway: &dyn GraphGateway, record: &VertexRecord, abort: &AbortToken) -> Result<Self> {
        let type_edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelFlagType], abort))?;
        let Some(type_id) = type_edges.first().and_then(|edge| edge.endpoints).map(|(_, in_id)| in_id) else {
            return domain_err(DomainError::FlagTypeNotAdded);
        };
        let severity_edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelFlagSeverity], abort))?;
        let Some(severity_id) = severity_edges.first().and_then(|edge| edge.endpoints).map(|(_, in_id)| in_id) else {
            return domain_err(DomainError::FlagSeverityNotAdded);
        };
        let component_edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelFlagComponent], abort))?;
        let mut components = Vec::with_capacity(component_edges.len());
        for edge in &component_edges {
            if let Some((_, component_id)) = edge.endpoints {
                components.push(Component::from_id(cache, gateway, component_id, abort)?);
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
            flag_type: FlagType::from_id(cache, gateway, type_id, abort)?,
            severity: FlagSeverity::from_id(cache, gateway, severity_id, abort)?,
            components,
            interval: interval_from_attrs(&record.attrs),
            lifecycle: Lifecycle::from_attrs(&record.attrs),
        }))))
    }

    #[must_use]
    pub fn added_to_db(&self) -> bool {
        !self.id().is_virtual()
    }

    #[instrument(skip(self, cache, gateway, abort), fields(name = %self.name()))]
    pub fn add(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.added_to_db() {
            return domain_err(DomainError::VertexAlreadyAdded);
        }
        let (flag_type, severity, components) = {
            let state = self.lock();
            (state.flag_type.clone(), state.severity.clone(), state.components.clone())
        };
        if flag_type.id().is_virtual() {
            flag_type.add(cache, gateway, abort)?;
        }
        if severity.id().is_virtual() {
            severity.add(cache, gateway, abort)?;
        }
        self.lock().lifecycle = Lifecycle::new_active(Timestamp::now());
        let id = from_gateway(gateway.add_vertex(Category::Flag, self.attrs(), abort))?;
        from_gateway(gateway.add_edge(Category::RelFlagType, id, flag_type.id(), AttrMap::new(), abort))?;
        from_gateway(gateway.add_edge(Category::RelFlagSeverity, id, severity.id(), AttrMap::new(), abort))?;
        for component in &components {
            from_gateway(gateway.add_edge(Category::RelFlagComponent, id, component.id(), AttrMap::new(), abort))?;
        }
        self.lock().id = id;
        cache.flags.get_or_insert_with(id, || self.clone());
        Ok(())
    }

    /// Closes the flag's interval, persisting the new `end` both on the
    /// vertex and on the in-memory handle. Fails `FlagNotAdded` if the flag
    /// was never persisted (§4.6).
    #[instrument(skip(self, gateway, abort), fields(id = %self.id()))]
    pub fn end_flag(&self, end: EditStamp, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if !self.added_to_db() {
            return domain_err(DomainError::FlagNotAdded);
        }
        let mut interval = self.interval();
        interval.close(end);
        let attrs = interval_to_attrs(&interval);
        from_gateway(gateway.set_vertex_properties(self.id(), attrs, abort))?;
        self.lock().interval = interval;
        Ok(())
    }

    pub fn disable(&self, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if !self.added_to_db() {
            return domain_err(DomainError::FlagNotAdded);
        }
        disable_vertex_and_incident_edges(gateway, self.id(), INCIDENT_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        Ok(())
    }

    pub fn replace(&self, new_flag: &Self, cache: &Cache, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if !self.added_to_db() {
            return domain_err(DomainError::FlagNotAdded);
        }
        crate::support::disable_vertex_only(gateway, self.id(), disable_time, abort)?;
        new_flag.add(cache, gateway, abort)?;
        crate::support::set_replacement(gateway, self.id(), new_flag.id(), abort)?;
        crate::support::migrate_incident_edges(gateway, self.id(), new_flag.id(), TRANSFERABLE_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        state.lifecycle.replacement = Some(new_flag.id());
        Ok(())
    }

    pub fn from_id(cache: &Cache, gateway: &dyn GraphGateway, id: GatewayId, abort: &AbortToken) -> Result<Self> {
        if let Some(existing) = cache.flags.get(id) {
            return Ok(existing);
        }
        let record = from_gateway(gateway.get_vertex(id, abort))?;
        if let Some(existing) = cache.flags.get(id) {
            return Ok(existing);
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(cache.flags.get_or_insert_with(id, || built.clone()))
    }
}
