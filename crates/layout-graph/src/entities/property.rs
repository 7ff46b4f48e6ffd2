use std::sync::{Arc, Mutex, PoisonError};

use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use temporal_versioning::Timestamp;
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::PropertyType,
    error::{domain_err, from_gateway, DomainError, Result},
    support::{disable_vertex_and_incident_edges, Lifecycle},
};

const INCIDENT_EDGES: &[Category] = &[Category::RelPropertyType, Category::RelProperty];
const TRANSFERABLE_EDGES: &[Category] = &[Category::RelProperty];

#[derive(Debug)]
struct State {
    id: GatewayId,
    values: Vec<String>,
    property_type: PropertyType,
    lifecycle: Lifecycle,
}

/// An immutable value instance of a `PropertyType`, attached to a component
/// by a temporal `rel_property` edge (§3). Never mutated once attached:
/// `Component::set_property` always creates a fresh vertex (§4.5).
#[derive(Debug, Clone)]
pub struct Property(Arc<Mutex<State>>);

impl PartialEq for Property {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Property {}

impl Property {
    #[must_use]
    pub fn new(values: Vec<String>, property_type: PropertyType) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: GatewayId::virtual_id(),
            values,
            property_type,
            lifecycle: Lifecycle::new_active(Timestamp::now()),
        })))
    }

    /// A deep copy with a fresh (virtual) identity — `set_property` attaches
    /// a copy of the caller-supplied property rather than the original
    /// handle (§4.5).
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        let state = self.lock();
        Self::new(state.values.clone(), state.property_type.clone())
    }

    #[must_use]
    pub fn id(&self) -> GatewayId {
        self.lock().id
    }

    #[must_use]
    pub fn values(&self) -> Vec<String> {
        self.lock().values.clone()
    }

    #[must_use]
    pub fn property_type(&self) -> PropertyType {
        self.lock().property_type.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attrs(&self) -> AttrMap {
        let state = self.lock();
        let mut attrs = AttrMap::new();
        attrs.insert("values".to_owned(), AttrValue::from(state.values.clone()));
        state.lifecycle.write_to(&mut attrs);
        attrs
    }

    fn from_record(cache: &Cache, gateway: &dyn GraphGateway, record: &VertexRecord, abort: &AbortToken) -> Result<Self> {
        let edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelPropertyType], abort))?;
        let Some(type_id) = edges.first().and_then(|edge| edge.endpoints).map(|(_, in_id)| in_id) else {
            return domain_err(DomainError::PropertyTypeNotAdded);
        };
        let property_type = PropertyType::from_id(cache, gateway, type_id, abort)?;
        Ok(Self(Arc::new(Mutex::new(State {
            id: record.id,
            values: record.attrs.get("values").and_then(AttrValue::as_seq).map(<[String]>::to_vec).unwrap_or_default(),
            property_type,
            lifecycle: Lifecycle::from_attrs(&record.attrs),
        }))))
    }

    #[must_use]
    pub fn added_to_db(&self) -> bool {
        !self.id().is_virtual()
    }

    #[instrument(skip(self, cache, gateway, abort))]
    pub fn add(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.added_to_db() {
            return domain_err(DomainError::VertexAlreadyAdded);
        }
        let property_type = self.property_type();
        self.property_type().validate_values(&self.values())?;
        if property_type.id().is_virtual() {
            return domain_err(DomainError::PropertyTypeNotAdded);
        }
        self.lock().lifecycle = Lifecycle::new_active(Timestamp::now());
        let id = from_gateway(gateway.add_vertex(Category::Property, self.attrs(), abort))?;
        from_gateway(gateway.add_edge(Category::RelPropertyType, id, property_type.id(), AttrMap::new(), abort))?;
        self.lock().id = id;
        cache.properties.get_or_insert_with(id, || self.clone());
        Ok(())
    }

    pub fn disable(&self, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if !self.added_to_db() {
            return domain_err(DomainError::PropertyNotAdded);
        }
        disable_vertex_and_incident_edges(gateway, self.id(), INCIDENT_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        Ok(())
    }

    pub fn replace(&self, new_property: &Self, cache: &Cache, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if !self.added_to_db() {
            return domain_err(DomainError::PropertyNotAdded);
        }
        crate::support::disable_vertex_only(gateway, self.id(), disable_time, abort)?;
        new_property.add(cache, gateway, abort)?;
        crate::support::set_replacement(gateway, self.id(), new_property.id(), abort)?;
        crate::support::migrate_incident_edges(gateway, self.id(), new_property.id(), TRANSFERABLE_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        state.lifecycle.replacement = Some(new_property.id());
        Ok(())
    }

    pub fn from_id(cache: &Cache, gateway: &dyn GraphGateway, id: GatewayId, abort: &AbortToken) -> Result<Self> {
        if let Some(existing) = cache.properties.get(id) {
            return Ok(existing);
        }
        let record = from_gateway(gateway.get_vertex(id, abort))?;
        if let Some(existing) = cache.properties.get(id) {
            return Ok(existing);
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(cache.properties.get_or_insert_with(id, || built.clone()))
    }
}
