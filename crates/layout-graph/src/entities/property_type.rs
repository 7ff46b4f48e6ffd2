use std::sync::{Arc, Mutex, PoisonError};

use graph_gateway::query::{OrderDirection, Predicate, QuerySpec, Range};
use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use regex::Regex;
use temporal_versioning::Timestamp;
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::ComponentType,
    error::{domain_err, from_gateway, DomainError, Result},
    support::{disable_vertex_and_incident_edges, find_active_by_field, Lifecycle},
};

const INCIDENT_EDGES: &[Category] = &[Category::RelPropertyAllowedType, Category::RelPropertyType];

#[derive(Debug)]
struct State {
    id: GatewayId,
    name: String,
    units: String,
    allowed_regex: String,
    n_values: u32,
    comments: String,
    allowed_types: Vec<ComponentType>,
    lifecycle: Lifecycle,
}

/// A typed, schema-carrying property definition: arity (`n_values`), a
/// validation `allowed_regex`, and the set of component types it may be
/// attached to (§3).
#[derive(Debug, Clone)]
pub struct PropertyType(Arc<Mutex<State>>);

impl PartialEq for PropertyType {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for PropertyType {}

impl PropertyType {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        units: impl Into<String>,
        allowed_regex: impl Into<String>,
        n_values: u32,
        comments: impl Into<String>,
        allowed_types: Vec<ComponentType>,
    ) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: GatewayId::virtual_id(),
            name: name.into(),
            units: units.into(),
            allowed_regex: allowed_regex.into(),
            n_values,
            comments: comments.into(),
            allowed_types,
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
    pub fn units(&self) -> String {
        self.lock().units.clone()
    }

    #[must_use]
    pub fn allowed_regex(&self) -> String {
        self.lock().allowed_regex.clone()
    }

    #[must_use]
    pub fn n_values(&self) -> u32 {
        self.lock().n_values
    }

    #[must_use]
    pub fn allowed_types(&self) -> Vec<ComponentType> {
        self.lock().allowed_types.clone()
    }

    /// Checks `values.len() == n_values` and every element against
    /// `allowed_regex` (§3 invariant 2, §8 invariant 3).
    pub fn validate_values(&self, values: &[String]) -> Result<()> {
        let state = self.lock();
        if values.len() as u32 != state.n_values {
            return domain_err(DomainError::PropertyWrongNValues);
        }
        let Ok(regex) = Regex::new(&state.allowed_regex) else {
            return domain_err(DomainError::PropertyNotMatchRegex);
        };
        let fully_matches = |value: &str| {
            regex
                .find(value)
                .is_some_and(|found| found.start() == 0 && found.end() == value.len())
        };
        if values.iter().any(|value| !fully_matches(value)) {
            return domain_err(DomainError::PropertyNotMatchRegex);
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attrs(&self) -> AttrMap {
        let state = self.lock();
        let mut attrs = AttrMap::new();
        attrs.insert("name".to_owned(), AttrValue::from(state.name.clone()));
        attrs.insert("units".to_owned(), AttrValue::from(state.units.clone()));
        attrs.insert("allowed_regex".to_owned(), AttrValue::from(state.allowed_regex.clone()));
        attrs.insert("n_values".to_owned(), AttrValue::Int(i64::from(state.n_values)));
        attrs.insert("comments".to_owned(), AttrValue::from(state.comments.clone()));
        state.lifecycle.write_to(&mut attrs);
        attrs
    }

    fn from_record(cache: &Cache, gateway: &dyn GraphGateway, record: &VertexRecord, abort: &AbortToken) -> Result<Self> {
        let edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelPropertyAllowedType], abort))?;
        let mut allowed_types = Vec::with_capacity(edges.len());
        for edge in edges {
            if let Some((_, type_id)) = edge.endpoints {
                allowed_types.push(ComponentType::from_id(cache, gateway, type_id, abort)?);
            }
        }
        Ok(Self(Arc::new(Mutex::new(State {
            id: record.id,
            name: record.attrs.get("name").and_then(AttrValue::as_text).unwrap_or_default().to_owned(),
            units: record.attrs.get("units").and_then(AttrValue::as_text).unwrap_or_default().to_owned(),
            allowed_regex: record
                .attrs
                .get("allowed_regex")
                .and_then(AttrValue::as_text)
                .unwrap_or_default()
                .to_owned(),
            n_values: record
                .attrs
                .get("n_values")
                .and_then(AttrValue::as_int)
                .unwrap_or(1)
                .max(1) as u32,
            comments: record
                .attrs
                .get("comments")
                .and_then(AttrValue::as_text)
                .unwrap_or_default()
                .to_owned(),
            allowed_types,
            lifecycle: Lifecycle::from_attrs(&record.attrs),
        }))))
    }

    pub fn added_to_db(&self, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<bool> {
        if !self.id().is_virtual() {
            return Ok(true);
        }
        let name = self.name();
        Ok(!find_active_by_field(gateway, Category::PropertyType, "name", &name, abort)?.is_empty())
    }

    #[instrument(skip(self, cache, gateway, abort), fields(name = %self.name()))]
    pub fn add(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.added_to_db(gateway, abort)? {
            return domain_err(DomainError::VertexAlreadyAdded);
        }
        if self.lock().n_values == 0 {
            return domain_err(DomainError::PropertyWrongNValues);
        }
        let allowed_types = self.allowed_types();
        if allowed_types.is_empty() {
            return domain_err(DomainError::PropertyTypeZeroAllowedTypes);
        }
        for allowed_type in &allowed_types {
            if allowed_type.id().is_virtual() {
                allowed_type.add(cache, gateway, abort)?;
            }
        }
        self.lock().lifecycle = Lifecycle::new_active(Timestamp::now());
        let id = from_gateway(gateway.add_vertex(Category::PropertyType, self.attrs(), abort))?;
        for allowed_type in &allowed_types {
            from_gateway(gateway.add_edge(Category::RelPropertyAllowedType, id, allowed_type.id(), AttrMap::new(), abort))?;
        }
        self.lock().id = id;
        cache.property_types.get_or_insert_with(id, || self.clone());
        Ok(())
    }

    /// Neither `rel_property_allowed_type` nor `rel_property_type` is
    /// transferred on `replace()`: both are structural-typing edges by
    /// analogy with `rel_component_type`, treated uniformly even though only
    /// the allowed-type edge is named explicitly elsewhere (§9 resolved open
    /// point).
    pub fn disable(&self, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::PropertyTypeNotAdded);
        }
        disable_vertex_and_incident_edges(gateway, self.id(), INCIDENT_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        Ok(())
    }

    pub fn replace(&self, new_type: &Self, cache: &Cache, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::PropertyTypeNotAdded);
        }
        crate::support::disable_vertex_only(gateway, self.id(), disable_time, abort)?;
        new_type.add(cache, gateway, abort)?;
        crate::support::set_replacement(gateway, self.id(), new_type.id(), abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        state.lifecycle.replacement = Some(new_type.id());
        Ok(())
    }

    pub fn from_id(cache: &Cache, gateway: &dyn GraphGateway, id: GatewayId, abort: &AbortToken) -> Result<Self> {
        if let Some(existing) = cache.property_types.get(id) {
            return Ok(existing);
        }
        let record = from_gateway(gateway.get_vertex(id, abort))?;
        if let Some(existing) = cache.property_types.get(id) {
            return Ok(existing);
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(cache.property_types.get_or_insert_with(id, || built.clone()))
    }

    pub fn from_name(cache: &Cache, gateway: &dyn GraphGateway, name: &str, abort: &AbortToken) -> Result<Option<Self>> {
        let Some(record) = find_active_by_field(gateway, Category::PropertyType, "name", name, abort)?.into_iter().next() else {
            return Ok(None);
        };
        if let Some(existing) = cache.property_types.get(record.id) {
            return Ok(Some(existing));
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(Some(cache.property_types.get_or_insert_with(record.id, || built.clone())))
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
            Predicate::CategoryIs(Category::PropertyType),
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
            Predicate::CategoryIs(Category::PropertyType),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
            Predicate::Substring("name".to_owned(), name_substring.to_owned()),
        ]));
        Ok(from_gateway(gateway.query(&spec, abort))?.len())
    }
}
