use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use graph_gateway::query::{OrderDirection, Predicate, QuerySpec, Range};
use graph_gateway::{AbortToken, AttrMap, AttrValue, Category, GatewayId, GraphGateway, VertexRecord};
use temporal_versioning::Timestamp;
use tracing::instrument;

use crate::{
    cache::Cache,
    entities::{ComponentType, ComponentVersion},
    error::{domain_err, from_gateway, DomainError, Result},
    support::{disable_vertex_and_incident_edges, find_active_by_field, Lifecycle},
};

const INCIDENT_EDGES: &[Category] = &[
    Category::RelComponentType,
    Category::RelVersion,
    Category::RelProperty,
    Category::RelConnection,
    Category::RelSubcomponent,
    Category::RelFlagComponent,
];

const TRANSFERABLE_EDGES: &[Category] =
    &[Category::RelProperty, Category::RelConnection, Category::RelSubcomponent, Category::RelFlagComponent];

/// Sentinel used so components with no `version` sort after every real
/// version name in ascending order (§4.4).
const MISSING_VERSION_SORT_KEY: &str = "\u{10FFFF}";

/// The closed set of keys `Component::get_list` accepts (§4.4) — a compile
/// error for anything else, stricter than a runtime "programming error"
/// check but meaning-preserving (§9 REDESIGN).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentOrderKey {
    Name,
    Type,
    Version,
}

/// One AND-clause of a `Component::get_list` filter; an empty string in any
/// field means "do not constrain on this". The full filter list is an OR of
/// these (§4.4).
#[derive(Debug, Clone, Default)]
pub struct ComponentFilter {
    pub name_substring: String,
    pub type_name: String,
    pub version_name: String,
}

#[derive(Debug)]
struct State {
    id: GatewayId,
    name: String,
    component_type: ComponentType,
    version: Option<ComponentVersion>,
    lifecycle: Lifecycle,
}

/// One physical piece of inventory: a typed, optionally-versioned vertex
/// that anchors the temporal property/connection/flag/subcomponent
/// operations of §4.5–§4.6.
#[derive(Debug, Clone)]
pub struct Component(Arc<Mutex<State>>);

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Component {}

impl Component {
    #[must_use]
    pub fn new(name: impl Into<String>, component_type: ComponentType, version: Option<ComponentVersion>) -> Self {
        Self(Arc::new(Mutex::new(State {
            id: GatewayId::virtual_id(),
            name: name.into(),
            component_type,
            version,
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
    pub fn time_added(&self) -> Timestamp {
        self.lock().lifecycle.time_added
    }

    #[must_use]
    pub fn component_type(&self) -> ComponentType {
        self.lock().component_type.clone()
    }

    #[must_use]
    pub fn version(&self) -> Option<ComponentVersion> {
        self.lock().version.clone()
    }

    pub(crate) fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn attrs(&self) -> AttrMap {
        let state = self.lock();
        let mut attrs = AttrMap::new();
        attrs.insert("name".to_owned(), AttrValue::from(state.name.clone()));
        state.lifecycle.write_to(&mut attrs);
        attrs
    }

    fn version_sort_key(&self) -> String {
        self.version().map_or_else(|| MISSING_VERSION_SORT_KEY.to_owned(), |version| version.name())
    }

    fn matches_filter(&self, filter: &ComponentFilter) -> bool {
        (filter.name_substring.is_empty() || self.name().contains(&filter.name_substring))
            && (filter.type_name.is_empty() || self.component_type().name() == filter.type_name)
            && (filter.version_name.is_empty()
                || self.version().is_some_and(|version| version.name() == filter.version_name))
    }

    fn cmp_by(&self, other: &Self, order_by: ComponentOrderKey, direction: OrderDirection) -> Ordering {
        let primary = match order_by {
            ComponentOrderKey::Name => self.name().cmp(&other.name()),
            ComponentOrderKey::Type => self.component_type().name().cmp(&other.component_type().name()),
            ComponentOrderKey::Version => self.version_sort_key().cmp(&other.version_sort_key()),
        };
        let primary = match direction {
            OrderDirection::Asc => primary,
            OrderDirection::Desc => primary.reverse(),
        };
        let tail = match order_by {
            ComponentOrderKey::Name => self
                .component_type()
                .name()
                .cmp(&other.component_type().name())
                .then_with(|| self.version_sort_key().cmp(&other.version_sort_key())),
            ComponentOrderKey::Type => self.version_sort_key().cmp(&other.version_sort_key()),
            ComponentOrderKey::Version => self.component_type().name().cmp(&other.component_type().name()),
        };
        primary.then_with(|| self.name().cmp(&other.name())).then(tail)
    }

    fn from_record(cache: &Cache, gateway: &dyn GraphGateway, record: &VertexRecord, abort: &AbortToken) -> Result<Self> {
        let type_edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelComponentType], abort))?;
        let Some(type_id) = type_edges.first().and_then(|edge| edge.endpoints).map(|(_, in_id)| in_id) else {
            return domain_err(DomainError::ComponentTypeNotAdded);
        };
        let component_type = ComponentType::from_id(cache, gateway, type_id, abort)?;
        let version_edges = from_gateway(gateway.incident_edges(record.id, &[Category::RelVersion], abort))?;
        let version = match version_edges.first().and_then(|edge| edge.endpoints) {
            Some((_, version_id)) => Some(ComponentVersion::from_id(cache, gateway, version_id, abort)?),
            None => None,
        };
        Ok(Self(Arc::new(Mutex::new(State {
            id: record.id,
            name: record.attrs.get("name").and_then(AttrValue::as_text).unwrap_or_default().to_owned(),
            component_type,
            version,
            lifecycle: Lifecycle::from_attrs(&record.attrs),
        }))))
    }

    pub fn added_to_db(&self, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<bool> {
        if !self.id().is_virtual() {
            return Ok(true);
        }
        let name = self.name();
        Ok(!find_active_by_field(gateway, Category::Component, "name", &name, abort)?.is_empty())
    }

    #[instrument(skip(self, cache, gateway, abort), fields(name = %self.name()))]
    pub fn add(&self, cache: &Cache, gateway: &dyn GraphGateway, abort: &AbortToken) -> Result<()> {
        if self.added_to_db(gateway, abort)? {
            return domain_err(DomainError::VertexAlreadyAdded);
        }
        let (component_type, version) = {
            let state = self.lock();
            (state.component_type.clone(), state.version.clone())
        };
        if component_type.id().is_virtual() {
            component_type.add(cache, gateway, abort)?;
        }
        if let Some(version) = &version {
            if version.id().is_virtual() {
                version.add(cache, gateway, abort)?;
            }
        }
        self.lock().lifecycle = Lifecycle::new_active(Timestamp::now());
        let id = from_gateway(gateway.add_vertex(Category::Component, self.attrs(), abort))?;
        from_gateway(gateway.add_edge(Category::RelComponentType, id, component_type.id(), AttrMap::new(), abort))?;
        if let Some(version) = &version {
            from_gateway(gateway.add_edge(Category::RelVersion, id, version.id(), AttrMap::new(), abort))?;
        }
        self.lock().id = id;
        cache.components.get_or_insert_with(id, || self.clone());
        Ok(())
    }

    #[instrument(skip(self, gateway, abort), fields(id = %self.id()))]
    pub fn disable(&self, gateway: &dyn GraphGateway, disable_time: Timestamp, abort: &AbortToken) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        disable_vertex_and_incident_edges(gateway, self.id(), INCIDENT_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        Ok(())
    }

    #[instrument(skip(self, new_component, cache, gateway, abort), fields(id = %self.id()))]
    pub fn replace(
        &self,
        new_component: &Self,
        cache: &Cache,
        gateway: &dyn GraphGateway,
        disable_time: Timestamp,
        abort: &AbortToken,
    ) -> Result<()> {
        if self.id().is_virtual() {
            return domain_err(DomainError::ComponentNotAdded);
        }
        crate::support::disable_vertex_only(gateway, self.id(), disable_time, abort)?;
        new_component.add(cache, gateway, abort)?;
        crate::support::set_replacement(gateway, self.id(), new_component.id(), abort)?;
        crate::support::migrate_incident_edges(gateway, self.id(), new_component.id(), TRANSFERABLE_EDGES, disable_time, abort)?;
        let mut state = self.lock();
        state.lifecycle.active = false;
        state.lifecycle.time_disabled = disable_time;
        state.lifecycle.replacement = Some(new_component.id());
        Ok(())
    }

    pub fn from_id(cache: &Cache, gateway: &dyn GraphGateway, id: GatewayId, abort: &AbortToken) -> Result<Self> {
        if let Some(existing) = cache.components.get(id) {
            return Ok(existing);
        }
        let record = from_gateway(gateway.get_vertex(id, abort))?;
        if let Some(existing) = cache.components.get(id) {
            return Ok(existing);
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(cache.components.get_or_insert_with(id, || built.clone()))
    }

    pub fn from_name(cache: &Cache, gateway: &dyn GraphGateway, name: &str, abort: &AbortToken) -> Result<Option<Self>> {
        let Some(record) = find_active_by_field(gateway, Category::Component, "name", name, abort)?.into_iter().next() else {
            return Ok(None);
        };
        if let Some(existing) = cache.components.get(record.id) {
            return Ok(Some(existing));
        }
        let built = Self::from_record(cache, gateway, &record, abort)?;
        Ok(Some(cache.components.get_or_insert_with(record.id, || built.clone())))
    }

    /// Filtered, ordered, paginated listing (§4.4). The gateway only knows
    /// how to filter on a vertex's own attributes, so `type_name`/
    /// `version_name` constraints and the `type`/`version` sort keys —
    /// which both require following an edge to a related vertex — are
    /// applied here, after loading each candidate through the cache.
    pub fn get_list(
        cache: &Cache,
        gateway: &dyn GraphGateway,
        filters: &[ComponentFilter],
        order_by: ComponentOrderKey,
        direction: OrderDirection,
        range: Option<Range>,
        abort: &AbortToken,
    ) -> Result<Vec<Self>> {
        let spec = QuerySpec::new(Predicate::and([
            Predicate::CategoryIs(Category::Component),
            Predicate::Eq("active".to_owned(), AttrValue::Bool(true)),
        ]));
        let records = from_gateway(gateway.query(&spec, abort))?;
        let mut components = records
            .into_iter()
            .map(|record| Self::from_id(cache, gateway, record.id, abort))
            .collect::<Result<Vec<_>>>()?;

        if !filters.is_empty() {
            components.retain(|component| filters.iter().any(|filter| component.matches_filter(filter)));
        }

        components.sort_by(|a, b| a.cmp_by(b, order_by, direction));

        Ok(match range {
            Some(range) => components.into_iter().skip(range.lo).take(range.len()).collect(),
            None => components,
        })
    }

    pub fn get_count(cache: &Cache, gateway: &dyn GraphGateway, filters: &[ComponentFilter], abort: &AbortToken) -> Result<usize> {
        Ok(Self::get_list(cache, gateway, filters, ComponentOrderKey::Name, OrderDirection::Asc, None, abort)?.len())
    }

    /// `Component.of_type(type_name)` — a convenience lister over a single
    /// filter column (§3 SUPPLEMENT).
    pub fn of_type(cache: &Cache, gateway: &dyn GraphGateway, type_name: &str, abort: &AbortToken) -> Result<Vec<Self>> {
        let filter = ComponentFilter {
            type_name: type_name.to_owned(),
            ..ComponentFilter::default()
        };
        Self::get_list(cache, gateway, &[filter], ComponentOrderKey::Name, OrderDirection::Asc, None, abort)
    }

    /// `Component.of_version(version_name)` (§3 SUPPLEMENT).
    pub fn of_version(cache: &Cache, gateway: &dyn GraphGateway, version_name: &str, abort: &AbortToken) -> Result<Vec<Self>> {
        let filter = ComponentFilter {
            version_name: version_name.to_owned(),
            ..ComponentFilter::default()
        };
        Self::get_list(cache, gateway, &[filter], ComponentOrderKey::Name, OrderDirection::Asc, None, abort)
    }
}
