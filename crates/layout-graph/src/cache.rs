use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use graph_gateway::GatewayId;

/// A process-wide `id -> live object` map for one entity kind (§4.2).
///
/// `get_or_insert_with` is the only way to populate it: if the id is already
/// present the cached handle is returned and the freshly constructed one is
/// discarded, which is what makes cache lookups injective (§8, invariant 6)
/// and keeps every kind's constructor idempotent (§9).
#[derive(Debug)]
pub struct TypedCache<T: Clone> {
    entries: Mutex<HashMap<GatewayId, T>>,
}

impl<T: Clone> Default for TypedCache<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> TypedCache<T> {
    #[must_use]
    pub fn get(&self, id: GatewayId) -> Option<T> {
        self.lock().get(&id).cloned()
    }

    /// Returns the cached handle for `id` if present; otherwise builds one
    /// with `build`, inserts it, and returns it. Idempotent under races: if
    /// two callers lose the lock in turn, the second `build()`'s result is
    /// discarded in favor of whichever landed first.
    pub fn get_or_insert_with(&self, id: GatewayId, build: impl FnOnce() -> T) -> T {
        let mut entries = self.lock();
        entries.entry(id).or_insert_with(build).clone()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<GatewayId, T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

use crate::entities::{
    Component, ComponentType, ComponentVersion, Flag, FlagSeverity, FlagType, Permission, Property, PropertyType,
    User, UserGroup,
};

/// The process-wide identity cache (§4.2): one [`TypedCache`] per entity
/// kind. `reset()` is the explicit teardown hook §9 asks for — the test
/// harness calls it between cases the way an integration-test harness
/// truncates tables between tests.
#[derive(Debug, Default)]
pub struct Cache {
    pub component_types: TypedCache<ComponentType>,
    pub component_versions: TypedCache<ComponentVersion>,
    pub components: TypedCache<Component>,
    pub property_types: TypedCache<PropertyType>,
    pub properties: TypedCache<Property>,
    pub flag_types: TypedCache<FlagType>,
    pub flag_severities: TypedCache<FlagSeverity>,
    pub flags: TypedCache<Flag>,
    pub permissions: TypedCache<Permission>,
    pub user_groups: TypedCache<UserGroup>,
    pub users: TypedCache<User>,
}

impl Cache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&self) {
        self.component_types.clear();
        self.component_versions.clear();
        self.components.clear();
        self.property_types.clear();
        self.properties.clear();
        self.flag_types.clear();
        self.flag_severities.clear();
        self.flags.clear();
        self.permissions.clear();
        self.user_groups.clear();
        self.users.clear();
    }
}
