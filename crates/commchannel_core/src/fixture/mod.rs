//! Demo owner scaffolding for tests and the CLI probe.
//!
//! # Responsibility
//! - Provide a minimal owner entity and an in-memory store that doubles as
//!   the owner resolver for the `commchannel_demo` kind.
//!
//! # Invariants
//! - Store handles share state via `Arc`, so a clone registered as resolver
//!   observes later creates and teardowns.

use crate::model::owner::{CommunicationChannelOwner, OwnerResolver};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Owner kind tag used by the demo objects.
pub const DEMO_OWNER_KIND: &str = "commchannel_demo";

/// Minimal demo entity that can own communication channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoObject {
    pub id: Uuid,
    pub name: String,
}

impl CommunicationChannelOwner for DemoObject {
    fn owner_kind(&self) -> &str {
        DEMO_OWNER_KIND
    }

    fn owner_id(&self) -> Uuid {
        self.id
    }
}

/// Shared in-memory store of demo objects.
///
/// Clones share the same underlying map; register one clone with the owner
/// registry and keep another for creating objects.
#[derive(Debug, Clone, Default)]
pub struct DemoObjectStore {
    objects: Arc<Mutex<BTreeMap<Uuid, DemoObject>>>,
}

impl DemoObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates and stores a demo object with a generated id.
    pub fn create(&self, name: impl Into<String>) -> DemoObject {
        let object = DemoObject {
            id: Uuid::new_v4(),
            name: name.into(),
        };
        self.lock().insert(object.id, object.clone());
        object
    }

    /// Finds one demo object by exact name.
    pub fn find_by_name(&self, name: &str) -> Option<DemoObject> {
        self.lock()
            .values()
            .find(|object| object.name == name)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Teardown helper: removes every stored object.
    pub fn remove_all(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<Uuid, DemoObject>> {
        self.objects.lock().expect("demo object store mutex poisoned")
    }
}

impl OwnerResolver for DemoObjectStore {
    fn owner_kind(&self) -> &str {
        DEMO_OWNER_KIND
    }

    fn exists(&self, id: Uuid) -> bool {
        self.lock().contains_key(&id)
    }

    fn title_of(&self, id: Uuid) -> Option<String> {
        self.lock().get(&id).map(|object| object.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::{DemoObjectStore, DEMO_OWNER_KIND};
    use crate::model::owner::{CommunicationChannelOwner, OwnerResolver};

    #[test]
    fn store_creates_and_resolves_demo_objects() {
        let store = DemoObjectStore::new();
        let fred = store.create("Fred");

        assert_eq!(fred.owner_kind(), DEMO_OWNER_KIND);
        assert!(store.exists(fred.id));
        assert_eq!(store.title_of(fred.id).as_deref(), Some("Fred"));
        assert_eq!(store.find_by_name("Fred"), Some(fred));
        assert_eq!(store.find_by_name("Bill"), None);
    }

    #[test]
    fn clones_share_state_and_teardown_clears_it() {
        let store = DemoObjectStore::new();
        let resolver_handle = store.clone();

        let fred = store.create("Fred");
        assert!(resolver_handle.exists(fred.id));

        store.remove_all();
        assert!(store.is_empty());
        assert!(!resolver_handle.exists(fred.id));
    }
}
