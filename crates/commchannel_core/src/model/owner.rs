//! Polymorphic channel owner references and the owner-kind registry.
//!
//! # Responsibility
//! - Define the capability trait that lets arbitrary host entities own
//!   communication channels.
//! - Provide the tagged `OwnerRef` used as the association key together with
//!   a channel id.
//! - Resolve owner kinds through an explicit registry instead of ambient
//!   framework lookup.
//!
//! # Invariants
//! - Owner kind tags are non-empty lowercase ascii, digits, `_` or `-`.
//! - The association key is always the full `(kind, id)` pair; two owners of
//!   different kinds with the same id are distinct.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// Capability interface for entities that can own communication channels.
///
/// Host types implement this instead of depending on the channel module's
/// internals; all channel actions operate on the capability.
pub trait CommunicationChannelOwner {
    /// Stable owner-kind tag, registered with the [`OwnerKindRegistry`].
    fn owner_kind(&self) -> &str;
    /// Stable identity within the owner kind.
    fn owner_id(&self) -> Uuid;
}

/// Tagged polymorphic reference to a channel owner.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct OwnerRef {
    pub kind: String,
    pub id: Uuid,
}

impl OwnerRef {
    /// Builds a reference from raw parts, validating the kind tag.
    pub fn new(kind: impl Into<String>, id: Uuid) -> Result<Self, OwnerRegistryError> {
        let kind = kind.into();
        if !is_valid_owner_kind(&kind) {
            return Err(OwnerRegistryError::InvalidOwnerKind(kind));
        }
        Ok(Self { kind, id })
    }

    /// Derives a reference from an owner capability.
    pub fn of(owner: &dyn CommunicationChannelOwner) -> Result<Self, OwnerRegistryError> {
        Self::new(owner.owner_kind(), owner.owner_id())
    }
}

impl Display for OwnerRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

/// Host-side resolver for one owner kind.
///
/// The registry consults it before any channel is created so unknown owners
/// fail fast, and the demo/CLI layer uses `title_of` for display.
pub trait OwnerResolver {
    /// The kind tag this resolver answers for.
    fn owner_kind(&self) -> &str;
    /// Whether an owner with this id currently exists.
    fn exists(&self, id: Uuid) -> bool;
    /// Display title for an existing owner.
    fn title_of(&self, id: Uuid) -> Option<String>;
}

/// Owner registry and resolution errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerRegistryError {
    InvalidOwnerKind(String),
    DuplicateOwnerKind(String),
    OwnerKindNotRegistered(String),
    OwnerNotFound { kind: String, id: Uuid },
}

impl Display for OwnerRegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOwnerKind(value) => write!(f, "owner kind is invalid: `{value}`"),
            Self::DuplicateOwnerKind(value) => {
                write!(f, "owner kind already registered: `{value}`")
            }
            Self::OwnerKindNotRegistered(value) => {
                write!(f, "owner kind not registered: `{value}`")
            }
            Self::OwnerNotFound { kind, id } => write!(f, "owner not found: {kind}:{id}"),
        }
    }
}

impl Error for OwnerRegistryError {}

/// Registry of owner kinds known to the channel module.
///
/// Keyed by the owner-kind tag; each entry resolves identities for one host
/// entity type.
#[derive(Default)]
pub struct OwnerKindRegistry {
    resolvers: BTreeMap<String, Arc<dyn OwnerResolver>>,
}

impl OwnerKindRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one owner-kind resolver.
    pub fn register(
        &mut self,
        resolver: Arc<dyn OwnerResolver>,
    ) -> Result<(), OwnerRegistryError> {
        let kind = resolver.owner_kind().trim().to_string();
        if !is_valid_owner_kind(&kind) {
            return Err(OwnerRegistryError::InvalidOwnerKind(kind));
        }
        if self.resolvers.contains_key(kind.as_str()) {
            return Err(OwnerRegistryError::DuplicateOwnerKind(kind));
        }
        self.resolvers.insert(kind, resolver);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Returns sorted registered kind tags.
    pub fn owner_kinds(&self) -> Vec<String> {
        self.resolvers.keys().cloned().collect()
    }

    /// Returns the resolver for one kind tag.
    pub fn get(&self, kind: &str) -> Option<Arc<dyn OwnerResolver>> {
        self.resolvers.get(kind.trim()).cloned()
    }

    /// Resolves the registry entry for a reference.
    pub fn resolve(
        &self,
        owner: &OwnerRef,
    ) -> Result<Arc<dyn OwnerResolver>, OwnerRegistryError> {
        self.get(&owner.kind)
            .ok_or_else(|| OwnerRegistryError::OwnerKindNotRegistered(owner.kind.clone()))
    }

    /// Confirms the referenced owner exists in its host store.
    pub fn require_owner(&self, owner: &OwnerRef) -> Result<(), OwnerRegistryError> {
        let resolver = self.resolve(owner)?;
        if !resolver.exists(owner.id) {
            return Err(OwnerRegistryError::OwnerNotFound {
                kind: owner.kind.clone(),
                id: owner.id,
            });
        }
        Ok(())
    }

    /// Display title for a referenced owner, when its resolver knows one.
    pub fn title_of(&self, owner: &OwnerRef) -> Option<String> {
        self.get(&owner.kind)?.title_of(owner.id)
    }
}

fn is_valid_owner_kind(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
}

#[cfg(test)]
mod tests {
    use super::{
        CommunicationChannelOwner, OwnerKindRegistry, OwnerRef, OwnerRegistryError, OwnerResolver,
    };
    use std::sync::Arc;
    use uuid::Uuid;

    struct MockResolver {
        kind: String,
        known: Vec<Uuid>,
    }

    impl MockResolver {
        fn new(kind: &str, known: Vec<Uuid>) -> Self {
            Self {
                kind: kind.to_string(),
                known,
            }
        }
    }

    impl OwnerResolver for MockResolver {
        fn owner_kind(&self) -> &str {
            &self.kind
        }

        fn exists(&self, id: Uuid) -> bool {
            self.known.contains(&id)
        }

        fn title_of(&self, id: Uuid) -> Option<String> {
            self.exists(id).then(|| format!("{}-{id}", self.kind))
        }
    }

    struct Customer {
        id: Uuid,
    }

    impl CommunicationChannelOwner for Customer {
        fn owner_kind(&self) -> &str {
            "customer"
        }

        fn owner_id(&self) -> Uuid {
            self.id
        }
    }

    #[test]
    fn owner_ref_derives_from_capability() {
        let id = Uuid::new_v4();
        let customer = Customer { id };
        let owner = OwnerRef::of(&customer).expect("valid kind should build");
        assert_eq!(owner.kind, "customer");
        assert_eq!(owner.id, id);
    }

    #[test]
    fn owner_ref_rejects_invalid_kind() {
        let err = OwnerRef::new("Customer Record", Uuid::new_v4())
            .expect_err("spaced/capitalized kind must fail");
        assert!(matches!(err, OwnerRegistryError::InvalidOwnerKind(_)));

        let err = OwnerRef::new("", Uuid::new_v4()).expect_err("empty kind must fail");
        assert!(matches!(err, OwnerRegistryError::InvalidOwnerKind(_)));
    }

    #[test]
    fn registers_and_resolves_kinds() {
        let id = Uuid::new_v4();
        let mut registry = OwnerKindRegistry::new();
        registry
            .register(Arc::new(MockResolver::new("customer", vec![id])))
            .expect("resolver should register");
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.owner_kinds(), vec!["customer".to_string()]);

        let owner = OwnerRef::new("customer", id).unwrap();
        registry.require_owner(&owner).expect("known owner resolves");
        assert_eq!(registry.title_of(&owner), Some(format!("customer-{id}")));
    }

    #[test]
    fn rejects_invalid_or_duplicate_kind() {
        let mut registry = OwnerKindRegistry::new();
        let invalid = registry.register(Arc::new(MockResolver::new("Customer", vec![])));
        assert!(matches!(
            invalid,
            Err(OwnerRegistryError::InvalidOwnerKind(_))
        ));

        registry
            .register(Arc::new(MockResolver::new("customer", vec![])))
            .expect("first registration should succeed");
        let duplicate = registry.register(Arc::new(MockResolver::new("customer", vec![])));
        assert!(matches!(
            duplicate,
            Err(OwnerRegistryError::DuplicateOwnerKind(_))
        ));
    }

    #[test]
    fn unknown_kind_and_missing_owner_fail_resolution() {
        let mut registry = OwnerKindRegistry::new();
        registry
            .register(Arc::new(MockResolver::new("customer", vec![])))
            .expect("resolver should register");

        let unknown = OwnerRef::new("supplier", Uuid::new_v4()).unwrap();
        assert!(matches!(
            registry.require_owner(&unknown),
            Err(OwnerRegistryError::OwnerKindNotRegistered(_))
        ));

        let missing = OwnerRef::new("customer", Uuid::new_v4()).unwrap();
        assert!(matches!(
            registry.require_owner(&missing),
            Err(OwnerRegistryError::OwnerNotFound { .. })
        ));
    }

    #[test]
    fn same_id_under_different_kinds_stays_distinct() {
        let shared = Uuid::new_v4();
        let customer = OwnerRef::new("customer", shared).unwrap();
        let supplier = OwnerRef::new("supplier", shared).unwrap();
        assert_ne!(customer, supplier);
    }
}
