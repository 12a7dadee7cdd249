//! Identity store abstraction
//!
//! The resolver never owns users or groups. It resolves group ids through an
//! [`IdentityStore`] supplied at construction and relies on the store's own
//! notion of what counts as a group and as a group principal.

use crate::error::{StoreError, StoreResult};
use crate::types::{Authorizable, Principal, PrincipalKind};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Identity store trait
pub trait IdentityStore: Send + Sync {
    /// Resolve an authorizable by id
    ///
    /// Returns `Ok(None)` when no user or group with this id exists.
    fn authorizable(&self, id: &str) -> StoreResult<Option<Authorizable>>;

    /// Whether the store considers the authorizable a group
    fn is_group(&self, authorizable: &Authorizable) -> bool {
        authorizable.is_group()
    }

    /// Whether the store recognizes the principal as group-typed
    fn is_group_principal(&self, principal: &Principal) -> bool {
        principal.kind == PrincipalKind::Group
    }

    /// All authorizables synchronized from the given IDP
    ///
    /// Only needed by providers that enumerate identities. Stores that cannot
    /// enumerate return [`StoreError::Unsupported`].
    fn authorizables_of_idp(&self, idp_name: &str) -> StoreResult<Vec<Authorizable>> {
        Err(StoreError::Unsupported(format!(
            "Enumerating authorizables of IDP {idp_name}"
        )))
    }
}

/// In-memory identity store implementation
///
/// Preserves insertion order for enumeration.
pub struct InMemoryIdentityStore {
    authorizables: Arc<RwLock<HashMap<String, Authorizable>>>,
    order: Arc<RwLock<Vec<String>>>,
}

impl InMemoryIdentityStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            authorizables: Arc::new(RwLock::new(HashMap::new())),
            order: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add or replace an authorizable
    pub fn add(&self, authorizable: Authorizable) {
        let mut authorizables = self.authorizables.write();
        if authorizables
            .insert(authorizable.id.clone(), authorizable.clone())
            .is_none()
        {
            self.order.write().push(authorizable.id);
        }
    }

    /// Remove an authorizable, returning it if present
    pub fn remove(&self, id: &str) -> Option<Authorizable> {
        let removed = self.authorizables.write().remove(id);
        if removed.is_some() {
            self.order.write().retain(|existing| existing != id);
        }
        removed
    }

    /// Number of stored authorizables
    pub fn len(&self) -> usize {
        self.authorizables.read().len()
    }

    /// Whether the store is empty
    pub fn is_empty(&self) -> bool {
        self.authorizables.read().is_empty()
    }
}

impl Default for InMemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Authorizable> for InMemoryIdentityStore {
    fn from_iter<I: IntoIterator<Item = Authorizable>>(iter: I) -> Self {
        let store = Self::new();
        for authorizable in iter {
            store.add(authorizable);
        }
        store
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn authorizable(&self, id: &str) -> StoreResult<Option<Authorizable>> {
        Ok(self.authorizables.read().get(id).cloned())
    }

    fn authorizables_of_idp(&self, idp_name: &str) -> StoreResult<Vec<Authorizable>> {
        let authorizables = self.authorizables.read();
        let order = self.order.read();

        Ok(order
            .iter()
            .filter_map(|id| authorizables.get(id))
            .filter(|authorizable| authorizable.idp_name.as_deref() == Some(idp_name))
            .cloned()
            .collect())
    }
}
