//! Static auto-membership mapping and provider registry
//!
//! Both tables are supplied once at construction and never change for the
//! life of a resolver, so they are read without synchronization.

use crate::config::AutoMembershipConfig;
use crate::error::{ConfigError, ConfigResult};
use crate::provider::AutoMembershipProvider;
use crate::types::{GroupId, IdpName};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Administrator-configured mapping: IDP name → ordered group ids
///
/// Group ids are not checked here. Duplicates and ids that do not resolve to
/// a group are accepted and filtered out lazily during verification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticMapping {
    groups: HashMap<IdpName, Vec<GroupId>>,
}

impl StaticMapping {
    /// Create an empty mapping
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the group ids for an IDP, replacing any previous entry
    pub fn with_groups<I, S>(mut self, idp_name: impl Into<IdpName>, group_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<GroupId>,
    {
        self.groups
            .insert(idp_name.into(), group_ids.into_iter().map(Into::into).collect());
        self
    }

    /// Configured group ids for an IDP (empty if the IDP is not mapped)
    pub fn group_ids(&self, idp_name: &str) -> &[GroupId] {
        self.groups.get(idp_name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Whether the IDP has an entry in the mapping
    pub fn contains_idp(&self, idp_name: &str) -> bool {
        self.groups.contains_key(idp_name)
    }

    /// Whether the group id is listed verbatim for the IDP
    pub fn contains_group(&self, idp_name: &str, group_id: &str) -> bool {
        self.group_ids(idp_name).iter().any(|id| id == group_id)
    }

    /// Mapped IDP names
    pub fn idp_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    /// Number of mapped IDPs
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no IDP is mapped
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

impl From<HashMap<IdpName, Vec<GroupId>>> for StaticMapping {
    fn from(groups: HashMap<IdpName, Vec<GroupId>>) -> Self {
        Self { groups }
    }
}

impl From<&AutoMembershipConfig> for StaticMapping {
    fn from(config: &AutoMembershipConfig) -> Self {
        Self {
            groups: config
                .mapping
                .iter()
                .map(|(idp_name, group_ids)| (idp_name.clone(), group_ids.clone()))
                .collect(),
        }
    }
}

/// Registered dynamic providers, at most one per IDP
///
/// Iteration follows registration order.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: Vec<(IdpName, Arc<dyn AutoMembershipProvider>)>,
    index: HashMap<IdpName, usize>,
}

impl ProviderRegistry {
    /// Create an empty registry (no dynamic rules for any IDP)
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider for an IDP
    ///
    /// # Errors
    ///
    /// Returns an error if the IDP name is blank or a provider is already
    /// registered for it.
    pub fn register(
        &mut self,
        idp_name: impl Into<IdpName>,
        provider: Arc<dyn AutoMembershipProvider>,
    ) -> ConfigResult<()> {
        let idp_name = idp_name.into();

        if idp_name.trim().is_empty() {
            return Err(ConfigError::InvalidIdpName(idp_name));
        }
        if self.index.contains_key(&idp_name) {
            return Err(ConfigError::DuplicateProvider(idp_name));
        }

        self.index.insert(idp_name.clone(), self.providers.len());
        self.providers.push((idp_name, provider));
        Ok(())
    }

    /// Builder-style variant of [`register`](Self::register)
    ///
    /// # Errors
    ///
    /// Same as [`register`](Self::register).
    pub fn with_provider(
        mut self,
        idp_name: impl Into<IdpName>,
        provider: Arc<dyn AutoMembershipProvider>,
    ) -> ConfigResult<Self> {
        self.register(idp_name, provider)?;
        Ok(self)
    }

    /// Provider registered for the IDP, if any
    pub fn get(&self, idp_name: &str) -> Option<&Arc<dyn AutoMembershipProvider>> {
        self.index.get(idp_name).map(|&i| &self.providers[i].1)
    }

    /// Providers in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn AutoMembershipProvider>)> {
        self.providers
            .iter()
            .map(|(idp_name, provider)| (idp_name.as_str(), provider))
    }

    /// Number of registered providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Whether no provider is registered
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("idp_names", &self.providers.iter().map(|(name, _)| name).collect::<Vec<_>>())
            .finish()
    }
}
