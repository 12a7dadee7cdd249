//! Automatic membership resolver
//!
//! Combines the static mapping (cached, verified once per IDP) with the
//! per-identity answers of registered providers (never cached).
//!
//! # Example
//!
//! ```rust
//! use cretoai_automembership::{
//!     AutoMembershipResolver, Authorizable, InMemoryIdentityStore, ProviderRegistry,
//!     StaticMapping,
//! };
//! use std::sync::Arc;
//!
//! let store: InMemoryIdentityStore = [Authorizable::group("g-staff")].into_iter().collect();
//! let mapping = StaticMapping::new().with_groups("corp-ldap", ["g-staff"]);
//! let resolver = AutoMembershipResolver::new(Arc::new(store), mapping, ProviderRegistry::new());
//!
//! let alice = Authorizable::user("alice").with_idp("corp-ldap");
//! let groups = resolver.resolve_auto_membership("corp-ldap", &alice).unwrap();
//! assert!(groups.iter().any(|group| group.name() == "g-staff"));
//! ```

use crate::cache::{CacheStats, PrincipalCache, PrincipalSet};
use crate::config::AutoMembershipConfig;
use crate::error::{ProviderError, Result};
use crate::mapping::{ProviderRegistry, StaticMapping};
use crate::provider::AuthorizableIter;
use crate::store::IdentityStore;
use crate::types::{Authorizable, GroupPrincipal, IdpName, Principal};
use crate::verify::PrincipalVerifier;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, trace};

/// Resolves automatic group membership for synchronized identities
///
/// # Thread Safety
///
/// The resolver is thread-safe and can be shared across threads using `Arc`
/// or cloned cheaply; clones share the verified-principal cache.
#[derive(Clone)]
pub struct AutoMembershipResolver {
    /// IDP name → configured group ids
    mapping: Arc<StaticMapping>,

    /// IDP name → dynamic provider
    providers: Arc<ProviderRegistry>,

    /// Group id verification against the identity store
    verifier: PrincipalVerifier,

    /// IDP name → verified principals of the static mapping
    cache: PrincipalCache,
}

impl AutoMembershipResolver {
    /// Create a resolver
    pub fn new(
        store: Arc<dyn IdentityStore>,
        mapping: StaticMapping,
        providers: ProviderRegistry,
    ) -> Self {
        Self {
            mapping: Arc::new(mapping),
            providers: Arc::new(providers),
            verifier: PrincipalVerifier::new(store),
            cache: PrincipalCache::new(),
        }
    }

    /// Create a resolver from a loaded configuration
    pub fn from_config(
        store: Arc<dyn IdentityStore>,
        config: &AutoMembershipConfig,
        providers: ProviderRegistry,
    ) -> Self {
        Self::new(store, StaticMapping::from(config), providers)
    }

    /// Group principals the authorizable is an automatic member of for the IDP
    ///
    /// Includes the verified static mapping of the IDP and the verified result
    /// of its provider, if one is registered. Ids that fail verification are
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged if its forward lookup fails.
    pub fn resolve_auto_membership(
        &self,
        idp_name: &str,
        authorizable: &Authorizable,
    ) -> Result<HashSet<GroupPrincipal>> {
        let mut principals: HashSet<GroupPrincipal> =
            self.global_principals(idp_name).iter().cloned().collect();

        if let Some(provider) = self.providers.get(idp_name) {
            for group_id in provider.auto_membership(authorizable)? {
                if let Some(principal) = self.verifier.verify(&group_id) {
                    principals.insert(principal);
                }
            }
        }

        Ok(principals)
    }

    /// Whether the authorizable is an automatic member of the group for the IDP
    ///
    /// A group id listed verbatim in the static mapping answers `true` without
    /// consulting the identity store. Otherwise the IDP's provider decides by
    /// exact group id match; without a provider the answer is `false`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged if its forward lookup fails.
    pub fn is_auto_member(
        &self,
        idp_name: &str,
        group_id: &str,
        authorizable: &Authorizable,
    ) -> Result<bool> {
        if self.mapping.contains_group(idp_name, group_id) {
            return Ok(true);
        }

        match self.providers.get(idp_name) {
            Some(provider) => Ok(provider.auto_membership(authorizable)?.contains(group_id)),
            None => Ok(false),
        }
    }

    /// Automatic members of the group across all registered providers
    ///
    /// Providers are consulted lazily in registration order: a provider is not
    /// invoked until all earlier sequences are exhausted. Results are neither
    /// deduplicated nor reordered. A provider fault is yielded as an `Err` item
    /// at the position where it occurs; items yielded before it stay valid.
    pub fn auto_members_of<'a>(
        &'a self,
        group: &'a Authorizable,
    ) -> impl Iterator<Item = Result<Authorizable>> + 'a {
        self.providers
            .iter()
            .flat_map(move |(idp_name, provider)| -> AuthorizableIter<'a> {
                trace!(idp_name, group_id = %group.id, "Enumerating automatic members");
                match provider.auto_members(group) {
                    Ok(members) => members,
                    Err(e) => Box::new(std::iter::once(Err::<Authorizable, ProviderError>(e))),
                }
            })
    }

    /// IDP names whose static mapping contains the given group principal
    ///
    /// Principals are compared by name. Populates the cache for every mapped
    /// IDP that has not been resolved yet before answering.
    ///
    /// The fill runs on every call, not only while the cache is empty: an
    /// entry created earlier by a forward lookup for one IDP does not stop the
    /// remaining mapped IDPs from being resolved here.
    pub fn idp_names_configuring(&self, principal: &Principal) -> HashSet<IdpName> {
        if self.cache.len() < self.mapping.len() {
            debug!(
                populated = self.cache.len(),
                configured = self.mapping.len(),
                "Populating auto-membership cache for all configured IDPs"
            );
        }

        self.mapping
            .idp_names()
            .filter(|idp_name| {
                self.global_principals(idp_name)
                    .iter()
                    .any(|group| group.name() == principal.name)
            })
            .map(str::to_string)
            .collect()
    }

    /// Returns verified-principal cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Static mapping the resolver was created with
    pub fn mapping(&self) -> &StaticMapping {
        &self.mapping
    }

    /// Verified principals of the IDP's static mapping, computed on first use
    fn global_principals(&self, idp_name: &str) -> PrincipalSet {
        if let Some(principals) = self.cache.get(idp_name) {
            trace!(idp_name, "Auto-membership cache hit");
            return principals;
        }

        if !self.mapping.contains_idp(idp_name) {
            return PrincipalSet::default();
        }

        let principals: PrincipalSet = Arc::new(
            self.mapping
                .group_ids(idp_name)
                .iter()
                .filter_map(|group_id| self.verifier.verify(group_id))
                .collect(),
        );

        debug!(
            idp_name,
            configured = self.mapping.group_ids(idp_name).len(),
            verified = principals.len(),
            "Populated auto-membership cache entry"
        );

        self.cache.insert(idp_name, Arc::clone(&principals));
        principals
    }
}
