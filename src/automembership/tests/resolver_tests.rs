//! Auto-membership resolver integration tests
//!
//! Covers caching of the static mapping, recomputation of provider results,
//! drop-and-continue verification, the point-membership fast path, provider
//! fault propagation, the IDP reverse index and lazy reverse enumeration.

use cretoai_automembership::{
    error::{StoreError, StoreResult},
    AuthorizableIter, AutoMembershipProvider, AutoMembershipResolver, Authorizable,
    GroupId, GroupPrincipal, IdentityStore, InMemoryIdentityStore, Principal, PrincipalKind,
    ProviderError, ProviderRegistry, StaticMapping, StaticMembershipProvider,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ============================================================================
// TEST STUBS
// ============================================================================

/// Store that counts lookups and delegates to an in-memory store
struct CountingStore {
    inner: InMemoryIdentityStore,
    lookups: AtomicUsize,
}

impl CountingStore {
    fn new(authorizables: impl IntoIterator<Item = Authorizable>) -> Self {
        Self {
            inner: authorizables.into_iter().collect(),
            lookups: AtomicUsize::new(0),
        }
    }

    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl IdentityStore for CountingStore {
    fn authorizable(&self, id: &str) -> StoreResult<Option<Authorizable>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.authorizable(id)
    }
}

/// Store that fails every call
struct UnavailableStore;

impl IdentityStore for UnavailableStore {
    fn authorizable(&self, _id: &str) -> StoreResult<Option<Authorizable>> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Provider whose forward answer can be changed between calls
#[derive(Default)]
struct MutableProvider {
    groups: Mutex<HashSet<GroupId>>,
    calls: AtomicUsize,
}

impl MutableProvider {
    fn set(&self, groups: &[&str]) {
        *self.groups.lock() = groups.iter().map(|g| g.to_string()).collect();
    }
}

impl AutoMembershipProvider for MutableProvider {
    fn auto_membership(
        &self,
        _authorizable: &Authorizable,
    ) -> Result<HashSet<GroupId>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.groups.lock().clone())
    }

    fn auto_members<'a>(
        &'a self,
        _group: &Authorizable,
    ) -> Result<AuthorizableIter<'a>, ProviderError> {
        Ok(Box::new(std::iter::empty()))
    }
}

/// Provider that fails every forward lookup
struct FaultyProvider;

impl AutoMembershipProvider for FaultyProvider {
    fn auto_membership(
        &self,
        _authorizable: &Authorizable,
    ) -> Result<HashSet<GroupId>, ProviderError> {
        Err(ProviderError::Unavailable("policy service timeout".to_string()))
    }

    fn auto_members<'a>(
        &'a self,
        _group: &Authorizable,
    ) -> Result<AuthorizableIter<'a>, ProviderError> {
        Err(ProviderError::Unavailable("policy service timeout".to_string()))
    }
}

/// Provider yielding a fixed sequence and recording reverse invocations
struct SequenceProvider {
    members: Vec<Result<Authorizable, String>>,
    invocations: Arc<AtomicUsize>,
}

impl SequenceProvider {
    fn new(ids: &[&str], invocations: Arc<AtomicUsize>) -> Self {
        Self {
            members: ids.iter().map(|id| Ok(Authorizable::user(*id))).collect(),
            invocations,
        }
    }

    fn failing_after(mut self, message: &str) -> Self {
        self.members.push(Err(message.to_string()));
        self
    }
}

impl AutoMembershipProvider for SequenceProvider {
    fn auto_membership(
        &self,
        _authorizable: &Authorizable,
    ) -> Result<HashSet<GroupId>, ProviderError> {
        Ok(HashSet::new())
    }

    fn auto_members<'a>(
        &'a self,
        _group: &Authorizable,
    ) -> Result<AuthorizableIter<'a>, ProviderError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(self.members.iter().map(|member| match member {
            Ok(authorizable) => Ok(authorizable.clone()),
            Err(message) => Err(ProviderError::Evaluation(message.clone())),
        })))
    }
}

fn groups(ids: &[&str]) -> Vec<Authorizable> {
    ids.iter().map(|id| Authorizable::group(*id)).collect()
}

fn sorted_names(principals: &HashSet<GroupPrincipal>) -> Vec<String> {
    let mut names: Vec<_> = principals.iter().map(|p| p.name().to_string()).collect();
    names.sort();
    names
}

// ============================================================================
// FORWARD MEMBERSHIP
// ============================================================================

#[test]
fn test_static_mapping_resolved_once() {
    let store = Arc::new(CountingStore::new(groups(&["g1", "g2"])));
    let mapping = StaticMapping::new().with_groups("idp-a", ["g1", "g2"]);
    let resolver = AutoMembershipResolver::new(store.clone(), mapping, ProviderRegistry::new());

    let user = Authorizable::user("alice").with_idp("idp-a");

    let first = resolver.resolve_auto_membership("idp-a", &user).unwrap();
    assert_eq!(store.lookups(), 2, "Static ids should be verified on first use");

    let second = resolver.resolve_auto_membership("idp-a", &user).unwrap();
    assert_eq!(store.lookups(), 2, "Second call should be served from cache");

    assert_eq!(first, second);
    assert_eq!(sorted_names(&first), vec!["g1", "g2"]);

    let stats = resolver.cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
}

#[test]
fn test_provider_result_recomputed_every_call() {
    let store = Arc::new(CountingStore::new(groups(&["g1", "g2", "g3"])));
    let provider = Arc::new(MutableProvider::default());
    provider.set(&["g1"]);

    let providers = ProviderRegistry::new()
        .with_provider("idp-a", provider.clone())
        .unwrap();
    let resolver = AutoMembershipResolver::new(store.clone(), StaticMapping::new(), providers);

    let user = Authorizable::user("alice");
    let first = resolver.resolve_auto_membership("idp-a", &user).unwrap();
    assert_eq!(sorted_names(&first), vec!["g1"]);

    provider.set(&["g2", "g3"]);
    let second = resolver.resolve_auto_membership("idp-a", &user).unwrap();
    assert_eq!(sorted_names(&second), vec!["g2", "g3"]);

    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.lookups(), 3, "Provider ids are verified on every call");
}

#[test]
fn test_invalid_static_ids_dropped() {
    let store = Arc::new(InMemoryIdentityStore::new());
    store.add(Authorizable::group("g-valid"));
    store.add(Authorizable::user("u-not-a-group"));
    store.add(
        Authorizable::group("g-odd-principal")
            .with_principal(Principal::new("odd", PrincipalKind::Other)),
    );

    let mapping = StaticMapping::new().with_groups(
        "idp-a",
        ["g-valid", "u-not-a-group", "g-missing", "g-odd-principal"],
    );
    let resolver = AutoMembershipResolver::new(store, mapping, ProviderRegistry::new());

    let result = resolver
        .resolve_auto_membership("idp-a", &Authorizable::user("alice"))
        .unwrap();
    assert_eq!(sorted_names(&result), vec!["g-valid"]);
}

#[test]
fn test_invalid_provider_ids_dropped() {
    let store = Arc::new(InMemoryIdentityStore::from_iter(groups(&["g1"])));
    store.add(Authorizable::user("bob"));

    let providers = ProviderRegistry::new()
        .with_provider(
            "idp-a",
            Arc::new(
                StaticMembershipProvider::new()
                    .with_member(Authorizable::user("alice"), ["g1", "bob", "nope"]),
            ),
        )
        .unwrap();
    let resolver = AutoMembershipResolver::new(store, StaticMapping::new(), providers);

    let result = resolver
        .resolve_auto_membership("idp-a", &Authorizable::user("alice"))
        .unwrap();
    assert_eq!(sorted_names(&result), vec!["g1"]);
}

#[test]
fn test_store_failure_yields_empty_static_set() {
    let mapping = StaticMapping::new().with_groups("idp-a", ["g1", "g2"]);
    let resolver =
        AutoMembershipResolver::new(Arc::new(UnavailableStore), mapping, ProviderRegistry::new());

    let result = resolver
        .resolve_auto_membership("idp-a", &Authorizable::user("alice"))
        .unwrap();
    assert!(result.is_empty());
}

#[test]
fn test_principals_collapsed_by_name() {
    // Two ids sharing one principal name collapse into one entry.
    let store = Arc::new(InMemoryIdentityStore::new());
    store.add(Authorizable::group("g-a").with_principal(Principal::group("Engineering")));
    store.add(Authorizable::group("g-b").with_principal(Principal::group("Engineering")));

    let mapping = StaticMapping::new().with_groups("idp-a", ["g-a"]);
    let providers = ProviderRegistry::new()
        .with_provider(
            "idp-a",
            Arc::new(
                StaticMembershipProvider::new().with_member(Authorizable::user("alice"), ["g-b"]),
            ),
        )
        .unwrap();
    let resolver = AutoMembershipResolver::new(store, mapping, providers);

    let result = resolver
        .resolve_auto_membership("idp-a", &Authorizable::user("alice"))
        .unwrap();
    assert_eq!(sorted_names(&result), vec!["Engineering"]);
}

#[test]
fn test_provider_fault_propagated() {
    let store = Arc::new(InMemoryIdentityStore::from_iter(groups(&["g1"])));
    let mapping = StaticMapping::new().with_groups("idp-a", ["g1"]);
    let providers = ProviderRegistry::new()
        .with_provider("idp-a", Arc::new(FaultyProvider))
        .unwrap();
    let resolver = AutoMembershipResolver::new(store, mapping, providers);

    let err = resolver
        .resolve_auto_membership("idp-a", &Authorizable::user("alice"))
        .unwrap_err();
    assert!(
        matches!(&err, ProviderError::Unavailable(msg) if msg == "policy service timeout"),
        "Provider error should reach the caller unchanged, got {err:?}"
    );
}

// ============================================================================
// POINT MEMBERSHIP
// ============================================================================

#[test]
fn test_is_auto_member_static_short_circuit() {
    let mapping = StaticMapping::new().with_groups("idp-a", ["g1"]);
    let providers = ProviderRegistry::new()
        .with_provider("idp-a", Arc::new(FaultyProvider))
        .unwrap();
    let resolver = AutoMembershipResolver::new(Arc::new(UnavailableStore), mapping, providers);

    // Neither the failing store nor the failing provider is consulted.
    assert!(resolver
        .is_auto_member("idp-a", "g1", &Authorizable::user("alice"))
        .unwrap());
}

#[test]
fn test_is_auto_member_static_path_skips_store() {
    let store = Arc::new(CountingStore::new(Vec::new()));
    let mapping = StaticMapping::new().with_groups("idp-a", ["g-unresolvable"]);
    let resolver = AutoMembershipResolver::new(store.clone(), mapping, ProviderRegistry::new());

    assert!(resolver
        .is_auto_member("idp-a", "g-unresolvable", &Authorizable::user("alice"))
        .unwrap());
    assert_eq!(store.lookups(), 0);
}

#[test]
fn test_is_auto_member_falls_back_to_provider() {
    let provider = Arc::new(MutableProvider::default());
    provider.set(&["g-dynamic"]);
    let providers = ProviderRegistry::new()
        .with_provider("idp-a", provider.clone())
        .unwrap();
    let mapping = StaticMapping::new().with_groups("idp-a", ["g-static"]);
    let resolver = AutoMembershipResolver::new(Arc::new(UnavailableStore), mapping, providers);

    let user = Authorizable::user("alice");
    assert!(resolver.is_auto_member("idp-a", "g-dynamic", &user).unwrap());
    assert!(!resolver.is_auto_member("idp-a", "g-other", &user).unwrap());
    assert!(!resolver.is_auto_member("idp-b", "g-dynamic", &user).unwrap());
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_is_auto_member_propagates_provider_fault() {
    let providers = ProviderRegistry::new()
        .with_provider("idp-a", Arc::new(FaultyProvider))
        .unwrap();
    let resolver =
        AutoMembershipResolver::new(Arc::new(UnavailableStore), StaticMapping::new(), providers);

    let result = resolver.is_auto_member("idp-a", "g1", &Authorizable::user("alice"));
    assert!(matches!(result, Err(ProviderError::Unavailable(_))));
}

// ============================================================================
// CONFIGURED IDP NAMES
// ============================================================================

#[test]
fn test_idp_names_configuring() {
    let store = Arc::new(InMemoryIdentityStore::from_iter(groups(&["g1", "g2"])));
    let mapping = StaticMapping::new()
        .with_groups("idpA", ["g1", "g2"])
        .with_groups("idpB", ["g2"]);
    let resolver = AutoMembershipResolver::new(store, mapping, ProviderRegistry::new());

    let g2 = resolver.idp_names_configuring(&Principal::group("g2"));
    assert_eq!(g2, HashSet::from(["idpA".to_string(), "idpB".to_string()]));

    let g1 = resolver.idp_names_configuring(&Principal::group("g1"));
    assert_eq!(g1, HashSet::from(["idpA".to_string()]));

    assert!(resolver
        .idp_names_configuring(&Principal::group("g3"))
        .is_empty());
}

#[test]
fn test_idp_names_configuring_warms_up_every_idp() {
    let store = Arc::new(CountingStore::new(groups(&["g1", "g2"])));
    let mapping = StaticMapping::new()
        .with_groups("idpA", ["g1"])
        .with_groups("idpB", ["g2"]);
    let resolver = AutoMembershipResolver::new(store.clone(), mapping, ProviderRegistry::new());

    // Populate only idpA first; the query must still see idpB.
    resolver
        .resolve_auto_membership("idpA", &Authorizable::user("alice"))
        .unwrap();
    assert_eq!(resolver.cache_stats().entries, 1);

    let idps = resolver.idp_names_configuring(&Principal::group("g2"));
    assert_eq!(idps, HashSet::from(["idpB".to_string()]));
    assert_eq!(resolver.cache_stats().entries, 2);
    assert_eq!(store.lookups(), 2);

    resolver.idp_names_configuring(&Principal::group("g1"));
    assert_eq!(store.lookups(), 2, "Warm cache should not hit the store again");
}

#[test]
fn test_idp_names_configuring_with_empty_mapping() {
    let resolver = AutoMembershipResolver::new(
        Arc::new(UnavailableStore),
        StaticMapping::new(),
        ProviderRegistry::new(),
    );

    assert!(resolver
        .idp_names_configuring(&Principal::group("g1"))
        .is_empty());
    assert_eq!(resolver.cache_stats().entries, 0);
}

// ============================================================================
// REVERSE ENUMERATION
// ============================================================================

#[test]
fn test_auto_members_chained_in_registration_order() {
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let providers = ProviderRegistry::new()
        .with_provider(
            "idp-b",
            Arc::new(SequenceProvider::new(&["u1", "u2"], first_calls.clone())),
        )
        .unwrap()
        .with_provider(
            "idp-a",
            Arc::new(SequenceProvider::new(&["u3", "u1"], second_calls.clone())),
        )
        .unwrap();
    let resolver =
        AutoMembershipResolver::new(Arc::new(UnavailableStore), StaticMapping::new(), providers);

    let group = Authorizable::group("g1");
    let ids: Vec<_> = resolver
        .auto_members_of(&group)
        .map(|member| member.unwrap().id)
        .collect();

    // Concatenated in registration order, duplicates across providers kept.
    assert_eq!(ids, vec!["u1", "u2", "u3", "u1"]);
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_auto_members_is_lazy() {
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let providers = ProviderRegistry::new()
        .with_provider("idp-a", Arc::new(SequenceProvider::new(&["u1", "u2"], first_calls.clone())))
        .unwrap()
        .with_provider("idp-b", Arc::new(SequenceProvider::new(&["u3"], second_calls.clone())))
        .unwrap();
    let resolver =
        AutoMembershipResolver::new(Arc::new(UnavailableStore), StaticMapping::new(), providers);

    let group = Authorizable::group("g1");
    let mut members = resolver.auto_members_of(&group);
    assert_eq!(first_calls.load(Ordering::SeqCst), 0, "Nothing invoked before first advance");

    let first = members.next().unwrap().unwrap();
    assert_eq!(first.id, "u1");
    assert_eq!(first_calls.load(Ordering::SeqCst), 1);
    assert_eq!(second_calls.load(Ordering::SeqCst), 0, "Second provider must not be invoked yet");
}

#[test]
fn test_auto_members_fault_after_yielded_items() {
    let calls = Arc::new(AtomicUsize::new(0));
    let providers = ProviderRegistry::new()
        .with_provider(
            "idp-a",
            Arc::new(
                SequenceProvider::new(&["u1"], calls.clone()).failing_after("rule engine crashed"),
            ),
        )
        .unwrap()
        .with_provider("idp-b", Arc::new(SequenceProvider::new(&["u2"], calls.clone())))
        .unwrap();
    let resolver =
        AutoMembershipResolver::new(Arc::new(UnavailableStore), StaticMapping::new(), providers);

    let group = Authorizable::group("g1");
    let mut members = resolver.auto_members_of(&group);

    assert_eq!(members.next().unwrap().unwrap().id, "u1");
    let fault = members.next().unwrap();
    assert!(matches!(fault, Err(ProviderError::Evaluation(msg)) if msg == "rule engine crashed"));
}

#[test]
fn test_auto_members_provider_invocation_fault() {
    let calls = Arc::new(AtomicUsize::new(0));
    let providers = ProviderRegistry::new()
        .with_provider("idp-a", Arc::new(SequenceProvider::new(&["u1"], calls.clone())))
        .unwrap()
        .with_provider("idp-b", Arc::new(FaultyProvider))
        .unwrap();
    let resolver =
        AutoMembershipResolver::new(Arc::new(UnavailableStore), StaticMapping::new(), providers);

    let group = Authorizable::group("g1");
    let results: Vec<_> = resolver.auto_members_of(&group).collect();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].as_ref().unwrap().id, "u1");
    assert!(matches!(results[1], Err(ProviderError::Unavailable(_))));
}

#[test]
fn test_auto_members_without_providers() {
    let mapping = StaticMapping::new().with_groups("idp-a", ["g1"]);
    let resolver =
        AutoMembershipResolver::new(Arc::new(UnavailableStore), mapping, ProviderRegistry::new());

    let group = Authorizable::group("g1");
    assert_eq!(resolver.auto_members_of(&group).count(), 0);
}
