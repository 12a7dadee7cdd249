//! # CretoAI Auto-Membership
//!
//! Automatic group membership for identities synchronized from external
//! identity providers (IDPs).
//!
//! ## Features
//!
//! - **Static mapping**: administrator-configured IDP → group ids, verified
//!   against the identity store once per IDP and cached for the process lifetime
//! - **Pluggable providers**: per-identity membership computed by an
//!   [`AutoMembershipProvider`], evaluated on every call
//! - **Lock-free caching**: `DashMap` with idempotent recomputation instead of
//!   per-key locking
//! - **Lazy reverse enumeration**: members of a group streamed across providers
//!   in registration order
//!
//! ## Example
//!
//! ```rust
//! use cretoai_automembership::{
//!     AutoMembershipResolver, Authorizable, InMemoryIdentityStore, Principal, ProviderRegistry,
//!     StaticMapping, StaticMembershipProvider,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store: InMemoryIdentityStore = [
//!     Authorizable::group("g-staff"),
//!     Authorizable::group("g-admins"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let mapping = StaticMapping::new().with_groups("corp-ldap", ["g-staff"]);
//! let ldap_provider = StaticMembershipProvider::new()
//!     .with_member(Authorizable::user("alice"), ["g-admins"]);
//! let providers = ProviderRegistry::new().with_provider("corp-ldap", Arc::new(ldap_provider))?;
//!
//! let resolver = AutoMembershipResolver::new(Arc::new(store), mapping, providers);
//!
//! let alice = Authorizable::user("alice").with_idp("corp-ldap");
//! let groups = resolver.resolve_auto_membership("corp-ldap", &alice)?;
//! assert_eq!(groups.len(), 2);
//!
//! assert!(resolver.is_auto_member("corp-ldap", "g-staff", &alice)?);
//! assert!(resolver
//!     .idp_names_configuring(&Principal::group("g-staff"))
//!     .contains("corp-ldap"));
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod mapping;
pub mod provider;
pub mod resolver;
pub mod store;
pub mod types;
pub mod verify;

// Re-export commonly used types
pub use cache::{CacheStats, PrincipalCache};
pub use config::AutoMembershipConfig;
pub use error::{ConfigError, ProviderError, Result, StoreError};
pub use mapping::{ProviderRegistry, StaticMapping};
pub use provider::{
    AttributeRule, AttributeRuleProvider, AuthorizableIter, AutoMembershipProvider,
    StaticMembershipProvider,
};
pub use resolver::AutoMembershipResolver;
pub use store::{IdentityStore, InMemoryIdentityStore};
pub use types::{
    Authorizable, AuthorizableKind, GroupId, GroupPrincipal, IdpName, Principal, PrincipalKind,
};
pub use verify::PrincipalVerifier;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
