//! Group principal verification
//!
//! Resolves a configured or provider-supplied group id through the identity
//! store and keeps it only if it denotes an actual group with a group-typed
//! principal. Rejected ids never fail the caller.

use crate::store::IdentityStore;
use crate::types::GroupPrincipal;
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifies group ids against an identity store
#[derive(Clone)]
pub struct PrincipalVerifier {
    store: Arc<dyn IdentityStore>,
}

impl PrincipalVerifier {
    /// Create a verifier for the given store
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    /// Resolve a group id to a verified group principal
    ///
    /// Returns `None` and logs a warning when the id does not exist, is not a
    /// group, or its principal is not group-typed. Store failures are logged
    /// at debug level since they are expected to be transient.
    pub fn verify(&self, group_id: &str) -> Option<GroupPrincipal> {
        let authorizable = match self.store.authorizable(group_id) {
            Ok(Some(authorizable)) => authorizable,
            Ok(None) => {
                warn!(group_id, "Configured auto-membership group does not exist, ignoring");
                return None;
            }
            Err(e) => {
                debug!(group_id, error = %e, "Failed to retrieve auto-membership group");
                return None;
            }
        };

        if !self.store.is_group(&authorizable) {
            warn!(group_id, "Configured auto-membership group is not a group, ignoring");
            return None;
        }

        if !self.store.is_group_principal(&authorizable.principal) {
            warn!(
                group_id,
                principal = %authorizable.principal.name,
                "Principal of auto-membership group is not of group type, ignoring"
            );
            return None;
        }

        Some(GroupPrincipal::new(authorizable.principal))
    }
}
