//! Pluggable membership providers
//!
//! A provider computes per-identity automatic membership for one IDP. It
//! answers two questions: which groups an identity belongs to (forward), and
//! which identities belong to a group (reverse, as a lazy sequence).
//!
//! Two implementations ship with the crate:
//!
//! - [`StaticMembershipProvider`]: explicit allow-list of group ids per identity
//! - [`AttributeRuleProvider`]: membership derived from synchronized attributes

mod attribute;
mod allow_list;

pub use attribute::{AttributeRule, AttributeRuleProvider};
pub use allow_list::StaticMembershipProvider;

use crate::error::Result;
use crate::types::{Authorizable, GroupId};
use std::collections::HashSet;

/// Lazy sequence of authorizables produced by reverse enumeration
///
/// A provider fault partway through the sequence is reported as an `Err`
/// item at the point where it occurs.
pub type AuthorizableIter<'a> = Box<dyn Iterator<Item = Result<Authorizable>> + Send + 'a>;

/// Dynamic automatic membership provider
pub trait AutoMembershipProvider: Send + Sync {
    /// Group ids the authorizable is an automatic member of
    fn auto_membership(&self, authorizable: &Authorizable) -> Result<HashSet<GroupId>>;

    /// Authorizables that are automatic members of the given group
    fn auto_members<'a>(&'a self, group: &Authorizable) -> Result<AuthorizableIter<'a>>;
}
