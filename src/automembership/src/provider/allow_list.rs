//! Allow-list provider: explicit group ids per identity

use super::{AuthorizableIter, AutoMembershipProvider};
use crate::error::Result;
use crate::types::{Authorizable, GroupId};
use std::collections::HashSet;

/// Provider backed by a fixed table of identities and their group ids
///
/// Identities are matched by id. Reverse enumeration yields members in the
/// order they were added.
#[derive(Debug, Clone, Default)]
pub struct StaticMembershipProvider {
    members: Vec<(Authorizable, HashSet<GroupId>)>,
}

impl StaticMembershipProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant automatic membership in the given groups to an identity
    ///
    /// Calling this again for the same identity extends its group set.
    pub fn with_member<I, S>(mut self, authorizable: Authorizable, group_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<GroupId>,
    {
        let group_ids = group_ids.into_iter().map(Into::into);

        match self
            .members
            .iter_mut()
            .find(|(existing, _)| existing.id == authorizable.id)
        {
            Some((_, groups)) => groups.extend(group_ids),
            None => self.members.push((authorizable, group_ids.collect())),
        }
        self
    }

    /// Number of listed identities
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Whether no identity is listed
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl AutoMembershipProvider for StaticMembershipProvider {
    fn auto_membership(&self, authorizable: &Authorizable) -> Result<HashSet<GroupId>> {
        Ok(self
            .members
            .iter()
            .find(|(member, _)| member.id == authorizable.id)
            .map(|(_, groups)| groups.clone())
            .unwrap_or_default())
    }

    fn auto_members<'a>(&'a self, group: &Authorizable) -> Result<AuthorizableIter<'a>> {
        let group_id = group.id.clone();

        Ok(Box::new(
            self.members
                .iter()
                .filter(move |(_, groups)| groups.contains(&group_id))
                .map(|(member, _)| Ok(member.clone())),
        ))
    }
}
