//! Attribute-driven provider
//!
//! Grants membership when a synchronized identity attribute has a given value,
//! e.g. `department == "engineering"` → `g-engineering`.

use super::{AuthorizableIter, AutoMembershipProvider};
use crate::error::{ProviderError, Result};
use crate::store::IdentityStore;
use crate::types::{Authorizable, GroupId, IdpName};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Single attribute match rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeRule {
    /// Attribute name
    pub attribute: String,

    /// Required attribute value (exact match)
    pub value: String,

    /// Group granted when the rule matches
    pub group_id: GroupId,
}

impl AttributeRule {
    /// Create a new rule
    pub fn new(
        attribute: impl Into<String>,
        value: impl Into<String>,
        group_id: impl Into<GroupId>,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
            group_id: group_id.into(),
        }
    }

    /// Check if the authorizable satisfies this rule
    pub fn matches(&self, authorizable: &Authorizable) -> bool {
        authorizable
            .attributes
            .get(&self.attribute)
            .is_some_and(|value| *value == self.value)
    }
}

/// Provider evaluating attribute rules for the identities of one IDP
///
/// Reverse enumeration walks the store's identities for the IDP, so a store
/// failure there is reported as a provider fault.
pub struct AttributeRuleProvider {
    idp_name: IdpName,
    rules: Vec<AttributeRule>,
    store: Arc<dyn IdentityStore>,
}

impl AttributeRuleProvider {
    /// Create a provider without rules
    pub fn new(idp_name: impl Into<IdpName>, store: Arc<dyn IdentityStore>) -> Self {
        Self {
            idp_name: idp_name.into(),
            rules: Vec::new(),
            store,
        }
    }

    /// Add a rule
    pub fn with_rule(mut self, rule: AttributeRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Configured rules
    pub fn rules(&self) -> &[AttributeRule] {
        &self.rules
    }
}

impl AutoMembershipProvider for AttributeRuleProvider {
    fn auto_membership(&self, authorizable: &Authorizable) -> Result<HashSet<GroupId>> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| rule.matches(authorizable))
            .map(|rule| rule.group_id.clone())
            .collect())
    }

    fn auto_members<'a>(&'a self, group: &Authorizable) -> Result<AuthorizableIter<'a>> {
        let rules: Vec<&AttributeRule> = self
            .rules
            .iter()
            .filter(|rule| rule.group_id == group.id)
            .collect();

        if rules.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }

        let candidates = self
            .store
            .authorizables_of_idp(&self.idp_name)
            .map_err(|e| {
                ProviderError::Unavailable(format!(
                    "Failed to enumerate identities of {}: {}",
                    self.idp_name, e
                ))
            })?;

        Ok(Box::new(
            candidates
                .into_iter()
                .filter(move |candidate| rules.iter().any(|rule| rule.matches(candidate)))
                .map(Ok),
        ))
    }
}
