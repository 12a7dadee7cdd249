//! Core identity and principal types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Name of an external identity provider (case-sensitive, exact match)
pub type IdpName = String;

/// Identifier of a group in the identity store
pub type GroupId = String;

/// Principal type as recognized by the identity store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrincipalKind {
    /// Individual user principal
    User,
    /// Group principal
    Group,
    /// Any other principal type (system, service, anonymous)
    Other,
}

/// Security principal of an authorizable
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    /// Principal name
    pub name: String,

    /// Principal type
    #[serde(rename = "type")]
    pub kind: PrincipalKind,
}

impl Principal {
    /// Create a new principal
    pub fn new(name: impl Into<String>, kind: PrincipalKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a group-typed principal
    pub fn group(name: impl Into<String>) -> Self {
        Self::new(name, PrincipalKind::Group)
    }

    /// Create a user-typed principal
    pub fn user(name: impl Into<String>) -> Self {
        Self::new(name, PrincipalKind::User)
    }
}

/// A group principal that passed verification against the identity store
///
/// Equality and hashing only consider the principal name, so sets of
/// group principals collapse entries that resolve to the same name.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct GroupPrincipal(Principal);

impl GroupPrincipal {
    pub(crate) fn new(principal: Principal) -> Self {
        Self(principal)
    }

    /// Principal name
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Underlying principal
    pub fn principal(&self) -> &Principal {
        &self.0
    }

    /// Consume into the underlying principal
    pub fn into_principal(self) -> Principal {
        self.0
    }
}

impl PartialEq for GroupPrincipal {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for GroupPrincipal {}

impl Hash for GroupPrincipal {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}

impl AsRef<Principal> for GroupPrincipal {
    fn as_ref(&self) -> &Principal {
        &self.0
    }
}

impl fmt::Display for GroupPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Kind of identity store entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorizableKind {
    /// User account
    User,
    /// Group
    Group,
}

/// User or group entity owned by the identity store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorizable {
    /// Store identifier (e.g., "alice", "g-engineering")
    pub id: String,

    /// User or group
    pub kind: AuthorizableKind,

    /// Principal the store associates with this entity
    pub principal: Principal,

    /// IDP this identity was synchronized from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idp_name: Option<IdpName>,

    /// Synchronized identity attributes (e.g., department, country)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

impl Authorizable {
    /// Create a user whose principal name equals its id
    pub fn user(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            principal: Principal::user(id.clone()),
            id,
            kind: AuthorizableKind::User,
            idp_name: None,
            attributes: HashMap::new(),
        }
    }

    /// Create a group whose principal name equals its id
    pub fn group(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            principal: Principal::group(id.clone()),
            id,
            kind: AuthorizableKind::Group,
            idp_name: None,
            attributes: HashMap::new(),
        }
    }

    /// Replace the principal
    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    /// Mark the identity as synchronized from the given IDP
    pub fn with_idp(mut self, idp_name: impl Into<IdpName>) -> Self {
        self.idp_name = Some(idp_name.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether this entity is a group
    pub fn is_group(&self) -> bool {
        self.kind == AuthorizableKind::Group
    }
}
