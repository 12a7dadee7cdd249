//! Auto-membership configuration loading and validation
//!
//! ```toml
//! [mapping]
//! corp-ldap = ["g-staff", "g-ldap-users"]
//! partner-saml = ["g-partners"]
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::types::{GroupId, IdpName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Static auto-membership configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AutoMembershipConfig {
    /// IDP name → group ids every identity of that IDP is a member of
    #[serde(default)]
    pub mapping: BTreeMap<IdpName, Vec<GroupId>>,
}

impl AutoMembershipConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails [`validate`](Self::validate).
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from a TOML string
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not valid TOML or fails validation.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: AutoMembershipConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// Only IDP names are checked. Group ids are verified against the
    /// identity store when first used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidIdpName`] for an empty or blank IDP name.
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(idp_name) = self.mapping.keys().find(|name| name.trim().is_empty()) {
            return Err(ConfigError::InvalidIdpName(idp_name.clone()));
        }
        Ok(())
    }
}
