//! Error types for automatic membership resolution

use thiserror::Error;

/// Identity store errors
///
/// Raised by an [`IdentityStore`](crate::store::IdentityStore) lookup. The
/// resolver treats these as operational noise during group verification and
/// never surfaces them to its caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Store backend temporarily unreachable
    #[error("Identity store unavailable: {0}")]
    Unavailable(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Operation not implemented by this store
    #[error("Unsupported store operation: {0}")]
    Unsupported(String),

    /// Internal store error
    #[error("Internal store error: {0}")]
    Internal(String),
}

/// Membership provider errors
///
/// Returned by a registered [`AutoMembershipProvider`](crate::provider::AutoMembershipProvider)
/// and propagated to the resolver's caller unchanged.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider (or the system behind it) cannot be reached
    #[error("Membership provider unavailable: {0}")]
    Unavailable(String),

    /// Provider failed to evaluate its membership rules
    #[error("Membership evaluation failed: {0}")]
    Evaluation(String),

    /// Any other provider-specific failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for this schema
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// IDP name is empty or blank
    #[error("Invalid IDP name: {0:?}")]
    InvalidIdpName(String),

    /// A provider is already registered for this IDP
    #[error("Provider already registered for IDP: {0}")]
    DuplicateProvider(String),
}

/// Result type for identity store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type for provider and resolver operations
pub type Result<T> = std::result::Result<T, ProviderError>;

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
