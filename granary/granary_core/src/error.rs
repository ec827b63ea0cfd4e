//! Error types for Granary.
//!
//! Each subsystem has its own error type; the root [`Error`] wraps all of
//! them so binaries can handle failures uniformly.
//!
//! Permission reads never fail because something is missing: a grain or
//! token that does not resolve simply yields "no permissions". Only the
//! requirement validator reports a [`RevokedError`], and that is the one
//! error callers are expected to branch on.

use crate::id::{AccountId, GrainId, TokenId};
use thiserror::Error;

/// Root error type for Granary.
#[derive(Debug, Error)]
pub enum Error {
    /// Store access errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Token issuance and update errors
    #[error("Issue error: {0}")]
    Issue(#[from] IssueError),

    /// A capability's membrane requirements no longer hold
    #[error("Capability revoked: {0}")]
    Revoked(#[from] RevokedError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Errors raised by a grain/token store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No grain with the given ID exists
    #[error("Grain not found: {0}")]
    GrainNotFound(GrainId),

    /// No token with the given ID exists
    #[error("Token not found: {0}")]
    TokenNotFound(TokenId),

    /// No account with the given ID exists
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// The write conflicts with an existing record
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The backing store failed
    #[error("Backend failure: {0}")]
    Backend(String),
}

/// Errors raised while creating or modifying tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IssueError {
    /// The grain being shared does not exist
    #[error("No grain found: {0}")]
    GrainNotFound(GrainId),

    /// The parent token does not exist on the grain, or was revoked
    #[error("No such parent token found on grain {0}")]
    ParentTokenNotFound(GrainId),

    /// A role assignment does not fit the grain's permission catalog
    #[error("Malformed role assignment: {0}")]
    MalformedRoleAssignment(String),

    /// The caller may not perform this change
    #[error("Not authorized: {0}")]
    NotAuthorized(String),

    /// A self-destructing token was used after its deadline
    #[error("Authorization token expired: {0}")]
    Expired(TokenId),

    /// The store rejected the operation
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The capability revoked error.
///
/// Each variant names the membrane requirement that stopped holding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RevokedError {
    /// A required token is missing, revoked, or its own requirements fail
    #[error("Token {0} is no longer valid")]
    TokenInvalid(TokenId),

    /// A holder no longer has the permissions the capability was granted under
    #[error("{holder} no longer holds the required permissions on grain {grain_id}")]
    PermissionsLost {
        /// Grain the permissions were required on
        grain_id: GrainId,
        /// Display form of the identity or token that had to hold them
        holder: String,
    },

    /// An account is no longer an administrator
    #[error("Account {0} is no longer an administrator")]
    NotAdmin(AccountId),

    /// The store failed while checking
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors related to configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias using the root error type.
pub type Result<T> = std::result::Result<T, Error>;
