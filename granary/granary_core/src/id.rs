//! Strongly-typed identifiers for Granary.
//!
//! Grains, identities and accounts are named by UUIDs wrapped in a phantom
//! typed [`Id`], so an identity id can never be passed where a grain id is
//! expected. Tokens are different: a token's id is derived from its bearer
//! secret, so [`TokenId`] wraps the hashed secret as a string.
//!
//! # Examples
//!
//! ```
//! use granary_core::id::{GrainId, IdentityId};
//! use std::str::FromStr;
//!
//! let grain_id = GrainId::new();
//! let identity_id = IdentityId::new();
//! assert_ne!(grain_id.to_string(), identity_id.to_string());
//!
//! let id_str = "550e8400-e29b-41d4-a716-446655440000";
//! let grain_id = GrainId::from_str(id_str).unwrap();
//! assert_eq!(grain_id.to_string(), id_str);
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::{Ord, PartialOrd};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// A type-safe identifier based on UUID.
///
/// The phantom parameter `T` keeps identifiers for different entity types
/// apart even though they share the same underlying representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Id<T> {
    uuid: Uuid,
    #[serde(skip)]
    _marker: std::marker::PhantomData<T>,
}

impl<T> Id<T> {
    /// Create a new random identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use granary_core::id::GrainId;
    ///
    /// let id = GrainId::new();
    /// assert!(!id.is_nil());
    /// ```
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an identifier from a specific UUID.
    ///
    /// Used when ids come back out of a snapshot or are fixed in tests.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self {
            uuid,
            _marker: std::marker::PhantomData,
        }
    }

    /// Get the underlying UUID.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// Create a nil (all zeros) identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use granary_core::id::AccountId;
    ///
    /// let nil_id = AccountId::nil();
    /// assert_eq!(nil_id.to_string(), "00000000-0000-0000-0000-000000000000");
    /// ```
    pub fn nil() -> Self {
        Self::from_uuid(Uuid::nil())
    }

    /// Check if this is a nil identifier.
    pub fn is_nil(&self) -> bool {
        self.uuid == Uuid::nil()
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.uuid)
    }
}

impl<T> FromStr for Id<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_uuid(Uuid::parse_str(s)?))
    }
}

/// Marker type for grains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrainMarker;
/// Identifier for a grain (an app instance).
pub type GrainId = Id<GrainMarker>;

/// Marker type for identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentityMarker;
/// Identifier for a login identity. One account may own several.
pub type IdentityId = Id<IdentityMarker>;

/// Marker type for accounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountMarker;
/// Identifier for a user account.
pub type AccountId = Id<AccountMarker>;

/// Identifier for an API token.
///
/// The id is the base64 encoded SHA-256 of the token's bearer secret, so the
/// store never holds the secret itself.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);

impl TokenId {
    /// Wrap an already hashed token id.
    pub fn new(hashed: impl Into<String>) -> Self {
        Self(hashed.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TokenId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for TokenId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}
