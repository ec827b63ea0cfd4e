use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use granary_core::id::{AccountId, GrainId, IdentityId, TokenId};

use super::role::RoleAssignment;
use super::vector::PermissionVector;
use super::vertex::Vertex;

/// Who may present a token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OwnerDescriptor {
    /// Anyone holding the bearer secret.
    Webkey {
        /// Whether the holder may share the grain further
        for_sharing: bool,
    },
    /// A specific identity, which becomes a recipient node in the sharing graph.
    User { identity_id: IdentityId, title: String },
}

impl OwnerDescriptor {
    /// Recipient identity, for user-owned tokens.
    pub fn recipient(&self) -> Option<IdentityId> {
        match self {
            Self::User { identity_id, .. } => Some(*identity_id),
            Self::Webkey { .. } => None,
        }
    }
}

/// The party whose permissions a `PermissionsHeld` requirement inspects.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionHolder {
    Identity(IdentityId),
    Token(TokenId),
}

impl PermissionHolder {
    /// The vertex this holder occupies on `grain_id`.
    pub fn vertex(&self, grain_id: GrainId) -> Vertex {
        match self {
            Self::Identity(identity_id) => Vertex::identity(grain_id, *identity_id),
            Self::Token(token_id) => Vertex::token(grain_id, token_id.clone()),
        }
    }
}

impl fmt::Display for PermissionHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity(identity_id) => write!(f, "identity {}", identity_id),
            Self::Token(token_id) => write!(f, "token {}", token_id),
        }
    }
}

/// A condition that must keep holding for a token to stay valid.
///
/// Records how a capability was justified when it was granted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembraneRequirement {
    /// The named token must exist, be unrevoked, and itself be valid.
    TokenValid { token_id: TokenId },
    /// `holder` must still hold at least `permissions` on `grain_id`.
    PermissionsHeld {
        grain_id: GrainId,
        holder: PermissionHolder,
        permissions: PermissionVector,
    },
    /// The account must still be an administrator.
    UserIsAdmin { account_id: AccountId },
}

/// An API token: one edge in a grain's sharing graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Base64 SHA-256 of the bearer secret
    pub id: TokenId,
    pub grain_id: GrainId,
    /// Identity that shared this token (inherited by children)
    #[serde(default)]
    pub sharer: Option<IdentityId>,
    /// Account behind `sharer`
    #[serde(default)]
    pub sharer_account: Option<AccountId>,
    #[serde(default)]
    pub parent_token: Option<TokenId>,
    #[serde(default)]
    pub role_assignment: Option<RoleAssignment>,
    pub owner: OwnerDescriptor,
    #[serde(default)]
    pub petname: String,
    #[serde(default)]
    pub requirements: Vec<MembraneRequirement>,
    #[serde(default)]
    pub revoked: bool,
    pub created: DateTime<Utc>,
    /// Self-destruct deadline, cleared once the token is used
    #[serde(default)]
    pub expires_if_unused: Option<DateTime<Utc>>,
}

impl Token {
    /// A bare token record with no sharer, parent or requirements.
    pub fn new(id: TokenId, grain_id: GrainId, owner: OwnerDescriptor) -> Self {
        Self {
            id,
            grain_id,
            sharer: None,
            sharer_account: None,
            parent_token: None,
            role_assignment: None,
            owner,
            petname: String::new(),
            requirements: Vec::new(),
            revoked: false,
            created: Utc::now(),
            expires_if_unused: None,
        }
    }

    /// Whether this token is a root share (no parent).
    pub fn is_root(&self) -> bool {
        self.parent_token.is_none()
    }

    /// Whether the token's self-destruct deadline has passed.
    ///
    /// A token is still usable at exactly its deadline.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_if_unused.is_some_and(|deadline| deadline < now)
    }

    /// The `for_sharing` flag, false for user-owned tokens.
    pub fn for_sharing(&self) -> bool {
        matches!(self.owner, OwnerDescriptor::Webkey { for_sharing: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_expiry() {
        let now = Utc::now();
        let mut token = Token::new(
            TokenId::new("t"),
            GrainId::new(),
            OwnerDescriptor::Webkey { for_sharing: true },
        );
        assert!(!token.is_expired_at(now));

        token.expires_if_unused = Some(now);
        assert!(!token.is_expired_at(now));

        token.expires_if_unused = Some(now - Duration::seconds(1));
        assert!(token.is_expired_at(now));
        assert!(token.for_sharing());
    }

    #[test]
    fn test_requirement_serde() {
        let grain_id = GrainId::new();
        let requirement = MembraneRequirement::PermissionsHeld {
            grain_id,
            holder: PermissionHolder::Token(TokenId::new("abc")),
            permissions: PermissionVector::new(vec![true]),
        };
        let json = serde_json::to_string(&requirement).unwrap();
        let back: MembraneRequirement = serde_json::from_str(&json).unwrap();
        assert_eq!(back, requirement);
        assert!(json.contains("permissions_held"));
    }

    #[test]
    fn test_token_defaults_when_deserializing() {
        let json = format!(
            r#"{{"id": "abc", "grain_id": "{}", "owner": {{"webkey": {{"for_sharing": false}}}},
                "created": "2024-01-01T00:00:00Z"}}"#,
            GrainId::nil()
        );
        let token: Token = serde_json::from_str(&json).unwrap();
        assert!(token.is_root());
        assert!(!token.revoked);
        assert!(token.requirements.is_empty());
        assert_eq!(token.owner.recipient(), None);
    }
}
