use serde::{Deserialize, Serialize};
use std::fmt;

use granary_core::id::{GrainId, IdentityId, TokenId};

/// The party whose access to a grain is being asked about.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vertex {
    /// Someone presenting a token.
    Token { token_id: TokenId, grain_id: GrainId },
    /// A logged-in identity, or anonymous when `identity_id` is `None`.
    Identity {
        grain_id: GrainId,
        identity_id: Option<IdentityId>,
    },
}

impl Vertex {
    pub fn token(grain_id: GrainId, token_id: TokenId) -> Self {
        Self::Token { token_id, grain_id }
    }

    pub fn identity(grain_id: GrainId, identity_id: IdentityId) -> Self {
        Self::Identity {
            grain_id,
            identity_id: Some(identity_id),
        }
    }

    pub fn anonymous(grain_id: GrainId) -> Self {
        Self::Identity {
            grain_id,
            identity_id: None,
        }
    }

    /// Grain the vertex asks about.
    pub fn grain_id(&self) -> GrainId {
        match self {
            Self::Token { grain_id, .. } | Self::Identity { grain_id, .. } => *grain_id,
        }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token { token_id, grain_id } => {
                write!(f, "token {} on grain {}", token_id, grain_id)
            }
            Self::Identity {
                grain_id,
                identity_id: Some(identity_id),
            } => write!(f, "identity {} on grain {}", identity_id, grain_id),
            Self::Identity {
                grain_id,
                identity_id: None,
            } => write!(f, "anonymous on grain {}", grain_id),
        }
    }
}

/// A node of a grain's sharing graph.
///
/// `Owner` is the implicit source holding all access; every identity of the
/// owning account receives it through a trivial edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Principal {
    Owner,
    Identity(IdentityId),
}
