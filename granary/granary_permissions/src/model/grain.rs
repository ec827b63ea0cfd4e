use serde::{Deserialize, Serialize};

use granary_core::id::{AccountId, GrainId, IdentityId};

use super::catalog::ViewCatalog;

/// An app instance owned by one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grain {
    pub id: GrainId,
    pub owner_account: AccountId,
    /// `false` means legacy "anyone with the id may open it" semantics
    #[serde(default = "default_private")]
    pub private: bool,
    #[serde(default)]
    pub view_catalog: ViewCatalog,
}

fn default_private() -> bool {
    true
}

impl Grain {
    pub fn new(owner_account: AccountId, view_catalog: ViewCatalog) -> Self {
        Self {
            id: GrainId::new(),
            owner_account,
            private: true,
            view_catalog,
        }
    }
}

/// A user account and the identities it logs in with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(default)]
    pub identities: Vec<IdentityId>,
    #[serde(default)]
    pub is_admin: bool,
}

impl Account {
    /// A non-admin account with one fresh identity.
    pub fn with_identity() -> Self {
        Self {
            id: AccountId::new(),
            identities: vec![IdentityId::new()],
            is_admin: false,
        }
    }

    /// First identity, if the account has any.
    pub fn primary_identity(&self) -> Option<IdentityId> {
        self.identities.first().copied()
    }
}
