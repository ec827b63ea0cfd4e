//! Shared fixture for the integration tests.
//!
//! Mirrors how a shell drives the engine: accounts with a single identity,
//! grains with a view catalog, and shares made through the token issuer with
//! requirements appended afterwards.

#![allow(dead_code)]

use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use granary_core::id::{GrainId, IdentityId, TokenId};
use granary_permissions::issuer::{NewOwner, Provider};
use granary_permissions::model::{
    Account, Grain, MembraneRequirement, PermissionHolder, PermissionVector, RoleAssignment,
    RoleDef, Vertex, ViewCatalog,
};
use granary_permissions::store::{GrainStore, InMemoryGrainStore};
use granary_permissions::PermissionEngine;

// Initialize tracing for tests
pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

/// Three permissions and seven roles; role 1 is the default.
pub fn common_catalog() -> ViewCatalog {
    ViewCatalog::new(
        ["one", "two", "three"],
        vec![
            RoleDef::new(vec![true, true, true]),
            RoleDef::new(vec![true, false, false]).as_default(),
            RoleDef::new(vec![false, false, true]),
            RoleDef::new(vec![false, false, false]),
            RoleDef::new(vec![true, true, false]),
            RoleDef::new(vec![true, false, true]),
            RoleDef::new(vec![false, true, true]),
        ],
    )
}

/// `count` permissions; role `i` holds every permission except `i`, role 0 is the default.
pub fn create_catalog(count: usize) -> ViewCatalog {
    let roles = (0..count)
        .map(|i| {
            let role = RoleDef::new((0..count).map(|j| i != j).collect());
            if i == 0 {
                role.as_default()
            } else {
                role
            }
        })
        .collect();
    ViewCatalog::new((0..count).map(|i| i.to_string()), roles)
}

/// Requirement that `user` holds `bits` on `grain`.
pub fn held_by(grain: GrainId, user: &User, bits: &[bool]) -> MembraneRequirement {
    MembraneRequirement::PermissionsHeld {
        grain_id: grain,
        holder: PermissionHolder::Identity(user.identity()),
        permissions: PermissionVector::new(bits.to_vec()),
    }
}

#[derive(Clone, Debug)]
pub struct User {
    pub account: Account,
}

impl User {
    pub fn identity(&self) -> IdentityId {
        self.account.identities[0]
    }

    fn provider(&self) -> Provider {
        Provider::Identity {
            identity_id: self.identity(),
            account_id: self.account.id,
        }
    }
}

/// A bearer webkey: its secret, its id and the grain it opens.
#[derive(Clone, Debug)]
pub struct Webkey {
    pub raw: String,
    pub id: TokenId,
    pub grain: GrainId,
}

pub struct Fixture {
    pub store: Arc<InMemoryGrainStore>,
    pub engine: PermissionEngine,
}

impl Fixture {
    pub fn new() -> Self {
        init_tracing();
        let store = Arc::new(InMemoryGrainStore::new());
        let engine = PermissionEngine::new(store.clone());
        Self { store, engine }
    }

    pub fn user(&self) -> User {
        let account = Account::with_identity();
        self.store.insert_account(account.clone());
        User { account }
    }

    pub fn grain(&self, owner: &User, catalog: ViewCatalog) -> GrainId {
        self.store.insert_grain(Grain::new(owner.account.id, catalog))
    }

    pub fn public_grain(&self, owner: &User, catalog: ViewCatalog) -> GrainId {
        let mut grain = Grain::new(owner.account.id, catalog);
        grain.private = false;
        self.store.insert_grain(grain)
    }

    fn issue(
        &self,
        provider: Provider,
        grain: GrainId,
        owner: NewOwner,
        role: RoleAssignment,
        requirements: Vec<MembraneRequirement>,
    ) -> (String, TokenId) {
        let issued = self
            .engine
            .create_token(&provider, &grain, "<petname>", role, owner)
            .expect("token should be issued");
        if !requirements.is_empty() {
            self.engine
                .append_requirements(&issued.id, requirements)
                .expect("requirements should be appended");
        }
        (issued.token, issued.id)
    }

    fn to_user(recipient: &User) -> NewOwner {
        NewOwner::User {
            identity_id: recipient.identity(),
            title: "share".to_string(),
        }
    }

    fn to_webkey() -> NewOwner {
        NewOwner::Webkey {
            for_sharing: true,
            expires_if_unused: None,
        }
    }

    pub fn share_to_account(
        &self,
        from: &User,
        grain: GrainId,
        recipient: &User,
        role: RoleAssignment,
        requirements: Vec<MembraneRequirement>,
    ) -> TokenId {
        self.issue(from.provider(), grain, Self::to_user(recipient), role, requirements)
            .1
    }

    pub fn share_to_webkey(
        &self,
        from: &User,
        grain: GrainId,
        role: RoleAssignment,
        requirements: Vec<MembraneRequirement>,
    ) -> Webkey {
        let (raw, id) = self.issue(from.provider(), grain, Self::to_webkey(), role, requirements);
        Webkey { raw, id, grain }
    }

    pub fn reshare_to_account(
        &self,
        webkey: &Webkey,
        recipient: &User,
        role: RoleAssignment,
        requirements: Vec<MembraneRequirement>,
    ) -> TokenId {
        let provider = Provider::ParentToken {
            raw_token: webkey.raw.clone(),
        };
        self.issue(provider, webkey.grain, Self::to_user(recipient), role, requirements)
            .1
    }

    pub fn reshare_to_webkey(
        &self,
        webkey: &Webkey,
        role: RoleAssignment,
        requirements: Vec<MembraneRequirement>,
    ) -> Webkey {
        let provider = Provider::ParentToken {
            raw_token: webkey.raw.clone(),
        };
        let (raw, id) = self.issue(provider, webkey.grain, Self::to_webkey(), role, requirements);
        Webkey {
            raw,
            id,
            grain: webkey.grain,
        }
    }

    pub fn revoke(&self, token_id: &TokenId) {
        self.store.revoke_token(token_id).expect("token should exist");
    }

    pub fn may_open(&self, user: &User, grain: GrainId) -> bool {
        self.engine
            .may_open_grain(&Vertex::identity(grain, user.identity()))
            .expect("query should succeed")
    }

    pub fn permissions(&self, user: &User, grain: GrainId) -> Option<Vec<bool>> {
        self.engine
            .grain_permissions(&Vertex::identity(grain, user.identity()))
            .expect("query should succeed")
            .map(|permissions| permissions.bits().to_vec())
    }

    pub fn webkey_may_open(&self, webkey: &Webkey) -> bool {
        self.engine
            .may_open_grain(&Vertex::token(webkey.grain, webkey.id.clone()))
            .expect("query should succeed")
    }

    pub fn webkey_permissions(&self, webkey: &Webkey) -> Option<Vec<bool>> {
        self.engine
            .grain_permissions(&Vertex::token(webkey.grain, webkey.id.clone()))
            .expect("query should succeed")
            .map(|permissions| permissions.bits().to_vec())
    }
}
