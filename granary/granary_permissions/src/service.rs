use std::sync::Arc;
use std::time::Instant;

use chrono::{Duration, Utc};
use tracing::{debug, warn};

use granary_core::config::EngineConfig;
use granary_core::error::{IssueError, RevokedError, StoreError};
use granary_core::id::{AccountId, GrainId, TokenId};

use crate::downstream::{self, DownstreamRoot};
use crate::engine;
use crate::issuer::{self, NewOwner, NewToken, Provider, TokenUpdate};
use crate::model::{MembraneRequirement, PermissionVector, RoleAssignment, Token, Vertex};
use crate::requirements;
use crate::store::GrainStore;

/// The main permission engine
///
/// Wraps a store with the read-path queries and the token issuer, timing
/// each query against the configured slow-query threshold.
pub struct PermissionEngine {
    /// The store every query reads from
    store: Arc<dyn GrainStore>,

    /// Engine configuration
    config: EngineConfig,
}

impl PermissionEngine {
    /// Creates a new engine over the given store with default configuration
    pub fn new(store: Arc<dyn GrainStore>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    /// Creates a new engine over the given store and configuration
    pub fn with_config(store: Arc<dyn GrainStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Gets a reference to the store
    pub fn store(&self) -> &Arc<dyn GrainStore> {
        &self.store
    }

    /// Gets a reference to the configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn timed<T>(&self, operation: &str, query: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let result = query();
        let elapsed = start.elapsed();

        if elapsed > self.config.slow_query_threshold() {
            warn!("Slow {} query took {:?}", operation, elapsed);
        } else {
            debug!("{} query took {:?}", operation, elapsed);
        }
        result
    }

    /// Effective permissions of `vertex`, indexed by its grain's current catalog.
    ///
    /// `None` means the vertex cannot open the grain.
    pub fn grain_permissions(
        &self,
        vertex: &Vertex,
    ) -> Result<Option<PermissionVector>, StoreError> {
        self.timed("grain_permissions", || {
            let Some(grain) = self.store.get_grain(&vertex.grain_id())? else {
                return Ok(None);
            };
            engine::grain_permissions(self.store.as_ref(), vertex, &grain.view_catalog)
        })
    }

    /// Whether `vertex` may open its grain at all
    pub fn may_open_grain(&self, vertex: &Vertex) -> Result<bool, StoreError> {
        self.timed("may_open_grain", || {
            engine::may_open_grain(self.store.as_ref(), vertex)
        })
    }

    /// Tokens that would stop working if `root` were revoked
    pub fn downstream_tokens(&self, root: &DownstreamRoot) -> Result<Vec<Token>, StoreError> {
        self.timed("downstream_tokens", || {
            downstream::downstream_tokens(self.store.as_ref(), root)
        })
    }

    /// Validate membrane requirements before exercising a capability
    pub fn check_requirements(
        &self,
        requirements: &[MembraneRequirement],
    ) -> Result<(), RevokedError> {
        self.timed("check_requirements", || {
            requirements::check_requirements(self.store.as_ref(), requirements)
        })
    }

    /// Issue a new token. See [`issuer::create_new_api_token`].
    pub fn create_token(
        &self,
        provider: &Provider,
        grain_id: &GrainId,
        petname: &str,
        role_assignment: RoleAssignment,
        owner: NewOwner,
    ) -> Result<NewToken, IssueError> {
        issuer::create_new_api_token(
            self.store.as_ref(),
            provider,
            grain_id,
            petname,
            role_assignment,
            owner,
        )
    }

    /// Issue a webkey that self-destructs after the configured lifetime if never used.
    ///
    /// Without a configured lifetime the webkey never self-destructs.
    pub fn create_self_destructing_webkey(
        &self,
        provider: &Provider,
        grain_id: &GrainId,
        petname: &str,
        role_assignment: RoleAssignment,
    ) -> Result<NewToken, IssueError> {
        // A lifetime too large for chrono never expires.
        let expires_if_unused = self
            .config
            .self_destruct_ttl()
            .and_then(|ttl| Duration::from_std(ttl).ok());

        self.create_token(
            provider,
            grain_id,
            petname,
            role_assignment,
            NewOwner::Webkey {
                for_sharing: false,
                expires_if_unused,
            },
        )
    }

    /// Modify a token on behalf of `account_id`. See [`issuer::update_api_token`].
    pub fn update_token(
        &self,
        account_id: &AccountId,
        token_id: &TokenId,
        update: TokenUpdate,
    ) -> Result<Token, IssueError> {
        issuer::update_api_token(self.store.as_ref(), account_id, token_id, update)
    }

    /// Attach further membrane requirements to an existing token
    pub fn append_requirements(
        &self,
        token_id: &TokenId,
        requirements: Vec<MembraneRequirement>,
    ) -> Result<(), StoreError> {
        self.store.append_requirements(token_id, requirements)
    }

    /// Record that a token was presented, clearing any self-destruct deadline
    pub fn record_token_use(&self, token_id: &TokenId) -> Result<Token, IssueError> {
        issuer::record_token_use(self.store.as_ref(), token_id, Utc::now())
    }

    /// Delete self-destructing tokens that expired unused
    pub fn cleanup_self_destructing(&self) -> Result<usize, StoreError> {
        issuer::cleanup_self_destructing(self.store.as_ref(), Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Account, Grain, RoleDef, ViewCatalog};
    use crate::store::InMemoryGrainStore;

    fn engine_with_grain() -> (PermissionEngine, Account, GrainId) {
        let store = Arc::new(InMemoryGrainStore::new());
        let alice = Account::with_identity();
        store.insert_account(alice.clone());
        let catalog = ViewCatalog::new(
            ["read", "write"],
            vec![RoleDef::new(vec![true, false]).as_default()],
        );
        let grain_id = store.insert_grain(Grain::new(alice.id, catalog));
        (PermissionEngine::new(store), alice, grain_id)
    }

    #[test]
    fn test_engine_queries() {
        let (engine, alice, grain_id) = engine_with_grain();
        let provider = Provider::Identity {
            identity_id: alice.identities[0],
            account_id: alice.id,
        };

        let owner = Vertex::identity(grain_id, alice.identities[0]);
        assert_eq!(
            engine.grain_permissions(&owner).unwrap(),
            Some(PermissionVector::new(vec![true, true]))
        );

        let issued = engine
            .create_token(
                &provider,
                &grain_id,
                "viewer",
                RoleAssignment::None,
                NewOwner::Webkey {
                    for_sharing: false,
                    expires_if_unused: None,
                },
            )
            .unwrap();
        let webkey = Vertex::token(grain_id, issued.id.clone());
        assert!(engine.may_open_grain(&webkey).unwrap());
        assert_eq!(
            engine.grain_permissions(&webkey).unwrap(),
            Some(PermissionVector::new(vec![true, false]))
        );

        let downstream = engine
            .downstream_tokens(&DownstreamRoot::Grain {
                grain_id,
                identity_id: alice.identities[0],
            })
            .unwrap();
        assert_eq!(downstream.len(), 1);

        engine
            .update_token(
                &alice.id,
                &issued.id,
                TokenUpdate {
                    revoked: Some(true),
                    ..TokenUpdate::default()
                },
            )
            .unwrap();
        assert!(!engine.may_open_grain(&webkey).unwrap());
        assert_eq!(engine.grain_permissions(&webkey).unwrap(), None);
    }

    #[test]
    fn test_missing_grain_has_no_permissions() {
        let (engine, alice, _) = engine_with_grain();
        let vertex = Vertex::identity(GrainId::new(), alice.identities[0]);
        assert_eq!(engine.grain_permissions(&vertex).unwrap(), None);
        assert!(!engine.may_open_grain(&vertex).unwrap());
    }

    #[test]
    fn test_self_destructing_webkey_uses_configured_lifetime() {
        let store = Arc::new(InMemoryGrainStore::new());
        let alice = Account::with_identity();
        store.insert_account(alice.clone());
        let grain_id = store.insert_grain(Grain::new(alice.id, ViewCatalog::default()));
        let config = EngineConfig {
            self_destruct_ttl_secs: Some(60),
            ..EngineConfig::default()
        };
        let engine = PermissionEngine::with_config(store, config);
        let provider = Provider::Identity {
            identity_id: alice.identities[0],
            account_id: alice.id,
        };

        let issued = engine
            .create_self_destructing_webkey(&provider, &grain_id, "", RoleAssignment::None)
            .unwrap();
        let token = engine.store().get_token(&issued.id).unwrap().unwrap();
        assert!(token.expires_if_unused.is_some());

        // Unused tokens survive until their deadline
        assert_eq!(engine.cleanup_self_destructing().unwrap(), 0);

        let used = engine.record_token_use(&issued.id).unwrap();
        assert!(used.expires_if_unused.is_none());
    }
}
