use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::RwLock;
use tracing::debug;

use granary_core::error::StoreError;
use granary_core::id::{AccountId, GrainId, IdentityId, TokenId};

use super::snapshot::StoreSnapshot;
use super::GrainStore;
use crate::model::{Account, Grain, Token};

/// Accounts plus the reverse identity index, kept under one lock so the two
/// never disagree.
#[derive(Default)]
struct AccountRegistry {
    accounts: HashMap<AccountId, Account>,
    identity_owner: HashMap<IdentityId, AccountId>,
}

/// An in-memory implementation of the GrainStore trait
///
/// Grains and tokens live in DashMaps for concurrent access; tokens are
/// additionally indexed by grain so a sharing graph can be loaded without
/// scanning every token.
#[derive(Default)]
pub struct InMemoryGrainStore {
    grains: DashMap<GrainId, Grain>,
    tokens: DashMap<TokenId, Token>,
    tokens_by_grain: DashMap<GrainId, HashSet<TokenId>>,
    accounts: RwLock<AccountRegistry>,
}

impl InMemoryGrainStore {
    /// Creates a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a grain
    pub fn insert_grain(&self, grain: Grain) -> GrainId {
        let grain_id = grain.id;
        self.grains.insert(grain_id, grain);
        grain_id
    }

    /// Insert or replace an account, re-indexing its identities
    pub fn insert_account(&self, account: Account) -> AccountId {
        let account_id = account.id;
        let mut registry = self.accounts.write();
        if let Some(previous) = registry.accounts.remove(&account_id) {
            for identity_id in previous.identities {
                registry.identity_owner.remove(&identity_id);
            }
        }
        for identity_id in &account.identities {
            registry.identity_owner.insert(*identity_id, account_id);
        }
        registry.accounts.insert(account_id, account);
        account_id
    }

    /// Get a copy of an account
    pub fn get_account(&self, account_id: &AccountId) -> Option<Account> {
        self.accounts.read().accounts.get(account_id).cloned()
    }

    /// Flip an account's administrator flag
    pub fn set_admin(&self, account_id: &AccountId, is_admin: bool) -> Result<(), StoreError> {
        let mut registry = self.accounts.write();
        let account = registry
            .accounts
            .get_mut(account_id)
            .ok_or(StoreError::AccountNotFound(*account_id))?;
        account.is_admin = is_admin;
        Ok(())
    }

    /// Number of stored tokens, revoked ones included
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// Copy the whole store into a serializable snapshot
    pub fn snapshot(&self) -> StoreSnapshot {
        let mut grains: Vec<Grain> = self.grains.iter().map(|g| g.value().clone()).collect();
        grains.sort_by_key(|g| g.id);

        let mut accounts: Vec<Account> = self.accounts.read().accounts.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);

        let mut tokens: Vec<Token> = self.tokens.iter().map(|t| t.value().clone()).collect();
        tokens.sort_by(|a, b| a.created.cmp(&b.created).then_with(|| a.id.cmp(&b.id)));

        StoreSnapshot {
            grains,
            accounts,
            tokens,
        }
    }

    /// Build a store from a snapshot
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let store = Self::new();
        for grain in snapshot.grains {
            store.insert_grain(grain);
        }
        for account in snapshot.accounts {
            store.insert_account(account);
        }
        for token in snapshot.tokens {
            store.insert_token(token)?;
        }
        debug!(
            "Loaded snapshot with {} grains and {} tokens",
            store.grains.len(),
            store.tokens.len()
        );
        Ok(store)
    }

    fn unindex_token(&self, token: &Token) {
        if let Some(mut ids) = self.tokens_by_grain.get_mut(&token.grain_id) {
            ids.remove(&token.id);
        }
    }
}

impl GrainStore for InMemoryGrainStore {
    fn get_grain(&self, grain_id: &GrainId) -> Result<Option<Grain>, StoreError> {
        Ok(self.grains.get(grain_id).map(|g| g.value().clone()))
    }

    fn tokens_for_grain(&self, grain_id: &GrainId) -> Result<Vec<Token>, StoreError> {
        let ids: Vec<TokenId> = match self.tokens_by_grain.get(grain_id) {
            Some(ids) => ids.iter().cloned().collect(),
            None => return Ok(Vec::new()),
        };

        Ok(ids
            .iter()
            .filter_map(|id| self.tokens.get(id).map(|t| t.value().clone()))
            .filter(|token| !token.revoked)
            .collect())
    }

    fn get_token(&self, token_id: &TokenId) -> Result<Option<Token>, StoreError> {
        Ok(self.tokens.get(token_id).map(|t| t.value().clone()))
    }

    fn insert_token(&self, token: Token) -> Result<(), StoreError> {
        if self.tokens.contains_key(&token.id) {
            return Err(StoreError::Conflict(format!(
                "Token {} already exists",
                token.id
            )));
        }

        self.tokens_by_grain
            .entry(token.grain_id)
            .or_default()
            .insert(token.id.clone());
        self.tokens.insert(token.id.clone(), token);
        Ok(())
    }

    fn replace_token(&self, token: Token) -> Result<(), StoreError> {
        let previous = self
            .tokens
            .get(&token.id)
            .map(|t| t.value().clone())
            .ok_or_else(|| StoreError::TokenNotFound(token.id.clone()))?;

        if previous.grain_id != token.grain_id {
            self.unindex_token(&previous);
            self.tokens_by_grain
                .entry(token.grain_id)
                .or_default()
                .insert(token.id.clone());
        }
        self.tokens.insert(token.id.clone(), token);
        Ok(())
    }

    fn remove_token(&self, token_id: &TokenId) -> Result<Option<Token>, StoreError> {
        let removed = self.tokens.remove(token_id).map(|(_, token)| token);
        if let Some(token) = &removed {
            self.unindex_token(token);
        }
        Ok(removed)
    }

    fn remove_expired_tokens(&self, now: DateTime<Utc>) -> Result<Vec<TokenId>, StoreError> {
        let expired: Vec<TokenId> = self
            .tokens
            .iter()
            .filter(|t| t.value().is_expired_at(now))
            .map(|t| t.key().clone())
            .collect();

        for token_id in &expired {
            self.remove_token(token_id)?;
        }
        Ok(expired)
    }

    fn identities_of(&self, account_id: &AccountId) -> Result<Vec<IdentityId>, StoreError> {
        Ok(self
            .accounts
            .read()
            .accounts
            .get(account_id)
            .map(|account| account.identities.clone())
            .unwrap_or_default())
    }

    fn account_of(&self, identity_id: &IdentityId) -> Result<Option<AccountId>, StoreError> {
        Ok(self.accounts.read().identity_owner.get(identity_id).copied())
    }

    fn is_admin(&self, account_id: &AccountId) -> Result<bool, StoreError> {
        Ok(self
            .accounts
            .read()
            .accounts
            .get(account_id)
            .is_some_and(|account| account.is_admin))
    }
}
