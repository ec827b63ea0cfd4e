mod in_memory;
mod snapshot;

use chrono::{DateTime, Utc};

use granary_core::error::StoreError;
use granary_core::id::{AccountId, GrainId, IdentityId, TokenId};

use crate::model::{Grain, MembraneRequirement, Token};

/// The queryable store of grain, account and token records the engine reads from.
///
/// The engine only ever reads through this trait while answering permission
/// queries; the token issuer is the sole writer.
pub trait GrainStore: Send + Sync {
    /// Get a grain by ID, or `None` if it does not exist
    fn get_grain(&self, grain_id: &GrainId) -> Result<Option<Grain>, StoreError>;

    /// List every non-revoked token on a grain
    fn tokens_for_grain(&self, grain_id: &GrainId) -> Result<Vec<Token>, StoreError>;

    /// Get a token by ID, including revoked ones
    fn get_token(&self, token_id: &TokenId) -> Result<Option<Token>, StoreError>;

    /// Insert a new token; fails if the ID is already taken
    fn insert_token(&self, token: Token) -> Result<(), StoreError>;

    /// Replace a stored token with an updated copy
    fn replace_token(&self, token: Token) -> Result<(), StoreError>;

    /// Mark a token revoked. Revoking twice is not an error.
    fn revoke_token(&self, token_id: &TokenId) -> Result<(), StoreError> {
        let mut token = self
            .get_token(token_id)?
            .ok_or_else(|| StoreError::TokenNotFound(token_id.clone()))?;
        if token.revoked {
            return Ok(());
        }
        token.revoked = true;
        self.replace_token(token)
    }

    /// Append membrane requirements to a stored token
    fn append_requirements(
        &self,
        token_id: &TokenId,
        requirements: Vec<MembraneRequirement>,
    ) -> Result<(), StoreError> {
        let mut token = self
            .get_token(token_id)?
            .ok_or_else(|| StoreError::TokenNotFound(token_id.clone()))?;
        token.requirements.extend(requirements);
        self.replace_token(token)
    }

    /// Delete a token outright, returning it if it existed
    fn remove_token(&self, token_id: &TokenId) -> Result<Option<Token>, StoreError>;

    /// Delete every token whose self-destruct deadline is before `now`
    fn remove_expired_tokens(&self, now: DateTime<Utc>) -> Result<Vec<TokenId>, StoreError>;

    /// Identities belonging to an account
    fn identities_of(&self, account_id: &AccountId) -> Result<Vec<IdentityId>, StoreError>;

    /// Account an identity belongs to
    fn account_of(&self, identity_id: &IdentityId) -> Result<Option<AccountId>, StoreError>;

    /// Whether an account is currently an administrator
    fn is_admin(&self, account_id: &AccountId) -> Result<bool, StoreError>;
}

pub use in_memory::InMemoryGrainStore;
pub use snapshot::StoreSnapshot;
