//! Token issuance and maintenance.
//!
//! The issuer is the only writer of the sharing graph. It performs no
//! permission computation: what a new token actually grants is worked out
//! lazily whenever it is read.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use granary_core::error::{IssueError, StoreError};
use granary_core::id::{AccountId, GrainId, IdentityId, TokenId};

use crate::model::{OwnerDescriptor, RoleAssignment, Token, ViewCatalog};
use crate::store::GrainStore;

/// Length of a bearer secret in random bytes.
const SECRET_BYTES: usize = 32;

/// Who is sharing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// A logged-in identity sharing directly.
    Identity {
        identity_id: IdentityId,
        account_id: AccountId,
    },
    /// The holder of an existing token, re-sharing it.
    ParentToken { raw_token: String },
}

/// Who the new token is for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NewOwner {
    /// A bearer webkey, optionally self-destructing if never used.
    Webkey {
        for_sharing: bool,
        expires_if_unused: Option<Duration>,
    },
    /// A specific identity.
    User { identity_id: IdentityId, title: String },
}

/// A freshly issued token.
#[derive(Clone, Debug)]
pub struct NewToken {
    /// Store id of the token
    pub id: TokenId,
    /// The bearer secret; only ever returned here
    pub token: String,
    /// The parent token, when re-sharing
    pub parent: Option<Token>,
}

/// Fields an owner may change on an existing token.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUpdate {
    #[serde(default)]
    pub petname: Option<String>,
    #[serde(default)]
    pub role_assignment: Option<RoleAssignment>,
    #[serde(default)]
    pub revoked: Option<bool>,
}

/// Store id for a bearer secret: base64 of its SHA-256.
pub fn hash_token(raw_token: &str) -> TokenId {
    TokenId::new(STANDARD.encode(Sha256::digest(raw_token.as_bytes())))
}

fn generate_secret() -> String {
    let mut bytes = [0u8; SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Reject assignments whose extra bits are longer than the catalog.
///
/// Only the shape is checked; a role id that does not exist is resolved to
/// nothing at read time.
fn check_role_shape(assignment: &RoleAssignment, catalog: &ViewCatalog) -> Result<(), IssueError> {
    let extra = assignment.extra_bits_len();
    if extra > catalog.permission_count() {
        return Err(IssueError::MalformedRoleAssignment(format!(
            "{} extra bits for a catalog of {} permissions",
            extra,
            catalog.permission_count()
        )));
    }
    Ok(())
}

/// Create and store a new token.
///
/// # Arguments
///
/// * `store` - The store to write to.
/// * `provider` - The sharing identity, or the secret of the token being re-shared.
/// * `grain_id` - The grain being shared.
/// * `petname` - A label for the sharer's own reference.
/// * `role_assignment` - How the new token attenuates the provider's access.
/// * `owner` - Who may present the new token.
///
/// # Returns
///
/// The new token's id and bearer secret.
pub fn create_new_api_token(
    store: &dyn GrainStore,
    provider: &Provider,
    grain_id: &GrainId,
    petname: &str,
    role_assignment: RoleAssignment,
    owner: NewOwner,
) -> Result<NewToken, IssueError> {
    let grain = store
        .get_grain(grain_id)?
        .ok_or(IssueError::GrainNotFound(*grain_id))?;
    check_role_shape(&role_assignment, &grain.view_catalog)?;

    let secret = generate_secret();
    let mut token = Token::new(
        hash_token(&secret),
        *grain_id,
        OwnerDescriptor::Webkey { for_sharing: false },
    );
    token.petname = petname.to_string();
    token.role_assignment = Some(role_assignment);

    let mut parent_for_sharing = false;
    let parent = match provider {
        Provider::ParentToken { raw_token } => {
            let parent = store
                .get_token(&hash_token(raw_token))?
                .filter(|parent| parent.grain_id == *grain_id && !parent.revoked)
                .ok_or(IssueError::ParentTokenNotFound(*grain_id))?;

            parent_for_sharing = parent.for_sharing();
            token.sharer = parent.sharer;
            token.sharer_account = parent.sharer_account;
            token.parent_token = Some(parent.id.clone());
            Some(parent)
        }
        Provider::Identity {
            identity_id,
            account_id,
        } => {
            if store.account_of(identity_id)? != Some(*account_id) {
                return Err(IssueError::NotAuthorized(format!(
                    "Identity {} does not belong to account {}",
                    identity_id, account_id
                )));
            }
            token.sharer = Some(*identity_id);
            token.sharer_account = Some(*account_id);
            None
        }
    };

    token.owner = match owner {
        NewOwner::Webkey {
            for_sharing,
            expires_if_unused,
        } => {
            token.expires_if_unused = expires_if_unused.map(|lifetime| token.created + lifetime);
            OwnerDescriptor::Webkey {
                for_sharing: parent_for_sharing || for_sharing,
            }
        }
        NewOwner::User { identity_id, title } => OwnerDescriptor::User { identity_id, title },
    };

    let id = token.id.clone();
    store.insert_token(token)?;
    info!("Issued token {} for grain {}", id, grain_id);

    Ok(NewToken {
        id,
        token: secret,
        parent,
    })
}

/// Change a token's petname, role assignment or revocation flag.
///
/// Only the account recorded as the token's sharer may modify it.
pub fn update_api_token(
    store: &dyn GrainStore,
    account_id: &AccountId,
    token_id: &TokenId,
    update: TokenUpdate,
) -> Result<Token, IssueError> {
    let mut token = store
        .get_token(token_id)?
        .ok_or_else(|| StoreError::TokenNotFound(token_id.clone()))?;

    if token.sharer_account != Some(*account_id) {
        return Err(IssueError::NotAuthorized(format!(
            "Account {} may not modify token {}",
            account_id, token_id
        )));
    }

    if let Some(assignment) = &update.role_assignment {
        if let Some(grain) = store.get_grain(&token.grain_id)? {
            check_role_shape(assignment, &grain.view_catalog)?;
        }
    }

    if let Some(petname) = update.petname {
        token.petname = petname;
    }
    if let Some(assignment) = update.role_assignment {
        token.role_assignment = Some(assignment);
    }
    if let Some(revoked) = update.revoked {
        token.revoked = revoked;
    }

    store.replace_token(token.clone())?;
    info!("Account {} updated token {}", account_id, token_id);
    Ok(token)
}

/// Note that a token is being used.
///
/// A self-destructing token past its deadline is refused; otherwise its
/// deadline is cleared, since it is no longer unused.
pub fn record_token_use(
    store: &dyn GrainStore,
    token_id: &TokenId,
    now: DateTime<Utc>,
) -> Result<Token, IssueError> {
    let mut token = store
        .get_token(token_id)?
        .ok_or_else(|| StoreError::TokenNotFound(token_id.clone()))?;

    if token.is_expired_at(now) {
        return Err(IssueError::Expired(token_id.clone()));
    }

    if token.expires_if_unused.take().is_some() {
        store.replace_token(token.clone())?;
        debug!("Token {} used; self-destruct cleared", token_id);
    }
    Ok(token)
}

/// Delete self-destructing tokens whose deadline passed unused.
pub fn cleanup_self_destructing(
    store: &dyn GrainStore,
    now: DateTime<Utc>,
) -> Result<usize, StoreError> {
    let removed = store.remove_expired_tokens(now)?;
    if !removed.is_empty() {
        info!("Removed {} expired self-destructing tokens", removed.len());
    }
    Ok(removed.len())
}
