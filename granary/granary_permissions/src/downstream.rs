//! Downstream token enumeration.
//!
//! Lists every token that derives, directly or transitively, from a given
//! share: what would stop working if that share were revoked. This is a
//! forward walk with no permission arithmetic.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use granary_core::error::StoreError;
use granary_core::id::{GrainId, IdentityId, TokenId};

use crate::model::Token;
use crate::store::GrainStore;

/// Where a downstream walk starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownstreamRoot {
    /// Everything derived from one token.
    Token { token_id: TokenId, grain_id: GrainId },
    /// Everything an identity has shared of a grain.
    Grain {
        grain_id: GrainId,
        identity_id: IdentityId,
    },
}

impl DownstreamRoot {
    pub fn grain_id(&self) -> GrainId {
        match self {
            Self::Token { grain_id, .. } | Self::Grain { grain_id, .. } => *grain_id,
        }
    }
}

/// Collect every non-revoked token downstream of `root`, each exactly once.
///
/// From a token, the walk follows its child tokens. From an identity, it
/// follows the root shares that identity made. Every token reached that is
/// owned by a user also leads on to that user's own root shares. A missing or
/// public grain has nothing downstream.
pub fn downstream_tokens(
    store: &dyn GrainStore,
    root: &DownstreamRoot,
) -> Result<Vec<Token>, StoreError> {
    let grain_id = root.grain_id();
    match store.get_grain(&grain_id)? {
        Some(grain) if grain.private => {}
        _ => return Ok(Vec::new()),
    }

    let mut tokens_by_parent: HashMap<TokenId, Vec<Token>> = HashMap::new();
    let mut tokens_by_sharer: HashMap<IdentityId, Vec<Token>> = HashMap::new();

    for token in store.tokens_for_grain(&grain_id)? {
        if let Some(parent) = &token.parent_token {
            tokens_by_parent
                .entry(parent.clone())
                .or_default()
                .push(token);
        } else if let Some(sharer) = token.sharer {
            tokens_by_sharer.entry(sharer).or_default().push(token);
        }
    }

    let mut stack: Vec<Token> = Vec::new();
    let mut stacked: HashSet<TokenId> = HashSet::new();
    let mut push_all = |tokens: Option<&Vec<Token>>, stack: &mut Vec<Token>| {
        for token in tokens.into_iter().flatten() {
            if stacked.insert(token.id.clone()) {
                stack.push(token.clone());
            }
        }
    };

    match root {
        DownstreamRoot::Token { token_id, .. } => {
            push_all(tokens_by_parent.get(token_id), &mut stack)
        }
        DownstreamRoot::Grain { identity_id, .. } => {
            push_all(tokens_by_sharer.get(identity_id), &mut stack)
        }
    }

    let mut result = Vec::new();
    while let Some(token) = stack.pop() {
        push_all(tokens_by_parent.get(&token.id), &mut stack);
        if let Some(recipient) = token.owner.recipient() {
            push_all(tokens_by_sharer.get(&recipient), &mut stack);
        }
        result.push(token);
    }

    Ok(result)
}
