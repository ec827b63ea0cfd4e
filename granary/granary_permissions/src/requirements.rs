//! Exercise-time validation of membrane requirements.
//!
//! Called whenever a capability derived from a token is about to be used.
//! Upstream changes (a revoked parent, a lost permission, a demoted admin)
//! surface here as a [`RevokedError`] rather than being pushed eagerly to
//! every dependent token.

use std::collections::HashSet;

use tracing::warn;

use granary_core::error::RevokedError;
use granary_core::id::TokenId;

use crate::engine::grain_permissions;
use crate::model::MembraneRequirement;
use crate::store::GrainStore;

/// Check that every requirement still holds.
///
/// Succeeds silently, or fails with the first condition that no longer holds.
///
/// # Arguments
///
/// * `store` - The store to read tokens, grains and accounts from.
/// * `requirements` - The conditions to check, in order.
pub fn check_requirements(
    store: &dyn GrainStore,
    requirements: &[MembraneRequirement],
) -> Result<(), RevokedError> {
    let mut checking = HashSet::new();
    check_all(store, requirements, &mut checking)
}

fn check_all(
    store: &dyn GrainStore,
    requirements: &[MembraneRequirement],
    checking: &mut HashSet<TokenId>,
) -> Result<(), RevokedError> {
    for requirement in requirements {
        if let Err(error) = check_one(store, requirement, checking) {
            warn!("Membrane requirement failed: {}", error);
            return Err(error);
        }
    }
    Ok(())
}

fn check_one(
    store: &dyn GrainStore,
    requirement: &MembraneRequirement,
    checking: &mut HashSet<TokenId>,
) -> Result<(), RevokedError> {
    match requirement {
        MembraneRequirement::TokenValid { token_id } => check_token(store, token_id, checking),
        MembraneRequirement::PermissionsHeld {
            grain_id,
            holder,
            permissions,
        } => {
            let lost = || RevokedError::PermissionsLost {
                grain_id: *grain_id,
                holder: holder.to_string(),
            };

            let grain = store.get_grain(grain_id)?.ok_or_else(lost)?;
            let held = grain_permissions(store, &holder.vertex(*grain_id), &grain.view_catalog)?
                .ok_or_else(lost)?;

            if permissions.is_subset_of(&held) {
                Ok(())
            } else {
                Err(lost())
            }
        }
        MembraneRequirement::UserIsAdmin { account_id } => {
            if store.is_admin(account_id)? {
                Ok(())
            } else {
                Err(RevokedError::NotAdmin(*account_id))
            }
        }
    }
}

/// A token is valid while it exists unrevoked, its own requirements hold, and
/// its parent is valid.
fn check_token(
    store: &dyn GrainStore,
    token_id: &TokenId,
    checking: &mut HashSet<TokenId>,
) -> Result<(), RevokedError> {
    let invalid = || RevokedError::TokenInvalid(token_id.clone());

    // A token whose validity depends on itself can never be valid.
    if !checking.insert(token_id.clone()) {
        return Err(invalid());
    }

    let token = match store.get_token(token_id)? {
        Some(token) if !token.revoked => token,
        _ => return Err(invalid()),
    };

    check_all(store, &token.requirements, checking).map_err(|error| match error {
        RevokedError::Store(store_error) => RevokedError::Store(store_error),
        _ => invalid(),
    })?;

    if let Some(parent) = &token.parent_token {
        check_token(store, parent, checking).map_err(|error| match error {
            RevokedError::Store(store_error) => RevokedError::Store(store_error),
            _ => invalid(),
        })?;
    }

    checking.remove(token_id);
    Ok(())
}
