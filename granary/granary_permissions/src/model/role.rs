//! Role assignments and their resolution against a catalog.

use serde::{Deserialize, Serialize};

use super::catalog::ViewCatalog;
use super::vector::PermissionVector;

/// The attenuation chosen when sharing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleAssignment {
    /// The grain's default role.
    None,
    /// Every permission the catalog declares.
    AllAccess,
    /// A specific role, optionally adjusted.
    Role {
        role_id: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        add_bits: Option<PermissionVector>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        remove_bits: Option<PermissionVector>,
    },
}

impl RoleAssignment {
    /// Plain role assignment with no extra bits.
    pub fn role(role_id: usize) -> Self {
        Self::Role {
            role_id,
            add_bits: None,
            remove_bits: None,
        }
    }

    /// Resolve to concrete permissions.
    ///
    /// Never fails: a role id that no longer exists in the catalog resolves
    /// to the empty vector before the extra bits are applied.
    pub fn resolve(&self, catalog: &ViewCatalog) -> PermissionVector {
        match self {
            Self::None => catalog.default_permissions(),
            Self::AllAccess => catalog.all_access(),
            Self::Role {
                role_id,
                add_bits,
                remove_bits,
            } => {
                let mut permissions = catalog
                    .role(*role_id)
                    .map(|role| role.permissions.clone())
                    .unwrap_or_default();
                if let Some(add) = add_bits {
                    permissions.union_with(add);
                }
                if let Some(remove) = remove_bits {
                    permissions.subtract(remove);
                }
                permissions
            }
        }
    }

    /// Longest extra-bit vector carried, used for shape checks.
    pub fn extra_bits_len(&self) -> usize {
        match self {
            Self::Role {
                add_bits,
                remove_bits,
                ..
            } => add_bits
                .iter()
                .chain(remove_bits.iter())
                .map(PermissionVector::len)
                .max()
                .unwrap_or(0),
            _ => 0,
        }
    }
}

/// Resolve an optional assignment; a missing one means the default role.
pub fn resolve_role(
    assignment: Option<&RoleAssignment>,
    catalog: &ViewCatalog,
) -> PermissionVector {
    assignment.unwrap_or(&RoleAssignment::None).resolve(catalog)
}

/// Intersect a sequence of assignments, starting from all access.
pub fn fold_assignments<'a>(
    assignments: impl IntoIterator<Item = &'a RoleAssignment>,
    catalog: &ViewCatalog,
) -> PermissionVector {
    let mut permissions = catalog.all_access();
    for assignment in assignments {
        permissions.intersect_with(&assignment.resolve(catalog));
    }
    permissions
}
