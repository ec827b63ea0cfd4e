use serde::{Deserialize, Serialize};

use super::vector::PermissionVector;

/// One permission a grain's app declares.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionDef {
    /// Machine name of the permission
    pub name: String,
    #[serde(default)]
    pub obsolete: bool,
}

/// A named bundle of permissions offered when sharing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDef {
    #[serde(default)]
    pub title: Option<String>,
    /// Permissions granted by this role
    pub permissions: PermissionVector,
    /// Role used when a share names no role
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub obsolete: bool,
}

impl RoleDef {
    pub fn new(permissions: Vec<bool>) -> Self {
        Self {
            title: None,
            permissions: PermissionVector::new(permissions),
            default: false,
            obsolete: false,
        }
    }

    pub fn as_default(mut self) -> Self {
        self.default = true;
        self
    }
}

/// A grain's permission and role catalog.
///
/// Cached on the grain record and immutable for a given app version. At most
/// one role should be marked default; if several are, the first one wins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCatalog {
    #[serde(default)]
    pub permissions: Vec<PermissionDef>,
    #[serde(default)]
    pub roles: Vec<RoleDef>,
}

impl ViewCatalog {
    /// Catalog with the given permission names and roles.
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>, roles: Vec<RoleDef>) -> Self {
        Self {
            permissions: names
                .into_iter()
                .map(|name| PermissionDef {
                    name: name.into(),
                    obsolete: false,
                })
                .collect(),
            roles,
        }
    }

    /// Number of declared permissions.
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }

    /// The all-access vector for this catalog.
    pub fn all_access(&self) -> PermissionVector {
        PermissionVector::all(self.permissions.len())
    }

    /// The role marked default, if any.
    pub fn default_role(&self) -> Option<&RoleDef> {
        self.roles.iter().find(|role| role.default)
    }

    /// Permissions of the default role, or nothing if there is none.
    pub fn default_permissions(&self) -> PermissionVector {
        self.default_role()
            .map(|role| role.permissions.clone())
            .unwrap_or_default()
    }

    /// Look up a role by index.
    pub fn role(&self, role_id: usize) -> Option<&RoleDef> {
        self.roles.get(role_id)
    }

    /// Index of a permission by name.
    pub fn permission_index(&self, name: &str) -> Option<usize> {
        self.permissions.iter().position(|p| p.name == name)
    }
}
