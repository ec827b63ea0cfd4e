//! Data model for grains, tokens and permissions.

pub mod catalog;
pub mod grain;
pub mod role;
pub mod token;
pub mod vector;
pub mod vertex;

pub use catalog::{PermissionDef, RoleDef, ViewCatalog};
pub use grain::{Account, Grain};
pub use role::{fold_assignments, resolve_role, RoleAssignment};
pub use token::{MembraneRequirement, OwnerDescriptor, PermissionHolder, Token};
pub use vector::PermissionVector;
pub use vertex::{Principal, Vertex};
