//! Permission propagation and reachability.
//!
//! Both questions are answered by walking a grain's sharing graph backwards
//! from the queried vertex toward the grain owner. Edges whose membrane
//! requirements do not currently hold are ignored; requirements that depend on
//! permissions elsewhere are resolved together in one fixpoint per call.
//!
//! Nothing is cached between calls: every query reads the store afresh.

mod context;
mod propagation;
mod reachability;

use granary_core::error::StoreError;

use crate::model::{PermissionVector, Vertex, ViewCatalog};
use crate::store::GrainStore;

use context::Context;

/// Compute the permissions `vertex` effectively holds on its grain.
///
/// Returns `None` when the vertex cannot open the grain at all: the grain is
/// missing, the caller is anonymous on a private grain, or no live chain of
/// shares connects the vertex to the owner. The vector is indexed by
/// `catalog`, normally the grain's current one.
///
/// # Arguments
///
/// * `store` - The store to read grains and tokens from.
/// * `vertex` - The identity or token being asked about.
/// * `catalog` - The permission catalog to resolve roles against.
pub fn grain_permissions(
    store: &dyn GrainStore,
    vertex: &Vertex,
    catalog: &ViewCatalog,
) -> Result<Option<PermissionVector>, StoreError> {
    let mut context = Context::new(store);
    context.solve(|context| context.permissions_for(vertex, Some(catalog)))
}

/// Whether `vertex` may open its grain at all.
///
/// Cheaper than [`grain_permissions`]: a breadth-first search that stops as
/// soon as the owner is reached. Public grains are open to everyone.
pub fn may_open_grain(store: &dyn GrainStore, vertex: &Vertex) -> Result<bool, StoreError> {
    let mut context = Context::new(store);
    context.solve(|context| context.reaches_owner(vertex))
}
