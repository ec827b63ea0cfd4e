use std::collections::hash_map::Entry;
use std::collections::HashMap;

use granary_core::error::StoreError;

use super::context::Context;
use crate::graph::VertexAccess;
use crate::model::{PermissionVector, Principal, Vertex, ViewCatalog};

impl Context<'_> {
    /// Permissions the grain owner effectively grants `vertex`, under the
    /// current requirement values.
    ///
    /// Walks the graph backwards from the vertex. Each node's vector only
    /// grows and a node is revisited only when its vector grows, so the walk
    /// is bounded by edges times permission bits rather than by the number of
    /// paths. `catalog` defaults to the grain's stored one.
    pub(crate) fn permissions_for(
        &mut self,
        vertex: &Vertex,
        catalog: Option<&ViewCatalog>,
    ) -> Result<Option<PermissionVector>, StoreError> {
        let Some(graph) = self.graph(&vertex.grain_id())? else {
            return Ok(None);
        };
        let catalog = catalog.unwrap_or(&graph.grain().view_catalog);

        let terminal = match graph.access_for(vertex) {
            VertexAccess::LegacyPublic { is_owner: true } => return Ok(Some(catalog.all_access())),
            VertexAccess::LegacyPublic { is_owner: false } => {
                return Ok(Some(catalog.default_permissions()))
            }
            VertexAccess::AnonymousDisallowed | VertexAccess::Terminal(None) => return Ok(None),
            VertexAccess::Terminal(Some(edge)) => edge,
        };

        if !self.requirements_hold(&terminal.requirements)? {
            return Ok(None);
        }

        let mut permissions_of: HashMap<Principal, PermissionVector> = HashMap::new();
        permissions_of.insert(terminal.sharer, terminal.permissions(catalog));
        let mut worklist = vec![terminal.sharer];

        while let Some(recipient) = worklist.pop() {
            let held = permissions_of
                .get(&recipient)
                .cloned()
                .unwrap_or_default();

            for edge in graph.edges_to(&recipient) {
                if !self.requirements_hold(&edge.requirements)? {
                    continue;
                }

                let (mut delta, _) = edge.permissions(catalog).intersect(&held);
                // Bits the owner already grants need no further propagation.
                if let Some(owner) = permissions_of.get(&Principal::Owner) {
                    delta.subtract(owner);
                }

                match permissions_of.entry(edge.sharer) {
                    Entry::Vacant(slot) => {
                        slot.insert(delta);
                        worklist.push(edge.sharer);
                    }
                    Entry::Occupied(mut slot) => {
                        if slot.get_mut().union_with(&delta) {
                            worklist.push(edge.sharer);
                        }
                    }
                }
            }
        }

        Ok(permissions_of
            .remove(&Principal::Owner)
            .map(|permissions| permissions.resized(catalog.permission_count())))
    }
}
