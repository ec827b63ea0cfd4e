use std::collections::{HashSet, VecDeque};

use granary_core::error::StoreError;

use super::context::Context;
use crate::graph::VertexAccess;
use crate::model::{Principal, Vertex};

impl Context<'_> {
    /// Whether `vertex` reaches the grain owner over live edges.
    pub(crate) fn reaches_owner(&mut self, vertex: &Vertex) -> Result<bool, StoreError> {
        let Some(graph) = self.graph(&vertex.grain_id())? else {
            return Ok(false);
        };

        let terminal = match graph.access_for(vertex) {
            VertexAccess::LegacyPublic { .. } => return Ok(true),
            VertexAccess::AnonymousDisallowed | VertexAccess::Terminal(None) => return Ok(false),
            VertexAccess::Terminal(Some(edge)) => edge,
        };

        if !self.requirements_hold(&terminal.requirements)? {
            return Ok(false);
        }

        let mut visited = HashSet::from([terminal.sharer]);
        let mut queue = VecDeque::from([terminal.sharer]);

        while let Some(node) = queue.pop_front() {
            if node == Principal::Owner {
                return Ok(true);
            }
            for edge in graph.edges_to(&node) {
                if visited.contains(&edge.sharer) {
                    continue;
                }
                if !self.requirements_hold(&edge.requirements)? {
                    continue;
                }
                visited.insert(edge.sharer);
                queue.push_back(edge.sharer);
            }
        }

        Ok(false)
    }
}
