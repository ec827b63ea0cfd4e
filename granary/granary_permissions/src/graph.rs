//! Sharing graph construction.
//!
//! A grain's sharing graph is rebuilt from its non-revoked tokens on every
//! query. Chains of child tokens are coalesced into single edges running from
//! the identity that made the root share to the identity that owns the last
//! token in the chain.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use granary_core::error::StoreError;
use granary_core::id::{GrainId, IdentityId, TokenId};

use crate::model::{
    fold_assignments, Grain, MembraneRequirement, PermissionVector, Principal, RoleAssignment,
    Token, Vertex, ViewCatalog,
};
use crate::store::GrainStore;

/// A coalesced sharer-to-recipient edge.
#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    /// Where the permissions come from
    pub sharer: Principal,
    /// Attenuations along the chain, applied as successive intersections
    pub role_assignments: Vec<RoleAssignment>,
    /// Requirements of every token in the chain; the edge is live only while all hold
    pub requirements: Vec<MembraneRequirement>,
}

impl Edge {
    /// An edge that passes everything through unconditionally.
    pub fn trivial(sharer: Principal) -> Self {
        Self {
            sharer,
            role_assignments: Vec::new(),
            requirements: Vec::new(),
        }
    }

    /// Permissions this edge lets through, before any intersection with the recipient.
    pub fn permissions(&self, catalog: &ViewCatalog) -> PermissionVector {
        fold_assignments(&self.role_assignments, catalog)
    }
}

/// How a vertex relates to a loaded grain, before any graph walk.
#[derive(Clone, Debug, PartialEq)]
pub enum VertexAccess {
    /// Public grain: the owner gets everything, anyone else the default role.
    LegacyPublic { is_owner: bool },
    /// Anonymous callers may not open private grains.
    AnonymousDisallowed,
    /// Walk the graph starting from this edge; `None` means the vertex has no way in.
    Terminal(Option<Edge>),
}

/// Output of [`collect_edges`].
#[derive(Clone, Debug, PartialEq)]
pub enum CollectedEdges {
    GrainMissing,
    LegacyPublic {
        is_owner: bool,
    },
    AnonymousDisallowed,
    Edges {
        edges_by_recipient: HashMap<Principal, Vec<Edge>>,
        terminal_edge: Option<Edge>,
    },
}

/// A grain together with the edges of its sharing graph.
#[derive(Debug)]
pub struct SharingGraph {
    grain: Grain,
    owner_identities: HashSet<IdentityId>,
    tokens: HashMap<TokenId, Token>,
    edges_by_recipient: HashMap<Principal, Vec<Edge>>,
}

impl SharingGraph {
    /// Load a grain's graph from the store. Returns `None` if the grain does not exist.
    pub fn load(store: &dyn GrainStore, grain_id: &GrainId) -> Result<Option<Self>, StoreError> {
        let grain = match store.get_grain(grain_id)? {
            Some(grain) => grain,
            None => return Ok(None),
        };

        let owner_identities: HashSet<IdentityId> =
            store.identities_of(&grain.owner_account)?.into_iter().collect();

        let tokens: HashMap<TokenId, Token> = if grain.private {
            store
                .tokens_for_grain(grain_id)?
                .into_iter()
                .map(|token| (token.id.clone(), token))
                .collect()
        } else {
            HashMap::new()
        };

        let mut graph = Self {
            grain,
            owner_identities,
            tokens,
            edges_by_recipient: HashMap::new(),
        };
        graph.build_edges();

        debug!(
            "Loaded sharing graph for grain {}: {} tokens, {} recipients",
            grain_id,
            graph.tokens.len(),
            graph.edges_by_recipient.len()
        );
        Ok(Some(graph))
    }

    fn build_edges(&mut self) {
        let mut edges_by_recipient: HashMap<Principal, Vec<Edge>> = HashMap::new();

        for token in self.tokens.values() {
            let Some(recipient) = token.owner.recipient() else {
                continue;
            };
            if let Some(edge) = self.compute_edge(token) {
                edges_by_recipient
                    .entry(Principal::Identity(recipient))
                    .or_default()
                    .push(edge);
            }
        }

        // The owner's access never derives from a token.
        for identity_id in &self.owner_identities {
            edges_by_recipient.insert(
                Principal::Identity(*identity_id),
                vec![Edge::trivial(Principal::Owner)],
            );
        }

        self.edges_by_recipient = edges_by_recipient;
    }

    /// Coalesce a token's parent chain into one edge.
    ///
    /// Hops without a role assignment pass permissions through unchanged; the
    /// root token's missing assignment means the default role. Returns `None`
    /// if the chain reaches a revoked or missing parent, loops, or ends at a
    /// root token with no sharer.
    pub fn compute_edge(&self, token: &Token) -> Option<Edge> {
        let mut role_assignments = Vec::new();
        let mut requirements = Vec::new();
        let mut visited = HashSet::new();
        let mut current = token;

        loop {
            if !visited.insert(&current.id) {
                return None;
            }
            requirements.extend(current.requirements.iter().cloned());

            match &current.parent_token {
                Some(parent_id) => {
                    if let Some(assignment) = &current.role_assignment {
                        role_assignments.push(assignment.clone());
                    }
                    current = self.tokens.get(parent_id)?;
                }
                None => {
                    role_assignments.push(
                        current
                            .role_assignment
                            .clone()
                            .unwrap_or(RoleAssignment::None),
                    );
                    let sharer = current.sharer?;
                    return Some(Edge {
                        sharer: Principal::Identity(sharer),
                        role_assignments,
                        requirements,
                    });
                }
            }
        }
    }

    /// Classify a vertex against this grain and find its terminal edge.
    pub fn access_for(&self, vertex: &Vertex) -> VertexAccess {
        if !self.grain.private {
            let is_owner = match vertex {
                Vertex::Identity {
                    identity_id: Some(identity_id),
                    ..
                } => self.owner_identities.contains(identity_id),
                _ => false,
            };
            return VertexAccess::LegacyPublic { is_owner };
        }

        match vertex {
            Vertex::Identity {
                identity_id: None, ..
            } => VertexAccess::AnonymousDisallowed,
            Vertex::Identity {
                identity_id: Some(identity_id),
                ..
            } => VertexAccess::Terminal(Some(Edge::trivial(Principal::Identity(*identity_id)))),
            Vertex::Token { token_id, .. } => VertexAccess::Terminal(
                self.tokens
                    .get(token_id)
                    .and_then(|token| self.compute_edge(token)),
            ),
        }
    }

    /// Edges arriving at a node.
    pub fn edges_to(&self, recipient: &Principal) -> &[Edge] {
        self.edges_by_recipient
            .get(recipient)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn grain(&self) -> &Grain {
        &self.grain
    }

    pub fn edges_by_recipient(&self) -> &HashMap<Principal, Vec<Edge>> {
        &self.edges_by_recipient
    }

    pub fn is_owner_identity(&self, identity_id: &IdentityId) -> bool {
        self.owner_identities.contains(identity_id)
    }
}

/// Build the sharing graph for the vertex's grain and find the vertex's terminal edge.
pub fn collect_edges(
    store: &dyn GrainStore,
    vertex: &Vertex,
) -> Result<CollectedEdges, StoreError> {
    let graph = match SharingGraph::load(store, &vertex.grain_id())? {
        Some(graph) => graph,
        None => return Ok(CollectedEdges::GrainMissing),
    };

    Ok(match graph.access_for(vertex) {
        VertexAccess::LegacyPublic { is_owner } => CollectedEdges::LegacyPublic { is_owner },
        VertexAccess::AnonymousDisallowed => CollectedEdges::AnonymousDisallowed,
        VertexAccess::Terminal(terminal_edge) => CollectedEdges::Edges {
            edges_by_recipient: graph.edges_by_recipient,
            terminal_edge,
        },
    })
}
