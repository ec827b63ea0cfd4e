use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::trace;

use granary_core::error::StoreError;
use granary_core::id::{AccountId, GrainId, TokenId};

use crate::graph::SharingGraph;
use crate::model::{MembraneRequirement, PermissionVector, Token, Vertex};
use crate::store::GrainStore;

/// Per-query evaluation state.
///
/// Membrane requirements can refer to permissions on other grains, whose
/// edges can carry requirements of their own, possibly looping back. The
/// context resolves all of them together as a least fixpoint: every
/// `(grain, holder)` pair a `PermissionsHeld` requirement mentions becomes a
/// goal whose permissions start out unknown (no grant), and each round
/// recomputes every goal using only edges whose requirements hold under the
/// previous round's answers. Values only grow, so the rounds stop once
/// nothing changes and no new goal appears.
///
/// Graphs, tokens and admin flags are read from the store at most once per
/// context, so a query sees one consistent snapshot.
pub(crate) struct Context<'s> {
    store: &'s dyn GrainStore,
    graphs: HashMap<GrainId, Option<Rc<SharingGraph>>>,
    tokens: HashMap<TokenId, Option<Token>>,
    admins: HashMap<AccountId, bool>,
    goals: Vec<Vertex>,
    goal_set: HashSet<Vertex>,
    known: HashMap<Vertex, PermissionVector>,
    token_validity: HashMap<TokenId, bool>,
    tokens_in_progress: HashSet<TokenId>,
}

impl<'s> Context<'s> {
    pub(crate) fn new(store: &'s dyn GrainStore) -> Self {
        Self {
            store,
            graphs: HashMap::new(),
            tokens: HashMap::new(),
            admins: HashMap::new(),
            goals: Vec::new(),
            goal_set: HashSet::new(),
            known: HashMap::new(),
            token_validity: HashMap::new(),
            tokens_in_progress: HashSet::new(),
        }
    }

    /// Run `query` to a fixpoint.
    ///
    /// The query is re-run each round against the current goal values and
    /// its last answer is returned once the goals are stable.
    pub(crate) fn solve<T>(
        &mut self,
        mut query: impl FnMut(&mut Self) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut round = 0usize;
        loop {
            round += 1;
            let goal_count = self.goals.len();
            let changed = self.refresh_goals()?;
            let answer = query(self)?;

            if !changed && self.goals.len() == goal_count {
                trace!(
                    "Requirement fixpoint reached after {} rounds over {} goals",
                    round,
                    self.goals.len()
                );
                return Ok(answer);
            }
        }
    }

    /// Recompute every goal once, growing the known values. Returns whether anything grew.
    fn refresh_goals(&mut self) -> Result<bool, StoreError> {
        let mut changed = false;
        let mut index = 0;

        // Goals discovered during this pass are evaluated in the same pass.
        while index < self.goals.len() {
            let goal = self.goals[index].clone();
            index += 1;

            let Some(value) = self.permissions_for(&goal, None)? else {
                continue;
            };

            let grew = match self.known.get_mut(&goal) {
                Some(held) => held.union_with(&value),
                None => {
                    self.known.insert(goal, value);
                    true
                }
            };
            if grew {
                self.token_validity.clear();
                changed = true;
            }
        }

        Ok(changed)
    }

    fn add_goal(&mut self, vertex: &Vertex) {
        if self.goal_set.insert(vertex.clone()) {
            self.goals.push(vertex.clone());
        }
    }

    /// The sharing graph for a grain, loaded once per context.
    pub(super) fn graph(
        &mut self,
        grain_id: &GrainId,
    ) -> Result<Option<Rc<SharingGraph>>, StoreError> {
        if let Some(graph) = self.graphs.get(grain_id) {
            return Ok(graph.clone());
        }
        let graph = SharingGraph::load(self.store, grain_id)?.map(Rc::new);
        self.graphs.insert(*grain_id, graph.clone());
        Ok(graph)
    }

    fn token(&mut self, token_id: &TokenId) -> Result<Option<Token>, StoreError> {
        if let Some(token) = self.tokens.get(token_id) {
            return Ok(token.clone());
        }
        let token = self.store.get_token(token_id)?;
        self.tokens.insert(token_id.clone(), token.clone());
        Ok(token)
    }

    fn is_admin(&mut self, account_id: &AccountId) -> Result<bool, StoreError> {
        if let Some(is_admin) = self.admins.get(account_id) {
            return Ok(*is_admin);
        }
        let is_admin = self.store.is_admin(account_id)?;
        self.admins.insert(*account_id, is_admin);
        Ok(is_admin)
    }

    /// Whether every requirement holds under the current goal values.
    pub(super) fn requirements_hold(
        &mut self,
        requirements: &[MembraneRequirement],
    ) -> Result<bool, StoreError> {
        for requirement in requirements {
            if !self.requirement_holds(requirement)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn requirement_holds(&mut self, requirement: &MembraneRequirement) -> Result<bool, StoreError> {
        match requirement {
            MembraneRequirement::TokenValid { token_id } => self.token_valid(token_id),
            MembraneRequirement::PermissionsHeld {
                grain_id,
                holder,
                permissions,
            } => {
                let vertex = holder.vertex(*grain_id);
                self.add_goal(&vertex);
                Ok(self
                    .known
                    .get(&vertex)
                    .is_some_and(|held| permissions.is_subset_of(held)))
            }
            MembraneRequirement::UserIsAdmin { account_id } => self.is_admin(account_id),
        }
    }

    /// A token is valid if it exists, is not revoked, its requirements hold
    /// and its parent is valid. A token whose validity depends on itself is invalid.
    fn token_valid(&mut self, token_id: &TokenId) -> Result<bool, StoreError> {
        if let Some(valid) = self.token_validity.get(token_id) {
            return Ok(*valid);
        }
        if !self.tokens_in_progress.insert(token_id.clone()) {
            return Ok(false);
        }

        let valid = self.evaluate_token(token_id);
        self.tokens_in_progress.remove(token_id);
        let valid = valid?;

        self.token_validity.insert(token_id.clone(), valid);
        Ok(valid)
    }

    fn evaluate_token(&mut self, token_id: &TokenId) -> Result<bool, StoreError> {
        let token = match self.token(token_id)? {
            Some(token) if !token.revoked => token,
            _ => return Ok(false),
        };

        if !self.requirements_hold(&token.requirements)? {
            return Ok(false);
        }

        match &token.parent_token {
            Some(parent) => self.token_valid(parent),
            None => Ok(true),
        }
    }
}
