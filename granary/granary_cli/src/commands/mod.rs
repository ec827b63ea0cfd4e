//! Command implementations
//!
//! Every command prints its result to stdout as JSON.

pub mod admin;
pub mod query;
pub mod share;

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use serde::de::DeserializeOwned;
use serde::Serialize;

use granary_core::id::{GrainId, IdentityId, TokenId};
use granary_permissions::model::{RoleAssignment, Vertex};

/// Who is asking about a grain
#[derive(Args, Clone, Debug)]
pub struct VertexArgs {
    /// Grain being asked about
    #[clap(long)]
    pub grain: GrainId,

    /// Identity asking; omit both this and --token for an anonymous caller
    #[clap(long, conflicts_with = "token")]
    pub identity: Option<IdentityId>,

    /// Hashed id of the token asking
    #[clap(long)]
    pub token: Option<TokenId>,
}

impl VertexArgs {
    pub fn vertex(&self) -> Vertex {
        match (&self.identity, &self.token) {
            (_, Some(token)) => Vertex::token(self.grain, token.clone()),
            (Some(identity), None) => Vertex::identity(self.grain, *identity),
            (None, None) => Vertex::anonymous(self.grain),
        }
    }
}

/// Parse a role assignment: `none`, `all`, a role number, or JSON.
pub fn parse_role(value: &str) -> Result<RoleAssignment, String> {
    match value {
        "none" | "default" => Ok(RoleAssignment::None),
        "all" | "all_access" => Ok(RoleAssignment::AllAccess),
        _ => match value.parse::<usize>() {
            Ok(role_id) => Ok(RoleAssignment::role(role_id)),
            Err(_) => serde_json::from_str(value)
                .map_err(|e| format!("Invalid role assignment '{}': {}", value, e)),
        },
    }
}

/// Read a JSON document from a file
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
