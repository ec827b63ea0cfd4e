//! Read-only permission queries

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use granary_core::id::{GrainId, IdentityId, TokenId};
use granary_permissions::downstream::DownstreamRoot;
use granary_permissions::model::MembraneRequirement;

use super::{print_json, read_json, VertexArgs};
use crate::workspace::Workspace;

/// Arguments for the downstream command
#[derive(Args)]
pub struct DownstreamArgs {
    /// Grain the shares belong to
    #[clap(long)]
    pub grain: GrainId,

    /// List everything this identity has shared
    #[clap(long, conflicts_with = "token", required_unless_present = "token")]
    pub identity: Option<IdentityId>,

    /// List everything derived from this token
    #[clap(long)]
    pub token: Option<TokenId>,
}

/// Arguments for the check command
#[derive(Args)]
pub struct CheckArgs {
    /// JSON file holding an array of membrane requirements
    #[clap(long)]
    pub requirements: PathBuf,
}

pub fn execute_permissions(workspace: &Workspace, args: &VertexArgs) -> Result<()> {
    let vertex = args.vertex();
    let permissions = workspace
        .engine()
        .grain_permissions(&vertex)
        .context("Permission query failed")?;

    print_json(&json!({
        "vertex": vertex.to_string(),
        "permissions": permissions.map(|p| p.bits().to_vec()),
    }))
}

pub fn execute_may_open(workspace: &Workspace, args: &VertexArgs) -> Result<()> {
    let vertex = args.vertex();
    let may_open = workspace
        .engine()
        .may_open_grain(&vertex)
        .context("Reachability query failed")?;

    print_json(&json!({
        "vertex": vertex.to_string(),
        "may_open": may_open,
    }))
}

pub fn execute_downstream(workspace: &Workspace, args: &DownstreamArgs) -> Result<()> {
    let root = match (&args.token, &args.identity) {
        (Some(token_id), _) => DownstreamRoot::Token {
            token_id: token_id.clone(),
            grain_id: args.grain,
        },
        (None, Some(identity_id)) => DownstreamRoot::Grain {
            grain_id: args.grain,
            identity_id: *identity_id,
        },
        (None, None) => anyhow::bail!("Either --identity or --token is required"),
    };

    let tokens = workspace
        .engine()
        .downstream_tokens(&root)
        .context("Downstream query failed")?;
    print_json(&tokens)
}

/// Fails when any requirement no longer holds.
pub fn execute_check(workspace: &Workspace, args: &CheckArgs) -> Result<()> {
    let requirements: Vec<MembraneRequirement> = read_json(&args.requirements)?;
    workspace
        .engine()
        .check_requirements(&requirements)
        .context("Membrane requirements do not hold")?;

    print_json(&json!({ "valid": true }))
}
