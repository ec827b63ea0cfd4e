//! Token issuance and maintenance commands

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;

use granary_core::id::{AccountId, GrainId, IdentityId, TokenId};
use granary_permissions::issuer::{NewOwner, Provider, TokenUpdate};
use granary_permissions::model::{MembraneRequirement, RoleAssignment};

use super::{parse_role, print_json, read_json};
use crate::workspace::Workspace;

/// Arguments for the share command
#[derive(Args)]
pub struct ShareArgs {
    /// Grain to share
    #[clap(long)]
    pub grain: GrainId,

    /// Identity doing the sharing (requires --account)
    #[clap(long, requires = "account", conflicts_with = "parent_token")]
    pub identity: Option<IdentityId>,

    /// Account the sharing identity belongs to
    #[clap(long)]
    pub account: Option<AccountId>,

    /// Bearer secret of the token being re-shared
    #[clap(long)]
    pub parent_token: Option<String>,

    /// Role assignment: none, all, a role number, or JSON
    #[clap(long, default_value = "none", value_parser = parse_role)]
    pub role: RoleAssignment,

    /// Share with this identity instead of minting a webkey
    #[clap(long)]
    pub to_identity: Option<IdentityId>,

    /// Title shown to the recipient identity
    #[clap(long, default_value = "")]
    pub title: String,

    /// Let webkey holders share further
    #[clap(long, conflicts_with = "to_identity")]
    pub for_sharing: bool,

    /// Delete the webkey if it is not used within the configured lifetime
    #[clap(long, conflicts_with_all = ["for_sharing", "to_identity"])]
    pub self_destruct: bool,

    /// Label for the sharer's reference
    #[clap(long, default_value = "")]
    pub petname: String,

    /// JSON file of membrane requirements to attach
    #[clap(long)]
    pub requirements: Option<PathBuf>,
}

/// Arguments for the update command
#[derive(Args)]
pub struct UpdateArgs {
    /// Account making the change; must own the sharing identity
    #[clap(long)]
    pub account: AccountId,

    /// Hashed id of the token to change
    #[clap(long)]
    pub token_id: TokenId,

    /// New petname
    #[clap(long)]
    pub petname: Option<String>,

    /// New role assignment
    #[clap(long, value_parser = parse_role)]
    pub role: Option<RoleAssignment>,

    /// Revoke the token
    #[clap(long, conflicts_with = "restore")]
    pub revoke: bool,

    /// Undo a revocation
    #[clap(long)]
    pub restore: bool,
}

/// Arguments for the record-use command
#[derive(Args)]
pub struct RecordUseArgs {
    /// Hashed id of the token presented
    #[clap(long)]
    pub token_id: TokenId,
}

pub fn execute_share(workspace: &Workspace, args: &ShareArgs) -> Result<()> {
    let provider = match (&args.parent_token, args.identity, args.account) {
        (Some(raw_token), _, _) => Provider::ParentToken {
            raw_token: raw_token.clone(),
        },
        (None, Some(identity_id), Some(account_id)) => Provider::Identity {
            identity_id,
            account_id,
        },
        _ => bail!("Either --parent-token or --identity with --account is required"),
    };

    let requirements: Vec<MembraneRequirement> = match &args.requirements {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let engine = workspace.engine();
    let issued = match args.to_identity {
        Some(identity_id) => engine.create_token(
            &provider,
            &args.grain,
            &args.petname,
            args.role.clone(),
            NewOwner::User {
                identity_id,
                title: args.title.clone(),
            },
        ),
        None if args.self_destruct => engine.create_self_destructing_webkey(
            &provider,
            &args.grain,
            &args.petname,
            args.role.clone(),
        ),
        None => engine.create_token(
            &provider,
            &args.grain,
            &args.petname,
            args.role.clone(),
            NewOwner::Webkey {
                for_sharing: args.for_sharing,
                expires_if_unused: None,
            },
        ),
    }
    .context("Failed to issue token")?;

    if !requirements.is_empty() {
        engine
            .append_requirements(&issued.id, requirements)
            .context("Failed to attach requirements")?;
    }
    workspace.save()?;

    print_json(&json!({
        "id": issued.id,
        "token": issued.token,
        "parent": issued.parent.map(|parent| parent.id),
    }))
}

pub fn execute_update(workspace: &Workspace, args: &UpdateArgs) -> Result<()> {
    let revoked = match (args.revoke, args.restore) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    };
    let update = TokenUpdate {
        petname: args.petname.clone(),
        role_assignment: args.role.clone(),
        revoked,
    };

    let token = workspace
        .engine()
        .update_token(&args.account, &args.token_id, update)
        .context("Failed to update token")?;
    workspace.save()?;
    print_json(&token)
}

pub fn execute_record_use(workspace: &Workspace, args: &RecordUseArgs) -> Result<()> {
    let token = workspace
        .engine()
        .record_token_use(&args.token_id)
        .context("Token may not be used")?;
    workspace.save()?;
    print_json(&token)
}

pub fn execute_cleanup(workspace: &Workspace) -> Result<()> {
    let removed = workspace
        .engine()
        .cleanup_self_destructing()
        .context("Cleanup failed")?;
    workspace.save()?;
    print_json(&json!({ "removed": removed }))
}
