//! Store administration commands
//!
//! Accounts and grains are created outside the sharing model; these commands
//! exist so a snapshot can be populated from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::json;

use granary_core::id::AccountId;
use granary_permissions::model::{Account, Grain, ViewCatalog};

use super::{print_json, read_json};
use crate::workspace::Workspace;

/// Arguments for the add-account command
#[derive(Args)]
pub struct AddAccountArgs {
    /// Make the account an administrator
    #[clap(long)]
    pub admin: bool,
}

/// Arguments for the add-grain command
#[derive(Args)]
pub struct AddGrainArgs {
    /// Owning account
    #[clap(long)]
    pub owner: AccountId,

    /// JSON file holding the grain's view catalog
    #[clap(long)]
    pub catalog: Option<PathBuf>,

    /// Create a legacy public grain
    #[clap(long)]
    pub public: bool,
}

/// Arguments for the set-admin command
#[derive(Args)]
pub struct SetAdminArgs {
    #[clap(long)]
    pub account: AccountId,

    /// Remove administrator status instead of granting it
    #[clap(long)]
    pub revoke: bool,
}

pub fn execute_add_account(workspace: &Workspace, args: &AddAccountArgs) -> Result<()> {
    let mut account = Account::with_identity();
    account.is_admin = args.admin;
    workspace.store().insert_account(account.clone());
    workspace.save()?;
    print_json(&account)
}

pub fn execute_add_grain(workspace: &Workspace, args: &AddGrainArgs) -> Result<()> {
    let catalog: ViewCatalog = match &args.catalog {
        Some(path) => read_json(path)?,
        None => ViewCatalog::default(),
    };

    let mut grain = Grain::new(args.owner, catalog);
    grain.private = !args.public;
    let grain_id = workspace.store().insert_grain(grain);
    workspace.save()?;
    print_json(&json!({ "grain_id": grain_id }))
}

pub fn execute_set_admin(workspace: &Workspace, args: &SetAdminArgs) -> Result<()> {
    workspace
        .store()
        .set_admin(&args.account, !args.revoke)
        .context("Failed to change administrator status")?;
    workspace.save()?;
    print_json(&json!({ "account": args.account, "is_admin": !args.revoke }))
}
