//! # Granary Permissions
//!
//! This crate implements Granary's capability-sharing authorization engine.
//! Every grain has an owner; access spreads outward as users share tokens
//! with each other, each share optionally narrowing what it grants and
//! optionally carrying membrane requirements that must keep holding.
//!
//! The engine never materializes anyone's permissions. Each query walks the
//! grain's sharing graph backwards from the asking vertex toward the owner,
//! so revoking a share takes effect on the very next query.
//!
//! ## Core Components
//!
//! - **Model**: Permission vectors, view catalogs, role assignments, tokens and vertices
//! - **Store**: The queryable record of grains, accounts and tokens
//! - **Graph**: Coalesces token chains into edges between principals
//! - **Engine**: Permission propagation and owner reachability
//! - **Downstream**: Lists the tokens derived from a share
//! - **Requirements**: Exercise-time validation of membrane requirements
//! - **Issuer**: Creates, updates and expires tokens
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use granary_permissions::issuer::{NewOwner, Provider};
//! use granary_permissions::model::{Account, Grain, RoleAssignment, RoleDef, Vertex, ViewCatalog};
//! use granary_permissions::store::InMemoryGrainStore;
//! use granary_permissions::PermissionEngine;
//!
//! // Create a store with one account owning one grain
//! let store = Arc::new(InMemoryGrainStore::new());
//! let alice = Account::with_identity();
//! store.insert_account(alice.clone());
//! let catalog = ViewCatalog::new(
//!     ["read", "write"],
//!     vec![RoleDef::new(vec![true, false]).as_default()],
//! );
//! let grain_id = store.insert_grain(Grain::new(alice.id, catalog));
//!
//! // Share a read-only webkey
//! let engine = PermissionEngine::new(store);
//! let provider = Provider::Identity {
//!     identity_id: alice.identities[0],
//!     account_id: alice.id,
//! };
//! let webkey = engine
//!     .create_token(
//!         &provider,
//!         &grain_id,
//!         "read only",
//!         RoleAssignment::None,
//!         NewOwner::Webkey { for_sharing: false, expires_if_unused: None },
//!     )
//!     .unwrap();
//!
//! // Ask what the webkey grants
//! let permissions = engine
//!     .grain_permissions(&Vertex::token(grain_id, webkey.id))
//!     .unwrap();
//! assert_eq!(permissions.map(|p| p.bits().to_vec()), Some(vec![true, false]));
//! ```

pub mod downstream;
pub mod engine;
pub mod graph;
pub mod issuer;
pub mod model;
pub mod requirements;
pub mod service;
pub mod store;

// Re-export commonly used types
pub use model::{
    Account, Grain, MembraneRequirement, OwnerDescriptor, PermissionHolder, PermissionVector,
    Principal, RoleAssignment, RoleDef, Token, Vertex, ViewCatalog,
};

pub use downstream::{downstream_tokens, DownstreamRoot};
pub use engine::{grain_permissions, may_open_grain};
pub use graph::{collect_edges, CollectedEdges, Edge, SharingGraph};
pub use issuer::{
    cleanup_self_destructing, create_new_api_token, record_token_use, update_api_token, NewOwner,
    NewToken, Provider, TokenUpdate,
};
pub use requirements::check_requirements;
pub use service::PermissionEngine;
pub use store::{GrainStore, InMemoryGrainStore, StoreSnapshot};
