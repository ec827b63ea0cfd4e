//! # Granary Core
//!
//! `granary_core` provides the building blocks shared by every Granary crate:
//! identifiers, the error hierarchy, configuration and logging utilities.
//!
//! ## Crate Structure
//!
//! - **id**: Strongly-typed identifiers for grains, identities, accounts and tokens
//! - **error**: Error types for the store, the token issuer and requirement checks
//! - **config**: Engine configuration loaded from TOML
//! - **logging**: Log levels and their mapping onto `tracing`

pub mod config;
pub mod error;
pub mod id;
pub mod logging;

pub use config::EngineConfig;
pub use error::{ConfigError, Error, IssueError, Result, RevokedError, StoreError};
pub use id::{AccountId, GrainId, IdentityId, TokenId};
pub use logging::LogLevel;
