use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use granary_core::error::Error;

use crate::model::{Account, Grain, Token};

/// Every record in a store, in a form that can be written to disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub grains: Vec<Grain>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

impl StoreSnapshot {
    /// Read a JSON snapshot from disk.
    pub fn read_from(path: &Path) -> Result<Self, Error> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Write this snapshot to disk as pretty-printed JSON.
    pub fn write_to(&self, path: &Path) -> Result<(), Error> {
        let content =
            serde_json::to_string_pretty(self).map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }
}
