//! Persisted record of a successful manual registration
//!
//! Written once after a manual run for the operator's reference; nothing
//! reads it back.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    pub token_contract: String,
    pub token_id: String,
    pub asset_id: String,
    pub parent_asset: String,
    pub license_token: String,
    pub metadata_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_uri: Option<String>,
}

impl RegistrationRecord {
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Registration record saved to {}", path.display());
        Ok(())
    }
}
