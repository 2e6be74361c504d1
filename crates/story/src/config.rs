//! Configuration types for the Story Protocol gateway

use serde::{Deserialize, Serialize};

/// Configuration for the Story Protocol gateway
///
/// All contract addresses are configuration, never hard-coded: the gateway
/// refuses to start with a missing or malformed address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryConfig {
    /// RPC URL for the Story testnet node
    pub rpc_url: String,

    /// Chain ID of the target network
    pub chain_id: u64,

    /// Private key for signing transactions (optional for read-only use)
    /// Format: 0x-prefixed hex string (66 chars)
    pub private_key: Option<String>,

    /// IP Asset Registry contract address
    pub ip_asset_registry: String,

    /// Licensing Module contract address
    pub licensing_module: String,

    /// PIL License Template contract address
    pub pil_template: String,

    /// Royalty policy contract referenced in license terms
    pub royalty_policy: String,

    /// Currency token used for license fees
    pub currency_token: String,

    /// How long to wait for a transaction receipt before giving up (seconds)
    pub confirmation_timeout_secs: u64,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 1315, // Story Aeneid testnet
            private_key: None,
            ip_asset_registry: String::new(),
            licensing_module: String::new(),
            pil_template: String::new(),
            royalty_policy: String::new(),
            currency_token: String::new(),
            confirmation_timeout_secs: 120,
        }
    }
}

fn validate_address(name: &str, value: &str) -> Result<(), String> {
    if value.is_empty() {
        return Err(format!("{} cannot be empty", name));
    }
    if !value.starts_with("0x") {
        return Err(format!("{} must start with 0x", name));
    }
    if value.len() != 42 {
        return Err(format!(
            "{} must be 42 characters (0x + 40 hex), got {}",
            name,
            value.len()
        ));
    }
    if !value[2..].chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("{} must contain only hex characters after 0x", name));
    }
    Ok(())
}

impl StoryConfig {
    /// Validate configuration
    ///
    /// Returns `Ok(())` if valid, otherwise an error message
    pub fn validate(&self) -> Result<(), String> {
        if self.rpc_url.is_empty() {
            return Err("rpc_url cannot be empty".to_string());
        }
        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err("rpc_url must start with http:// or https://".to_string());
        }

        validate_address("ip_asset_registry", &self.ip_asset_registry)?;
        validate_address("licensing_module", &self.licensing_module)?;
        validate_address("pil_template", &self.pil_template)?;
        validate_address("royalty_policy", &self.royalty_policy)?;
        validate_address("currency_token", &self.currency_token)?;

        if let Some(ref pk) = self.private_key {
            if !pk.is_empty() {
                if !pk.starts_with("0x") {
                    return Err("private_key must start with 0x".to_string());
                }
                if pk.len() != 66 {
                    return Err(format!(
                        "private_key must be 66 characters (0x + 64 hex), got {}",
                        pk.len()
                    ));
                }
                if !pk[2..].chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err("private_key must contain only hex characters after 0x".to_string());
                }
            }
        }

        if self.confirmation_timeout_secs == 0 {
            return Err("confirmation_timeout_secs must be > 0".to_string());
        }
        if self.confirmation_timeout_secs > 3600 {
            return Err("confirmation_timeout_secs too large (max 1 hour)".to_string());
        }

        Ok(())
    }

    /// Check if configuration supports write operations (has private key)
    pub fn can_write(&self) -> bool {
        self.private_key.as_ref().is_some_and(|pk| !pk.is_empty())
    }
}
