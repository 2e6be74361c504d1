//! Contract client holding parsed addresses and provider construction
//!
//! Providers are stateless: a new one is created for each call, read-only
//! or signing, following the validated configuration.

use crate::config::StoryConfig;
use crate::error::{ChainCallError, Result};
use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use std::str::FromStr;

/// Parsed contract addresses and connection details
pub struct ContractClient {
    /// IP Asset Registry address
    pub ip_asset_registry: Address,
    /// Licensing Module address
    pub licensing_module: Address,
    /// PIL License Template address
    pub pil_template: Address,
    /// Royalty policy referenced when registering license terms
    pub royalty_policy: Address,
    /// Currency token referenced when registering license terms
    pub currency_token: Address,
    /// Configuration the client was built from
    pub config: StoryConfig,
}

fn parse_address(name: &str, value: &str) -> Result<Address> {
    Address::from_str(value).map_err(|e| {
        ChainCallError::Configuration(format!("invalid {} address '{}': {}", name, value, e))
    })
}

impl ContractClient {
    /// Creates a new contract client from a validated configuration
    ///
    /// Fails if any contract address or the private key (when provided)
    /// does not parse.
    pub fn new(config: StoryConfig) -> Result<Self> {
        config.validate().map_err(ChainCallError::Configuration)?;

        let ip_asset_registry = parse_address("ip_asset_registry", &config.ip_asset_registry)?;
        let licensing_module = parse_address("licensing_module", &config.licensing_module)?;
        let pil_template = parse_address("pil_template", &config.pil_template)?;
        let royalty_policy = parse_address("royalty_policy", &config.royalty_policy)?;
        let currency_token = parse_address("currency_token", &config.currency_token)?;

        if let Some(ref private_key) = config.private_key {
            if !private_key.is_empty() {
                let _ = private_key.parse::<PrivateKeySigner>().map_err(|e| {
                    ChainCallError::Configuration(format!("invalid private key: {}", e))
                })?;
            }
        }

        Ok(Self {
            ip_asset_registry,
            licensing_module,
            pil_template,
            royalty_policy,
            currency_token,
            config,
        })
    }

    /// Returns the chain ID from configuration
    pub fn chain_id(&self) -> u64 {
        self.config.chain_id
    }

    /// Checks if the client has a key for signing transactions
    pub fn has_wallet(&self) -> bool {
        self.config.can_write()
    }

    /// Address of the configured signing key
    pub fn wallet_address(&self) -> Result<Address> {
        let signer = self.signer()?;
        Ok(signer.address())
    }

    fn signer(&self) -> Result<PrivateKeySigner> {
        let private_key = self
            .config
            .private_key
            .as_ref()
            .filter(|pk| !pk.is_empty())
            .ok_or(ChainCallError::NoPrivateKey)?;

        private_key
            .parse::<PrivateKeySigner>()
            .map_err(|e| ChainCallError::Wallet(format!("invalid private key: {}", e)))
    }

    /// Create a read-only provider for contract calls
    pub fn create_provider(&self) -> Result<impl Provider> {
        let rpc_url = self
            .config
            .rpc_url
            .parse()
            .map_err(|e| ChainCallError::Provider(format!("invalid RPC URL: {}", e)))?;

        Ok(ProviderBuilder::new().connect_http(rpc_url))
    }

    /// Create a provider with wallet for sending transactions
    pub fn create_provider_with_signer(&self) -> Result<impl Provider> {
        let signer = self.signer()?;
        let wallet = EthereumWallet::from(signer);

        let rpc_url = self
            .config
            .rpc_url
            .parse()
            .map_err(|e| ChainCallError::Provider(format!("invalid RPC URL: {}", e)))?;

        Ok(ProviderBuilder::new().wallet(wallet).connect_http(rpc_url))
    }
}
