//! Typed wrappers over the Story Protocol registration contracts
//!
//! Every write is a two-phase call: submit, then wait for the receipt under
//! a deadline. Success is only reported once a confirmed, non-reverted
//! receipt is observed, and the three failure modes are kept distinct:
//! submission rejected, confirmed but reverted, confirmation timed out.
//! Identifiers produced by the chain are decoded from receipt logs by event
//! name, never by log position.

use crate::abi::{IIPAssetRegistry, ILicensingModule, IPILicenseTemplate};
use crate::config::StoryConfig;
use crate::contract::ContractClient;
use crate::error::{ChainCallError, Result};
use alloy::network::Ethereum;
use alloy::primitives::{Address, U256};
use alloy::providers::PendingTransactionBuilder;
use alloy::rpc::types::TransactionReceipt;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info};

/// Commercial posture of a set of license terms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseKind {
    NonCommercial,
    Commercial,
}

/// Request to register PIL license terms on the template contract
#[derive(Debug, Clone)]
pub struct LicenseTermsRequest {
    /// Fee charged when minting a license token against these terms
    pub minting_fee: U256,
    /// Commercial revenue share in parts per million (10% = 10_000_000)
    pub commercial_rev_share: u32,
    /// Royalty policy contract the terms reference
    pub royalty_policy: Address,
    /// Currency token for fee settlement
    pub currency_token: Address,
}

impl LicenseTermsRequest {
    /// Commercial remix terms: free to mint, a percentage of derivative
    /// revenue flows back to the licensor
    pub fn commercial_remix(
        rev_share_percent: u32,
        royalty_policy: Address,
        currency_token: Address,
    ) -> Self {
        Self {
            minting_fee: U256::ZERO,
            commercial_rev_share: rev_share_percent * 1_000_000,
            royalty_policy,
            currency_token,
        }
    }

    /// Non-commercial terms with no fee and no revenue share
    pub fn non_commercial(royalty_policy: Address, currency_token: Address) -> Self {
        Self {
            minting_fee: U256::ZERO,
            commercial_rev_share: 0,
            royalty_policy,
            currency_token,
        }
    }

    pub fn kind(&self) -> LicenseKind {
        if self.commercial_rev_share > 0 || self.minting_fee > U256::ZERO {
            LicenseKind::Commercial
        } else {
            LicenseKind::NonCommercial
        }
    }
}

/// Gateway operations against the IP registration contracts
///
/// Implemented by [`StoryGateway`] for the live chain and by fakes in tests.
#[async_trait]
pub trait IpGateway: Send + Sync {
    /// Register an NFT as an IP asset, returning the asset ID decoded from
    /// the `IPRegistered` event
    async fn register_asset(
        &self,
        chain_id: u64,
        token_contract: Address,
        token_id: U256,
    ) -> Result<Address>;

    /// Look up the asset ID for a token without writing anything.
    /// Idempotent: identical inputs resolve to the same ID.
    async fn asset_id(
        &self,
        chain_id: u64,
        token_contract: Address,
        token_id: U256,
    ) -> Result<Address>;

    /// Register license terms on the PIL template, returning the terms ID
    async fn register_license_terms(&self, terms: LicenseTermsRequest) -> Result<U256>;

    /// Attach license terms to an asset. Terms that are already attached
    /// count as success, not error.
    ///
    /// The already-attached condition is recognized at submission time,
    /// where gas estimation surfaces the module's custom error. A
    /// transaction that is included and then reverts carries no revert
    /// data here and is reported as [`ChainCallError::Reverted`].
    async fn attach_license_terms(&self, asset: Address, terms_id: U256) -> Result<()>;

    /// Mint one license token against a licensor's terms, returning the
    /// token ID decoded from the `LicenseTokensMinted` event
    async fn mint_license(
        &self,
        licensor: Address,
        terms_id: U256,
        receiver: Address,
    ) -> Result<U256>;

    /// Register a child asset as a derivative, consuming license tokens
    async fn register_derivative(&self, child: Address, license_tokens: &[U256]) -> Result<()>;
}

/// Live gateway backed by the configured Story testnet contracts
pub struct StoryGateway {
    contract: ContractClient,
    confirmation_timeout_secs: u64,
}

/// The licensing module reverts with a distinct custom error when terms
/// are already attached to an asset
pub(crate) fn is_already_attached(message: &str) -> bool {
    message.contains("AlreadyAttached")
}

impl StoryGateway {
    pub fn new(config: StoryConfig) -> Result<Self> {
        info!(
            "Initializing Story gateway for chain {} via {}",
            config.chain_id, config.rpc_url
        );
        let confirmation_timeout_secs = config.confirmation_timeout_secs;
        let contract = ContractClient::new(config)?;
        Ok(Self {
            contract,
            confirmation_timeout_secs,
        })
    }

    /// Chain ID the gateway registers assets on
    pub fn chain_id(&self) -> u64 {
        self.contract.chain_id()
    }

    /// Address of the signing wallet
    pub fn wallet_address(&self) -> Result<Address> {
        self.contract.wallet_address()
    }

    /// Royalty policy address from configuration
    pub fn royalty_policy(&self) -> Address {
        self.contract.royalty_policy
    }

    /// Currency token address from configuration
    pub fn currency_token(&self) -> Address {
        self.contract.currency_token
    }

    /// Await the receipt of a submitted transaction and require success
    async fn confirmed(
        &self,
        sent: PendingTransactionBuilder<Ethereum>,
    ) -> Result<TransactionReceipt> {
        let deadline = Duration::from_secs(self.confirmation_timeout_secs);
        let receipt = timeout(deadline, sent.get_receipt())
            .await
            .map_err(|_| ChainCallError::ConfirmationTimeout(self.confirmation_timeout_secs))?
            .map_err(|e| ChainCallError::Rpc(e.to_string()))?;

        if !receipt.status() {
            return Err(ChainCallError::Reverted(format!(
                "0x{:x}",
                receipt.transaction_hash
            )));
        }

        debug!("Transaction confirmed: 0x{:x}", receipt.transaction_hash);
        Ok(receipt)
    }
}

#[async_trait]
impl IpGateway for StoryGateway {
    async fn register_asset(
        &self,
        chain_id: u64,
        token_contract: Address,
        token_id: U256,
    ) -> Result<Address> {
        debug!(
            "Registering IP asset for token {} on contract {}",
            token_id, token_contract
        );

        let provider = self.contract.create_provider_with_signer()?;
        let registry = IIPAssetRegistry::new(self.contract.ip_asset_registry, &provider);

        let sent = registry
            .register(U256::from(chain_id), token_contract, token_id)
            .send()
            .await
            .map_err(|e| ChainCallError::Rejected(e.to_string()))?;

        let receipt = self.confirmed(sent).await?;

        // Several modules emit events in this transaction; match by name
        for log in receipt.inner.logs() {
            if let Ok(decoded) = log.log_decode::<IIPAssetRegistry::IPRegistered>() {
                let asset_id = decoded.data().ipId;
                info!("IP asset registered: {}", asset_id);
                return Ok(asset_id);
            }
        }

        Err(ChainCallError::EventMissing("IPRegistered"))
    }

    async fn asset_id(
        &self,
        chain_id: u64,
        token_contract: Address,
        token_id: U256,
    ) -> Result<Address> {
        let provider = self.contract.create_provider()?;
        let registry = IIPAssetRegistry::new(self.contract.ip_asset_registry, &provider);

        registry
            .ipId(U256::from(chain_id), token_contract, token_id)
            .call()
            .await
            .map_err(|e| ChainCallError::Rpc(e.to_string()))
    }

    async fn register_license_terms(&self, terms: LicenseTermsRequest) -> Result<U256> {
        debug!(
            "Registering {:?} license terms (rev share {} ppm)",
            terms.kind(),
            terms.commercial_rev_share
        );

        let provider = self.contract.create_provider_with_signer()?;
        let template = IPILicenseTemplate::new(self.contract.pil_template, &provider);

        let pil_terms = IPILicenseTemplate::PILTerms {
            mintingFee: terms.minting_fee,
            commercialRevShare: U256::from(terms.commercial_rev_share),
            royaltyPolicy: terms.royalty_policy,
            currencyToken: terms.currency_token,
        };

        let sent = template
            .registerLicenseTerms(pil_terms)
            .send()
            .await
            .map_err(|e| ChainCallError::Rejected(e.to_string()))?;

        let receipt = self.confirmed(sent).await?;

        for log in receipt.inner.logs() {
            if let Ok(decoded) = log.log_decode::<IPILicenseTemplate::LicenseTermsRegistered>() {
                let terms_id = decoded.data().licenseTermsId;
                info!("License terms registered with ID {}", terms_id);
                return Ok(terms_id);
            }
        }

        Err(ChainCallError::EventMissing("LicenseTermsRegistered"))
    }

    async fn attach_license_terms(&self, asset: Address, terms_id: U256) -> Result<()> {
        debug!("Attaching license terms {} to asset {}", terms_id, asset);

        let provider = self.contract.create_provider_with_signer()?;
        let module = ILicensingModule::new(self.contract.licensing_module, &provider);

        let sent = match module
            .attachLicenseTerms(asset, self.contract.pil_template, terms_id)
            .send()
            .await
        {
            Ok(sent) => sent,
            Err(e) => {
                let message = e.to_string();
                if is_already_attached(&message) {
                    debug!(
                        "License terms {} already attached to {}, treating as success",
                        terms_id, asset
                    );
                    return Ok(());
                }
                return Err(ChainCallError::Rejected(message));
            }
        };

        self.confirmed(sent).await?;
        info!("License terms {} attached to asset {}", terms_id, asset);
        Ok(())
    }

    async fn mint_license(
        &self,
        licensor: Address,
        terms_id: U256,
        receiver: Address,
    ) -> Result<U256> {
        debug!(
            "Minting license token against {} with terms {}",
            licensor, terms_id
        );

        let provider = self.contract.create_provider_with_signer()?;
        let module = ILicensingModule::new(self.contract.licensing_module, &provider);

        let sent = module
            .mintLicenseTokens(
                licensor,
                self.contract.pil_template,
                terms_id,
                U256::from(1),
                receiver,
                String::new(),
                U256::ZERO,
                U256::ZERO,
            )
            .send()
            .await
            .map_err(|e| ChainCallError::Rejected(e.to_string()))?;

        let receipt = self.confirmed(sent).await?;

        for log in receipt.inner.logs() {
            if let Ok(decoded) = log.log_decode::<ILicensingModule::LicenseTokensMinted>() {
                let token_id = decoded.data().startLicenseTokenId;
                info!("License token {} minted to {}", token_id, receiver);
                return Ok(token_id);
            }
        }

        Err(ChainCallError::EventMissing("LicenseTokensMinted"))
    }

    async fn register_derivative(&self, child: Address, license_tokens: &[U256]) -> Result<()> {
        debug!(
            "Registering {} as derivative consuming {} license token(s)",
            child,
            license_tokens.len()
        );

        let provider = self.contract.create_provider_with_signer()?;
        let module = ILicensingModule::new(self.contract.licensing_module, &provider);

        let sent = module
            .registerDerivativeWithLicenseTokens(
                child,
                license_tokens.to_vec(),
                String::new(),
                U256::ZERO,
            )
            .send()
            .await
            .map_err(|e| ChainCallError::Rejected(e.to_string()))?;

        self.confirmed(sent).await?;
        info!("Derivative registered: {}", child);
        Ok(())
    }
}
