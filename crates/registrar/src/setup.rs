//! One-time environment setup
//!
//! Registers a root IP asset to serve as the parent for all derivatives,
//! registers commercial remix terms, and attaches them. The printed asset
//! and terms IDs go back into the environment for subsequent runs.

use crate::error::Result;
use story::{Address, IpGateway, LicenseTermsRequest, U256};
use tracing::info;

/// IDs produced by setup, to be fed back into the environment
#[derive(Debug, Clone)]
pub struct SetupOutcome {
    pub asset_id: Address,
    pub license_terms_id: U256,
}

/// Register a parent asset and attach commercial remix terms to it
pub async fn run_setup<G: IpGateway>(
    gateway: &G,
    chain_id: u64,
    token_contract: Address,
    rev_share_percent: u32,
    royalty_policy: Address,
    currency_token: Address,
) -> Result<SetupOutcome> {
    let token_id = U256::from_be_bytes(rand::random::<[u8; 32]>());
    info!(
        "Registering parent asset for token {} on contract {}",
        token_id, token_contract
    );
    let asset_id = gateway
        .register_asset(chain_id, token_contract, token_id)
        .await?;

    let terms = LicenseTermsRequest::commercial_remix(
        rev_share_percent,
        royalty_policy,
        currency_token,
    );
    let license_terms_id = gateway.register_license_terms(terms).await?;
    gateway.attach_license_terms(asset_id, license_terms_id).await?;

    info!(
        "Setup complete: asset {} with license terms {}",
        asset_id, license_terms_id
    );
    Ok(SetupOutcome {
        asset_id,
        license_terms_id,
    })
}
