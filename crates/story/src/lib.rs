//! Story Protocol contract gateway
//!
//! Thin typed wrappers over the three on-chain modules the registrar
//! talks to: the IP Asset Registry, the Licensing Module, and the PIL
//! License Template. Contract addresses, RPC endpoint and signing key are
//! configuration; nothing on-chain is hard-coded here.

pub mod abi;
pub mod config;
pub mod contract;
pub mod error;
pub mod gateway;

pub use config::StoryConfig;
pub use contract::ContractClient;
pub use error::{ChainCallError, Result};
pub use gateway::{IpGateway, LicenseKind, LicenseTermsRequest, StoryGateway};

// Chain primitives used throughout the workspace
pub use alloy::primitives::{Address, U256};
