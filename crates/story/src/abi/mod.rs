//! Contract ABI bindings module
//!
//! Alloy `sol!` bindings for the three Story Protocol contracts the
//! gateway talks to.

pub mod ip_asset_registry;
pub mod licensing_module;
pub mod pil_template;

pub use ip_asset_registry::IIPAssetRegistry;
pub use licensing_module::ILicensingModule;
pub use pil_template::IPILicenseTemplate;
