//! PIL License Template contract bindings

use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IPILicenseTemplate {
        struct PILTerms {
            uint256 mintingFee;
            uint256 commercialRevShare;
            address royaltyPolicy;
            address currencyToken;
        }

        event LicenseTermsRegistered(
            uint256 indexed licenseTermsId,
            address indexed licenseTemplate,
            bytes licenseTerms
        );

        function registerLicenseTerms(PILTerms terms) external returns (uint256);
        function getLicenseTermsId(PILTerms terms) external view returns (uint256);
    }
}
