//! Licensing Module contract bindings

use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface ILicensingModule {
        event LicenseTermsAttached(
            address indexed caller,
            address indexed ipId,
            address licenseTemplate,
            uint256 licenseTermsId
        );

        event LicenseTokensMinted(
            address indexed caller,
            address indexed licensorIpId,
            address licenseTemplate,
            uint256 indexed licenseTermsId,
            uint256 amount,
            address receiver,
            uint256 startLicenseTokenId
        );

        function attachLicenseTerms(address ipId, address licenseTemplate, uint256 licenseTermsId) external;

        function mintLicenseTokens(
            address licensorIpId,
            address licenseTemplate,
            uint256 licenseTermsId,
            uint256 amount,
            address receiver,
            string royaltyContext,
            uint256 maxMintingFee,
            uint256 maxRevenueShare
        ) external returns (uint256);

        function registerDerivativeWithLicenseTokens(
            address childIpId,
            uint256[] licenseTokenIds,
            string royaltyContext,
            uint256 maxRts
        ) external;
    }
}
