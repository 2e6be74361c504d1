//! IP Asset Registry contract bindings

use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    #[derive(Debug)]
    interface IIPAssetRegistry {
        event IPRegistered(
            address ipId,
            uint256 indexed chainId,
            address indexed tokenContract,
            uint256 indexed tokenId,
            string name,
            string uri,
            uint256 registrationDate
        );

        function register(uint256 chainid, address tokenContract, uint256 tokenId) external returns (address);
        function ipId(uint256 chainId, address tokenContract, uint256 tokenId) external view returns (address);
        function isRegistered(address id) external view returns (bool);
    }
}
