//! Bindings for the validator staking contract.

use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    contract ValidatorStaking {
        function delegate(address delegatorAddress) external payable;
        function undelegate(address withdrawalAddress, uint256 shares) external payable;
        function withdrawCommission(address withdrawalAddress) external returns (uint256);
        function getDelegation(address delegator) external view returns (address, uint256);
        function tokens() external view returns (uint256);
        function delegatorShares() external view returns (uint256);
        function withdrawalFeeInGwei() external view returns (uint96);
    }
}
