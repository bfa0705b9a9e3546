//! ABI declarations of the events emitted by the vault, the strategy and their venues.

use alloy_sol_types::sol;

sol! {
    // Vault
    event Deposit(address indexed recipient, uint256 shares, uint256 amount);
    event Withdraw(address indexed recipient, uint256 shares, uint256 amount);
    event StrategyAdded(
        address indexed strategy,
        uint256 debtRatio,
        uint256 minDebtPerHarvest,
        uint256 maxDebtPerHarvest,
        uint256 performanceFee
    );
    event StrategyReported(
        address indexed strategy,
        uint256 gain,
        uint256 loss,
        uint256 debtPaid,
        uint256 totalGain,
        uint256 totalLoss,
        uint256 totalDebt,
        uint256 debtAdded,
        uint256 debtRatio
    );
    event StrategyUpdateDebtRatio(address indexed strategy, uint256 debtRatio);
    event StrategyUpdateMinDebtPerHarvest(address indexed strategy, uint256 minDebtPerHarvest);
    event StrategyUpdateMaxDebtPerHarvest(address indexed strategy, uint256 maxDebtPerHarvest);
    event StrategyUpdatePerformanceFee(address indexed strategy, uint256 performanceFee);
    event StrategyMigrated(address indexed oldVersion, address indexed newVersion);
    event StrategyRevoked(address indexed strategy);
    event EmergencyShutdown(bool active);
    event UpdateDepositLimit(uint256 depositLimit);
    event UpdatePerformanceFee(uint256 performanceFee);
    event UpdateManagementFee(uint256 managementFee);
    event UpdateGuardian(address guardian);
    event UpdateManagement(address management);
    event UpdateRewards(address rewards);
    event LockedProfitDegradationUpdated(uint256 value);

    // Strategy
    event Harvested(uint256 profit, uint256 loss, uint256 debtPayment, uint256 debtOutstanding);
    event EmergencyExitEnabled();
    event UpdatedKeeper(address newKeeper);
    event UpdatedStrategist(address newStrategist);
    event UpdatedRewards(address rewards);
    event UpdatedMinReportDelay(uint256 delay);
    event UpdatedMaxReportDelay(uint256 delay);
    event UpdatedProfitFactor(uint256 profitFactor);
    event UpdatedDebtThreshold(uint256 debtThreshold);
    event SetHealthCheck(address healthCheck);
    event SetDoHealthCheck(bool doHealthCheck);

    // Swap venues
    event Swap(
        address indexed pool,
        address indexed tokenIn,
        address indexed tokenOut,
        uint256 amountIn,
        uint256 amountOut
    );
    event TokenExchange(
        address indexed buyer,
        int128 soldId,
        uint256 tokensSold,
        int128 boughtId,
        uint256 tokensBought
    );

    // Stability pool
    event UserDepositChanged(address indexed depositor, uint256 newDeposit);
    event ETHGainWithdrawn(address indexed depositor, uint256 ETH, uint256 LUSDLoss);
    event LQTYPaidToDepositor(address indexed depositor, uint256 LQTY);
    event StabilityPoolOffset(uint256 debtToOffset, uint256 collToAdd);

    // Price feed
    event AnswerUpdated(int256 indexed current, uint256 indexed roundId, uint256 updatedAt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};
    use alloy_sol_types::SolEvent;

    #[test]
    fn harvested_log_decodes_back() {
        let event = Harvested {
            profit: U256::from(5u64),
            loss: U256::ZERO,
            debtPayment: U256::from(2u64),
            debtOutstanding: U256::from(7u64),
        };
        let data = event.encode_log_data();
        assert_eq!(data.topics()[0], Harvested::SIGNATURE_HASH);
        let decoded = Harvested::decode_log_data(&data, true).unwrap();
        assert_eq!(decoded.profit, U256::from(5u64));
        assert_eq!(decoded.debtOutstanding, U256::from(7u64));
    }

    #[test]
    fn indexed_strategy_is_a_topic() {
        let strategy = Address::repeat_byte(0x42);
        let data = StrategyRevoked { strategy }.encode_log_data();
        assert_eq!(data.topics().len(), 2);
        assert_eq!(&data.topics()[1][12..], strategy.as_slice());
    }
}
