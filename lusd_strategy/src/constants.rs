//! Protocol constants and default parameters

use alloy_primitives::{address, Address, U256};

/// Scale used for fixed point arithmetic
pub const SCALE: u128 = 1_000_000_000_000_000_000; // e18
pub fn scale() -> U256 {
    U256::from(SCALE)
}

/// Basis point denominator
pub const MAX_BPS: u64 = 10_000;
pub fn max_bps() -> U256 {
    U256::from(MAX_BPS)
}

/// Seconds per year used by the management fee
pub const SECS_PER_YEAR: u64 = 31_556_952;

/// Seconds added to the clock for every mined block
pub const BLOCK_TIME: u64 = 1;

/// Locked profit degradation per second (e18). Releases a report's profit in ~6 hours.
pub const DEFAULT_LOCKED_PROFIT_DEGRADATION: u64 = 46_000_000_000_000;

/// Maximum strategies in the withdrawal queue
pub const MAXIMUM_STRATEGIES: usize = 20;

/// Default max loss accepted on vault withdrawals, in bps
pub const DEFAULT_MAX_LOSS_BPS: u64 = 1;

/// Uniswap fee tiers (in millionths) that have pools
pub const FEE_TIERS: [u32; 4] = [100, 500, 3_000, 10_000];

/// Uniswap fee denominator
pub const FEE_DENOMINATOR: u64 = 1_000_000;

/// Pool fees are `uint24`
pub const MAX_FEE: u32 = 0x00FF_FFFF;

/// Default LQTY -> ETH pool fee (0.3%)
pub const DEFAULT_LQTY_TO_ETH_FEE: u32 = 3_000;

/// Default ETH -> DAI pool fee (0.05%)
pub const DEFAULT_ETH_TO_DAI_FEE: u32 = 500;

/// Default DAI -> LUSD pool fee (0.05%)
pub const DEFAULT_DAI_TO_LUSD_FEE: u32 = 500;

/// Default minimum expected swap output in bps of the oracle value
pub const DEFAULT_MIN_EXPECTED_SWAP_PERCENTAGE: u64 = 9_800;

/// Default TWAP window in seconds
pub const DEFAULT_TWAP_PERIOD: u64 = 1_800;

/// Price observations kept per Uniswap pool
pub const OBSERVATION_CARDINALITY: usize = 1_024;

/// Chainlink answer decimals
pub const CHAINLINK_DECIMALS: u8 = 8;

/// Curve fee denominator
pub const CURVE_FEE_DENOMINATOR: u64 = 10_000_000_000;

/// Newton iterations allowed in the StableSwap math
pub const CURVE_MAX_ITERATIONS: usize = 255;

/// Health check default profit limit in bps
pub const DEFAULT_PROFIT_LIMIT_RATIO: u64 = 300;

/// Health check default loss limit in bps
pub const DEFAULT_LOSS_LIMIT_RATIO: u64 = 100;

/// Base strategy defaults
pub const DEFAULT_MIN_REPORT_DELAY: u64 = 0;
pub const DEFAULT_MAX_REPORT_DELAY: u64 = 86_400;
pub const DEFAULT_PROFIT_FACTOR: u64 = 100;

/// Journal collections kept before pruning
pub const MAX_JOURNAL_COLLECTIONS: usize = 300;

/// Mainnet token addresses used for the simulated deployment
pub const LUSD: Address = address!("5f98805a4e8be255a32880fdec7f6728c6568ba0");
pub const LQTY: Address = address!("6dea81c8171d0ba574754ef6f8b412f2ed88c54d");
pub const DAI: Address = address!("6b175474e89094c44da98b954eedeac495271d0f");
pub const WETH: Address = address!("c02aaa39b223fe8d0a0e5c4f27ead9083c756cc2");

/// Liquity stability pool
pub const STABILITY_POOL: Address = address!("66017d22b0f8556afdd19fc67041899eb65a21bb");

/// Chainlink ETH/USD aggregator
pub const ETH_USD_FEED: Address = address!("5f4ec3df9cbd43714fe2740f5e3616155c5b8419");

/// Curve LUSD pool
pub const CURVE_LUSD_POOL: Address = address!("ed279fdd11ca84beef15af5d39bb4d4bee23f0ca");

/// Uniswap v3 swap router
pub const UNISWAP_ROUTER: Address = address!("e592427a0aece92de3edee1f18e0157c05861564");

/// Returns `10^decimals` as U256
pub fn unit(decimals: u8) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_is_e18() {
        assert_eq!(SCALE, 10_u128.pow(18));
        assert_eq!(unit(18), scale());
    }

    #[test]
    fn degradation_unlocks_in_about_six_hours() {
        let seconds = SCALE / DEFAULT_LOCKED_PROFIT_DEGRADATION as u128;
        assert!(seconds > 6 * 3_600 && seconds < 7 * 3_600);
    }

    #[test]
    fn default_fees_are_valid_tiers() {
        assert!(FEE_TIERS.contains(&DEFAULT_LQTY_TO_ETH_FEE));
        assert!(FEE_TIERS.contains(&DEFAULT_ETH_TO_DAI_FEE));
        assert!(FEE_TIERS.contains(&DEFAULT_DAI_TO_LUSD_FEE));
    }
}
