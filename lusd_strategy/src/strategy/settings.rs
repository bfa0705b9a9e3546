//! Strategy settings

use alloy_primitives::{Address, U256};

use crate::{
    config::StrategyConfig,
    constants::{
        DEFAULT_DAI_TO_LUSD_FEE, DEFAULT_ETH_TO_DAI_FEE, DEFAULT_LQTY_TO_ETH_FEE,
        DEFAULT_MAX_REPORT_DELAY, DEFAULT_MIN_EXPECTED_SWAP_PERCENTAGE, DEFAULT_MIN_REPORT_DELAY,
        DEFAULT_PROFIT_FACTOR, DEFAULT_TWAP_PERIOD,
    },
};

/// Settings of a strategy.
/// Addresses are fixed at deployment, the rest is tuned through the role gated setters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrategySettings {
    /// Vault the strategy reports to
    pub vault: Address,
    /// Token borrowed from the vault (LUSD)
    pub want: Address,
    pub strategist: Address,
    pub keeper: Address,
    /// Receives the strategist's share of the vault fees
    pub rewards: Address,
    /// Health check consulted on harvest. Zero disables it.
    pub health_check: Address,
    /// Minimum seconds between harvests before the trigger fires
    pub min_report_delay: u64,
    /// Seconds after which the trigger fires regardless
    pub max_report_delay: u64,
    /// Multiple of the call cost a harvest must be worth
    pub profit_factor: U256,
    /// Debt outstanding tolerated before the trigger fires
    pub debt_threshold: U256,
    /// Uniswap fee tier of the LQTY -> WETH hop
    pub lqty_to_eth_fee: u32,
    /// Uniswap fee tier of the WETH -> DAI hop
    pub eth_to_dai_fee: u32,
    /// Uniswap fee tier of the DAI -> LUSD swap
    pub dai_to_lusd_fee: u32,
    /// Minimum swap output in bps of the expected value
    pub min_expected_swap_percentage: U256,
    /// DAI is sold on Curve when set, on Uniswap otherwise
    pub convert_dai_to_lusd_on_curve: bool,
    /// LQTY is valued through the pool TWAP when set, ignored otherwise
    pub twap_enabled: bool,
    /// TWAP window in seconds
    pub twap_period: u64,
}

impl StrategySettings {
    /// Settings with every tunable at its default.
    pub fn new(vault: Address, want: Address, strategist: Address) -> Self {
        Self {
            vault,
            want,
            strategist,
            keeper: strategist,
            rewards: strategist,
            health_check: Address::ZERO,
            min_report_delay: DEFAULT_MIN_REPORT_DELAY,
            max_report_delay: DEFAULT_MAX_REPORT_DELAY,
            profit_factor: U256::from(DEFAULT_PROFIT_FACTOR),
            debt_threshold: U256::ZERO,
            lqty_to_eth_fee: DEFAULT_LQTY_TO_ETH_FEE,
            eth_to_dai_fee: DEFAULT_ETH_TO_DAI_FEE,
            dai_to_lusd_fee: DEFAULT_DAI_TO_LUSD_FEE,
            min_expected_swap_percentage: U256::from(DEFAULT_MIN_EXPECTED_SWAP_PERCENTAGE),
            convert_dai_to_lusd_on_curve: true,
            twap_enabled: true,
            twap_period: DEFAULT_TWAP_PERIOD,
        }
    }

    /// Applies the tunables of a configuration.
    pub fn apply(&mut self, config: &StrategyConfig) -> &mut Self {
        self.lqty_to_eth_fee = config.lqty_to_eth_fee;
        self.eth_to_dai_fee = config.eth_to_dai_fee;
        self.dai_to_lusd_fee = config.dai_to_lusd_fee;
        self.min_expected_swap_percentage = U256::from(config.min_expected_swap_percentage);
        self.convert_dai_to_lusd_on_curve = config.convert_dai_to_lusd_on_curve;
        self.twap_enabled = config.twap_enabled;
        self.twap_period = config.twap_period;
        self.min_report_delay = config.min_report_delay;
        self.max_report_delay = config.max_report_delay;
        self.profit_factor = U256::from(config.profit_factor);
        self.debt_threshold = U256::from(config.debt_threshold);
        self
    }

    /// Sets the keeper.
    pub fn keeper(&mut self, keeper: Address) -> &mut Self {
        self.keeper = keeper;
        self
    }

    /// Sets the strategist.
    pub fn strategist(&mut self, strategist: Address) -> &mut Self {
        self.strategist = strategist;
        self
    }

    /// Sets the rewards recipient.
    pub fn rewards(&mut self, rewards: Address) -> &mut Self {
        self.rewards = rewards;
        self
    }

    /// Sets the health check.
    pub fn health_check(&mut self, health_check: Address) -> &mut Self {
        self.health_check = health_check;
        self
    }

    /// Sets the minimum report delay.
    pub fn min_report_delay(&mut self, delay: u64) -> &mut Self {
        self.min_report_delay = delay;
        self
    }

    /// Sets the maximum report delay.
    pub fn max_report_delay(&mut self, delay: u64) -> &mut Self {
        self.max_report_delay = delay;
        self
    }

    /// Sets the profit factor.
    pub fn profit_factor(&mut self, profit_factor: U256) -> &mut Self {
        self.profit_factor = profit_factor;
        self
    }

    /// Sets the debt threshold.
    pub fn debt_threshold(&mut self, debt_threshold: U256) -> &mut Self {
        self.debt_threshold = debt_threshold;
        self
    }

    /// Sets the three Uniswap fee tiers used to sell rewards.
    pub fn swap_fees(&mut self, lqty_to_eth: u32, eth_to_dai: u32, dai_to_lusd: u32) -> &mut Self {
        self.lqty_to_eth_fee = lqty_to_eth;
        self.eth_to_dai_fee = eth_to_dai;
        self.dai_to_lusd_fee = dai_to_lusd;
        self
    }

    /// Sets the minimum expected swap percentage.
    pub fn min_expected_swap_percentage(&mut self, percentage: U256) -> &mut Self {
        self.min_expected_swap_percentage = percentage;
        self
    }

    /// Sets the venue used to sell DAI.
    pub fn convert_dai_to_lusd_on_curve(&mut self, on_curve: bool) -> &mut Self {
        self.convert_dai_to_lusd_on_curve = on_curve;
        self
    }

    /// Enables or disables LQTY valuation through the TWAP.
    pub fn twap_enabled(&mut self, enabled: bool) -> &mut Self {
        self.twap_enabled = enabled;
        self
    }
}
