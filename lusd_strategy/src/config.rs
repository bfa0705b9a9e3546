//! Deployment configuration

use serde::{Deserialize, Serialize};

use crate::{
    constants::*,
    utils::error::{StrategyError, StrategyResult},
};

/// Configuration of a full deployment: market, vault, health check and strategy.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Seed of the account derivation
    pub seed: u64,
    pub vault: VaultConfig,
    pub strategy: StrategyConfig,
    pub health_check: HealthCheckConfig,
    pub market: MarketConfig,
}

/// Vault parameters applied right after initialization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub name: String,
    pub symbol: String,
    /// Deposit limit in wei, `None` for unlimited
    pub deposit_limit: Option<u128>,
    /// Performance fee in bps
    pub performance_fee: u64,
    /// Management fee in bps per year
    pub management_fee: u64,
    /// Locked profit degradation per second, e18
    pub locked_profit_degradation: u64,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            name: "LUSD yVault".to_string(),
            symbol: "yvLUSD".to_string(),
            deposit_limit: None,
            performance_fee: 1_000,
            management_fee: 200,
            locked_profit_degradation: DEFAULT_LOCKED_PROFIT_DEGRADATION,
        }
    }
}

/// Strategy registration parameters and swap configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    /// Debt ratio granted when the strategy is added, in bps
    pub debt_ratio: u64,
    /// Wei
    pub min_debt_per_harvest: u128,
    /// Wei, `None` for unlimited
    pub max_debt_per_harvest: Option<u128>,
    /// Strategist performance fee in bps
    pub performance_fee: u64,
    pub lqty_to_eth_fee: u32,
    pub eth_to_dai_fee: u32,
    pub dai_to_lusd_fee: u32,
    pub min_expected_swap_percentage: u64,
    pub convert_dai_to_lusd_on_curve: bool,
    pub twap_enabled: bool,
    /// Seconds
    pub twap_period: u64,
    /// Seconds
    pub min_report_delay: u64,
    /// Seconds
    pub max_report_delay: u64,
    pub profit_factor: u64,
    /// Wei
    pub debt_threshold: u128,
    /// Whether new strategies start with the common health check attached
    pub use_health_check: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            debt_ratio: MAX_BPS,
            min_debt_per_harvest: 0,
            max_debt_per_harvest: None,
            performance_fee: 1_000,
            lqty_to_eth_fee: DEFAULT_LQTY_TO_ETH_FEE,
            eth_to_dai_fee: DEFAULT_ETH_TO_DAI_FEE,
            dai_to_lusd_fee: DEFAULT_DAI_TO_LUSD_FEE,
            min_expected_swap_percentage: DEFAULT_MIN_EXPECTED_SWAP_PERCENTAGE,
            convert_dai_to_lusd_on_curve: true,
            twap_enabled: true,
            twap_period: DEFAULT_TWAP_PERIOD,
            min_report_delay: DEFAULT_MIN_REPORT_DELAY,
            max_report_delay: DEFAULT_MAX_REPORT_DELAY,
            profit_factor: DEFAULT_PROFIT_FACTOR,
            debt_threshold: 0,
            use_health_check: true,
        }
    }
}

/// Common health check limits
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// bps of total debt
    pub profit_limit_ratio: u64,
    /// bps of total debt
    pub loss_limit_ratio: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            profit_limit_ratio: DEFAULT_PROFIT_LIMIT_RATIO,
            loss_limit_ratio: DEFAULT_LOSS_LIMIT_RATIO,
        }
    }
}

/// Simulated market. Reserves and balances are expressed in whole tokens.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// ETH price in whole USD
    pub eth_usd_price: u64,
    /// WETH, DAI reserves of the 0.05% pool
    pub weth_dai_reserves: [u64; 2],
    /// WETH, DAI reserves of the 0.3% pool
    pub weth_dai_reserves_03: [u64; 2],
    /// LQTY, WETH reserves of the 0.3% pool
    pub lqty_weth_reserves: [u64; 2],
    /// DAI, LUSD reserves of the 0.05% pool
    pub dai_lusd_reserves: [u64; 2],
    /// LUSD, DAI balances of the StableSwap pool
    pub curve_reserves: [u64; 2],
    pub curve_amplification: u64,
    /// StableSwap fee in 1e10 units
    pub curve_fee: u64,
    /// Balance given to each whale of its token
    pub whale_balance: u64,
    /// Native balance of the ETH whale
    pub eth_whale_balance: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            eth_usd_price: 2_000,
            weth_dai_reserves: [50_000, 100_000_000],
            weth_dai_reserves_03: [5_000, 10_000_000],
            lqty_weth_reserves: [1_000_000, 5_000],
            dai_lusd_reserves: [10_000_000, 10_000_000],
            curve_reserves: [20_000_000, 20_000_000],
            curve_amplification: 200,
            curve_fee: 4_000_000,
            whale_balance: 100_000_000,
            eth_whale_balance: 1_000_000,
        }
    }
}

impl ChainConfig {
    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> StrategyResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|err| StrategyError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> StrategyResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|err| StrategyError::InvalidConfig(err.to_string()))
    }

    /// Rejects values the contracts would refuse at deployment.
    pub fn validate(&self) -> StrategyResult<()> {
        let invalid = |reason: &str| Err(StrategyError::InvalidConfig(reason.to_string()));

        if self.vault.performance_fee > MAX_BPS / 2 {
            return invalid("vault performance fee above 50%");
        }
        if self.vault.management_fee > MAX_BPS {
            return invalid("vault management fee above 100%");
        }
        if self.vault.locked_profit_degradation as u128 > SCALE {
            return invalid("locked profit degradation above 1e18");
        }
        if self.strategy.debt_ratio > MAX_BPS {
            return invalid("strategy debt ratio above 100%");
        }
        if self.strategy.performance_fee > MAX_BPS / 2 {
            return invalid("strategist performance fee above 50%");
        }
        if let Some(max_debt) = self.strategy.max_debt_per_harvest {
            if self.strategy.min_debt_per_harvest > max_debt {
                return invalid("min debt per harvest above max debt per harvest");
            }
        }
        for fee in [
            self.strategy.lqty_to_eth_fee,
            self.strategy.eth_to_dai_fee,
            self.strategy.dai_to_lusd_fee,
        ] {
            if !FEE_TIERS.contains(&fee) {
                return invalid("swap fee is not an enabled fee tier");
            }
        }
        if self.strategy.twap_enabled && self.strategy.twap_period == 0 {
            return invalid("twap period must be positive");
        }
        if self.strategy.min_report_delay > self.strategy.max_report_delay {
            return invalid("min report delay above max report delay");
        }
        if self.health_check.profit_limit_ratio > MAX_BPS {
            return invalid("health check profit limit above 100%");
        }
        if self.health_check.loss_limit_ratio >= MAX_BPS {
            return invalid("health check loss limit must be below 100%");
        }
        if self.market.eth_usd_price == 0 {
            return invalid("eth price must be positive");
        }
        let reserves = [
            self.market.weth_dai_reserves,
            self.market.weth_dai_reserves_03,
            self.market.lqty_weth_reserves,
            self.market.dai_lusd_reserves,
            self.market.curve_reserves,
        ];
        if reserves.iter().flatten().any(|reserve| *reserve == 0) {
            return invalid("pool reserves must be positive");
        }
        if self.market.curve_amplification == 0 {
            return invalid("curve amplification must be positive");
        }
        if self.market.curve_fee >= CURVE_FEE_DENOMINATOR {
            return invalid("curve fee above 100%");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(ChainConfig::default().validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config = ChainConfig::from_json(
            r#"{
                "seed": 9,
                "strategy": { "twap_enabled": false },
                "market": { "eth_usd_price": 1500 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.seed, 9);
        assert!(!config.strategy.twap_enabled);
        assert_eq!(config.strategy.lqty_to_eth_fee, DEFAULT_LQTY_TO_ETH_FEE);
        assert_eq!(config.market.eth_usd_price, 1_500);
        assert_eq!(config.health_check.profit_limit_ratio, 300);
    }

    #[test]
    fn json_round_trip() {
        let config = ChainConfig::default();
        let parsed = ChainConfig::from_json(&config.to_json().unwrap()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = ChainConfig::default();
        config.strategy.eth_to_dai_fee = 5_511;
        assert!(matches!(config.validate(), Err(StrategyError::InvalidConfig(_))));

        let mut config = ChainConfig::default();
        config.health_check.loss_limit_ratio = MAX_BPS;
        assert!(config.validate().is_err());

        let mut config = ChainConfig::default();
        config.health_check.profit_limit_ratio = MAX_BPS;
        assert!(config.validate().is_ok());
        config.health_check.profit_limit_ratio = MAX_BPS + 1;
        assert!(config.validate().is_err());

        let mut config = ChainConfig::default();
        config.strategy.min_debt_per_harvest = 10;
        config.strategy.max_debt_per_harvest = Some(5);
        assert!(config.validate().is_err());

        assert!(ChainConfig::from_json("{ not json").is_err());
    }
}
