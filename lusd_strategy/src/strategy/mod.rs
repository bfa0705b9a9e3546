//! Yearn base strategy specialised to lend LUSD to the Liquity stability pool.
//!
//! The vault lends LUSD, the strategy deposits it in the stability pool and collects the
//! ETH from liquidations and the LQTY issued to depositors. On harvest those rewards are
//! sold back to LUSD (LQTY -> WETH -> DAI and ETH -> DAI on Uniswap, DAI -> LUSD on Curve or
//! Uniswap), the result is reported to the vault and idle LUSD is deposited again.

use alloy_primitives::{Address, U256};
use tracing::info;

use crate::{
    config::StrategyConfig,
    state::State,
    utils::{
        access::Roles,
        error::{StrategyError, StrategyResult},
    },
};

pub mod base;
pub mod data;
pub mod settings;
pub mod stability;

pub use data::StrategyData;
pub use settings::StrategySettings;

/// Display name of the strategy
pub const STRATEGY_NAME: &str = "StrategyLiquityStabilityPoolLUSD";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Strategy {
    /// Address holding the strategy's funds
    pub address: Address,
    pub settings: StrategySettings,
    pub data: StrategyData,
}

impl Strategy {
    pub fn new(address: Address, settings: StrategySettings) -> Self {
        Self {
            address,
            settings,
            data: StrategyData::default(),
        }
    }

    pub fn name(&self) -> &'static str {
        STRATEGY_NAME
    }
}

impl State {
    /// Deploys a strategy for the vault at `address`, owned by `strategist`.
    ///
    /// The strategy starts with the common health check attached when `use_health_check` is
    /// set, and approves the vault to pull its want. It is not added to the vault.
    pub fn deploy_strategy(
        &mut self,
        address: Address,
        strategist: Address,
        config: &StrategyConfig,
    ) -> StrategyResult<()> {
        if self.strategies.contains_key(&address) {
            return Err(StrategyError::StrategyAlreadyActive(address));
        }
        let mut settings = StrategySettings::new(self.vault.address, self.vault.token, strategist);
        settings.apply(config);
        if config.use_health_check {
            settings.health_check(self.health_check.address);
        }

        let (want, vault) = (settings.want, settings.vault);
        self.ledger.approve(want, address, vault, U256::MAX);
        self.strategies.insert(address, Strategy::new(address, settings));

        info!(%address, %strategist, "strategy deployed");
        Ok(())
    }

    /// Everyone holding a role over `strategy`.
    pub fn strategy_roles(&self, strategy: Address) -> StrategyResult<Roles> {
        let settings = &self.strategy(strategy)?.settings;
        Ok(Roles {
            governance: self.vault.governance,
            management: self.vault.management,
            guardian: self.vault.guardian,
            strategist: settings.strategist,
            keeper: settings.keeper,
        })
    }

    /// Assets managed elsewhere on behalf of the vault. Excluded from the management fee.
    pub fn delegated_assets(&self, _strategy: Address) -> U256 {
        U256::ZERO
    }

    /// A strategy is active while the vault lends to it or it still holds assets.
    pub fn strategy_is_active(&self, strategy: Address) -> StrategyResult<bool> {
        Ok(!self.vault.strategies(strategy).debt_ratio.is_zero()
            || !self.estimated_total_assets(strategy)?.is_zero())
    }
}
