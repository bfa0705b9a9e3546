//! Yearn style vault: pooled deposits of one token lent to strategies.
//!
//! Vault shares are an ERC-20 in the ledger whose token address is the vault address.
//! Profit reported by strategies is locked and released linearly through
//! `locked_profit_degradation`, so share price only rises as it unlocks.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};

use crate::{
    constants::{max_bps, scale, DEFAULT_LOCKED_PROFIT_DEGRADATION},
    utils::{
        error::{StrategyError, StrategyResult},
        math::mul_div,
    },
};

pub mod admin;
pub mod debt;
pub mod params;
pub mod report;
pub mod shares;

pub use params::StrategyParams;

#[derive(Clone, Debug)]
pub struct Vault {
    /// Address of the vault, also the share token
    pub address: Address,
    /// Underlying token
    pub token: Address,
    pub name: String,
    pub symbol: String,
    pub governance: Address,
    pub management: Address,
    pub guardian: Address,
    /// Receives the performance and management fee shares
    pub rewards: Address,
    pub deposit_limit: U256,
    pub emergency_shutdown: bool,
    /// Sum of the debt of every strategy
    pub total_debt: U256,
    /// Underlying held by the vault itself
    pub total_idle: U256,
    /// Sum of the debt ratios of every strategy, in bps
    pub debt_ratio: U256,
    /// Timestamp of the last report by any strategy
    pub last_report: u64,
    pub activation: u64,
    /// Profit not yet released to share holders
    pub locked_profit: U256,
    /// Share of the locked profit released per second, e18
    pub locked_profit_degradation: U256,
    /// Vault performance fee in bps
    pub performance_fee: U256,
    /// Management fee in bps per year
    pub management_fee: U256,
    /// Order in which strategies are pulled from on withdrawal
    pub withdrawal_queue: Vec<Address>,
    pub strategies: BTreeMap<Address, StrategyParams>,
}

impl Vault {
    /// Vault initialized at `now`, with no strategies and the default fees.
    pub fn new(
        address: Address,
        token: Address,
        governance: Address,
        rewards: Address,
        guardian: Address,
        management: Address,
        now: u64,
    ) -> Self {
        Self {
            address,
            token,
            name: String::new(),
            symbol: String::new(),
            governance,
            management,
            guardian,
            rewards,
            deposit_limit: U256::ZERO,
            emergency_shutdown: false,
            total_debt: U256::ZERO,
            total_idle: U256::ZERO,
            debt_ratio: U256::ZERO,
            last_report: now,
            activation: now,
            locked_profit: U256::ZERO,
            locked_profit_degradation: U256::from(DEFAULT_LOCKED_PROFIT_DEGRADATION),
            performance_fee: U256::from(1_000u64),
            management_fee: U256::from(200u64),
            withdrawal_queue: vec![],
            strategies: BTreeMap::new(),
        }
    }

    /// Idle funds plus everything lent to strategies
    pub fn total_assets(&self) -> U256 {
        self.total_idle + self.total_debt
    }

    /// Part of the locked profit still locked at `now`.
    pub fn calculate_locked_profit(&self, now: u64) -> StrategyResult<U256> {
        let elapsed = U256::from(now.saturating_sub(self.last_report));
        let locked_funds_ratio = elapsed.saturating_mul(self.locked_profit_degradation);
        if locked_funds_ratio < scale() {
            let released = mul_div(locked_funds_ratio, self.locked_profit, scale())?;
            Ok(self.locked_profit - released)
        } else {
            Ok(U256::ZERO)
        }
    }

    /// Assets backing shares right now
    pub fn free_funds(&self, now: u64) -> StrategyResult<U256> {
        Ok(self
            .total_assets()
            .saturating_sub(self.calculate_locked_profit(now)?))
    }

    pub fn params(&self, strategy: Address) -> StrategyResult<&StrategyParams> {
        self.strategies
            .get(&strategy)
            .filter(|params| params.is_activated())
            .ok_or(StrategyError::StrategyNotActive(strategy))
    }

    pub(crate) fn params_mut(&mut self, strategy: Address) -> StrategyResult<&mut StrategyParams> {
        self.strategies
            .get_mut(&strategy)
            .filter(|params| params.is_activated())
            .ok_or(StrategyError::StrategyNotActive(strategy))
    }

    /// Strategy params, or all zero for an address never added.
    pub fn strategies(&self, strategy: Address) -> StrategyParams {
        self.strategies.get(&strategy).copied().unwrap_or_default()
    }

    /// Debt limit implied by `debt_ratio` over the current total assets.
    pub(crate) fn debt_limit(&self, debt_ratio: U256) -> StrategyResult<U256> {
        mul_div(debt_ratio, self.total_assets(), max_bps())
    }
}
