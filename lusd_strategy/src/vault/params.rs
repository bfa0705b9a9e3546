//! Per strategy accounting kept by the vault

use alloy_primitives::U256;

/// Vault side parameters and totals of one strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrategyParams {
    /// Strategist performance fee in bps
    pub performance_fee: U256,
    /// Timestamp the strategy was added. Zero when it was never added.
    pub activation: u64,
    /// Share of vault assets the strategy may borrow, in bps
    pub debt_ratio: U256,
    /// Credit below this amount is not extended
    pub min_debt_per_harvest: U256,
    /// Credit extended per harvest is capped at this amount
    pub max_debt_per_harvest: U256,
    /// Timestamp of the last report
    pub last_report: u64,
    /// Outstanding debt to the vault
    pub total_debt: U256,
    /// Sum of every reported gain
    pub total_gain: U256,
    /// Sum of every reported loss
    pub total_loss: U256,
}

impl StrategyParams {
    /// Parameters of a strategy added at `now`.
    pub fn new(
        now: u64,
        debt_ratio: U256,
        min_debt_per_harvest: U256,
        max_debt_per_harvest: U256,
        performance_fee: U256,
    ) -> Self {
        Self {
            performance_fee,
            activation: now,
            debt_ratio,
            min_debt_per_harvest,
            max_debt_per_harvest,
            last_report: now,
            ..Default::default()
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activation > 0
    }

    /// Sets the debt ratio.
    pub fn debt_ratio(&mut self, debt_ratio: U256) -> &mut Self {
        self.debt_ratio = debt_ratio;
        self
    }

    /// Sets the minimum debt per harvest.
    pub fn min_debt_per_harvest(&mut self, amount: U256) -> &mut Self {
        self.min_debt_per_harvest = amount;
        self
    }

    /// Sets the maximum debt per harvest.
    pub fn max_debt_per_harvest(&mut self, amount: U256) -> &mut Self {
        self.max_debt_per_harvest = amount;
        self
    }

    /// Sets the strategist performance fee.
    pub fn performance_fee(&mut self, fee: U256) -> &mut Self {
        self.performance_fee = fee;
        self
    }
}
