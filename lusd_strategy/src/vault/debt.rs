//! Credit and debt limits of strategies

use alloy_primitives::{Address, U256};

use crate::{
    state::State,
    utils::{
        error::{StrategyError, StrategyResult},
        math::mul_div,
    },
};

use super::Vault;

impl Vault {
    /// Amount the strategy should return to the vault.
    /// Everything when the vault lends nothing or is shut down.
    pub fn debt_outstanding(&self, strategy: Address) -> StrategyResult<U256> {
        let params = self.params(strategy)?;
        if self.debt_ratio.is_zero() {
            return Ok(params.total_debt);
        }
        let strategy_debt_limit = self.debt_limit(params.debt_ratio)?;
        let strategy_total_debt = params.total_debt;

        if self.emergency_shutdown {
            Ok(strategy_total_debt)
        } else if strategy_total_debt <= strategy_debt_limit {
            Ok(U256::ZERO)
        } else {
            Ok(strategy_total_debt - strategy_debt_limit)
        }
    }

    /// Amount the vault would lend the strategy on its next report.
    pub fn credit_available(&self, strategy: Address) -> StrategyResult<U256> {
        if self.emergency_shutdown {
            return Ok(U256::ZERO);
        }
        let params = self.params(strategy)?;
        let vault_debt_limit = self.debt_limit(self.debt_ratio)?;
        let vault_total_debt = self.total_debt;
        let strategy_debt_limit = self.debt_limit(params.debt_ratio)?;
        let strategy_total_debt = params.total_debt;

        if strategy_debt_limit <= strategy_total_debt || vault_debt_limit <= vault_total_debt {
            return Ok(U256::ZERO);
        }

        let available = (strategy_debt_limit - strategy_total_debt)
            .min(vault_debt_limit - vault_total_debt)
            .min(self.total_idle);

        if available < params.min_debt_per_harvest {
            return Ok(U256::ZERO);
        }
        Ok(available.min(params.max_debt_per_harvest))
    }

    /// Writes a loss off the strategy's debt and scales its debt ratio down proportionally.
    pub(crate) fn report_loss(&mut self, strategy: Address, loss: U256) -> StrategyResult<()> {
        if loss.is_zero() {
            return Ok(());
        }
        let vault_debt_ratio = self.debt_ratio;
        let vault_total_debt = self.total_debt;
        let params = self.params_mut(strategy)?;
        if params.total_debt < loss {
            return Err(StrategyError::Custom(
                "loss exceeds strategy debt".to_string(),
            ));
        }

        let mut ratio_change = U256::ZERO;
        if !vault_debt_ratio.is_zero() {
            ratio_change =
                mul_div(loss, vault_debt_ratio, vault_total_debt)?.min(params.debt_ratio);
            params.debt_ratio -= ratio_change;
        }
        params.total_loss += loss;
        params.total_debt -= loss;

        self.debt_ratio -= ratio_change;
        self.total_debt -= loss;
        Ok(())
    }
}

impl State {
    /// Gain the strategy is expected to report now, extrapolated from its history.
    pub fn expected_return(&self, strategy: Address) -> StrategyResult<U256> {
        let params = *self.vault.params(strategy)?;
        let now = self.now();
        let since_last_harvest = now.saturating_sub(params.last_report);
        let total_harvest_time = params.last_report.saturating_sub(params.activation);

        if since_last_harvest > 0 && total_harvest_time > 0 && self.strategy_is_active(strategy)? {
            mul_div(
                params.total_gain,
                U256::from(since_last_harvest),
                U256::from(total_harvest_time),
            )
        } else {
            Ok(U256::ZERO)
        }
    }
}
