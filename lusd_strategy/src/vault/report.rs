//! Strategy reports: fee assessment, debt settlement and profit locking

use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use crate::{
    constants::{max_bps, SECS_PER_YEAR},
    state::State,
    types::StrategyReported,
    utils::{
        error::{StrategyError, StrategyResult},
        math::mul_div,
    },
};

impl State {
    /// Mints fee shares for a report of `gain` by `strategy`.
    /// Returns the fee charged, in underlying.
    ///
    /// Management fee accrues on the strategy's debt since its last report, strategist and vault
    /// performance fees are taken from the gain. The total never exceeds the gain.
    fn assess_fees(&mut self, strategy: Address, gain: U256) -> StrategyResult<U256> {
        let now = self.now();
        let params = *self.vault.params(strategy)?;
        if params.activation == now || gain.is_zero() {
            return Ok(U256::ZERO);
        }
        let duration = now.saturating_sub(params.last_report);
        if duration == 0 {
            return Ok(U256::ZERO);
        }

        let delegated = self.delegated_assets(strategy);
        let management_fee = mul_div(
            params.total_debt.saturating_sub(delegated) * U256::from(duration),
            self.vault.management_fee,
            max_bps(),
        )? / U256::from(SECS_PER_YEAR);
        let strategist_fee = mul_div(gain, params.performance_fee, max_bps())?;
        let performance_fee = mul_div(gain, self.vault.performance_fee, max_bps())?;

        let total_fee = (management_fee + strategist_fee + performance_fee).min(gain);
        if total_fee.is_zero() {
            return Ok(U256::ZERO);
        }

        let vault = self.vault.address;
        let reward = self.issue_shares_for_amount(vault, total_fee)?;
        if !strategist_fee.is_zero() {
            let strategist_reward = mul_div(strategist_fee, reward, total_fee)?;
            self.ledger.transfer(vault, vault, strategy, strategist_reward)?;
        }
        let remaining = self.ledger.balance_of(vault, vault);
        if !remaining.is_zero() {
            let rewards = self.vault.rewards;
            self.ledger.transfer(vault, vault, rewards, remaining)?;
        }

        debug!(
            %strategy,
            %management_fee,
            %strategist_fee,
            %performance_fee,
            %total_fee,
            "fees assessed"
        );
        Ok(total_fee)
    }

    /// Report of `strategy` to the vault.
    ///
    /// Books `loss` against the strategy's debt, charges fees on `gain`, repays up to
    /// `debt_payment` and extends new credit. The net of gain plus repayment against credit
    /// moves between strategy and vault. Returns the debt the strategy still owes, or all of
    /// its assets when it is being wound down.
    pub fn vault_report(
        &mut self,
        strategy: Address,
        gain: U256,
        loss: U256,
        debt_payment: U256,
    ) -> StrategyResult<U256> {
        self.vault.params(strategy)?;
        let (token, vault) = (self.vault.token, self.vault.address);
        let strategy_balance = self.ledger.balance_of(token, strategy);
        if strategy_balance < gain + debt_payment {
            return Err(StrategyError::InsufficientBalance {
                token,
                holder: strategy,
                balance: strategy_balance,
                required: gain + debt_payment,
            });
        }

        self.vault.report_loss(strategy, loss)?;
        let total_fees = self.assess_fees(strategy, gain)?;
        self.vault.params_mut(strategy)?.total_gain += gain;

        let credit = self.vault.credit_available(strategy)?;
        let mut debt = self.vault.debt_outstanding(strategy)?;
        let debt_payment = debt_payment.min(debt);

        if !debt_payment.is_zero() {
            self.vault.params_mut(strategy)?.total_debt -= debt_payment;
            self.vault.total_debt -= debt_payment;
            debt -= debt_payment;
        }
        if !credit.is_zero() {
            self.vault.params_mut(strategy)?.total_debt += credit;
            self.vault.total_debt += credit;
        }

        let total_available = gain + debt_payment;
        if total_available < credit {
            let amount = credit - total_available;
            self.vault.total_idle -= amount;
            self.ledger.transfer(token, vault, strategy, amount)?;
        } else if total_available > credit {
            let amount = total_available - credit;
            self.vault.total_idle += amount;
            self.ledger.transfer_from(token, vault, strategy, vault, amount)?;
        }

        let now = self.now();
        let locked_before_loss =
            (self.vault.calculate_locked_profit(now)? + gain).saturating_sub(total_fees);
        self.vault.locked_profit = locked_before_loss.saturating_sub(loss);

        let params = self.vault.params_mut(strategy)?;
        params.last_report = now;
        let params = *params;
        self.vault.last_report = now;

        info!(
            %strategy,
            %gain,
            %loss,
            %debt_payment,
            credit = %credit,
            total_debt = %params.total_debt,
            "strategy reported"
        );
        self.emit(
            vault,
            &StrategyReported {
                strategy,
                gain,
                loss,
                debtPaid: debt_payment,
                totalGain: params.total_gain,
                totalLoss: params.total_loss,
                totalDebt: params.total_debt,
                debtAdded: credit,
                debtRatio: params.debt_ratio,
            },
        );

        if params.debt_ratio.is_zero() || self.vault.emergency_shutdown {
            self.estimated_total_assets(strategy)
        } else {
            Ok(debt)
        }
    }
}
