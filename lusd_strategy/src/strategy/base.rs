//! Strategy lifecycle shared by every Yearn strategy: harvest, tend, triggers,
//! emergency exit, migration and the base setters.

use alloy_primitives::{Address, U256};
use tracing::{info, warn};

use crate::{
    health_check::{HarvestOutcome, HealthCheck},
    state::State,
    types::{
        EmergencyExitEnabled, Harvested, SetDoHealthCheck, SetHealthCheck, UpdatedDebtThreshold,
        UpdatedKeeper, UpdatedMaxReportDelay, UpdatedMinReportDelay, UpdatedProfitFactor,
        UpdatedRewards, UpdatedStrategist,
    },
    utils::error::{StrategyError, StrategyResult},
};

fn non_zero(address: Address) -> StrategyResult<()> {
    if address == Address::ZERO {
        return Err(StrategyError::Custom("zero address".to_string()));
    }
    Ok(())
}

impl State {
    /// Realises profit or loss, reports it to the vault and redeploys what the vault lends.
    ///
    /// In emergency exit the whole position is liquidated and everything above the debt
    /// outstanding counts as profit. The health check, when configured and enabled, rejects
    /// the harvest with `!healthcheck`. A harvest run with the check disabled re-enables it.
    pub fn harvest(
        &mut self,
        caller: Address,
        strategy: Address,
    ) -> StrategyResult<HarvestOutcome> {
        self.strategy_roles(strategy)?.only_keepers(caller)?;

        let debt_outstanding = self.vault.debt_outstanding(strategy)?;
        let (profit, loss, debt_payment) = if self.strategy(strategy)?.data.emergency_exit {
            let amount_freed = self.liquidate_all_positions(strategy)?;
            let loss = debt_outstanding.saturating_sub(amount_freed);
            let profit = amount_freed.saturating_sub(debt_outstanding);
            (profit, loss, debt_outstanding - loss)
        } else {
            self.prepare_return(strategy, debt_outstanding)?
        };

        let total_debt = self.vault.strategies(strategy).total_debt;
        let debt_outstanding = self.vault_report(strategy, profit, loss, debt_payment)?;
        self.adjust_position(strategy, debt_outstanding)?;

        let outcome = HarvestOutcome {
            profit,
            loss,
            debt_payment,
            debt_outstanding,
            total_debt,
        };

        let do_health_check = self.strategy(strategy)?.data.do_health_check;
        let health_check = self.strategy(strategy)?.settings.health_check;
        if do_health_check && health_check != Address::ZERO {
            if health_check != self.health_check.address {
                return Err(StrategyError::Custom(format!(
                    "no health check deployed at {health_check}"
                )));
            }
            if !self.health_check.check(strategy, &outcome) {
                return Err(StrategyError::HealthCheck);
            }
        } else {
            self.strategy_mut(strategy)?.data.do_health_check(true);
            self.emit(strategy, &SetDoHealthCheck { doHealthCheck: true });
        }

        info!(
            %strategy,
            %profit,
            %loss,
            %debt_payment,
            %debt_outstanding,
            "harvested"
        );
        self.emit(
            strategy,
            &Harvested {
                profit,
                loss,
                debtPayment: debt_payment,
                debtOutstanding: debt_outstanding,
            },
        );
        Ok(outcome)
    }

    /// Redeploys idle want without reporting.
    pub fn tend(&mut self, caller: Address, strategy: Address) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_keepers(caller)?;
        let debt_outstanding = self.vault.debt_outstanding(strategy)?;
        self.adjust_position(strategy, debt_outstanding)
    }

    /// Whether a keeper paying `call_cost` wei of gas should harvest now.
    pub fn harvest_trigger(&self, strategy: Address, call_cost: U256) -> StrategyResult<bool> {
        let settings = &self.strategy(strategy)?.settings;
        let call_cost = self.eth_to_want(call_cost)?;
        let params = self.vault.strategies(strategy);
        if !params.is_activated() {
            return Ok(false);
        }

        let since_last_report = self.now().saturating_sub(params.last_report);
        if since_last_report < settings.min_report_delay {
            return Ok(false);
        }
        if since_last_report >= settings.max_report_delay {
            return Ok(true);
        }

        if self.vault.debt_outstanding(strategy)? > settings.debt_threshold {
            return Ok(true);
        }

        let total = self.estimated_total_assets(strategy)?;
        if total.saturating_add(settings.debt_threshold) < params.total_debt {
            return Ok(true);
        }

        let profit = total.saturating_sub(params.total_debt);
        let credit = self.vault.credit_available(strategy)?;
        Ok(settings.profit_factor.saturating_mul(call_cost) < credit.saturating_add(profit))
    }

    /// Whether idle want is waiting to be deposited. The call cost is not weighed.
    pub fn tend_trigger(&self, strategy: Address, _call_cost: U256) -> StrategyResult<bool> {
        let state = self.strategy(strategy)?;
        if state.data.emergency_exit || !self.strategy_is_active(strategy)? {
            return Ok(false);
        }
        let idle = self.ledger.balance_of(state.settings.want, strategy);
        Ok(idle > self.vault.debt_outstanding(strategy)?)
    }

    /// Winds the strategy down: the vault revokes it and the next harvest returns everything.
    pub fn set_emergency_exit(&mut self, caller: Address, strategy: Address) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_emergency_authorized(caller)?;
        self.strategy_mut(strategy)?.data.emergency_exit(true);
        if !self.vault.strategies(strategy).debt_ratio.is_zero() {
            self.revoke_strategy(strategy, strategy)?;
        }
        warn!(%strategy, "emergency exit enabled");
        self.emit(strategy, &EmergencyExitEnabled {});
        Ok(())
    }

    /// Sends the whole balance of a stray `token` to governance.
    /// Want and vault shares cannot be swept.
    pub fn sweep(
        &mut self,
        caller: Address,
        strategy: Address,
        token: Address,
    ) -> StrategyResult<U256> {
        let roles = self.strategy_roles(strategy)?;
        roles.only_governance(caller)?;
        let settings = &self.strategy(strategy)?.settings;
        if token == settings.want {
            return Err(StrategyError::ProtectedWant);
        }
        if token == settings.vault {
            return Err(StrategyError::ProtectedShares);
        }
        let balance = self.ledger.balance_of(token, strategy);
        self.ledger.transfer(token, strategy, roles.governance, balance)?;
        Ok(balance)
    }

    /// Frees `amount_needed` of want for the vault and returns the loss taken doing so.
    pub fn strategy_withdraw(
        &mut self,
        caller: Address,
        strategy: Address,
        amount_needed: U256,
    ) -> StrategyResult<U256> {
        let settings = &self.strategy(strategy)?.settings;
        if caller != settings.vault {
            return Err(StrategyError::OnlyVault);
        }
        let want = settings.want;
        let (amount_freed, loss) = self.liquidate_position(strategy, amount_needed)?;
        self.ledger.transfer(want, strategy, caller, amount_freed)?;
        Ok(loss)
    }

    /// Hands every asset of `strategy` over to `new_strategy`.
    pub fn strategy_migrate(
        &mut self,
        caller: Address,
        strategy: Address,
        new_strategy: Address,
    ) -> StrategyResult<()> {
        let settings = &self.strategy(strategy)?.settings;
        if caller != settings.vault {
            return Err(StrategyError::OnlyVault);
        }
        if self.strategy(new_strategy)?.settings.vault != settings.vault {
            return Err(StrategyError::Custom("new strategy has another vault".to_string()));
        }
        let want = settings.want;
        self.prepare_migration(strategy, new_strategy)?;
        let balance = self.ledger.balance_of(want, strategy);
        self.ledger.transfer(want, strategy, new_strategy, balance)
    }

    pub fn set_strategist(
        &mut self,
        caller: Address,
        strategy: Address,
        strategist: Address,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_authorized(caller)?;
        non_zero(strategist)?;
        self.strategy_mut(strategy)?.settings.strategist(strategist);
        self.emit(strategy, &UpdatedStrategist { newStrategist: strategist });
        Ok(())
    }

    pub fn set_keeper(
        &mut self,
        caller: Address,
        strategy: Address,
        keeper: Address,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_authorized(caller)?;
        non_zero(keeper)?;
        self.strategy_mut(strategy)?.settings.keeper(keeper);
        self.emit(strategy, &UpdatedKeeper { newKeeper: keeper });
        Ok(())
    }

    pub fn set_strategy_rewards(
        &mut self,
        caller: Address,
        strategy: Address,
        rewards: Address,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_strategist(caller)?;
        non_zero(rewards)?;
        self.strategy_mut(strategy)?.settings.rewards(rewards);
        self.emit(strategy, &UpdatedRewards { rewards });
        Ok(())
    }

    pub fn set_min_report_delay(
        &mut self,
        caller: Address,
        strategy: Address,
        delay: u64,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_authorized(caller)?;
        self.strategy_mut(strategy)?.settings.min_report_delay(delay);
        self.emit(strategy, &UpdatedMinReportDelay { delay: U256::from(delay) });
        Ok(())
    }

    pub fn set_max_report_delay(
        &mut self,
        caller: Address,
        strategy: Address,
        delay: u64,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_authorized(caller)?;
        self.strategy_mut(strategy)?.settings.max_report_delay(delay);
        self.emit(strategy, &UpdatedMaxReportDelay { delay: U256::from(delay) });
        Ok(())
    }

    pub fn set_profit_factor(
        &mut self,
        caller: Address,
        strategy: Address,
        profit_factor: U256,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_authorized(caller)?;
        self.strategy_mut(strategy)?.settings.profit_factor(profit_factor);
        self.emit(strategy, &UpdatedProfitFactor { profitFactor: profit_factor });
        Ok(())
    }

    pub fn set_debt_threshold(
        &mut self,
        caller: Address,
        strategy: Address,
        debt_threshold: U256,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_authorized(caller)?;
        self.strategy_mut(strategy)?.settings.debt_threshold(debt_threshold);
        self.emit(strategy, &UpdatedDebtThreshold { debtThreshold: debt_threshold });
        Ok(())
    }

    pub fn set_health_check(
        &mut self,
        caller: Address,
        strategy: Address,
        health_check: Address,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_vault_managers(caller)?;
        self.strategy_mut(strategy)?.settings.health_check(health_check);
        self.emit(strategy, &SetHealthCheck { healthCheck: health_check });
        Ok(())
    }

    pub fn set_do_health_check(
        &mut self,
        caller: Address,
        strategy: Address,
        do_health_check: bool,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_vault_managers(caller)?;
        self.strategy_mut(strategy)?.data.do_health_check(do_health_check);
        self.emit(strategy, &SetDoHealthCheck { doHealthCheck: do_health_check });
        Ok(())
    }
}
