//! Transaction entry points: each call runs as one atomic transaction on the chain.

use std::sync::Arc;

use alloy_primitives::{Address, U256};

use crate::{
    chain::Chain,
    constants::DEFAULT_MAX_LOSS_BPS,
    health_check::{HarvestOutcome, HealthCheck},
    journal::LogType,
    utils::error::StrategyResult,
};

/// Token movements with any address as sender
impl Chain {
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.execute("token.transfer", |state, _| {
            state.ledger.transfer(token, from, to, amount)
        })
    }

    pub fn approve(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.execute("token.approve", |state, _| {
            state.ledger.approve(token, owner, spender, amount);
            Ok(())
        })
    }

    pub fn transfer_native(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.execute("native.transfer", |state, _| {
            state.ledger.transfer_native(from, to, amount)
        })
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.state.ledger.balance_of(token, holder)
    }

    pub fn native_balance(&self, holder: Address) -> U256 {
        self.state.ledger.native_balance(holder)
    }
}

/// Vault
impl Chain {
    /// Approves the vault for `amount` and deposits it, shares to `caller`.
    pub fn deposit(&mut self, caller: Address, amount: U256) -> StrategyResult<U256> {
        self.execute("vault.deposit", |state, journal| {
            let (token, vault) = (state.vault.token, state.vault.address);
            state.ledger.approve(token, caller, vault, amount);
            let shares = state.vault_deposit(caller, amount, caller)?;
            journal.append_note(
                Ok(()),
                LogType::Info,
                format!("{caller} minted {shares} shares"),
            );
            Ok(shares)
        })
    }

    /// Redeems `shares` of `caller` accepting the default max loss of 1 bps.
    pub fn withdraw(&mut self, caller: Address, shares: U256) -> StrategyResult<U256> {
        self.withdraw_to(caller, shares, caller, U256::from(DEFAULT_MAX_LOSS_BPS))
    }

    pub fn withdraw_to(
        &mut self,
        caller: Address,
        shares: U256,
        recipient: Address,
        max_loss: U256,
    ) -> StrategyResult<U256> {
        self.execute("vault.withdraw", |state, journal| {
            let amount = state.vault_withdraw(caller, shares, recipient, max_loss)?;
            journal.append_note(
                Ok(()),
                LogType::Info,
                format!("{recipient} received {amount}"),
            );
            Ok(amount)
        })
    }

    pub fn add_strategy(
        &mut self,
        caller: Address,
        strategy: Address,
        debt_ratio: U256,
        min_debt_per_harvest: U256,
        max_debt_per_harvest: U256,
        performance_fee: U256,
    ) -> StrategyResult<()> {
        self.execute("vault.add_strategy", |state, _| {
            state.add_strategy(
                caller,
                strategy,
                debt_ratio,
                min_debt_per_harvest,
                max_debt_per_harvest,
                performance_fee,
            )
        })
    }

    pub fn update_strategy_debt_ratio(
        &mut self,
        caller: Address,
        strategy: Address,
        debt_ratio: U256,
    ) -> StrategyResult<()> {
        self.execute("vault.update_strategy_debt_ratio", |state, _| {
            state.update_strategy_debt_ratio(caller, strategy, debt_ratio)
        })
    }

    pub fn revoke_strategy(&mut self, caller: Address, strategy: Address) -> StrategyResult<()> {
        self.execute("vault.revoke_strategy", |state, _| state.revoke_strategy(caller, strategy))
    }

    pub fn migrate_strategy(
        &mut self,
        caller: Address,
        old: Address,
        new: Address,
    ) -> StrategyResult<()> {
        self.execute("vault.migrate_strategy", |state, _| {
            state.migrate_strategy(caller, old, new)
        })
    }

    pub fn set_emergency_shutdown(&mut self, caller: Address, active: bool) -> StrategyResult<()> {
        self.execute("vault.set_emergency_shutdown", |state, _| {
            state.set_emergency_shutdown(caller, active)
        })
    }

    pub fn set_deposit_limit(&mut self, caller: Address, limit: U256) -> StrategyResult<()> {
        self.execute("vault.set_deposit_limit", |state, _| {
            state.set_deposit_limit(caller, limit)
        })
    }

    pub fn update_strategy_min_debt_per_harvest(
        &mut self,
        caller: Address,
        strategy: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.execute("vault.update_strategy_min_debt_per_harvest", |state, _| {
            state.update_strategy_min_debt_per_harvest(caller, strategy, amount)
        })
    }

    pub fn update_strategy_max_debt_per_harvest(
        &mut self,
        caller: Address,
        strategy: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.execute("vault.update_strategy_max_debt_per_harvest", |state, _| {
            state.update_strategy_max_debt_per_harvest(caller, strategy, amount)
        })
    }

    pub fn update_strategy_performance_fee(
        &mut self,
        caller: Address,
        strategy: Address,
        fee: U256,
    ) -> StrategyResult<()> {
        self.execute("vault.update_strategy_performance_fee", |state, _| {
            state.update_strategy_performance_fee(caller, strategy, fee)
        })
    }

    pub fn set_performance_fee(&mut self, caller: Address, fee: U256) -> StrategyResult<()> {
        self.execute("vault.set_performance_fee", |state, _| {
            state.set_performance_fee(caller, fee)
        })
    }

    pub fn set_management_fee(&mut self, caller: Address, fee: U256) -> StrategyResult<()> {
        self.execute("vault.set_management_fee", |state, _| {
            state.set_management_fee(caller, fee)
        })
    }

    pub fn set_management(&mut self, caller: Address, management: Address) -> StrategyResult<()> {
        self.execute("vault.set_management", |state, _| {
            state.set_management(caller, management)
        })
    }

    pub fn set_rewards(&mut self, caller: Address, rewards: Address) -> StrategyResult<()> {
        self.execute("vault.set_rewards", |state, _| state.set_rewards(caller, rewards))
    }

    pub fn set_guardian(&mut self, caller: Address, guardian: Address) -> StrategyResult<()> {
        self.execute("vault.set_guardian", |state, _| state.set_guardian(caller, guardian))
    }

    pub fn set_locked_profit_degradation(
        &mut self,
        caller: Address,
        degradation: U256,
    ) -> StrategyResult<()> {
        self.execute("vault.set_locked_profit_degradation", |state, _| {
            state.set_locked_profit_degradation(caller, degradation)
        })
    }
}

/// Strategy
impl Chain {
    pub fn harvest(
        &mut self,
        caller: Address,
        strategy: Address,
    ) -> StrategyResult<HarvestOutcome> {
        self.execute("strategy.harvest", |state, journal| {
            let outcome = state.harvest(caller, strategy)?;
            journal.append_note(
                Ok(()),
                LogType::Report,
                format!(
                    "profit {} loss {} debt payment {} debt outstanding {}",
                    outcome.profit, outcome.loss, outcome.debt_payment, outcome.debt_outstanding
                ),
            );
            Ok(outcome)
        })
    }

    pub fn tend(&mut self, caller: Address, strategy: Address) -> StrategyResult<()> {
        self.execute("strategy.tend", |state, _| state.tend(caller, strategy))
    }

    pub fn set_emergency_exit(&mut self, caller: Address, strategy: Address) -> StrategyResult<()> {
        self.execute("strategy.set_emergency_exit", |state, _| {
            state.set_emergency_exit(caller, strategy)
        })
    }

    pub fn sweep(
        &mut self,
        caller: Address,
        strategy: Address,
        token: Address,
    ) -> StrategyResult<U256> {
        self.execute("strategy.sweep", |state, _| state.sweep(caller, strategy, token))
    }

    pub fn deposit_lusd(
        &mut self,
        caller: Address,
        strategy: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.execute("strategy.deposit_lusd", |state, _| {
            state.deposit_lusd(caller, strategy, amount)
        })
    }

    pub fn withdraw_lusd(
        &mut self,
        caller: Address,
        strategy: Address,
        amount: U256,
    ) -> StrategyResult<U256> {
        self.execute("strategy.withdraw_lusd", |state, _| {
            state.withdraw_lusd(caller, strategy, amount)
        })
    }

    pub fn claim_rewards(&mut self, caller: Address, strategy: Address) -> StrategyResult<()> {
        self.execute("strategy.claim_rewards", |state, _| {
            state.claim_rewards(caller, strategy)
        })
    }

    pub fn sell_lqty_for_dai(
        &mut self,
        caller: Address,
        strategy: Address,
    ) -> StrategyResult<U256> {
        self.execute("strategy.sell_lqty_for_dai", |state, journal| {
            let bought = state.sell_lqty_for_dai(caller, strategy)?;
            journal.append_note(Ok(()), LogType::Swap, format!("LQTY -> {bought} DAI"));
            Ok(bought)
        })
    }

    pub fn sell_eth_for_dai(&mut self, caller: Address, strategy: Address) -> StrategyResult<U256> {
        self.execute("strategy.sell_eth_for_dai", |state, journal| {
            let bought = state.sell_eth_for_dai(caller, strategy)?;
            journal.append_note(Ok(()), LogType::Swap, format!("ETH -> {bought} DAI"));
            Ok(bought)
        })
    }

    pub fn sell_dai_for_lusd(
        &mut self,
        caller: Address,
        strategy: Address,
    ) -> StrategyResult<U256> {
        self.execute("strategy.sell_dai_for_lusd", |state, journal| {
            let bought = state.sell_dai_for_lusd(caller, strategy)?;
            journal.append_note(Ok(()), LogType::Swap, format!("DAI -> {bought} LUSD"));
            Ok(bought)
        })
    }

    pub fn swallow_eth(&mut self, caller: Address, strategy: Address) -> StrategyResult<U256> {
        self.execute("strategy.swallow_eth", |state, _| state.swallow_eth(caller, strategy))
    }

    pub fn wrap_eth(&mut self, caller: Address, strategy: Address) -> StrategyResult<U256> {
        self.execute("strategy.wrap_eth", |state, _| state.wrap_eth(caller, strategy))
    }

    pub fn set_do_health_check(
        &mut self,
        caller: Address,
        strategy: Address,
        enabled: bool,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_do_health_check", |state, _| {
            state.set_do_health_check(caller, strategy, enabled)
        })
    }

    pub fn set_twap_enabled(
        &mut self,
        caller: Address,
        strategy: Address,
        enabled: bool,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_twap_enabled", |state, _| {
            state.set_twap_enabled(caller, strategy, enabled)
        })
    }

    pub fn set_convert_dai_to_lusd_on_curve(
        &mut self,
        caller: Address,
        strategy: Address,
        on_curve: bool,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_convert_dai_to_lusd_on_curve", |state, _| {
            state.set_convert_dai_to_lusd_on_curve(caller, strategy, on_curve)
        })
    }

    pub fn set_swap_fees(
        &mut self,
        caller: Address,
        strategy: Address,
        fees: (u32, u32, u32),
    ) -> StrategyResult<()> {
        self.execute("strategy.set_swap_fees", |state, _| {
            state.set_swap_fees(caller, strategy, fees)
        })
    }

    pub fn set_min_expected_swap_percentage(
        &mut self,
        caller: Address,
        strategy: Address,
        percentage: U256,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_min_expected_swap_percentage", |state, _| {
            state.set_min_expected_swap_percentage(caller, strategy, percentage)
        })
    }
}

/// Strategy roles and reporting
impl Chain {
    pub fn set_strategist(
        &mut self,
        caller: Address,
        strategy: Address,
        strategist: Address,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_strategist", |state, _| {
            state.set_strategist(caller, strategy, strategist)
        })
    }

    pub fn set_keeper(
        &mut self,
        caller: Address,
        strategy: Address,
        keeper: Address,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_keeper", |state, _| {
            state.set_keeper(caller, strategy, keeper)
        })
    }

    pub fn set_strategy_rewards(
        &mut self,
        caller: Address,
        strategy: Address,
        rewards: Address,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_rewards", |state, _| {
            state.set_strategy_rewards(caller, strategy, rewards)
        })
    }

    pub fn set_min_report_delay(
        &mut self,
        caller: Address,
        strategy: Address,
        delay: u64,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_min_report_delay", |state, _| {
            state.set_min_report_delay(caller, strategy, delay)
        })
    }

    pub fn set_max_report_delay(
        &mut self,
        caller: Address,
        strategy: Address,
        delay: u64,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_max_report_delay", |state, _| {
            state.set_max_report_delay(caller, strategy, delay)
        })
    }

    pub fn set_profit_factor(
        &mut self,
        caller: Address,
        strategy: Address,
        profit_factor: U256,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_profit_factor", |state, _| {
            state.set_profit_factor(caller, strategy, profit_factor)
        })
    }

    pub fn set_debt_threshold(
        &mut self,
        caller: Address,
        strategy: Address,
        debt_threshold: U256,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_debt_threshold", |state, _| {
            state.set_debt_threshold(caller, strategy, debt_threshold)
        })
    }

    /// `Address::ZERO` turns the health check off for `strategy`.
    pub fn set_health_check(
        &mut self,
        caller: Address,
        strategy: Address,
        health_check: Address,
    ) -> StrategyResult<()> {
        self.execute("strategy.set_health_check", |state, _| {
            state.set_health_check(caller, strategy, health_check)
        })
    }
}

/// Common health check administration
impl Chain {
    pub fn set_health_check_governance(
        &mut self,
        caller: Address,
        governance: Address,
    ) -> StrategyResult<()> {
        self.execute("health_check.set_governance", |state, _| {
            state.health_check.set_governance(caller, governance)
        })
    }

    pub fn set_health_check_management(
        &mut self,
        caller: Address,
        management: Address,
    ) -> StrategyResult<()> {
        self.execute("health_check.set_management", |state, _| {
            state.health_check.set_management(caller, management)
        })
    }

    pub fn set_profit_limit_ratio(&mut self, caller: Address, ratio: U256) -> StrategyResult<()> {
        self.execute("health_check.set_profit_limit_ratio", |state, _| {
            state.health_check.set_profit_limit_ratio(caller, ratio)
        })
    }

    pub fn set_loss_limit_ratio(&mut self, caller: Address, ratio: U256) -> StrategyResult<()> {
        self.execute("health_check.set_loss_limit_ratio", |state, _| {
            state.health_check.set_loss_limit_ratio(caller, ratio)
        })
    }

    pub fn set_strategy_limits(
        &mut self,
        caller: Address,
        strategy: Address,
        profit_limit_ratio: U256,
        loss_limit_ratio: U256,
    ) -> StrategyResult<()> {
        self.execute("health_check.set_strategy_limits", |state, _| {
            state.health_check.set_strategy_limits(
                caller,
                strategy,
                profit_limit_ratio,
                loss_limit_ratio,
            )
        })
    }

    pub fn set_custom_check(
        &mut self,
        caller: Address,
        strategy: Address,
        check: Arc<dyn HealthCheck + Send + Sync>,
    ) -> StrategyResult<()> {
        self.execute("health_check.set_check", |state, _| {
            state.health_check.set_check(caller, strategy, check)
        })
    }

    pub fn set_disabled_check(
        &mut self,
        caller: Address,
        strategy: Address,
        disabled: bool,
    ) -> StrategyResult<()> {
        self.execute("health_check.set_disabled_check", |state, _| {
            state.health_check.set_disabled_check(caller, strategy, disabled)
        })
    }
}
