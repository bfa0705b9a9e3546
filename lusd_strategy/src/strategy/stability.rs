//! Stability pool position, reward sales and valuation

use alloy_primitives::{Address, U256};
use tracing::{debug, info};

use crate::{
    constants::{max_bps, DAI, LQTY, MAX_FEE, WETH},
    exchange::uniswap::encode_path,
    state::State,
    utils::{
        error::{StrategyError, StrategyResult},
        math::mul_div,
    },
};

/// Role gated entry points of the stability pool strategy
impl State {
    /// Deposits `amount` of idle LUSD in the stability pool.
    pub fn deposit_lusd(
        &mut self,
        caller: Address,
        strategy: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_keepers(caller)?;
        self.provide_to_sp(strategy, amount)
    }

    /// Withdraws up to `amount` of LUSD from the stability pool, claiming the gains.
    pub fn withdraw_lusd(
        &mut self,
        caller: Address,
        strategy: Address,
        amount: U256,
    ) -> StrategyResult<U256> {
        self.strategy_roles(strategy)?.only_keepers(caller)?;
        self.withdraw_from_sp(strategy, amount)
    }

    /// Sends the strategy's native ETH to governance.
    pub fn swallow_eth(&mut self, caller: Address, strategy: Address) -> StrategyResult<U256> {
        let roles = self.strategy_roles(strategy)?;
        roles.only_governance(caller)?;
        let balance = self.ledger.native_balance(strategy);
        self.ledger.transfer_native(strategy, roles.governance, balance)?;
        info!(%strategy, %balance, "eth swallowed");
        Ok(balance)
    }

    /// Wraps the strategy's native ETH into WETH.
    pub fn wrap_eth(&mut self, caller: Address, strategy: Address) -> StrategyResult<U256> {
        self.strategy_roles(strategy)?.only_governance(caller)?;
        let balance = self.ledger.native_balance(strategy);
        self.ledger.wrap_native(WETH, strategy, balance)?;
        Ok(balance)
    }

    pub fn claim_rewards(&mut self, caller: Address, strategy: Address) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_keepers(caller)?;
        self.claim_and_sell_rewards(strategy)
    }

    pub fn sell_lqty_for_dai(
        &mut self,
        caller: Address,
        strategy: Address,
    ) -> StrategyResult<U256> {
        self.strategy_roles(strategy)?.only_keepers(caller)?;
        self.swap_lqty_for_dai(strategy)
    }

    pub fn sell_eth_for_dai(&mut self, caller: Address, strategy: Address) -> StrategyResult<U256> {
        self.strategy_roles(strategy)?.only_keepers(caller)?;
        self.swap_eth_for_dai(strategy)
    }

    pub fn sell_dai_for_lusd(
        &mut self,
        caller: Address,
        strategy: Address,
    ) -> StrategyResult<U256> {
        self.strategy_roles(strategy)?.only_keepers(caller)?;
        self.swap_dai_for_lusd(strategy)
    }

    pub fn set_twap_enabled(
        &mut self,
        caller: Address,
        strategy: Address,
        enabled: bool,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_emergency_authorized(caller)?;
        self.strategy_mut(strategy)?.settings.twap_enabled(enabled);
        Ok(())
    }

    pub fn set_convert_dai_to_lusd_on_curve(
        &mut self,
        caller: Address,
        strategy: Address,
        on_curve: bool,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_emergency_authorized(caller)?;
        self.strategy_mut(strategy)?.settings.convert_dai_to_lusd_on_curve(on_curve);
        Ok(())
    }

    /// Fees must fit 24 bits. Other tiers are accepted here and revert at the swap,
    /// where no pool exists for them.
    pub fn set_swap_fees(
        &mut self,
        caller: Address,
        strategy: Address,
        (lqty_to_eth, eth_to_dai, dai_to_lusd): (u32, u32, u32),
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_emergency_authorized(caller)?;
        if let Some(&fee) = [lqty_to_eth, eth_to_dai, dai_to_lusd]
            .iter()
            .find(|&&fee| fee > MAX_FEE)
        {
            return Err(StrategyError::InvalidFeeTier(fee));
        }
        self.strategy_mut(strategy)?
            .settings
            .swap_fees(lqty_to_eth, eth_to_dai, dai_to_lusd);
        Ok(())
    }

    pub fn set_min_expected_swap_percentage(
        &mut self,
        caller: Address,
        strategy: Address,
        percentage: U256,
    ) -> StrategyResult<()> {
        self.strategy_roles(strategy)?.only_emergency_authorized(caller)?;
        self.strategy_mut(strategy)?
            .settings
            .min_expected_swap_percentage(percentage);
        Ok(())
    }
}

impl State {
    fn want_balance(&self, strategy: Address) -> StrategyResult<U256> {
        let want = self.strategy(strategy)?.settings.want;
        Ok(self.ledger.balance_of(want, strategy))
    }

    /// Idle LUSD plus the compounded stability pool deposit.
    pub fn total_lusd_balance(&self, strategy: Address) -> StrategyResult<U256> {
        Ok(self.want_balance(strategy)?
            + self.stability_pool.compounded_lusd_deposit(strategy)?)
    }

    /// Native ETH, WETH and the ETH gain pending in the stability pool.
    pub fn total_eth_balance(&self, strategy: Address) -> StrategyResult<U256> {
        Ok(self.ledger.native_balance(strategy)
            + self.ledger.balance_of(WETH, strategy)
            + self.stability_pool.depositor_eth_gain(strategy)?)
    }

    /// LQTY held plus the LQTY gain pending in the stability pool.
    pub fn total_lqty_balance(&self, strategy: Address) -> StrategyResult<U256> {
        Ok(self.ledger.balance_of(LQTY, strategy)
            + self.stability_pool.depositor_lqty_gain(strategy)?)
    }

    /// ETH valued in want at the Chainlink price. LUSD is taken at one dollar.
    pub fn eth_to_want(&self, amount: U256) -> StrategyResult<U256> {
        self.price_feed.convert(amount)
    }

    /// LQTY valued in want through the LQTY/WETH TWAP, zero while the TWAP is disabled.
    pub fn lqty_to_want(&self, strategy: Address, amount: U256) -> StrategyResult<U256> {
        let settings = &self.strategy(strategy)?.settings;
        if !settings.twap_enabled || amount.is_zero() {
            return Ok(U256::ZERO);
        }
        let eth = self.twap_quote(
            (LQTY, settings.lqty_to_eth_fee, WETH),
            amount,
            settings.twap_period,
        )?;
        self.eth_to_want(eth)
    }

    /// LUSD held or deposited plus the value of the unsold LQTY and ETH rewards.
    pub fn estimated_total_assets(&self, strategy: Address) -> StrategyResult<U256> {
        let lqty_value = self.lqty_to_want(strategy, self.total_lqty_balance(strategy)?)?;
        let eth_value = self.eth_to_want(self.total_eth_balance(strategy)?)?;
        Ok(self.total_lusd_balance(strategy)? + lqty_value + eth_value)
    }

    fn has_sp_deposit(&self, strategy: Address) -> bool {
        !self.stability_pool.initial_deposit(strategy).is_zero()
    }

    /// Sells every reward for LUSD. Stability pool gains are claimed first.
    pub(crate) fn claim_and_sell_rewards(&mut self, strategy: Address) -> StrategyResult<()> {
        if self.has_sp_deposit(strategy) {
            self.withdraw_from_sp(strategy, U256::ZERO)?;
        }
        self.swap_lqty_for_dai(strategy)?;
        self.swap_eth_for_dai(strategy)?;
        self.swap_dai_for_lusd(strategy)?;
        Ok(())
    }

    /// LQTY -> WETH -> DAI. There is no price reference for LQTY, so no minimum output.
    pub(crate) fn swap_lqty_for_dai(&mut self, strategy: Address) -> StrategyResult<U256> {
        let balance = self.ledger.balance_of(LQTY, strategy);
        if balance.is_zero() {
            return Ok(U256::ZERO);
        }
        let settings = &self.strategy(strategy)?.settings;
        let path = encode_path(
            &[LQTY, WETH, DAI],
            &[settings.lqty_to_eth_fee, settings.eth_to_dai_fee],
        )?;
        let dai = self.exact_input(strategy, strategy, &path, balance, U256::ZERO)?;
        debug!(%strategy, lqty = %balance, %dai, "sold lqty");
        Ok(dai)
    }

    /// Wraps native ETH and sells all WETH for DAI, at least `min_expected_swap_percentage`
    /// of its Chainlink value.
    pub(crate) fn swap_eth_for_dai(&mut self, strategy: Address) -> StrategyResult<U256> {
        let native = self.ledger.native_balance(strategy);
        if !native.is_zero() {
            self.ledger.wrap_native(WETH, strategy, native)?;
        }
        let balance = self.ledger.balance_of(WETH, strategy);
        if balance.is_zero() {
            return Ok(U256::ZERO);
        }
        let settings = &self.strategy(strategy)?.settings;
        let (fee, percentage) = (settings.eth_to_dai_fee, settings.min_expected_swap_percentage);
        let minimum = mul_div(self.eth_to_want(balance)?, percentage, max_bps())?;
        let dai = self.exact_input_single(strategy, strategy, (WETH, fee, DAI), balance, minimum)?;
        debug!(%strategy, eth = %balance, %dai, %minimum, "sold eth");
        Ok(dai)
    }

    /// Sells all DAI for LUSD on Curve or Uniswap, at least `min_expected_swap_percentage`
    /// of its face value.
    pub(crate) fn swap_dai_for_lusd(&mut self, strategy: Address) -> StrategyResult<U256> {
        let balance = self.ledger.balance_of(DAI, strategy);
        if balance.is_zero() {
            return Ok(U256::ZERO);
        }
        let settings = &self.strategy(strategy)?.settings;
        let (want, fee, on_curve) = (
            settings.want,
            settings.dai_to_lusd_fee,
            settings.convert_dai_to_lusd_on_curve,
        );
        let minimum = mul_div(balance, settings.min_expected_swap_percentage, max_bps())?;
        let lusd = if on_curve {
            let i = self.curve.coin_index(DAI)?;
            let j = self.curve.coin_index(want)?;
            self.curve_exchange(strategy, i, j, balance, minimum)?
        } else {
            self.exact_input_single(strategy, strategy, (DAI, fee, want), balance, minimum)?
        };
        debug!(%strategy, dai = %balance, %lusd, on_curve, "sold dai");
        Ok(lusd)
    }

    /// Sells the rewards, then splits the LUSD above debt into profit and debt payment.
    /// Returns `(profit, loss, debt_payment)`.
    pub(crate) fn prepare_return(
        &mut self,
        strategy: Address,
        debt_outstanding: U256,
    ) -> StrategyResult<(U256, U256, U256)> {
        self.claim_and_sell_rewards(strategy)?;

        let total_assets = self.total_lusd_balance(strategy)?;
        let total_debt = self.vault.strategies(strategy).total_debt;
        let (mut profit, loss) = if total_assets > total_debt {
            (total_assets - total_debt, U256::ZERO)
        } else {
            (U256::ZERO, total_debt - total_assets)
        };

        let (amount_freed, _) = self.liquidate_position(strategy, debt_outstanding + profit)?;
        profit = profit.min(amount_freed);
        let debt_payment = debt_outstanding.min(amount_freed - profit);

        debug!(%strategy, %profit, %loss, %debt_payment, "return prepared");
        Ok((profit, loss, debt_payment))
    }

    /// Deposits idle want above `debt_outstanding` in the stability pool.
    pub(crate) fn adjust_position(
        &mut self,
        strategy: Address,
        debt_outstanding: U256,
    ) -> StrategyResult<()> {
        if self.strategy(strategy)?.data.emergency_exit {
            return Ok(());
        }
        let balance = self.want_balance(strategy)?;
        if balance > debt_outstanding {
            let amount = balance - debt_outstanding;
            self.provide_to_sp(strategy, amount)?;
            debug!(%strategy, %amount, "deposited idle want");
        }
        Ok(())
    }

    /// Frees up to `amount_needed` of want from the stability pool.
    /// Returns `(liquidated, loss)` where the loss is the part that could not be freed.
    pub(crate) fn liquidate_position(
        &mut self,
        strategy: Address,
        amount_needed: U256,
    ) -> StrategyResult<(U256, U256)> {
        let mut balance = self.want_balance(strategy)?;
        if balance < amount_needed && self.has_sp_deposit(strategy) {
            let deposit = self.stability_pool.compounded_lusd_deposit(strategy)?;
            let amount = (amount_needed - balance).min(deposit);
            if !amount.is_zero() {
                self.withdraw_from_sp(strategy, amount)?;
                balance = self.want_balance(strategy)?;
            }
        }
        if amount_needed > balance {
            Ok((balance, amount_needed - balance))
        } else {
            Ok((amount_needed, U256::ZERO))
        }
    }

    /// Withdraws the whole deposit. Rewards are left unsold.
    pub(crate) fn liquidate_all_positions(&mut self, strategy: Address) -> StrategyResult<U256> {
        if self.has_sp_deposit(strategy) {
            self.withdraw_from_sp(strategy, U256::MAX)?;
        }
        self.want_balance(strategy)
    }

    /// Withdraws the deposit and hands every reward token and native ETH to `new_strategy`.
    pub(crate) fn prepare_migration(
        &mut self,
        strategy: Address,
        new_strategy: Address,
    ) -> StrategyResult<()> {
        if self.has_sp_deposit(strategy) {
            self.withdraw_from_sp(strategy, U256::MAX)?;
        }
        for token in [LQTY, WETH, DAI] {
            let balance = self.ledger.balance_of(token, strategy);
            if !balance.is_zero() {
                self.ledger.transfer(token, strategy, new_strategy, balance)?;
            }
        }
        let native = self.ledger.native_balance(strategy);
        if !native.is_zero() {
            self.ledger.transfer_native(strategy, new_strategy, native)?;
        }
        info!(%strategy, %new_strategy, "position handed over");
        Ok(())
    }
}
