//! Share issuance, redemption and pricing

use alloy_primitives::{Address, U256};
use tracing::{debug, warn};

use crate::{
    constants::{max_bps, unit},
    state::State,
    types::{Deposit, Withdraw},
    utils::{
        error::{StrategyError, StrategyResult},
        math::mul_div,
    },
};

impl State {
    /// Outstanding vault shares
    pub fn vault_total_supply(&self) -> U256 {
        self.ledger.total_supply(self.vault.address)
    }

    /// Underlying redeemable for `shares` at the current free funds.
    pub fn share_value(&self, shares: U256) -> StrategyResult<U256> {
        let total_supply = self.vault_total_supply();
        if total_supply.is_zero() {
            return Ok(shares);
        }
        mul_div(shares, self.vault.free_funds(self.now())?, total_supply)
    }

    /// Shares worth `amount` of underlying.
    pub fn shares_for_amount(&self, amount: U256) -> StrategyResult<U256> {
        let free_funds = self.vault.free_funds(self.now())?;
        if free_funds.is_zero() {
            return Ok(U256::ZERO);
        }
        mul_div(amount, self.vault_total_supply(), free_funds)
    }

    /// Value of one whole share
    pub fn price_per_share(&self) -> StrategyResult<U256> {
        let decimals = self.ledger.decimals(self.vault.address)?;
        self.share_value(unit(decimals))
    }

    /// Shares that could be redeemed from idle funds and strategy debt.
    pub fn max_available_shares(&self) -> StrategyResult<U256> {
        let mut shares = self.shares_for_amount(self.vault.total_idle)?;
        for strategy in &self.vault.withdrawal_queue {
            let total_debt = self.vault.strategies(*strategy).total_debt;
            shares += self.shares_for_amount(total_debt)?;
        }
        Ok(shares)
    }

    /// Mints shares worth `amount` of underlying to `to`.
    pub(crate) fn issue_shares_for_amount(
        &mut self,
        to: Address,
        amount: U256,
    ) -> StrategyResult<U256> {
        let total_supply = self.vault_total_supply();
        let shares = if total_supply.is_zero() {
            amount
        } else {
            mul_div(amount, total_supply, self.vault.free_funds(self.now())?)?
        };
        if shares.is_zero() {
            return Err(StrategyError::Custom("shares issued would be zero".to_string()));
        }
        self.ledger.mint(self.vault.address, to, shares)?;
        Ok(shares)
    }

    /// Deposits `amount` of underlying from `caller`, minting shares to `recipient`.
    /// `U256::MAX` deposits the caller's whole balance, bounded by the deposit limit.
    pub fn vault_deposit(
        &mut self,
        caller: Address,
        amount: U256,
        recipient: Address,
    ) -> StrategyResult<U256> {
        if self.vault.emergency_shutdown {
            return Err(StrategyError::VaultShutdown);
        }
        let total_assets = self.vault.total_assets();
        let amount = if amount == U256::MAX {
            self.vault
                .deposit_limit
                .saturating_sub(total_assets)
                .min(self.ledger.balance_of(self.vault.token, caller))
        } else {
            amount
        };
        if total_assets.saturating_add(amount) > self.vault.deposit_limit {
            return Err(StrategyError::DepositLimit);
        }
        if amount.is_zero() {
            return Err(StrategyError::Custom("deposit amount is zero".to_string()));
        }

        let shares = self.issue_shares_for_amount(recipient, amount)?;
        let (token, vault) = (self.vault.token, self.vault.address);
        self.ledger.transfer_from(token, vault, caller, vault, amount)?;
        self.vault.total_idle += amount;

        debug!(%caller, %recipient, %amount, %shares, "vault deposit");
        self.emit(vault, &Deposit { recipient, shares, amount });
        Ok(shares)
    }

    /// Burns up to `max_shares` of `caller` and sends the underlying to `recipient`,
    /// pulling from strategies in queue order when idle funds fall short.
    /// Reverts when the realised loss exceeds `max_loss` bps of the requested value.
    pub fn vault_withdraw(
        &mut self,
        caller: Address,
        max_shares: U256,
        recipient: Address,
        max_loss: U256,
    ) -> StrategyResult<U256> {
        if max_loss > max_bps() {
            return Err(StrategyError::Custom("max loss above 100%".to_string()));
        }
        let vault = self.vault.address;
        let balance = self.ledger.balance_of(vault, caller);
        let mut shares = if max_shares == U256::MAX { balance } else { max_shares };
        if shares > balance {
            return Err(StrategyError::InsufficientBalance {
                token: vault,
                holder: caller,
                balance,
                required: shares,
            });
        }
        if shares.is_zero() {
            return Err(StrategyError::NoShares);
        }

        let mut value = self.share_value(shares)?;
        let mut vault_balance = self.vault.total_idle;

        if value > vault_balance {
            let mut total_loss = U256::ZERO;
            for strategy in self.vault.withdrawal_queue.clone() {
                if value <= vault_balance {
                    break;
                }
                let amount_needed =
                    (value - vault_balance).min(self.vault.strategies(strategy).total_debt);
                if amount_needed.is_zero() {
                    continue;
                }

                let token = self.vault.token;
                let pre_balance = self.ledger.balance_of(token, vault);
                let loss = self.strategy_withdraw(vault, strategy, amount_needed)?;
                let withdrawn = self.ledger.balance_of(token, vault).saturating_sub(pre_balance);
                vault_balance += withdrawn;

                if !loss.is_zero() {
                    value = value.saturating_sub(loss);
                    total_loss += loss;
                    self.vault.report_loss(strategy, loss)?;
                }

                let params = self.vault.params_mut(strategy)?;
                params.total_debt = params.total_debt.saturating_sub(withdrawn);
                self.vault.total_debt = self.vault.total_debt.saturating_sub(withdrawn);
            }

            self.vault.total_idle = vault_balance;
            if value > vault_balance {
                value = vault_balance;
                shares = self.shares_for_amount(value + total_loss)?.min(balance);
            }

            if total_loss > mul_div(max_loss, value + total_loss, max_bps())? {
                warn!(%total_loss, %value, "withdrawal loss above max loss");
                return Err(StrategyError::MaxLoss { loss: total_loss });
            }
        }

        self.ledger.burn(vault, caller, shares)?;
        self.vault.total_idle -= value;
        self.ledger.transfer(self.vault.token, vault, recipient, value)?;

        debug!(%caller, %recipient, %shares, %value, "vault withdraw");
        self.emit(
            vault,
            &Withdraw {
                recipient,
                shares,
                amount: value,
            },
        );
        Ok(value)
    }
}
