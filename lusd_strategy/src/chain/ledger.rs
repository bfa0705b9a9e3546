//! ERC-20 and native currency balances

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::{Address, U256};
use tracing::trace;

use crate::utils::error::{arithmetic_err, StrategyError, StrategyResult};

/// Token metadata and supply
#[derive(Clone, Debug, PartialEq)]
pub struct TokenInfo {
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: U256,
}

/// All fungible balances of the simulated chain.
#[derive(Clone, Debug, Default)]
pub struct TokenLedger {
    /// Registered tokens
    tokens: BTreeMap<Address, TokenInfo>,
    /// (token, holder) -> balance
    balances: HashMap<(Address, Address), U256>,
    /// (token, owner, spender) -> allowance
    allowances: HashMap<(Address, Address, Address), U256>,
    /// holder -> native currency balance
    native: HashMap<Address, U256>,
}

impl TokenLedger {
    /// Registers a token. Registering twice keeps the original metadata.
    pub fn register(&mut self, token: Address, symbol: &str, decimals: u8) -> &mut Self {
        self.tokens.entry(token).or_insert_with(|| TokenInfo {
            symbol: symbol.to_string(),
            decimals,
            total_supply: U256::ZERO,
        });
        self
    }

    pub fn token(&self, token: Address) -> StrategyResult<&TokenInfo> {
        self.tokens.get(&token).ok_or(StrategyError::NonExistentValue)
    }

    pub fn decimals(&self, token: Address) -> StrategyResult<u8> {
        self.token(token).map(|info| info.decimals)
    }

    pub fn total_supply(&self, token: Address) -> U256 {
        self.tokens
            .get(&token)
            .map(|info| info.total_supply)
            .unwrap_or_default()
    }

    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    pub fn native_balance(&self, holder: Address) -> U256 {
        self.native.get(&holder).copied().unwrap_or_default()
    }

    /// Creates `amount` new tokens for `to`.
    pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> StrategyResult<()> {
        let info = self
            .tokens
            .get_mut(&token)
            .ok_or(StrategyError::NonExistentValue)?;
        info.total_supply = info
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| arithmetic_err("Total supply overflowed."))?;
        let balance = self.balances.entry((token, to)).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or_else(|| arithmetic_err("Balance overflowed."))?;
        trace!(%token, %to, %amount, "mint");
        Ok(())
    }

    /// Destroys `amount` tokens held by `from`.
    pub fn burn(&mut self, token: Address, from: Address, amount: U256) -> StrategyResult<()> {
        self.debit(token, from, amount)?;
        let info = self
            .tokens
            .get_mut(&token)
            .ok_or(StrategyError::NonExistentValue)?;
        info.total_supply = info.total_supply.saturating_sub(amount);
        trace!(%token, %from, %amount, "burn");
        Ok(())
    }

    /// Moves `amount` of `token` from `from` to `to`.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        if !self.tokens.contains_key(&token) {
            return Err(StrategyError::NonExistentValue);
        }
        self.debit(token, from, amount)?;
        *self.balances.entry((token, to)).or_default() += amount;
        trace!(%token, %from, %to, %amount, "transfer");
        Ok(())
    }

    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        self.allowances.insert((token, owner, spender), amount);
    }

    /// Moves tokens on behalf of `owner`, consuming the spender's allowance.
    /// A `U256::MAX` allowance is never consumed.
    pub fn transfer_from(
        &mut self,
        token: Address,
        spender: Address,
        owner: Address,
        to: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        let allowance = self.allowance(token, owner, spender);
        if allowance < amount {
            return Err(StrategyError::InsufficientAllowance {
                token,
                owner,
                spender,
            });
        }
        self.transfer(token, owner, to, amount)?;
        if allowance != U256::MAX {
            self.allowances
                .insert((token, owner, spender), allowance - amount);
        }
        Ok(())
    }

    /// Credits native currency out of thin air (test faucet / forced balance).
    pub fn fund_native(&mut self, holder: Address, amount: U256) {
        *self.native.entry(holder).or_default() += amount;
    }

    pub fn transfer_native(
        &mut self,
        from: Address,
        to: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        let balance = self.native_balance(from);
        if balance < amount {
            return Err(StrategyError::InsufficientNativeBalance { holder: from });
        }
        self.native.insert(from, balance - amount);
        *self.native.entry(to).or_default() += amount;
        Ok(())
    }

    /// WETH `deposit`: locks native currency in the `weth` contract and mints as much WETH.
    pub fn wrap_native(
        &mut self,
        weth: Address,
        holder: Address,
        amount: U256,
    ) -> StrategyResult<()> {
        self.transfer_native(holder, weth, amount)?;
        self.mint(weth, holder, amount)
    }

    fn debit(&mut self, token: Address, from: Address, amount: U256) -> StrategyResult<()> {
        let balance = self.balance_of(token, from);
        if balance < amount {
            return Err(StrategyError::InsufficientBalance {
                token,
                holder: from,
                balance,
                required: amount,
            });
        }
        self.balances.insert((token, from), balance - amount);
        Ok(())
    }
}
