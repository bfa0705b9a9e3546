//! Shared deployment and helpers for the end-to-end scenarios
#![allow(dead_code)]

use alloy_primitives::{Address, U256};
use lusd_strategy::{
    chain::accounts::Accounts,
    constants::{LQTY, LUSD},
    tokens,
    utils::math::approx_eq,
    vault::StrategyParams,
    Chain, ChainConfig, StrategyError, StrategyResult,
};

/// 1e-5 as an e18 fraction
pub const RELATIVE_APPROX: u64 = 10_000_000_000_000;

/// Six hours, enough for reported profit to unlock
pub const PROFIT_UNLOCK: u64 = 3_600 * 6;

pub const DAY: u64 = 24 * 3_600;

pub struct Fixture {
    pub chain: Chain,
    pub accounts: Accounts,
    /// Strategy added to the vault at deployment
    pub strategy: Address,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(ChainConfig::default())
    }

    pub fn with_config(config: ChainConfig) -> Self {
        let chain = Chain::deploy(config).expect("Failed to deploy chain");
        let accounts = chain.accounts.clone();
        let strategy = chain.strategy;
        Self {
            chain,
            accounts,
            strategy,
        }
    }

    /// Fixture whose user holds `amount` LUSD
    pub fn with_user_funds(amount: U256) -> Self {
        let mut fixture = Self::new();
        let (whale, user) = (fixture.accounts.lusd_whale, fixture.accounts.user);
        fixture
            .chain
            .transfer(LUSD, whale, user, amount)
            .expect("Failed to fund user");
        fixture
    }

    pub fn vault(&self) -> Address {
        self.chain.state.vault.address
    }

    pub fn deposit(&mut self, from: Address, amount: U256) {
        self.chain.deposit(from, amount).expect("Failed to deposit");
    }

    /// Harvest by the keeper after one second
    pub fn harvest(&mut self) -> StrategyResult<()> {
        let (keeper, strategy) = (self.accounts.keeper, self.strategy);
        self.chain.sleep(1);
        self.chain.harvest(keeper, strategy).map(|_| ())
    }

    pub fn unlock_profit(&mut self) {
        self.chain.sleep(PROFIT_UNLOCK).mine(1);
    }

    pub fn eta(&self) -> U256 {
        self.eta_of(self.strategy)
    }

    pub fn eta_of(&self, strategy: Address) -> U256 {
        self.chain
            .state
            .estimated_total_assets(strategy)
            .expect("Failed to value strategy")
    }

    pub fn params(&self) -> StrategyParams {
        self.chain.state.vault.strategies(self.strategy)
    }

    pub fn price_per_share(&self) -> U256 {
        self.chain.state.price_per_share().expect("Failed to price shares")
    }

    pub fn total_assets(&self) -> U256 {
        self.chain.state.vault.total_assets()
    }

    pub fn balance(&self, token: Address, holder: Address) -> U256 {
        self.chain.balance_of(token, holder)
    }

    pub fn send_lusd(&mut self, to: Address, amount: U256) {
        let whale = self.accounts.lusd_whale;
        self.chain
            .transfer(LUSD, whale, to, amount)
            .expect("Failed to send LUSD");
    }

    pub fn send_lqty(&mut self, to: Address, amount: U256) {
        let whale = self.accounts.lqty_whale;
        self.chain
            .transfer(LQTY, whale, to, amount)
            .expect("Failed to send LQTY");
    }

    /// Native ETH, the way liquidation gains arrive
    pub fn send_eth(&mut self, to: Address, amount: U256) {
        let whale = self.accounts.eth_whale;
        self.chain
            .transfer_native(whale, to, amount)
            .expect("Failed to send ETH");
    }

    /// Pulls the strategy's idle LUSD out, as if it had been lost
    pub fn drain_idle_lusd(&mut self) {
        let (strategy, whale) = (self.strategy, self.accounts.lusd_whale);
        let idle = self.balance(LUSD, strategy);
        self.chain
            .transfer(LUSD, strategy, whale, idle)
            .expect("Failed to drain strategy");
    }
}

pub fn approx(a: U256, b: U256) -> bool {
    approx_eq(a, b, U256::from(RELATIVE_APPROX))
}

/// `numerator / denominator` of `amount`
pub fn fraction(amount: U256, numerator: u64, denominator: u64) -> U256 {
    amount * U256::from(numerator) / U256::from(denominator)
}

pub fn assert_approx(actual: U256, expected: U256) {
    assert!(approx(actual, expected), "{actual} is not within 1e-5 of {expected}");
}

pub fn assert_reverts_with<T: std::fmt::Debug>(result: StrategyResult<T>, reason: &str) {
    match result {
        Err(err) => assert_eq!(err.reason(), reason),
        Ok(value) => panic!("expected revert `{reason}`, got {value:?}"),
    }
}

pub fn assert_unauthorized<T: std::fmt::Debug>(result: StrategyResult<T>) {
    assert!(
        matches!(result, Err(StrategyError::Unauthorized)),
        "expected !authorized, got {result:?}"
    );
}

pub fn e18(amount: u64) -> U256 {
    tokens(amount)
}
