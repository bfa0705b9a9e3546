//! Simulated chain: world state, accounts, clock and the transaction boundary.

use std::collections::BTreeMap;

use alloy_primitives::{Address, U256};
use tracing::{debug, info, warn};

use crate::{
    config::ChainConfig,
    constants::{
        unit, CHAINLINK_DECIMALS, CURVE_LUSD_POOL, DAI, ETH_USD_FEED, LQTY, LUSD, STABILITY_POOL,
        UNISWAP_ROUTER, WETH,
    },
    exchange::{curve::CurvePool, oracle::ChainlinkFeed, uniswap::UniswapRouter},
    health_check::{CommonHealthCheck, Limits},
    journal::{Journal, JournalCollection, LogType},
    liquity::stability_pool::StabilityPool,
    state::State,
    utils::error::StrategyResult,
    vault::Vault,
};

use self::{
    accounts::{AddressGenerator, Accounts},
    clock::Clock,
    ledger::TokenLedger,
};

pub mod accounts;
pub mod clock;
pub mod ledger;

/// Whole tokens to 18 decimal units
pub fn tokens(amount: u64) -> U256 {
    U256::from(amount) * unit(18)
}

/// A deployment of the vault, its strategy and the market they trade in.
pub struct Chain {
    pub state: State,
    pub journal: Journal,
    pub accounts: Accounts,
    pub config: ChainConfig,
    /// Address of the strategy deployed with the vault
    pub strategy: Address,
    generator: AddressGenerator,
}

impl Chain {
    /// Deploys tokens, whales, venues, the vault, the common health check and one strategy
    /// added to the vault with the configured debt ratio.
    pub fn deploy(config: ChainConfig) -> StrategyResult<Self> {
        config.validate()?;
        let mut generator = AddressGenerator::new(config.seed);
        let accounts = Accounts::generate(&mut generator);
        let clock = Clock::default();
        let now = clock.timestamp;
        let market = &config.market;

        let vault_address = generator.next_address();
        let mut ledger = TokenLedger::default();
        ledger
            .register(LUSD, "LUSD", 18)
            .register(LQTY, "LQTY", 18)
            .register(DAI, "DAI", 18)
            .register(WETH, "WETH", 18)
            .register(vault_address, &config.vault.symbol, 18);

        let mut vault = Vault::new(
            vault_address,
            LUSD,
            accounts.gov,
            accounts.rewards,
            accounts.guardian,
            accounts.management,
            now,
        );
        vault.name = config.vault.name.clone();
        vault.symbol = config.vault.symbol.clone();
        vault.deposit_limit = config.vault.deposit_limit.map_or(U256::MAX, U256::from);
        vault.performance_fee = U256::from(config.vault.performance_fee);
        vault.management_fee = U256::from(config.vault.management_fee);
        vault.locked_profit_degradation = U256::from(config.vault.locked_profit_degradation);

        let mut health_check =
            CommonHealthCheck::new(generator.next_address(), accounts.gov, accounts.management);
        health_check.limits = Limits {
            profit_limit_ratio: U256::from(config.health_check.profit_limit_ratio),
            loss_limit_ratio: U256::from(config.health_check.loss_limit_ratio),
        };

        let mut state = State {
            clock,
            ledger,
            price_feed: ChainlinkFeed::new(
                ETH_USD_FEED,
                U256::from(market.eth_usd_price) * unit(CHAINLINK_DECIMALS),
                now,
            ),
            uniswap: UniswapRouter::new(UNISWAP_ROUTER),
            curve: CurvePool::new(
                CURVE_LUSD_POOL,
                [LUSD, DAI],
                market.curve_amplification,
                market.curve_fee,
            ),
            stability_pool: StabilityPool::new(STABILITY_POOL, LUSD, LQTY),
            vault,
            strategies: BTreeMap::new(),
            health_check,
            logs: vec![],
        };

        let whale = tokens(market.whale_balance);
        state.ledger.mint(LUSD, accounts.lusd_whale, whale)?;
        state.ledger.mint(LQTY, accounts.lqty_whale, whale)?;
        state.ledger.mint(DAI, accounts.dai_whale, whale)?;
        state
            .ledger
            .fund_native(accounts.eth_whale, tokens(market.eth_whale_balance));

        let pools = [
            ((WETH, market.weth_dai_reserves[0]), (DAI, market.weth_dai_reserves[1]), 500),
            ((WETH, market.weth_dai_reserves_03[0]), (DAI, market.weth_dai_reserves_03[1]), 3_000),
            ((LQTY, market.lqty_weth_reserves[0]), (WETH, market.lqty_weth_reserves[1]), 3_000),
            ((DAI, market.dai_lusd_reserves[0]), (LUSD, market.dai_lusd_reserves[1]), 500),
        ];
        for ((token_a, amount_a), (token_b, amount_b), fee) in pools {
            state.create_uniswap_pool(
                generator.next_address(),
                (token_a, tokens(amount_a)),
                (token_b, tokens(amount_b)),
                fee,
            )?;
        }
        state
            .ledger
            .mint(LUSD, CURVE_LUSD_POOL, tokens(market.curve_reserves[0]))?;
        state
            .ledger
            .mint(DAI, CURVE_LUSD_POOL, tokens(market.curve_reserves[1]))?;

        let strategy = generator.next_address();
        state.deploy_strategy(strategy, accounts.strategist, &config.strategy)?;
        state.set_keeper(accounts.strategist, strategy, accounts.keeper)?;
        state.add_strategy(
            accounts.gov,
            strategy,
            U256::from(config.strategy.debt_ratio),
            U256::from(config.strategy.min_debt_per_harvest),
            config
                .strategy
                .max_debt_per_harvest
                .map_or(U256::MAX, U256::from),
            U256::from(config.strategy.performance_fee),
        )?;

        info!(vault = %vault_address, %strategy, "deployment ready");
        Ok(Self {
            state,
            journal: Journal::default(),
            accounts,
            config,
            strategy,
            generator,
        })
    }

    /// Runs `transaction` against the state. On error every change it made is rolled back.
    /// The outcome is journaled either way.
    pub fn execute<T, F>(&mut self, label: &str, transaction: F) -> StrategyResult<T>
    where
        F: FnOnce(&mut State, &mut JournalCollection) -> StrategyResult<T>,
    {
        let snapshot = self.state.clone();
        let first_log = self.state.logs.len();
        let mut collection = JournalCollection::open(label, self.state.now());
        let result = transaction(&mut self.state, &mut collection);
        match &result {
            Ok(_) => {
                for log in &self.state.logs[first_log..] {
                    let topic = log
                        .data
                        .topics()
                        .first()
                        .map(|topic| hex::encode(topic.as_slice()))
                        .unwrap_or_default();
                    collection.append_note(
                        Ok(()),
                        LogType::Info,
                        format!("log {} topic 0x{}", log.address, topic),
                    );
                }
                debug!(label, logs = self.state.logs.len() - first_log, "transaction committed");
                collection.append_note(Ok(()), LogType::ExecutionResult, "committed");
            }
            Err(err) => {
                warn!(label, %err, "transaction reverted");
                self.state = snapshot;
                collection.append_note(Err(err.clone()), LogType::ExecutionResult, "reverted");
            }
        }
        if let Some(outcome) = collection.entries.last() {
            debug!(label, entry = %outcome.render(), "journaled");
        }
        self.journal.commit(collection);
        result
    }

    /// Read only access to the state.
    pub fn view<T, F>(&self, query: F) -> T
    where
        F: FnOnce(&State) -> T,
    {
        query(&self.state)
    }

    pub fn now(&self) -> u64 {
        self.state.now()
    }

    pub fn sleep(&mut self, seconds: u64) -> &mut Self {
        self.state.clock.sleep(seconds);
        self
    }

    pub fn sleep_for(&mut self, duration: chrono::Duration) -> &mut Self {
        self.state.clock.sleep_for(duration);
        self
    }

    pub fn mine(&mut self, blocks: u64) -> &mut Self {
        self.state.clock.mine(blocks);
        self
    }

    /// A fresh address no deployment uses
    pub fn new_account(&mut self) -> Address {
        self.generator.next_address()
    }

    /// Deploys another strategy for the vault, owned by the strategist.
    /// It is not added to the vault.
    pub fn deploy_strategy(&mut self) -> StrategyResult<Address> {
        let address = self.generator.next_address();
        let strategist = self.accounts.strategist;
        let config = self.config.strategy.clone();
        self.execute("strategy.deploy", |state, journal| {
            state.deploy_strategy(address, strategist, &config)?;
            journal.append_note(Ok(()), LogType::Info, format!("strategy at {address}"));
            Ok(address)
        })
    }

    /// Liquidation absorbed by the stability pool: depositors lose `debt` LUSD and gain `coll` ETH.
    pub fn liquidate(&mut self, debt: U256, coll: U256) -> StrategyResult<()> {
        self.execute("stability_pool.offset", |state, _| state.offset(debt, coll))
    }

    /// LQTY issuance to stability pool depositors.
    pub fn issue_lqty(&mut self, amount: U256) -> StrategyResult<()> {
        self.execute("stability_pool.issue_lqty", |state, _| state.issue_lqty(amount))
    }

    /// Publishes a new ETH price in whole USD.
    pub fn set_eth_price(&mut self, usd: u64) -> StrategyResult<()> {
        self.execute("price_feed.update", |state, _| {
            state.set_eth_price(U256::from(usd) * unit(CHAINLINK_DECIMALS))
        })
    }
}
