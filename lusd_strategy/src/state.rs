//! Everything a transaction may mutate

use std::collections::BTreeMap;

use alloy_primitives::{Address, Log};
use alloy_sol_types::SolEvent;

use crate::{
    chain::{clock::Clock, ledger::TokenLedger},
    exchange::{curve::CurvePool, oracle::ChainlinkFeed, uniswap::UniswapRouter},
    health_check::CommonHealthCheck,
    liquity::stability_pool::StabilityPool,
    strategy::Strategy,
    utils::error::{StrategyError, StrategyResult},
    vault::Vault,
};

/// World state of the simulated chain.
/// Cloned before each transaction and restored when the transaction fails.
#[derive(Clone)]
pub struct State {
    pub clock: Clock,
    pub ledger: TokenLedger,
    /// Chainlink ETH/USD aggregator
    pub price_feed: ChainlinkFeed,
    pub uniswap: UniswapRouter,
    /// LUSD/DAI StableSwap pool
    pub curve: CurvePool,
    pub stability_pool: StabilityPool,
    pub vault: Vault,
    /// Deployed strategies keyed by address, active or not
    pub strategies: BTreeMap<Address, Strategy>,
    pub health_check: CommonHealthCheck,
    /// Emitted event logs, in order
    pub logs: Vec<Log>,
}

impl State {
    /// Current block timestamp
    pub fn now(&self) -> u64 {
        self.clock.timestamp
    }

    /// Appends an ABI encoded event emitted by `address`.
    pub(crate) fn emit<E: SolEvent>(&mut self, address: Address, event: &E) {
        self.logs.push(Log {
            address,
            data: event.encode_log_data(),
        });
    }

    /// Decodes every log of type `E`, skipping logs of other types.
    pub fn events<E: SolEvent>(&self) -> Vec<(Address, E)> {
        self.logs
            .iter()
            .filter(|log| log.data.topics().first() == Some(&E::SIGNATURE_HASH))
            .filter_map(|log| {
                E::decode_log_data(&log.data, true)
                    .ok()
                    .map(|event| (log.address, event))
            })
            .collect()
    }

    pub fn strategy(&self, address: Address) -> StrategyResult<&Strategy> {
        self.strategies
            .get(&address)
            .ok_or(StrategyError::NonExistentValue)
    }

    pub fn strategy_mut(&mut self, address: Address) -> StrategyResult<&mut Strategy> {
        self.strategies
            .get_mut(&address)
            .ok_or(StrategyError::NonExistentValue)
    }
}
