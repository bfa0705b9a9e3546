//! Chainlink style price feed and TWAP quotes

use alloy_primitives::{Address, I256, U256};
use tracing::info;

use crate::{
    constants::{unit, CHAINLINK_DECIMALS},
    state::State,
    types::AnswerUpdated,
    utils::{
        error::{arithmetic_err, StrategyResult},
        math::mul_div,
    },
};

/// Answer of `latestRoundData`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RoundData {
    pub round_id: u64,
    pub answer: U256,
    pub started_at: u64,
    pub updated_at: u64,
}

/// Aggregator with a single reporter
#[derive(Clone, Debug)]
pub struct ChainlinkFeed {
    pub address: Address,
    pub decimals: u8,
    round: RoundData,
}

impl ChainlinkFeed {
    pub fn new(address: Address, answer: U256, now: u64) -> Self {
        Self {
            address,
            decimals: CHAINLINK_DECIMALS,
            round: RoundData {
                round_id: 1,
                answer,
                started_at: now,
                updated_at: now,
            },
        }
    }

    pub fn latest_round_data(&self) -> RoundData {
        self.round
    }

    pub fn latest_answer(&self) -> U256 {
        self.round.answer
    }

    /// Value of `amount` (e18) in the quote currency (e18)
    pub fn convert(&self, amount: U256) -> StrategyResult<U256> {
        mul_div(amount, self.round.answer, unit(self.decimals))
    }

    fn update(&mut self, answer: U256, now: u64) {
        self.round = RoundData {
            round_id: self.round.round_id + 1,
            answer,
            started_at: now,
            updated_at: now,
        };
    }
}

impl State {
    /// Publishes a new ETH/USD answer with 8 decimals.
    pub fn set_eth_price(&mut self, answer: U256) -> StrategyResult<()> {
        let now = self.now();
        self.price_feed.update(answer, now);
        let current = I256::try_from(answer)
            .map_err(|_| arithmetic_err("Price answer does not fit in int256."))?;
        let round = self.price_feed.latest_round_data();
        info!(%answer, round = round.round_id, "eth price updated");
        self.emit(
            self.price_feed.address,
            &AnswerUpdated {
                current,
                roundId: U256::from(round.round_id),
                updatedAt: U256::from(round.updated_at),
            },
        );
        Ok(())
    }

    /// Converts `amount` of `token_in` to `token_out` at the pool's time weighted price.
    pub fn twap_quote(
        &self,
        (token_in, fee, token_out): (Address, u32, Address),
        amount: U256,
        period: u64,
    ) -> StrategyResult<U256> {
        if amount.is_zero() {
            return Ok(U256::ZERO);
        }
        self.uniswap
            .pool(token_in, token_out, fee)?
            .consult_amount(&self.ledger, self.now(), period, token_in, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn convert_uses_eight_decimals() {
        let feed = ChainlinkFeed::new(
            Address::repeat_byte(0x0f),
            U256::from(2_000u64) * unit(8),
            0,
        );
        let one_eth = unit(18);
        assert_eq!(feed.convert(one_eth).unwrap(), U256::from(2_000u64) * unit(18));
    }

    #[test]
    fn update_bumps_the_round() {
        let mut feed = ChainlinkFeed::new(Address::repeat_byte(0x0f), U256::from(1u64), 10);
        feed.update(U256::from(2u64), 20);
        let round = feed.latest_round_data();
        assert_eq!(round.round_id, 2);
        assert_eq!(round.answer, U256::from(2u64));
        assert_eq!(round.updated_at, 20);
    }
}
