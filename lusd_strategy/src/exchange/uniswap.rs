//! Uniswap v3 style router over constant product pools with TWAP observations

use std::collections::{BTreeMap, VecDeque};

use alloy_primitives::{Address, Bytes, U256};
use tracing::debug;

use crate::{
    chain::ledger::TokenLedger,
    constants::{scale, FEE_DENOMINATOR, FEE_TIERS, MAX_FEE, OBSERVATION_CARDINALITY},
    state::State,
    types::Swap,
    utils::{
        error::{arithmetic_err, StrategyError, StrategyResult},
        math::mul_div,
    },
};

/// Cumulative price checkpoint of a pool
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Observation {
    /// Block timestamp of the checkpoint
    pub timestamp: u64,
    /// Sum of `price * seconds` up to `timestamp`
    pub cumulative: U256,
    /// Price of token0 in token1 (e18) from `timestamp` on
    pub price: U256,
}

/// Pool identifier: sorted token pair and fee tier
pub type PoolKey = (Address, Address, u32);

/// Orders a pair the way pools store it.
pub fn sort_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Constant product pool. Its reserves are the ledger balances of `address`.
#[derive(Clone, Debug)]
pub struct UniswapPool {
    pub address: Address,
    pub token0: Address,
    pub token1: Address,
    /// Fee in millionths
    pub fee: u32,
    observations: VecDeque<Observation>,
}

impl UniswapPool {
    pub fn new(address: Address, token_a: Address, token_b: Address, fee: u32) -> Self {
        let (token0, token1) = sort_tokens(token_a, token_b);
        Self {
            address,
            token0,
            token1,
            fee,
            observations: VecDeque::new(),
        }
    }

    pub fn key(&self) -> PoolKey {
        (self.token0, self.token1, self.fee)
    }

    pub fn reserves(&self, ledger: &TokenLedger) -> (U256, U256) {
        (
            ledger.balance_of(self.token0, self.address),
            ledger.balance_of(self.token1, self.address),
        )
    }

    /// Price of token0 denominated in token1, e18
    pub fn spot_price(&self, ledger: &TokenLedger) -> StrategyResult<U256> {
        let (reserve0, reserve1) = self.reserves(ledger);
        mul_div(reserve1, scale(), reserve0)
    }

    /// Output of swapping `amount_in` of `token_in` against the current reserves.
    pub fn quote(
        &self,
        ledger: &TokenLedger,
        token_in: Address,
        amount_in: U256,
    ) -> StrategyResult<U256> {
        let (reserve0, reserve1) = self.reserves(ledger);
        let (reserve_in, reserve_out) = if token_in == self.token0 {
            (reserve0, reserve1)
        } else if token_in == self.token1 {
            (reserve1, reserve0)
        } else {
            return Err(StrategyError::Custom(format!(
                "{} is not traded by pool {}",
                token_in, self.address
            )));
        };

        let amount_in_with_fee = mul_div(
            amount_in,
            U256::from(FEE_DENOMINATOR - self.fee as u64),
            U256::from(FEE_DENOMINATOR),
        )?;
        let denominator = reserve_in
            .checked_add(amount_in_with_fee)
            .ok_or(arithmetic_err("Pool reserve overflowed."))?;
        mul_div(amount_in_with_fee, reserve_out, denominator)
    }

    /// Records the price in effect from `now` on.
    pub fn record(&mut self, now: u64, price: U256) -> StrategyResult<()> {
        match self.observations.back_mut() {
            Some(last) if last.timestamp == now => {
                last.price = price;
            }
            Some(last) => {
                let cumulative = Self::accumulate(last, now)?;
                self.observations.push_back(Observation {
                    timestamp: now,
                    cumulative,
                    price,
                });
            }
            None => self.observations.push_back(Observation {
                timestamp: now,
                cumulative: U256::ZERO,
                price,
            }),
        }
        while self.observations.len() > OBSERVATION_CARDINALITY {
            self.observations.pop_front();
        }
        Ok(())
    }

    fn accumulate(observation: &Observation, at: u64) -> StrategyResult<U256> {
        let elapsed = U256::from(at.saturating_sub(observation.timestamp));
        observation
            .price
            .checked_mul(elapsed)
            .and_then(|delta| observation.cumulative.checked_add(delta))
            .ok_or(arithmetic_err("Price cumulative overflowed."))
    }

    /// Cumulative price at `at`. Times before the oldest observation are clamped to it.
    fn cumulative_at(&self, at: u64) -> StrategyResult<(u64, U256)> {
        let oldest = self
            .observations
            .front()
            .ok_or(StrategyError::NonExistentValue)?;
        let at = at.max(oldest.timestamp);
        let observation = self
            .observations
            .iter()
            .rev()
            .find(|observation| observation.timestamp <= at)
            .ok_or(StrategyError::NonExistentValue)?;
        Ok((at, Self::accumulate(observation, at)?))
    }

    /// Time weighted price of token0 in token1 over the last `period` seconds.
    /// Falls back to the spot price when no time has elapsed.
    pub fn consult(&self, ledger: &TokenLedger, now: u64, period: u64) -> StrategyResult<U256> {
        let (start, start_cumulative) = self.cumulative_at(now.saturating_sub(period))?;
        if start >= now {
            return self.spot_price(ledger);
        }
        let (_, end_cumulative) = self.cumulative_at(now)?;
        let elapsed = U256::from(now - start);
        Ok((end_cumulative - start_cumulative) / elapsed)
    }

    /// Converts `amount` of `token_in` to the other token at the time weighted price.
    pub fn consult_amount(
        &self,
        ledger: &TokenLedger,
        now: u64,
        period: u64,
        token_in: Address,
        amount: U256,
    ) -> StrategyResult<U256> {
        let price = self.consult(ledger, now, period)?;
        if token_in == self.token0 {
            mul_div(amount, price, scale())
        } else {
            mul_div(amount, scale(), price)
        }
    }
}

/// Encodes a multi-hop path as `token (fee token)*`, 20 + 3 bytes per hop.
pub fn encode_path(tokens: &[Address], fees: &[u32]) -> StrategyResult<Bytes> {
    if tokens.len() < 2 || fees.len() + 1 != tokens.len() {
        return Err(StrategyError::Custom("malformed swap path".to_string()));
    }
    let mut path = Vec::with_capacity(tokens.len() * 20 + fees.len() * 3);
    for (index, token) in tokens.iter().enumerate() {
        path.extend_from_slice(token.as_slice());
        if let Some(&fee) = fees.get(index) {
            if fee > MAX_FEE {
                return Err(StrategyError::InvalidFeeTier(fee));
            }
            path.extend_from_slice(&fee.to_be_bytes()[1..]);
        }
    }
    Ok(Bytes::from(path))
}

/// Splits an encoded path into `(token_in, fee, token_out)` hops.
pub fn decode_path(path: &Bytes) -> StrategyResult<Vec<(Address, u32, Address)>> {
    if path.len() < 43 || (path.len() - 20) % 23 != 0 {
        return Err(StrategyError::Custom("malformed swap path".to_string()));
    }
    let hops = (path.len() - 20) / 23;
    let mut decoded = Vec::with_capacity(hops);
    for hop in 0..hops {
        let offset = hop * 23;
        let token_in = Address::from_slice(&path[offset..offset + 20]);
        let fee = u32::from_be_bytes([
            0,
            path[offset + 20],
            path[offset + 21],
            path[offset + 22],
        ]);
        let token_out = Address::from_slice(&path[offset + 23..offset + 43]);
        decoded.push((token_in, fee, token_out));
    }
    Ok(decoded)
}

/// Router and pool registry
#[derive(Clone, Debug)]
pub struct UniswapRouter {
    pub address: Address,
    pools: BTreeMap<PoolKey, UniswapPool>,
}

impl UniswapRouter {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            pools: BTreeMap::new(),
        }
    }

    pub fn insert_pool(&mut self, pool: UniswapPool) {
        self.pools.insert(pool.key(), pool);
    }

    /// Looks up a pool. Fees outside the enabled tiers never have a pool.
    pub fn pool(
        &self,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> StrategyResult<&UniswapPool> {
        if !FEE_TIERS.contains(&fee) {
            return Err(StrategyError::InvalidFeeTier(fee));
        }
        let (token0, token1) = sort_tokens(token_a, token_b);
        self.pools
            .get(&(token0, token1, fee))
            .ok_or(StrategyError::PoolNotFound {
                token_in: token_a,
                token_out: token_b,
                fee,
            })
    }

    fn pool_mut(
        &mut self,
        token_a: Address,
        token_b: Address,
        fee: u32,
    ) -> StrategyResult<&mut UniswapPool> {
        let key = self.pool(token_a, token_b, fee)?.key();
        self.pools.get_mut(&key).ok_or(StrategyError::NonExistentValue)
    }

    pub fn pools(&self) -> impl Iterator<Item = &UniswapPool> {
        self.pools.values()
    }
}

impl State {
    /// Creates a pool seeded with the given reserves, minted to the pool.
    pub fn create_uniswap_pool(
        &mut self,
        address: Address,
        (token_a, amount_a): (Address, U256),
        (token_b, amount_b): (Address, U256),
        fee: u32,
    ) -> StrategyResult<()> {
        if !FEE_TIERS.contains(&fee) {
            return Err(StrategyError::InvalidFeeTier(fee));
        }
        self.ledger.mint(token_a, address, amount_a)?;
        self.ledger.mint(token_b, address, amount_b)?;
        let mut pool = UniswapPool::new(address, token_a, token_b, fee);
        let price = pool.spot_price(&self.ledger)?;
        pool.record(self.now(), price)?;
        self.uniswap.insert_pool(pool);
        Ok(())
    }

    /// Swaps one hop, paid by `payer`, output sent to `recipient`.
    fn swap_hop(
        &mut self,
        payer: Address,
        recipient: Address,
        (token_in, fee, token_out): (Address, u32, Address),
        amount_in: U256,
    ) -> StrategyResult<U256> {
        if amount_in.is_zero() {
            return Err(StrategyError::Custom("AS".to_string()));
        }
        let pool = self.uniswap.pool(token_in, token_out, fee)?;
        let pool_address = pool.address;
        let amount_out = pool.quote(&self.ledger, token_in, amount_in)?;

        self.ledger.transfer(token_in, payer, pool_address, amount_in)?;
        self.ledger
            .transfer(token_out, pool_address, recipient, amount_out)?;

        let now = self.now();
        let price = self.uniswap.pool(token_in, token_out, fee)?.spot_price(&self.ledger)?;
        self.uniswap
            .pool_mut(token_in, token_out, fee)?
            .record(now, price)?;

        debug!(
            pool = %pool_address,
            %token_in,
            %token_out,
            %amount_in,
            %amount_out,
            "uniswap swap"
        );
        self.emit(
            pool_address,
            &Swap {
                pool: pool_address,
                tokenIn: token_in,
                tokenOut: token_out,
                amountIn: amount_in,
                amountOut: amount_out,
            },
        );
        Ok(amount_out)
    }

    /// Swaps `amount_in` of `token_in` for `token_out` through a single pool.
    pub fn exact_input_single(
        &mut self,
        sender: Address,
        recipient: Address,
        (token_in, fee, token_out): (Address, u32, Address),
        amount_in: U256,
        amount_out_minimum: U256,
    ) -> StrategyResult<U256> {
        let amount_out = self.swap_hop(sender, recipient, (token_in, fee, token_out), amount_in)?;
        if amount_out < amount_out_minimum {
            return Err(StrategyError::Slippage {
                received: amount_out,
                minimum: amount_out_minimum,
            });
        }
        Ok(amount_out)
    }

    /// Swaps along an encoded multi-hop path. Intermediate amounts are held by the router.
    pub fn exact_input(
        &mut self,
        sender: Address,
        recipient: Address,
        path: &Bytes,
        amount_in: U256,
        amount_out_minimum: U256,
    ) -> StrategyResult<U256> {
        let hops = decode_path(path)?;
        let router = self.uniswap.address;
        let last = hops.len() - 1;
        let mut payer = sender;
        let mut amount = amount_in;
        for (index, hop) in hops.into_iter().enumerate() {
            let to = if index == last { recipient } else { router };
            amount = self.swap_hop(payer, to, hop, amount)?;
            payer = router;
        }
        if amount < amount_out_minimum {
            return Err(StrategyError::Slippage {
                received: amount,
                minimum: amount_out_minimum,
            });
        }
        Ok(amount)
    }
}
