//! Two coin StableSwap pool (LUSD/DAI)

use alloy_primitives::{Address, U256};
use tracing::debug;

use crate::{
    constants::{CURVE_FEE_DENOMINATOR, CURVE_MAX_ITERATIONS},
    state::State,
    types::TokenExchange,
    utils::{
        error::{arithmetic_err, StrategyError, StrategyResult},
        math::{abs_diff, mul_div},
    },
};

const N_COINS: u64 = 2;

/// StableSwap invariant pool. Coin balances are the ledger balances of `address`.
#[derive(Clone, Debug)]
pub struct CurvePool {
    pub address: Address,
    pub coins: [Address; 2],
    /// Amplification coefficient
    pub amplification: U256,
    /// Swap fee in 1e10 units
    pub fee: U256,
}

fn n_coins() -> U256 {
    U256::from(N_COINS)
}

fn overflow() -> StrategyError {
    arithmetic_err("StableSwap math overflowed.")
}

impl CurvePool {
    pub fn new(address: Address, coins: [Address; 2], amplification: u64, fee: u64) -> Self {
        Self {
            address,
            coins,
            amplification: U256::from(amplification),
            fee: U256::from(fee),
        }
    }

    pub fn coin_index(&self, coin: Address) -> StrategyResult<usize> {
        self.coins
            .iter()
            .position(|candidate| *candidate == coin)
            .ok_or(StrategyError::NonExistentValue)
    }

    /// Invariant `D` of the given balances
    pub fn get_d(&self, xp: [U256; 2]) -> StrategyResult<U256> {
        let sum = xp[0].checked_add(xp[1]).ok_or_else(overflow)?;
        if sum.is_zero() {
            return Ok(U256::ZERO);
        }
        let ann = self.amplification * n_coins();
        let mut d = sum;
        for _ in 0..CURVE_MAX_ITERATIONS {
            let mut d_p = d;
            for x in xp {
                d_p = mul_div(d_p, d, x * n_coins())?;
            }
            let previous = d;
            let numerator = ann
                .checked_mul(sum)
                .and_then(|value| value.checked_add(d_p * n_coins()))
                .ok_or_else(overflow)?;
            let denominator = (ann - U256::from(1u64))
                .checked_mul(d)
                .and_then(|value| value.checked_add((n_coins() + U256::from(1u64)) * d_p))
                .ok_or_else(overflow)?;
            d = mul_div(numerator, d, denominator)?;
            if abs_diff(d, previous) <= U256::from(1u64) {
                return Ok(d);
            }
        }
        Err(arithmetic_err("StableSwap D did not converge."))
    }

    /// Balance of coin `j` keeping `D` constant when coin `i` has balance `x`
    pub fn get_y(&self, i: usize, j: usize, x: U256, xp: [U256; 2]) -> StrategyResult<U256> {
        if i == j || i > 1 || j > 1 {
            return Err(StrategyError::Custom("invalid coin index".to_string()));
        }
        let d = self.get_d(xp)?;
        let ann = self.amplification * n_coins();
        // two coins: the only other balance is the new `x`
        let mut c = mul_div(d, d, x * n_coins())?;
        c = mul_div(c, d, ann * n_coins())?;
        let b = x + d / ann;
        let mut y = d;
        for _ in 0..CURVE_MAX_ITERATIONS {
            let previous = y;
            let numerator = y
                .checked_mul(y)
                .and_then(|value| value.checked_add(c))
                .ok_or_else(overflow)?;
            let denominator = (y * U256::from(2u64) + b)
                .checked_sub(d)
                .ok_or_else(overflow)?;
            y = numerator / denominator;
            if abs_diff(y, previous) <= U256::from(1u64) {
                return Ok(y);
            }
        }
        Err(arithmetic_err("StableSwap y did not converge."))
    }

    fn balances(&self, state: &State) -> [U256; 2] {
        [
            state.ledger.balance_of(self.coins[0], self.address),
            state.ledger.balance_of(self.coins[1], self.address),
        ]
    }

    /// Output for selling `dx` of coin `i` for coin `j`, after fees.
    pub fn get_dy(&self, state: &State, i: usize, j: usize, dx: U256) -> StrategyResult<U256> {
        if i == j || i > 1 || j > 1 {
            return Err(StrategyError::Custom("invalid coin index".to_string()));
        }
        let xp = self.balances(state);
        let x = xp[i].checked_add(dx).ok_or_else(overflow)?;
        let y = self.get_y(i, j, x, xp)?;
        let dy = xp[j]
            .checked_sub(y)
            .and_then(|value| value.checked_sub(U256::from(1u64)))
            .unwrap_or_default();
        let fee = mul_div(dy, self.fee, U256::from(CURVE_FEE_DENOMINATOR))?;
        Ok(dy - fee)
    }
}

impl State {
    /// Sells `dx` of coin `i` for coin `j`, reverting below `min_dy`.
    pub fn curve_exchange(
        &mut self,
        sender: Address,
        i: usize,
        j: usize,
        dx: U256,
        min_dy: U256,
    ) -> StrategyResult<U256> {
        let pool = self.curve.clone();
        let dy = pool.get_dy(self, i, j, dx)?;
        if dy < min_dy {
            return Err(StrategyError::Slippage {
                received: dy,
                minimum: min_dy,
            });
        }
        self.ledger.transfer(pool.coins[i], sender, pool.address, dx)?;
        self.ledger.transfer(pool.coins[j], pool.address, sender, dy)?;

        debug!(pool = %pool.address, i, j, %dx, %dy, "curve exchange");
        self.emit(
            pool.address,
            &TokenExchange {
                buyer: sender,
                soldId: i as i128,
                tokensSold: dx,
                boughtId: j as i128,
                tokensBought: dy,
            },
        );
        Ok(dy)
    }
}
