//! Fixed point helpers shared by the vault, the pools and the strategy

use alloy_primitives::U256;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::constants::{max_bps, scale};

use super::error::{arithmetic_err, StrategyResult};

/// Converts `U256` to `BigUint`
fn to_big(value: U256) -> BigUint {
    BigUint::from_bytes_be(&value.to_be_bytes::<32>())
}

/// Converts `BigUint` to `U256`, failing when the value does not fit in 256 bits
fn from_big(value: BigUint) -> StrategyResult<U256> {
    let bytes = value.to_bytes_be();
    U256::try_from_be_slice(&bytes).ok_or_else(|| arithmetic_err("mul_div result overflowed."))
}

/// Returns `a * b / denominator` rounded down, without intermediate overflow.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> StrategyResult<U256> {
    let denominator = to_big(denominator);
    if denominator.is_zero() {
        return Err(arithmetic_err("mul_div denominator was zero."));
    }
    from_big(to_big(a) * to_big(b) / denominator)
}

/// Returns `a * b / denominator` rounded up.
pub fn mul_div_up(a: U256, b: U256, denominator: U256) -> StrategyResult<U256> {
    let denominator = to_big(denominator);
    if denominator.is_zero() {
        return Err(arithmetic_err("mul_div_up denominator was zero."));
    }
    let product = to_big(a) * to_big(b);
    let quotient = &product / &denominator;
    if (product % denominator).is_zero() {
        from_big(quotient)
    } else {
        from_big(quotient + 1u32)
    }
}

/// Applies a basis point ratio: `amount * bps / 10_000`
pub fn apply_bps(amount: U256, bps: U256) -> StrategyResult<U256> {
    mul_div(amount, bps, max_bps())
}

/// Multiplies two e18 fixed point numbers
pub fn wmul(a: U256, b: U256) -> StrategyResult<U256> {
    mul_div(a, b, scale())
}

/// Divides two e18 fixed point numbers
pub fn wdiv(a: U256, b: U256) -> StrategyResult<U256> {
    mul_div(a, scale(), b)
}

/// Absolute difference
pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a > b {
        a - b
    } else {
        b - a
    }
}

/// Returns `true` when `a` is within `relative` of `b`, relative to `b`.
/// `relative` is expressed as an e18 fraction.
pub fn approx_eq(a: U256, b: U256, relative: U256) -> bool {
    let tolerance = wmul(b, relative).unwrap_or(U256::MAX);
    abs_diff(a, b) <= tolerance
}
