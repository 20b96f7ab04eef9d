use crate::error::LedgerError;
use crate::full_math::{div_rounding_up, mul_div, mul_div_rounding_up, narrow, to_u128, Q96};
use alloy::primitives::{U256, U512};

fn sorted(a: U256, b: U256) -> (U256, U256) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Token0 spanned by `liquidity` between two sqrt prices.
/// L * (sqrt_pb - sqrt_pa) / (sqrt_pa * sqrt_pb)
pub fn get_amount0_delta(
    liquidity: u128,
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    round_up: bool,
) -> Result<U256, LedgerError> {
    let (lower, upper) = sorted(sqrt_price_a_x96, sqrt_price_b_x96);
    if lower.is_zero() {
        return Err(LedgerError::PriceOutOfBounds);
    }
    let numerator1 = U256::from(liquidity) << 96usize;
    let numerator2 = upper - lower;
    if round_up {
        div_rounding_up(mul_div_rounding_up(numerator1, numerator2, upper)?, lower)
    } else {
        Ok(mul_div(numerator1, numerator2, upper)? / lower)
    }
}

/// Token1 spanned by `liquidity` between two sqrt prices.
/// L * (sqrt_pb - sqrt_pa)
pub fn get_amount1_delta(
    liquidity: u128,
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    round_up: bool,
) -> Result<U256, LedgerError> {
    let (lower, upper) = sorted(sqrt_price_a_x96, sqrt_price_b_x96);
    if round_up {
        mul_div_rounding_up(U256::from(liquidity), upper - lower, Q96)
    } else {
        mul_div(U256::from(liquidity), upper - lower, Q96)
    }
}

/// L = amount0 * sqrt_pa * sqrt_pb / (Q96 * (sqrt_pb - sqrt_pa)), rounded down
pub fn get_liquidity_for_amount0(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    amount0: u128,
) -> Result<u128, LedgerError> {
    let (lower, upper) = sorted(sqrt_price_a_x96, sqrt_price_b_x96);
    if lower == upper {
        return Err(LedgerError::PriceOutOfBounds);
    }
    // the full 448-bit product keeps precision at extreme prices
    let numerator = U512::from(amount0) * U512::from(lower) * U512::from(upper);
    let denominator = U512::from(Q96) * U512::from(upper - lower);
    to_u128(narrow(numerator / denominator)?)
}

/// L = amount1 / (sqrt_pb - sqrt_pa), rounded down
pub fn get_liquidity_for_amount1(
    sqrt_price_a_x96: U256,
    sqrt_price_b_x96: U256,
    amount1: u128,
) -> Result<u128, LedgerError> {
    let (lower, upper) = sorted(sqrt_price_a_x96, sqrt_price_b_x96);
    if lower == upper {
        return Err(LedgerError::PriceOutOfBounds);
    }
    to_u128(mul_div(U256::from(amount1), Q96, upper - lower)?)
}

/// Liquidity credited for depositing `amount` of the pool's funding token
/// across a range. Never rounds in the depositor's favour.
pub fn amounts_to_liquidity(
    amount: u128,
    sqrt_price_lower_x96: U256,
    sqrt_price_upper_x96: U256,
    zero_for_one: bool,
) -> Result<u128, LedgerError> {
    if zero_for_one {
        get_liquidity_for_amount0(sqrt_price_lower_x96, sqrt_price_upper_x96, amount)
    } else {
        get_liquidity_for_amount1(sqrt_price_lower_x96, sqrt_price_upper_x96, amount)
    }
}

/// Funding token backing `liquidity` across a range. Round up for amounts
/// owed to the pool, down for amounts paid out.
pub fn liquidity_to_amounts(
    liquidity: u128,
    sqrt_price_lower_x96: U256,
    sqrt_price_upper_x96: U256,
    zero_for_one: bool,
    round_up: bool,
) -> Result<u128, LedgerError> {
    let amount = if zero_for_one {
        get_amount0_delta(liquidity, sqrt_price_lower_x96, sqrt_price_upper_x96, round_up)?
    } else {
        get_amount1_delta(liquidity, sqrt_price_lower_x96, sqrt_price_upper_x96, round_up)?
    };
    to_u128(amount)
}

pub fn add_delta(liquidity: u128, delta: i128) -> Result<u128, LedgerError> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(LedgerError::Overflow)
    } else {
        liquidity
            .checked_add(delta as u128)
            .ok_or(LedgerError::Overflow)
    }
}
