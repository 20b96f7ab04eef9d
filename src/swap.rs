use crate::error::LedgerError;
use crate::full_math::{div_rounding_up, mul_div, to_u128, Q96};
use crate::liquidity_math::{get_amount0_delta, get_amount1_delta};
use crate::state::{LedgerState, PoolSide};
use crate::tick_math;
use alloy::primitives::U256;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapParams {
    /// Pay token0 for token1 (fills pool1) or token1 for token0 (fills pool0).
    pub zero_for_one: bool,
    pub amount_in: u128,
    /// Furthest sqrt price the auction may be pushed to.
    pub price_limit: U256,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SwapResult {
    pub amount_in: u128,
    pub amount_out: u128,
    pub sqrt_price_after: U256,
    pub liquidity: u128,
}

// the part of the live segment a swap is allowed to cross
struct SwapStep {
    sqrt_price_start_x96: U256,
    sqrt_price_target_x96: U256,
    sqrt_price_next_x96: U256,
    amount_in: U256,
    amount_out: U256,
}

fn check_limit(side: &PoolSide, price_limit: U256) -> Result<(), LedgerError> {
    if price_limit < tick_math::MIN_SQRT_RATIO || price_limit >= tick_math::MAX_SQRT_RATIO {
        return Err(LedgerError::InvalidSwapLimit);
    }
    // pool0 auctions downward, pool1 upward
    let behind = if side.zero_for_one {
        price_limit > side.pool.price
    } else {
        price_limit < side.pool.price
    };
    if behind {
        return Err(LedgerError::InvalidSwapLimit);
    }
    Ok(())
}

fn compute_step(side: &PoolSide, amount: u128, price_limit: U256) -> Result<SwapStep, LedgerError> {
    let liquidity = side.pool.liquidity;
    let start = side.pool.price;
    let segment_end = tick_math::get_sqrt_ratio_at_tick(side.pool.nearest_tick)?;
    let mut step = SwapStep {
        sqrt_price_start_x96: start,
        sqrt_price_target_x96: if side.zero_for_one {
            segment_end.max(price_limit)
        } else {
            segment_end.min(price_limit)
        },
        sqrt_price_next_x96: start,
        amount_in: U256::ZERO,
        amount_out: U256::ZERO,
    };
    let amount = U256::from(amount);
    let target = step.sqrt_price_target_x96;

    if side.zero_for_one {
        // token1 in, price falls
        let max_in = get_amount1_delta(liquidity, target, start, true)?;
        step.sqrt_price_next_x96 = if amount >= max_in {
            target
        } else {
            let delta = mul_div(amount, Q96, U256::from(liquidity))?;
            start.saturating_sub(delta).max(target)
        };
        step.amount_in = get_amount1_delta(liquidity, step.sqrt_price_next_x96, start, true)?;
        step.amount_out = get_amount0_delta(liquidity, step.sqrt_price_next_x96, start, false)?;
    } else {
        // token0 in, price rises
        let max_in = get_amount0_delta(liquidity, start, target, true)?;
        step.sqrt_price_next_x96 = if amount >= max_in {
            target
        } else {
            let numerator = U256::from(liquidity) << 96usize;
            let base = div_rounding_up(numerator, start)?;
            if amount >= base {
                target
            } else {
                (numerator / (base - amount)).min(target)
            }
        };
        step.amount_in = get_amount0_delta(liquidity, start, step.sqrt_price_next_x96, true)?;
        step.amount_out = get_amount1_delta(liquidity, start, step.sqrt_price_next_x96, false)?;
    }
    step.amount_in = step.amount_in.min(amount);
    Ok(step)
}

/// Buys from the live segment of the pool the swap direction fills. The
/// price never leaves the segment; input beyond it is not taken.
pub fn swap(state: &mut LedgerState, params: &SwapParams) -> Result<SwapResult, LedgerError> {
    let side = state.side_mut(!params.zero_for_one);
    check_limit(side, params.price_limit)?;
    if params.amount_in == 0 || side.pool.liquidity == 0 {
        return Ok(SwapResult {
            sqrt_price_after: side.pool.price,
            liquidity: side.pool.liquidity,
            ..Default::default()
        });
    }

    let step = compute_step(side, params.amount_in, params.price_limit)?;
    let amount_in = to_u128(step.amount_in)?;
    let amount_out = to_u128(step.amount_out)?;
    side.pool.price = step.sqrt_price_next_x96;
    side.pool.amount_in_delta = side
        .pool
        .amount_in_delta
        .checked_add(i128::try_from(amount_in).map_err(|_| LedgerError::Overflow)?)
        .ok_or(LedgerError::Overflow)?;
    debug!(
        zero_for_one = params.zero_for_one,
        amount_in,
        amount_out,
        price_before = %step.sqrt_price_start_x96,
        price_after = %step.sqrt_price_next_x96,
        "swapped"
    );
    Ok(SwapResult {
        amount_in,
        amount_out,
        sqrt_price_after: step.sqrt_price_next_x96,
        liquidity: side.pool.liquidity,
    })
}
