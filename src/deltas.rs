use crate::error::LedgerError;
use crate::full_math::{mul_div, to_u128, Q96};
use crate::liquidity_math::{get_amount0_delta, get_amount1_delta};
use crate::tick_math::get_sqrt_ratio_at_tick;
use alloy::primitives::U256;

/// Fill state of the segments the sweep departed from one tick.
///
/// `amount_in_delta` is input received from swaps and owed to positions,
/// `amount_out_delta` is output left unsold and returned to positions. The
/// `*_max` fields cap both at what the full segment could have produced.
/// `liquidity` is the total weight that produced the record; positions claim
/// their share pro-rata against it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Deltas {
    pub amount_in_delta: u128,
    pub amount_in_delta_max: u128,
    pub amount_out_delta: u128,
    pub amount_out_delta_max: u128,
    pub liquidity: u128,
}

impl Deltas {
    pub fn is_empty(&self) -> bool {
        self.liquidity == 0
            && self.amount_in_delta == 0
            && self.amount_in_delta_max == 0
            && self.amount_out_delta == 0
            && self.amount_out_delta_max == 0
    }

    /// Folds another segment's fills into this record.
    pub fn record(&mut self, other: &Deltas) -> Result<(), LedgerError> {
        self.amount_in_delta = checked_add(self.amount_in_delta, other.amount_in_delta)?;
        self.amount_in_delta_max = checked_add(self.amount_in_delta_max, other.amount_in_delta_max)?;
        self.amount_out_delta = checked_add(self.amount_out_delta, other.amount_out_delta)?;
        self.amount_out_delta_max =
            checked_add(self.amount_out_delta_max, other.amount_out_delta_max)?;
        self.liquidity = checked_add(self.liquidity, other.liquidity)?;
        Ok(())
    }

    /// Removes the share owned by `liquidity` and returns it as `(in, out)`.
    /// The last claimant takes whatever rounding left behind.
    pub fn claim(&mut self, liquidity: u128) -> Result<(u128, u128), LedgerError> {
        if liquidity == 0 {
            return Ok((0, 0));
        }
        if liquidity > self.liquidity {
            return Err(LedgerError::Overflow);
        }
        if liquidity == self.liquidity {
            let claimed = (self.amount_in_delta, self.amount_out_delta);
            *self = Deltas::default();
            return Ok(claimed);
        }
        let in_max = share(self.amount_in_delta_max, liquidity, self.liquidity)?;
        let out_max = share(self.amount_out_delta_max, liquidity, self.liquidity)?;
        let amount_in = share(self.amount_in_delta, liquidity, self.liquidity)?.min(in_max);
        let amount_out = share(self.amount_out_delta, liquidity, self.liquidity)?.min(out_max);

        self.amount_in_delta -= amount_in;
        self.amount_in_delta_max -= in_max;
        self.amount_out_delta -= amount_out;
        self.amount_out_delta_max -= out_max;
        self.liquidity -= liquidity;
        Ok((amount_in, amount_out))
    }
}

fn checked_add(a: u128, b: u128) -> Result<u128, LedgerError> {
    a.checked_add(b).ok_or(LedgerError::Overflow)
}

fn share(amount: u128, liquidity: u128, total: u128) -> Result<u128, LedgerError> {
    to_u128(mul_div(U256::from(amount), U256::from(liquidity), U256::from(total))?)
}

fn per_liquidity(amount: U256, liquidity: u128) -> Result<i128, LedgerError> {
    let scaled = mul_div(amount, Q96, U256::from(liquidity))?;
    i128::try_from(to_u128(scaled)?).map_err(|_| LedgerError::Overflow)
}

/// Input never received and output never sold by `liquidity` over the part
/// of the segment from `current_tick` to `next_tick` the auction price has
/// not reached yet. Both round down.
fn unfilled(
    current_tick: i32,
    next_tick: i32,
    current_price: U256,
    liquidity: u128,
    is_pool0: bool,
) -> Result<(U256, U256), LedgerError> {
    let start_price = get_sqrt_ratio_at_tick(current_tick)?;
    let next_price = get_sqrt_ratio_at_tick(next_tick)?;
    if is_pool0 {
        // price auctions downward from start_price
        let price = current_price.min(start_price);
        if price <= next_price {
            return Ok((U256::ZERO, U256::ZERO));
        }
        Ok((
            get_amount1_delta(liquidity, next_price, price, false)?,
            get_amount0_delta(liquidity, next_price, price, false)?,
        ))
    } else {
        let price = current_price.max(start_price);
        if price >= next_price {
            return Ok((U256::ZERO, U256::ZERO));
        }
        Ok((
            get_amount0_delta(liquidity, price, next_price, false)?,
            get_amount1_delta(liquidity, price, next_price, false)?,
        ))
    }
}

/// Unfilled carry of the segment from `current_tick` to `next_tick` when the
/// auction price stopped at `current_price`, per unit of liquidity in Q96.
///
/// Returns `(amount_in_delta, amount_out_delta)`: the input that was never
/// received (negative) and the output that was never sold. A pool with no
/// liquidity or a fully filled segment carries nothing. Fails with
/// `Overflow` when a per-liquidity amount does not fit an `i128`, which
/// happens for segments near the tick bounds.
pub fn rollover(
    current_tick: i32,
    next_tick: i32,
    current_price: U256,
    current_liquidity: u128,
    is_pool0: bool,
) -> Result<(i128, i128), LedgerError> {
    if current_liquidity == 0 {
        return Ok((0, 0));
    }
    let (unfilled_in, unfilled_out) =
        unfilled(current_tick, next_tick, current_price, current_liquidity, is_pool0)?;
    Ok((
        -per_liquidity(unfilled_in, current_liquidity)?,
        per_liquidity(unfilled_out, current_liquidity)?,
    ))
}

/// Final fills of a segment the sweep leaves, given the auction price it
/// reached and the input it actually received.
pub fn settle_segment(
    current_tick: i32,
    next_tick: i32,
    current_price: U256,
    liquidity: u128,
    amount_received: u128,
    is_pool0: bool,
) -> Result<Deltas, LedgerError> {
    let start_price = get_sqrt_ratio_at_tick(current_tick)?;
    let next_price = get_sqrt_ratio_at_tick(next_tick)?;
    let (in_max, out_max) = if is_pool0 {
        (
            get_amount1_delta(liquidity, next_price, start_price, false)?,
            get_amount0_delta(liquidity, next_price, start_price, false)?,
        )
    } else {
        (
            get_amount0_delta(liquidity, start_price, next_price, false)?,
            get_amount1_delta(liquidity, start_price, next_price, false)?,
        )
    };
    let (in_max, out_max) = (to_u128(in_max)?, to_u128(out_max)?);

    let (unfilled_in, unfilled_out) =
        unfilled(current_tick, next_tick, current_price, liquidity, is_pool0)?;
    let unfilled_out = to_u128(unfilled_out)?.min(out_max);
    // capped by the input actually received
    let filled_in = in_max.saturating_sub(to_u128(unfilled_in)?).min(amount_received);

    Ok(Deltas {
        amount_in_delta: filled_in,
        amount_in_delta_max: in_max,
        amount_out_delta: unfilled_out,
        amount_out_delta_max: out_max,
        liquidity,
    })
}
