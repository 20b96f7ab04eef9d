use crate::config::CoverPoolConfig;
use crate::error::LedgerError;
use crate::full_math::{mul_div, to_u128};
use crate::liquidity_math::{
    amounts_to_liquidity, get_amount0_delta, get_amount1_delta, liquidity_to_amounts,
};
use crate::state::{LedgerState, PoolSide, Position};
use crate::tick_math::{get_sqrt_ratio_at_tick, get_tick_at_sqrt_ratio};
use alloy::primitives::U256;
use tracing::debug;

/// `burn_percent` equal to this burns the whole position.
pub const BURN_PERCENT_PRECISION: u128 = 100_000_000_000_000_000_000_000_000_000_000_000_000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintParams {
    pub lower: i32,
    pub upper: i32,
    /// Deposit in the funding token of the chosen pool.
    pub amount: u128,
    pub zero_for_one: bool,
    /// Adds to an existing, not yet entered position when set.
    pub position_id: Option<u64>,
    /// Initialized tick at or below `lower`, derived from the bitmap if unset.
    pub lower_old: Option<i32>,
    /// Initialized tick at or below `upper`, derived from the bitmap if unset.
    pub upper_old: Option<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MintOutcome {
    pub position_id: u64,
    pub liquidity: u128,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BurnParams {
    pub position_id: u64,
    pub claim_tick: i32,
    /// Share of the position to remove, scaled by `BURN_PERCENT_PRECISION`.
    pub burn_percent: u128,
    pub zero_for_one: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BurnOutcome {
    pub amount_in: u128,
    pub amount_out: u128,
    pub liquidity_burned: u128,
    pub closed: bool,
}

fn insert_with_hint(
    side: &mut PoolSide,
    tick: i32,
    hint: Option<i32>,
) -> Result<(), LedgerError> {
    if side.index.contains(tick) {
        return Ok(());
    }
    match hint {
        Some(previous) => {
            let next = side
                .index
                .node(previous)
                .map(|node| node.next_tick)
                .ok_or(LedgerError::InvalidTickHint(tick))?;
            side.index.insert(tick, previous, next)
        }
        None => side.index.insert_unhinted(tick),
    }
}

fn validate_mint(
    state: &LedgerState,
    config: &CoverPoolConfig,
    params: &MintParams,
) -> Result<(), LedgerError> {
    let MintParams { lower, upper, .. } = *params;
    if params.amount == 0 {
        return Err(LedgerError::InvalidPositionAmount);
    }
    let spread = config.tick_spread;
    let (min_tick, max_tick) = state.side(params.zero_for_one).index.bounds();
    if lower % spread != 0 || lower < min_tick || lower >= upper {
        return Err(LedgerError::InvalidLowerTick(lower));
    }
    if upper % spread != 0 || upper > max_tick {
        return Err(LedgerError::InvalidUpperTick(upper));
    }
    if (upper - lower) / spread < config.min_position_width {
        return Err(LedgerError::PositionTooNarrow {
            min_width: config.min_position_width,
        });
    }
    let latest = state.global.latest_tick;
    let beyond_latest = if params.zero_for_one { upper < latest } else { lower > latest };
    if !beyond_latest {
        return Err(LedgerError::InvalidPositionBoundsTwap {
            lower,
            upper,
            latest,
        });
    }
    Ok(())
}

/// Adds liquidity on the unfilled side of the latest tick.
pub fn mint(
    state: &mut LedgerState,
    config: &CoverPoolConfig,
    params: &MintParams,
) -> Result<MintOutcome, LedgerError> {
    validate_mint(state, config, params)?;
    let MintParams {
        lower,
        upper,
        zero_for_one,
        ..
    } = *params;

    let liquidity = amounts_to_liquidity(
        params.amount,
        get_sqrt_ratio_at_tick(lower)?,
        get_sqrt_ratio_at_tick(upper)?,
        zero_for_one,
    )?;
    if liquidity == 0 {
        return Err(LedgerError::InvalidPositionAmount);
    }

    let epoch = state.global.epochs.current_epoch();
    let position_id = match params.position_id {
        Some(id) => {
            if let Some(existing) = state.side(zero_for_one).positions.get(&id) {
                if existing.lower != lower || existing.upper != upper {
                    return Err(LedgerError::PositionBoundsMismatch(id));
                }
                let entry = existing.entry_tick(zero_for_one);
                if claim_tick_of(state.side(zero_for_one), existing)? != entry {
                    return Err(LedgerError::PositionAlreadyEntered(id));
                }
            }
            state.global.position_id_next = state.global.position_id_next.max(id.saturating_add(1));
            id
        }
        None => {
            let id = state.global.position_id_next;
            state.global.position_id_next = id.checked_add(1).ok_or(LedgerError::Overflow)?;
            id
        }
    };

    let side = state.side_mut(zero_for_one);
    insert_with_hint(side, lower, params.lower_old).map_err(|_| LedgerError::InvalidLowerTick(lower))?;
    let upper_hint = params
        .upper_old
        .map(|upper_old| if upper_old <= lower { lower } else { upper_old });
    insert_with_hint(side, upper, upper_hint).map_err(|_| LedgerError::InvalidUpperTick(upper))?;

    let signed = i128::try_from(liquidity).map_err(|_| LedgerError::Overflow)?;
    let (entry, exit) = if zero_for_one { (upper, lower) } else { (lower, upper) };
    side.apply_liquidity_delta(exit, signed)?;
    side.apply_liquidity_delta(entry, -signed)?;

    let claim_price_last = get_sqrt_ratio_at_tick(entry)?;
    let position = side.positions.entry(position_id).or_insert(Position {
        lower,
        upper,
        liquidity: 0,
        accum_epoch_last: epoch,
        claim_price_last,
        amount_in: 0,
        amount_out: 0,
    });
    position.liquidity = position
        .liquidity
        .checked_add(liquidity)
        .ok_or(LedgerError::Overflow)?;
    position.accum_epoch_last = epoch;
    position.claim_price_last = claim_price_last;

    state.global.liquidity_global = state
        .global
        .liquidity_global
        .checked_add(liquidity)
        .ok_or(LedgerError::Overflow)?;
    debug!(position_id, lower, upper, zero_for_one, liquidity, "minted position");
    Ok(MintOutcome {
        position_id,
        liquidity,
    })
}

/// The tick up to which the position's fills have been recorded. Walking from
/// the last claim, every tick the sweep recorded after the position's epoch
/// belongs to it.
fn claim_tick_of(side: &PoolSide, position: &Position) -> Result<i32, LedgerError> {
    let exit = position.exit_tick(side.zero_for_one);
    let mut tick = get_tick_at_sqrt_ratio(position.claim_price_last)?;
    while tick != exit {
        match side.index.node(tick) {
            Some(node) if node.accum_epoch_last > position.accum_epoch_last => {
                tick = side.step(tick);
            }
            _ => break,
        }
    }
    Ok(tick)
}

/// Claim tick a burn of `position_id` must pass in the current state.
pub fn claim_tick(
    state: &LedgerState,
    zero_for_one: bool,
    position_id: u64,
) -> Result<i32, LedgerError> {
    let side = state.side(zero_for_one);
    let position = side
        .positions
        .get(&position_id)
        .ok_or(LedgerError::PositionNotFound(position_id))?;
    claim_tick_of(side, position)
}

fn untouched_amount(
    liquidity: u128,
    from: i32,
    to: i32,
    zero_for_one: bool,
) -> Result<u128, LedgerError> {
    if from == to || liquidity == 0 {
        return Ok(0);
    }
    liquidity_to_amounts(
        liquidity,
        get_sqrt_ratio_at_tick(from.min(to))?,
        get_sqrt_ratio_at_tick(from.max(to))?,
        zero_for_one,
        false,
    )
}

/// Pulls `liquidity` out of the live segment starting at `tick` and returns
/// what it earned and what it still holds there.
fn withdraw_live(
    side: &mut PoolSide,
    tick: i32,
    liquidity: u128,
) -> Result<(u128, u128), LedgerError> {
    let price = side.pool.price;
    let start = get_sqrt_ratio_at_tick(tick)?;
    let end = get_sqrt_ratio_at_tick(side.step(tick))?;
    let (earned, unsold) = if side.zero_for_one {
        (
            get_amount1_delta(liquidity, price, start, false)?,
            get_amount0_delta(liquidity, end, price, false)?,
        )
    } else {
        (
            get_amount0_delta(liquidity, start, price, false)?,
            get_amount1_delta(liquidity, price, end, false)?,
        )
    };
    let received = u128::try_from(side.pool.amount_in_delta).unwrap_or(0);
    let earned = to_u128(earned)?.min(received);

    side.pool.amount_in_delta -= i128::try_from(earned).map_err(|_| LedgerError::Overflow)?;
    side.pool.liquidity = side
        .pool
        .liquidity
        .checked_sub(liquidity)
        .ok_or(LedgerError::Overflow)?;
    if side.pool.liquidity == 0 {
        side.pool.amount_in_delta = 0;
    }
    Ok((earned, to_u128(unsold)?))
}

/// Claims the position's recorded fills up to `claim_tick` and removes
/// `burn_percent` of its remaining liquidity.
pub fn burn(state: &mut LedgerState, params: &BurnParams) -> Result<BurnOutcome, LedgerError> {
    let BurnParams {
        position_id,
        claim_tick,
        burn_percent,
        zero_for_one,
    } = *params;
    if burn_percent > BURN_PERCENT_PRECISION {
        return Err(LedgerError::NotEnoughPositionLiquidity);
    }
    let latest = state.global.latest_tick;
    let epoch = state.global.epochs.current_epoch();
    let side = state.side_mut(zero_for_one);
    let mut position = side
        .positions
        .get(&position_id)
        .cloned()
        .ok_or(LedgerError::PositionNotFound(position_id))?;

    let expected = claim_tick_of(side, &position)?;
    if claim_tick != expected {
        return Err(LedgerError::WrongTickClaimedAt {
            expected,
            claimed: claim_tick,
        });
    }

    let mut outcome = BurnOutcome::default();
    let mut tick = get_tick_at_sqrt_ratio(position.claim_price_last)?;
    while tick != expected {
        let record = side.ticks.entry(tick).or_default();
        let (amount_in, amount_out) = record.claim(position.accum_epoch_last, position.liquidity)?;
        outcome.amount_in = outcome.amount_in.checked_add(amount_in).ok_or(LedgerError::Overflow)?;
        outcome.amount_out = outcome.amount_out.checked_add(amount_out).ok_or(LedgerError::Overflow)?;
        side.clean(tick)?;
        debug!(position_id, tick, amount_in, amount_out, "claimed tick");
        tick = side.step(tick);
    }

    let burned = to_u128(mul_div(
        U256::from(position.liquidity),
        U256::from(burn_percent),
        U256::from(BURN_PERCENT_PRECISION),
    )?)?;
    let exit = position.exit_tick(zero_for_one);
    if burned > 0 && expected != exit {
        let signed = i128::try_from(burned).map_err(|_| LedgerError::Overflow)?;
        let untouched_from = if expected == latest {
            let (earned, unsold) = withdraw_live(side, expected, burned)?;
            outcome.amount_in = outcome.amount_in.checked_add(earned).ok_or(LedgerError::Overflow)?;
            outcome.amount_out = outcome.amount_out.checked_add(unsold).ok_or(LedgerError::Overflow)?;
            side.step(expected)
        } else {
            side.apply_liquidity_delta(expected, signed)?;
            expected
        };
        outcome.amount_out = outcome
            .amount_out
            .checked_add(untouched_amount(burned, untouched_from, exit, zero_for_one)?)
            .ok_or(LedgerError::Overflow)?;
        side.apply_liquidity_delta(exit, -signed)?;
    }

    position.liquidity -= burned;
    position.claim_price_last = get_sqrt_ratio_at_tick(expected)?;
    position.accum_epoch_last = epoch;
    position.amount_in = position.amount_in.saturating_add(outcome.amount_in);
    position.amount_out = position.amount_out.saturating_add(outcome.amount_out);
    outcome.liquidity_burned = burned;
    outcome.closed = position.liquidity == 0;
    if outcome.closed {
        side.positions.remove(&position_id);
    } else {
        side.positions.insert(position_id, position);
    }

    state.global.liquidity_global = state
        .global
        .liquidity_global
        .checked_sub(burned)
        .ok_or(LedgerError::Overflow)?;
    debug!(
        position_id,
        claim_tick,
        burned,
        amount_in = outcome.amount_in,
        amount_out = outcome.amount_out,
        "burned position"
    );
    Ok(outcome)
}

/// What `burn` would return, computed on a copy of the state.
pub fn snapshot(state: &LedgerState, params: &BurnParams) -> Result<BurnOutcome, LedgerError> {
    let mut preview = state.clone();
    burn(&mut preview, params)
}
