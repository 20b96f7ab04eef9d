use crate::config::{AuctionPolicy, CoverPoolConfig};
use crate::deltas::{settle_segment, Deltas};
use crate::epoch::EpochLedger;
use crate::error::LedgerError;
use crate::state::{LedgerState, PoolSide};
use crate::tick_math::{get_sqrt_ratio_at_tick, tick_bounds};
use tracing::{debug, info};

/// What a sync pass did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncOutcome {
    pub latest_tick: i32,
    /// Tick spreads moved, negative when moving down.
    pub steps: i64,
    pub accum_epoch: u32,
}

/// Rounds the oracle tick onto the spread grid and keeps it far enough from
/// the bounds that both live segments stay priceable.
pub fn target_tick(config: &CoverPoolConfig, average_tick: i32) -> i32 {
    let spread = config.tick_spread;
    let floor = average_tick.div_euclid(spread) * spread;
    let rounded = if config.min_amount_lower_priced || floor == average_tick {
        floor
    } else {
        floor + spread
    };
    let (min_tick, max_tick) = tick_bounds(spread);
    rounded.clamp(min_tick + spread, max_tick - spread)
}

/// Moves `latest_tick` toward the oracle tick as far as the auction clock
/// allows, settling every segment the moving pool leaves behind.
pub fn sync(
    state: &mut LedgerState,
    config: &CoverPoolConfig,
    average_tick: i32,
    block_number: u64,
) -> Result<SyncOutcome, LedgerError> {
    let spread = config.tick_spread;
    let latest = state.global.latest_tick;
    let target = target_tick(config, average_tick);

    let distance = u64::from((target - latest).unsigned_abs() / spread.unsigned_abs());
    let elapsed = block_number.saturating_sub(state.global.auction_start);
    let reachable = elapsed / config.auction_length;
    let steps = match config.auction_policy {
        AuctionPolicy::PartialStep => distance.min(reachable),
        AuctionPolicy::FailClosed if reachable < distance => {
            return Err(LedgerError::AuctionNotElapsed {
                required: distance.saturating_mul(config.auction_length),
                elapsed,
            });
        }
        AuctionPolicy::FailClosed => distance,
    };
    state.global.last_block = block_number;
    if steps == 0 {
        return Ok(SyncOutcome {
            latest_tick: latest,
            steps: 0,
            accum_epoch: state.global.epochs.current_epoch(),
        });
    }

    // steps <= distance, which came from an i32
    let offset = steps as i32 * spread;
    let moving_down = target < latest;
    let next_latest = if moving_down { latest - offset } else { latest + offset };
    let epoch = state.global.epochs.advance_epoch()?;

    let (sweeping, reversing) = if moving_down {
        (&mut state.pool0, &mut state.pool1)
    } else {
        (&mut state.pool1, &mut state.pool0)
    };
    sweep(sweeping, &state.global.epochs, latest, next_latest, steps)?;
    reverse(reversing, &state.global.epochs, latest)?;

    state.pool0.reset_segment(next_latest)?;
    state.pool1.reset_segment(next_latest)?;
    state.global.latest_tick = next_latest;
    state.global.latest_price = get_sqrt_ratio_at_tick(next_latest)?;
    state.global.auction_start = block_number;

    info!(
        from = latest,
        to = next_latest,
        target,
        epoch,
        "auction advanced latest tick"
    );
    Ok(SyncOutcome {
        latest_tick: next_latest,
        steps: if moving_down { -(steps as i64) } else { steps as i64 },
        accum_epoch: epoch,
    })
}

/// Records the fills of the segment leaving `tick` under the current epoch.
fn record(
    side: &mut PoolSide,
    epochs: &EpochLedger,
    tick: i32,
    deltas: &Deltas,
) -> Result<(), LedgerError> {
    side.index.insert_unhinted(tick)?;
    side.ticks
        .entry(tick)
        .or_default()
        .record(epochs.current_epoch(), deltas)?;
    epochs.mark_touched(&mut side.index, tick)
}

fn settle_live_segment(
    side: &mut PoolSide,
    epochs: &EpochLedger,
    tick: i32,
) -> Result<(), LedgerError> {
    let received = u128::try_from(side.pool.amount_in_delta).unwrap_or(0);
    let deltas = settle_segment(
        tick,
        side.step(tick),
        side.pool.price,
        side.pool.liquidity,
        received,
        side.zero_for_one,
    )?;
    debug!(
        tick,
        zero_for_one = side.zero_for_one,
        filled_in = deltas.amount_in_delta,
        unfilled_out = deltas.amount_out_delta,
        "settled segment"
    );
    record(side, epochs, tick, &deltas)
}

fn loop_error(side: &PoolSide, tick: i32) -> LedgerError {
    if side.zero_for_one {
        LedgerError::InfiniteTickLoop0(tick)
    } else {
        LedgerError::InfiniteTickLoop1(tick)
    }
}

/// Walks the pool along its direction from `from` to `to`. Active segments
/// are settled one spread at a time; empty stretches jump to the next
/// initialized tick.
fn sweep(
    side: &mut PoolSide,
    epochs: &EpochLedger,
    from: i32,
    to: i32,
    steps: u64,
) -> Result<(), LedgerError> {
    let max_iterations = steps.saturating_add(side.index.len() as u64).saturating_add(1);
    let mut iterations = 0u64;
    let mut tick = from;
    while tick != to {
        iterations += 1;
        if iterations > max_iterations {
            return Err(loop_error(side, tick));
        }
        if side.pool.liquidity > 0 {
            settle_live_segment(side, epochs, tick)?;
            tick = side.step(tick);
        } else {
            let nearest = side.index.nearest(tick, side.zero_for_one)?;
            tick = match nearest {
                Some(next) if side.zero_for_one => next.max(to),
                Some(next) => next.min(to),
                None => to,
            };
        }
        side.arrive(tick)?;
        side.pool.price = get_sqrt_ratio_at_tick(tick)?;
        side.pool.amount_in_delta = 0;
        debug!(tick, liquidity = side.pool.liquidity, "sweep crossed tick");
    }
    Ok(())
}

/// Parks the liquidity of a pool whose direction the auction just moved
/// against. A partially filled segment is settled first and the liquidity
/// resumes past it; otherwise it resumes at `latest`.
fn reverse(
    side: &mut PoolSide,
    epochs: &EpochLedger,
    latest: i32,
) -> Result<(), LedgerError> {
    let liquidity = side.pool.liquidity;
    if liquidity == 0 {
        return Ok(());
    }
    let resume_at = if side.pool.price != get_sqrt_ratio_at_tick(latest)? {
        settle_live_segment(side, epochs, latest)?;
        side.step(latest)
    } else {
        latest
    };
    let stash = i128::try_from(liquidity).map_err(|_| LedgerError::Overflow)?;
    side.apply_liquidity_delta(resume_at, -stash)?;
    side.pool.liquidity = 0;
    debug!(
        zero_for_one = side.zero_for_one,
        resume_at,
        liquidity,
        "stashed liquidity"
    );
    Ok(())
}
