use crate::epoch::EpochLedger;
use crate::error::LedgerError;
use crate::liquidity_math::add_delta;
use crate::tick::Tick;
use crate::tick_index::TickIndex;
use crate::tick_math::get_sqrt_ratio_at_tick;
use alloy::primitives::U256;
use std::collections::HashMap;

/// Pool-wide state shared by both directions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalState {
    pub unlocked: bool,
    pub tick_spread: i32,
    pub twap_length: u32,
    pub auction_length: u64,
    pub latest_tick: i32,
    pub genesis_block: u64,
    pub last_block: u64,
    pub auction_start: u64,
    pub epochs: EpochLedger,
    pub liquidity_global: u128,
    pub latest_price: U256,
    pub position_id_next: u64,
}

/// Auction state of one direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolState {
    pub liquidity: u128,
    // input received from swaps over the live segment
    pub amount_in_delta: i128,
    pub price: U256,
    // far end of the live segment
    pub nearest_tick: i32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Position {
    pub lower: i32,
    pub upper: i32,
    pub liquidity: u128,
    pub accum_epoch_last: u32,
    // start of the range not yet claimed
    pub claim_price_last: U256,
    pub amount_in: u128,
    pub amount_out: u128,
}

impl Position {
    /// Tick where the sweep starts filling the position.
    pub fn entry_tick(&self, zero_for_one: bool) -> i32 {
        if zero_for_one {
            self.upper
        } else {
            self.lower
        }
    }

    /// Tick where the sweep is done with the position.
    pub fn exit_tick(&self, zero_for_one: bool) -> i32 {
        if zero_for_one {
            self.lower
        } else {
            self.upper
        }
    }
}

/// Everything owned by one direction: pool0 sweeps down, pool1 sweeps up.
#[derive(Clone, Debug)]
pub struct PoolSide {
    pub zero_for_one: bool,
    pub pool: PoolState,
    pub ticks: HashMap<i32, Tick>,
    pub index: TickIndex,
    pub positions: HashMap<u64, Position>,
}

impl PoolSide {
    pub fn new(zero_for_one: bool, tick_spread: i32, latest_tick: i32) -> Result<Self, LedgerError> {
        let mut side = Self {
            zero_for_one,
            pool: PoolState {
                liquidity: 0,
                amount_in_delta: 0,
                price: U256::ZERO,
                nearest_tick: latest_tick,
            },
            ticks: HashMap::new(),
            index: TickIndex::new(tick_spread)?,
            positions: HashMap::new(),
        };
        side.reset_segment(latest_tick)?;
        Ok(side)
    }

    /// One tick spread along the sweep direction.
    pub fn step(&self, tick: i32) -> i32 {
        if self.zero_for_one {
            tick - self.index.tick_spread()
        } else {
            tick + self.index.tick_spread()
        }
    }

    /// Restarts the live segment at `latest_tick` with nothing received.
    pub fn reset_segment(&mut self, latest_tick: i32) -> Result<(), LedgerError> {
        self.pool.price = get_sqrt_ratio_at_tick(latest_tick)?;
        self.pool.nearest_tick = self.step(latest_tick);
        self.pool.amount_in_delta = 0;
        Ok(())
    }

    pub fn tick(&self, tick: i32) -> Option<&Tick> {
        self.ticks.get(&tick)
    }

    /// Adds `delta` to the liquidity delta at `tick`, initializing it first.
    pub fn apply_liquidity_delta(&mut self, tick: i32, delta: i128) -> Result<(), LedgerError> {
        self.index.insert_unhinted(tick)?;
        let record = self.ticks.entry(tick).or_default();
        record.liquidity_delta = record
            .liquidity_delta
            .checked_add(delta)
            .ok_or(LedgerError::Overflow)?;
        self.clean(tick)
    }

    /// Takes the liquidity delta at `tick` and applies it to the active
    /// liquidity as the sweep arrives there.
    pub fn arrive(&mut self, tick: i32) -> Result<(), LedgerError> {
        let Some(record) = self.ticks.get_mut(&tick) else {
            return Ok(());
        };
        let delta = std::mem::take(&mut record.liquidity_delta);
        let negated = delta.checked_neg().ok_or(LedgerError::Overflow)?;
        self.pool.liquidity = add_delta(self.pool.liquidity, negated)?;
        self.clean(tick)
    }

    /// Drops the record and node at `tick` once nothing references them.
    pub fn clean(&mut self, tick: i32) -> Result<(), LedgerError> {
        let empty = self.ticks.get(&tick).map(Tick::is_empty).unwrap_or(true);
        if !empty {
            return Ok(());
        }
        self.ticks.remove(&tick);
        self.index.remove(tick, None)?;
        Ok(())
    }

    /// Sum of liquidity deltas over all ticks; equals the active liquidity
    /// whenever the ledger is consistent.
    pub fn net_liquidity_delta(&self) -> i128 {
        self.ticks.values().map(|tick| tick.liquidity_delta).sum()
    }
}

/// Complete ledger state. Operations run against a clone that replaces the
/// original only on success.
#[derive(Clone, Debug)]
pub struct LedgerState {
    pub global: GlobalState,
    pub pool0: PoolSide,
    pub pool1: PoolSide,
}

impl LedgerState {
    pub fn side(&self, zero_for_one: bool) -> &PoolSide {
        if zero_for_one {
            &self.pool0
        } else {
            &self.pool1
        }
    }

    pub fn side_mut(&mut self, zero_for_one: bool) -> &mut PoolSide {
        if zero_for_one {
            &mut self.pool0
        } else {
            &mut self.pool1
        }
    }
}
