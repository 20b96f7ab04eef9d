use crate::error::LedgerError;
use crate::tick::{Tick, TickNode};
use crate::tick_bitmap::{flip_tick, is_set, next_initialized_tick_within_one_word};
use crate::tick_math::tick_bounds;
use alloy::primitives::U256;
use std::collections::HashMap;

/// Ordered set of initialized ticks: a linked list over `HashMap` nodes plus
/// an existence bitmap for neighbour lookups. The two usable tick bounds are
/// permanent sentinels so every tick in range has both neighbours.
#[derive(Clone, Debug)]
pub struct TickIndex {
    tick_spread: i32,
    min_tick: i32,
    max_tick: i32,
    nodes: HashMap<i32, TickNode>,
    bitmap: HashMap<i16, U256>,
}

impl TickIndex {
    pub fn new(tick_spread: i32) -> Result<Self, LedgerError> {
        if tick_spread <= 0 {
            return Err(LedgerError::InvalidConfig("tick spread must be positive"));
        }
        let (min_tick, max_tick) = tick_bounds(tick_spread);
        let mut index = Self {
            tick_spread,
            min_tick,
            max_tick,
            nodes: HashMap::new(),
            bitmap: HashMap::new(),
        };
        for tick in [min_tick, max_tick] {
            index.nodes.insert(
                tick,
                TickNode {
                    previous_tick: min_tick,
                    next_tick: max_tick,
                    accum_epoch_last: 0,
                },
            );
            flip_tick(&mut index.bitmap, tick, tick_spread)?;
        }
        Ok(index)
    }

    pub fn tick_spread(&self) -> i32 {
        self.tick_spread
    }

    pub fn bounds(&self) -> (i32, i32) {
        (self.min_tick, self.max_tick)
    }

    pub fn contains(&self, tick: i32) -> bool {
        self.nodes.contains_key(&tick)
    }

    pub fn node(&self, tick: i32) -> Option<&TickNode> {
        self.nodes.get(&tick)
    }

    pub(crate) fn node_mut(&mut self, tick: i32) -> Option<&mut TickNode> {
        self.nodes.get_mut(&tick)
    }

    /// Number of initialized ticks, sentinels included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn check_tick(&self, tick: i32) -> Result<(), LedgerError> {
        if tick % self.tick_spread != 0 || tick < self.min_tick || tick > self.max_tick {
            return Err(LedgerError::InvalidTickHint(tick));
        }
        Ok(())
    }

    /// Links `tick` between `hint_prev` and `hint_next`, which must be
    /// adjacent initialized ticks bracketing it. Already present ticks are
    /// left untouched.
    pub fn insert(&mut self, tick: i32, hint_prev: i32, hint_next: i32) -> Result<(), LedgerError> {
        self.check_tick(tick)?;
        if self.contains(tick) {
            return Ok(());
        }
        let brackets = hint_prev < tick
            && tick < hint_next
            && self
                .nodes
                .get(&hint_prev)
                .map(|node| node.next_tick == hint_next)
                .unwrap_or(false);
        if !brackets {
            return Err(LedgerError::InvalidTickHint(tick));
        }
        self.nodes.insert(
            tick,
            TickNode {
                previous_tick: hint_prev,
                next_tick: hint_next,
                accum_epoch_last: 0,
            },
        );
        if let Some(prev) = self.nodes.get_mut(&hint_prev) {
            prev.next_tick = tick;
        }
        if let Some(next) = self.nodes.get_mut(&hint_next) {
            next.previous_tick = tick;
        }
        flip_tick(&mut self.bitmap, tick, self.tick_spread)
    }

    /// Inserts `tick` using hints derived from the bitmap.
    pub fn insert_unhinted(&mut self, tick: i32) -> Result<(), LedgerError> {
        self.check_tick(tick)?;
        if self.contains(tick) {
            return Ok(());
        }
        let (prev, next) = self.hints(tick)?;
        self.insert(tick, prev, next)
    }

    /// Adjacent initialized ticks strictly around `tick`.
    pub fn hints(&self, tick: i32) -> Result<(i32, i32), LedgerError> {
        self.check_tick(tick)?;
        let prev = self.nearest(tick, true)?.ok_or(LedgerError::InvalidTickHint(tick))?;
        let next = self.nearest(tick, false)?.ok_or(LedgerError::InvalidTickHint(tick))?;
        Ok((prev, next))
    }

    /// Unlinks `tick` once its record is empty; a no-op otherwise and for
    /// the sentinels. Returns whether the node was removed.
    pub fn remove(&mut self, tick: i32, record: Option<&Tick>) -> Result<bool, LedgerError> {
        if tick == self.min_tick || tick == self.max_tick {
            return Ok(false);
        }
        if record.map(|record| !record.is_empty()).unwrap_or(false) {
            return Ok(false);
        }
        let Some(node) = self.nodes.remove(&tick) else {
            return Ok(false);
        };
        if let Some(prev) = self.nodes.get_mut(&node.previous_tick) {
            prev.next_tick = node.next_tick;
        }
        if let Some(next) = self.nodes.get_mut(&node.next_tick) {
            next.previous_tick = node.previous_tick;
        }
        flip_tick(&mut self.bitmap, tick, self.tick_spread)?;
        Ok(true)
    }

    /// Nearest initialized tick strictly below (`lte`) or strictly above `tick`.
    pub fn nearest(&self, tick: i32, lte: bool) -> Result<Option<i32>, LedgerError> {
        if let Some(node) = self.nodes.get(&tick) {
            return Ok(match (lte, tick == self.min_tick, tick == self.max_tick) {
                (true, true, _) | (false, _, true) => None,
                (true, ..) => Some(node.previous_tick),
                (false, ..) => Some(node.next_tick),
            });
        }
        if lte {
            let mut cursor = tick - self.tick_spread;
            while cursor >= self.min_tick {
                let (next, initialized) =
                    next_initialized_tick_within_one_word(&self.bitmap, cursor, self.tick_spread, true)?;
                if initialized {
                    return Ok(Some(next));
                }
                cursor = next - self.tick_spread;
            }
        } else {
            let mut cursor = tick;
            while cursor < self.max_tick {
                let (next, initialized) =
                    next_initialized_tick_within_one_word(&self.bitmap, cursor, self.tick_spread, false)?;
                if initialized {
                    return Ok(Some(next));
                }
                cursor = next;
            }
        }
        Ok(None)
    }

    pub fn is_initialized(&self, tick: i32) -> Result<bool, LedgerError> {
        if tick % self.tick_spread != 0 {
            return Ok(false);
        }
        is_set(&self.bitmap, tick, self.tick_spread)
    }

    /// Initialized ticks in ascending order.
    pub fn ticks(&self) -> Vec<i32> {
        let mut ticks = Vec::with_capacity(self.nodes.len());
        let mut cursor = self.min_tick;
        loop {
            ticks.push(cursor);
            if cursor == self.max_tick {
                break;
            }
            match self.nodes.get(&cursor) {
                Some(node) if node.next_tick > cursor => cursor = node.next_tick,
                _ => break,
            }
        }
        ticks
    }
}
