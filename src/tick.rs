use crate::deltas::Deltas;
use crate::error::LedgerError;
use std::collections::BTreeMap;

/// Per-tick record of one pool direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Tick {
    // net liquidity removed from the active set when the sweep arrives here;
    // +L on a position's exit tick, -L on its entry tick, -L for a stash
    pub liquidity_delta: i128,
    // fills recorded for the segment the sweep departed from this tick, one
    // record per epoch the departure happened in
    pub deltas: BTreeMap<u32, Deltas>,
}

impl Tick {
    pub fn is_empty(&self) -> bool {
        self.liquidity_delta == 0 && self.deltas.is_empty()
    }

    /// Folds a settled segment into the record of `epoch`.
    pub fn record(&mut self, epoch: u32, deltas: &Deltas) -> Result<(), LedgerError> {
        self.deltas.entry(epoch).or_default().record(deltas)
    }

    /// Claims the share of `liquidity` from the first record made after
    /// `after_epoch`. A position crosses a tick at most once between claims,
    /// so that record is the one it took part in.
    pub fn claim(&mut self, after_epoch: u32, liquidity: u128) -> Result<(u128, u128), LedgerError> {
        let Some(lower) = after_epoch.checked_add(1) else {
            return Ok((0, 0));
        };
        let Some((&epoch, record)) = self.deltas.range_mut(lower..).next() else {
            return Ok((0, 0));
        };
        let claimed = record.claim(liquidity)?;
        if record.is_empty() {
            self.deltas.remove(&epoch);
        }
        Ok(claimed)
    }

    /// The record of `epoch`, if the sweep left one here then.
    pub fn deltas_at(&self, epoch: u32) -> Option<&Deltas> {
        self.deltas.get(&epoch)
    }
}

/// Doubly linked ordering over initialized ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickNode {
    pub previous_tick: i32,
    pub next_tick: i32,
    // epoch in which the sweep last recorded deltas here
    pub accum_epoch_last: u32,
}
