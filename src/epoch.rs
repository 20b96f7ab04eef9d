use crate::error::LedgerError;
use crate::tick_index::TickIndex;

/// Monotonic auction epoch. Ticks remember the epoch in which the sweep
/// last recorded fills on them, which tells positions which records are
/// theirs to claim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EpochLedger {
    accum_epoch: u32,
}

impl EpochLedger {
    pub fn current_epoch(&self) -> u32 {
        self.accum_epoch
    }

    /// Called once for every sync that moves the latest tick.
    pub fn advance_epoch(&mut self) -> Result<u32, LedgerError> {
        self.accum_epoch = self.accum_epoch.checked_add(1).ok_or(LedgerError::Overflow)?;
        Ok(self.accum_epoch)
    }

    /// Epoch of the last recording at `tick`, zero for ticks never recorded.
    pub fn last_touched_epoch(&self, index: &TickIndex, tick: i32) -> u32 {
        index.node(tick).map(|node| node.accum_epoch_last).unwrap_or(0)
    }

    pub fn mark_touched(&self, index: &mut TickIndex, tick: i32) -> Result<(), LedgerError> {
        let node = index.node_mut(tick).ok_or(LedgerError::InvalidTickHint(tick))?;
        node.accum_epoch_last = self.accum_epoch;
        Ok(())
    }
}
