use crate::error::LedgerError;
use crate::tick_math::MAX_TICK;

/// What sync does when the TWAP moved further than the auction clock allows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuctionPolicy {
    /// Step as many tick spreads as the elapsed blocks pay for.
    #[default]
    PartialStep,
    /// Refuse to move until the whole distance has elapsed.
    FailClosed,
}

/// Immutable per-pool parameters supplied at construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoverPoolConfig {
    pub tick_spread: i32,
    pub twap_length: u32,
    /// Blocks the auction runs per tick spread of movement.
    pub auction_length: u64,
    /// Narrowest position, in tick spreads.
    pub min_position_width: i32,
    /// Round the average tick down (true) or up (false) to the spread grid.
    pub min_amount_lower_priced: bool,
    pub auction_policy: AuctionPolicy,
}

impl CoverPoolConfig {
    pub fn new(tick_spread: i32, twap_length: u32, auction_length: u64) -> Self {
        Self {
            tick_spread,
            twap_length,
            auction_length,
            min_position_width: 1,
            min_amount_lower_priced: true,
            auction_policy: AuctionPolicy::default(),
        }
    }

    pub fn with_auction_policy(mut self, auction_policy: AuctionPolicy) -> Self {
        self.auction_policy = auction_policy;
        self
    }

    pub fn with_min_position_width(mut self, min_position_width: i32) -> Self {
        self.min_position_width = min_position_width;
        self
    }

    pub fn with_min_amount_lower_priced(mut self, min_amount_lower_priced: bool) -> Self {
        self.min_amount_lower_priced = min_amount_lower_priced;
        self
    }

    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.tick_spread <= 0 || self.tick_spread > MAX_TICK / 4 {
            return Err(LedgerError::InvalidConfig("tick spread out of range"));
        }
        if self.twap_length == 0 {
            return Err(LedgerError::InvalidConfig("twap length must be positive"));
        }
        if self.auction_length == 0 {
            return Err(LedgerError::InvalidConfig("auction length must be positive"));
        }
        if self.min_position_width <= 0 {
            return Err(LedgerError::InvalidConfig("min position width must be positive"));
        }
        Ok(())
    }
}
