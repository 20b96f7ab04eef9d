use thiserror::Error;

/// Failure classes a caller can act on differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input, rejected before any state changed. Retry with corrected input.
    Validation,
    /// The oracle or the auction clock is not ready yet. Retry later.
    Timing,
    /// The ledger reached a state the algorithm does not expect. Never retry blindly.
    Consistency,
    /// Claim made at a stale tick or for more liquidity than held.
    ClaimOrdering,
    /// The token layer refused a deposit or withdrawal.
    Transfer,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // validation
    #[error("invalid lower tick {0}")]
    InvalidLowerTick(i32),
    #[error("invalid upper tick {0}")]
    InvalidUpperTick(i32),
    #[error("hint does not bracket tick {0}")]
    InvalidTickHint(i32),
    #[error("position bounds [{lower}, {upper}] are on the wrong side of latest tick {latest}")]
    InvalidPositionBoundsTwap { lower: i32, upper: i32, latest: i32 },
    #[error("position amount must be non-zero")]
    InvalidPositionAmount,
    #[error("position narrower than {min_width} tick spreads")]
    PositionTooNarrow { min_width: i32 },
    #[error("position {0} not found")]
    PositionNotFound(u64),
    #[error("position {0} exists with different bounds")]
    PositionBoundsMismatch(u64),
    #[error("position {0} has already entered the auction")]
    PositionAlreadyEntered(u64),
    #[error("invalid swap price limit")]
    InvalidSwapLimit,
    #[error("sqrt price out of bounds")]
    PriceOutOfBounds,
    #[error("tick {0} out of bounds")]
    TickOutOfBounds(i32),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
    #[error("ledger is locked")]
    Locked,

    // timing
    #[error("wait until enough observations")]
    WaitUntilEnoughObservations,
    #[error("auction needs {required} blocks, only {elapsed} elapsed")]
    AuctionNotElapsed { required: u64, elapsed: u64 },

    // consistency
    #[error("infinite tick loop in pool0 at tick {0}")]
    InfiniteTickLoop0(i32),
    #[error("infinite tick loop in pool1 at tick {0}")]
    InfiniteTickLoop1(i32),
    #[error("arithmetic overflow")]
    Overflow,

    // claim ordering
    #[error("wrong tick claimed at: expected {expected}, got {claimed}")]
    WrongTickClaimedAt { expected: i32, claimed: i32 },
    #[error("not enough position liquidity")]
    NotEnoughPositionLiquidity,

    #[error("token transfer failed: {0}")]
    Transfer(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            WaitUntilEnoughObservations | AuctionNotElapsed { .. } => ErrorKind::Timing,
            InfiniteTickLoop0(_) | InfiniteTickLoop1(_) | Overflow => ErrorKind::Consistency,
            WrongTickClaimedAt { .. } | NotEnoughPositionLiquidity => ErrorKind::ClaimOrdering,
            Transfer(_) => ErrorKind::Transfer,
            _ => ErrorKind::Validation,
        }
    }

    /// Consistency errors signal a broken ledger and must be surfaced to operators.
    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::Consistency
    }
}
