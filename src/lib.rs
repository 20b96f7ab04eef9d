//! TWAP-gated directional liquidity ledger.
//!
//! Positions sit on one side of a protocol-controlled latest tick. The tick
//! only moves through a timed auction that follows an external average tick,
//! and positions claim what the auction filled tick by tick.

pub mod auction;
pub mod config;
pub mod deltas;
pub mod epoch;
pub mod error;
pub mod full_math;
pub mod ledger;
pub mod liquidity_math;
pub mod position;
pub mod state;
pub mod swap;
pub mod tick;
pub mod tick_bitmap;
pub mod tick_index;
pub mod tick_math;

pub use config::{AuctionPolicy, CoverPoolConfig};
pub use error::{ErrorKind, LedgerError};
pub use ledger::{BlockClock, PoolLedger, Token, TokenMover, TwapSource};
pub use position::{BurnOutcome, BurnParams, MintOutcome, MintParams, BURN_PERCENT_PRECISION};
pub use swap::{SwapParams, SwapResult};
