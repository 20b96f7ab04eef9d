use crate::auction::{self, target_tick, SyncOutcome};
use crate::config::CoverPoolConfig;
use crate::error::LedgerError;
use crate::position::{self, BurnOutcome, BurnParams, MintOutcome, MintParams};
use crate::state::{GlobalState, LedgerState, PoolSide, PoolState, Position};
use crate::swap::{self, SwapParams, SwapResult};
use crate::tick::Tick;
use crate::tick_math::get_sqrt_ratio_at_tick;
use tracing::{instrument, warn};

/// Time-weighted average price oracle.
pub trait TwapSource {
    fn average_tick(&self, twap_length: u32) -> i32;
    fn observations_sufficient(&self, twap_length: u32) -> bool;
}

/// Monotonic block height supplied by the embedding chain or test.
pub trait BlockClock {
    fn block_number(&self) -> u64;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    Zero,
    One,
}

impl Token {
    /// Token a pool's positions deposit and get back unsold.
    pub fn funding(zero_for_one: bool) -> Self {
        if zero_for_one {
            Token::Zero
        } else {
            Token::One
        }
    }

    /// Token a pool's positions receive from fills.
    pub fn proceeds(zero_for_one: bool) -> Self {
        Self::funding(!zero_for_one)
    }
}

/// Moves tokens between the caller and the pool.
pub trait TokenMover {
    fn deposit(&mut self, token: Token, amount: u128) -> Result<(), String>;
    fn withdraw(&mut self, token: Token, amount: u128) -> Result<(), String>;
}

fn deposit(tokens: &mut impl TokenMover, token: Token, amount: u128) -> Result<(), LedgerError> {
    if amount == 0 {
        return Ok(());
    }
    tokens.deposit(token, amount).map_err(LedgerError::Transfer)
}

fn withdraw(tokens: &mut impl TokenMover, token: Token, amount: u128) -> Result<(), LedgerError> {
    if amount == 0 {
        return Ok(());
    }
    tokens.withdraw(token, amount).map_err(LedgerError::Transfer)
}

fn surface(err: LedgerError) -> LedgerError {
    if err.is_fatal() {
        warn!(error = %err, "ledger consistency error, call aborted");
    }
    err
}

/// A cover pool: both directions, their positions, and the auction that
/// moves them. Every mutation syncs the auction first and commits nothing
/// unless it succeeds entirely.
#[derive(Debug)]
pub struct PoolLedger<T, C> {
    config: CoverPoolConfig,
    state: LedgerState,
    twap: T,
    clock: C,
}

impl<T: TwapSource, C: BlockClock> PoolLedger<T, C> {
    pub fn new(config: CoverPoolConfig, twap: T, clock: C) -> Result<Self, LedgerError> {
        config.validate()?;
        if !twap.observations_sufficient(config.twap_length) {
            return Err(LedgerError::WaitUntilEnoughObservations);
        }
        let latest_tick = target_tick(&config, twap.average_tick(config.twap_length));
        let block = clock.block_number();
        let state = LedgerState {
            global: GlobalState {
                unlocked: true,
                tick_spread: config.tick_spread,
                twap_length: config.twap_length,
                auction_length: config.auction_length,
                latest_tick,
                genesis_block: block,
                last_block: block,
                auction_start: block,
                epochs: Default::default(),
                liquidity_global: 0,
                latest_price: get_sqrt_ratio_at_tick(latest_tick)?,
                position_id_next: 0,
            },
            pool0: PoolSide::new(true, config.tick_spread, latest_tick)?,
            pool1: PoolSide::new(false, config.tick_spread, latest_tick)?,
        };
        Ok(Self {
            config,
            state,
            twap,
            clock,
        })
    }

    pub fn config(&self) -> &CoverPoolConfig {
        &self.config
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn global(&self) -> &GlobalState {
        &self.state.global
    }

    pub fn pool(&self, zero_for_one: bool) -> &PoolState {
        &self.state.side(zero_for_one).pool
    }

    pub fn tick(&self, zero_for_one: bool, tick: i32) -> Option<&Tick> {
        self.state.side(zero_for_one).tick(tick)
    }

    pub fn position(&self, zero_for_one: bool, position_id: u64) -> Option<&Position> {
        self.state.side(zero_for_one).positions.get(&position_id)
    }

    pub fn twap_mut(&mut self) -> &mut T {
        &mut self.twap
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    fn synced(&self, state: &mut LedgerState) -> Result<SyncOutcome, LedgerError> {
        if !self.twap.observations_sufficient(self.config.twap_length) {
            return Err(LedgerError::WaitUntilEnoughObservations);
        }
        let average_tick = self.twap.average_tick(self.config.twap_length);
        auction::sync(state, &self.config, average_tick, self.clock.block_number())
    }

    /// Runs `op` on a synced copy of the state and commits it on success.
    ///
    /// `&mut self` is what rules out reentry. `unlocked` is cleared only on
    /// the working copy, so the committed state stays unlocked between calls.
    fn transact<R>(
        &mut self,
        op: impl FnOnce(&mut LedgerState, &CoverPoolConfig) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        if !self.state.global.unlocked {
            return Err(LedgerError::Locked);
        }
        let mut next = self.state.clone();
        next.global.unlocked = false;
        self.synced(&mut next).map_err(surface)?;
        let result = op(&mut next, &self.config).map_err(surface)?;
        next.global.unlocked = true;
        self.state = next;
        Ok(result)
    }

    /// Previews on a synced copy without committing.
    fn preview<R>(
        &self,
        op: impl FnOnce(&mut LedgerState) -> Result<R, LedgerError>,
    ) -> Result<R, LedgerError> {
        let mut next = self.state.clone();
        self.synced(&mut next)?;
        op(&mut next)
    }

    /// Forces an auction pass without trading.
    #[instrument(skip(self))]
    pub fn sync(&mut self) -> Result<SyncOutcome, LedgerError> {
        if !self.state.global.unlocked {
            return Err(LedgerError::Locked);
        }
        let mut next = self.state.clone();
        let outcome = self.synced(&mut next).map_err(surface)?;
        self.state = next;
        Ok(outcome)
    }

    #[instrument(skip(self, tokens))]
    pub fn mint(
        &mut self,
        params: MintParams,
        tokens: &mut impl TokenMover,
    ) -> Result<MintOutcome, LedgerError> {
        self.transact(|state, config| {
            let outcome = position::mint(state, config, &params)?;
            deposit(tokens, Token::funding(params.zero_for_one), params.amount)?;
            Ok(outcome)
        })
    }

    #[instrument(skip(self, tokens))]
    pub fn burn(
        &mut self,
        params: BurnParams,
        tokens: &mut impl TokenMover,
    ) -> Result<BurnOutcome, LedgerError> {
        self.transact(|state, _| {
            let outcome = position::burn(state, &params)?;
            withdraw(tokens, Token::proceeds(params.zero_for_one), outcome.amount_in)?;
            withdraw(tokens, Token::funding(params.zero_for_one), outcome.amount_out)?;
            Ok(outcome)
        })
    }

    #[instrument(skip(self, tokens))]
    pub fn swap(
        &mut self,
        params: SwapParams,
        tokens: &mut impl TokenMover,
    ) -> Result<SwapResult, LedgerError> {
        self.transact(|state, _| {
            let result = swap::swap(state, &params)?;
            let (paid, bought) = if params.zero_for_one {
                (Token::Zero, Token::One)
            } else {
                (Token::One, Token::Zero)
            };
            deposit(tokens, paid, result.amount_in)?;
            withdraw(tokens, bought, result.amount_out)?;
            Ok(result)
        })
    }

    /// What `swap` would take and give right now.
    pub fn quote(&self, params: SwapParams) -> Result<(u128, u128), LedgerError> {
        self.preview(|state| swap::swap(state, &params))
            .map(|result| (result.amount_in, result.amount_out))
    }

    /// What `burn` would pay out right now.
    pub fn snapshot(&self, params: BurnParams) -> Result<BurnOutcome, LedgerError> {
        self.preview(|state| position::snapshot(state, &params))
    }

    /// The claim tick `burn` currently expects for a position.
    pub fn claim_tick(&self, zero_for_one: bool, position_id: u64) -> Result<i32, LedgerError> {
        self.preview(|state| position::claim_tick(state, zero_for_one, position_id))
    }
}
