use alloy::primitives::U256;
use cover_pool::tick_math::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};
use cover_pool::{
    AuctionPolicy, BlockClock, BurnParams, CoverPoolConfig, LedgerError, MintParams, PoolLedger,
    SwapParams, Token, TokenMover, TwapSource, BURN_PERCENT_PRECISION,
};

struct MockTwap {
    tick: i32,
    sufficient: bool,
}

impl TwapSource for MockTwap {
    fn average_tick(&self, _twap_length: u32) -> i32 {
        self.tick
    }

    fn observations_sufficient(&self, _twap_length: u32) -> bool {
        self.sufficient
    }
}

struct MockClock {
    block: u64,
}

impl BlockClock for MockClock {
    fn block_number(&self) -> u64 {
        self.block
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Deposit(Token, u128),
    Withdraw(Token, u128),
}

#[derive(Default)]
struct RecordingMover {
    transfers: Vec<Transfer>,
    refuse: bool,
}

impl TokenMover for RecordingMover {
    fn deposit(&mut self, token: Token, amount: u128) -> Result<(), String> {
        if self.refuse {
            return Err("transfers disabled".to_string());
        }
        self.transfers.push(Transfer::Deposit(token, amount));
        Ok(())
    }

    fn withdraw(&mut self, token: Token, amount: u128) -> Result<(), String> {
        if self.refuse {
            return Err("transfers disabled".to_string());
        }
        self.transfers.push(Transfer::Withdraw(token, amount));
        Ok(())
    }
}

type Ledger = PoolLedger<MockTwap, MockClock>;

const TEN_POW_20: u128 = 100_000_000_000_000_000_000;

fn ledger_with(config: CoverPoolConfig) -> eyre::Result<Ledger> {
    Ok(PoolLedger::new(
        config,
        MockTwap {
            tick: 0,
            sufficient: true,
        },
        MockClock { block: 0 },
    )?)
}

fn ledger() -> eyre::Result<Ledger> {
    ledger_with(CoverPoolConfig::new(20, 5, 10))
}

fn advance(ledger: &mut Ledger, tick: i32, block: u64) {
    ledger.twap_mut().tick = tick;
    ledger.clock_mut().block = block;
}

fn mint_params(lower: i32, upper: i32, amount: u128, zero_for_one: bool) -> MintParams {
    MintParams {
        lower,
        upper,
        amount,
        zero_for_one,
        position_id: None,
        lower_old: None,
        upper_old: None,
    }
}

fn burn_params(position_id: u64, claim_tick: i32, burn_percent: u128, zero_for_one: bool) -> BurnParams {
    BurnParams {
        position_id,
        claim_tick,
        burn_percent,
        zero_for_one,
    }
}

fn buy_from_pool0(amount_in: u128) -> SwapParams {
    SwapParams {
        zero_for_one: false,
        amount_in,
        price_limit: MIN_SQRT_RATIO,
    }
}

fn buy_from_pool1(amount_in: u128) -> SwapParams {
    SwapParams {
        zero_for_one: true,
        amount_in,
        price_limit: MAX_SQRT_RATIO - U256::from(1u8),
    }
}

fn assert_conserved(ledger: &Ledger) {
    for zero_for_one in [true, false] {
        let side = ledger.state().side(zero_for_one);
        assert_eq!(side.net_liquidity_delta(), side.pool.liquidity as i128);
        if side.pool.liquidity == 0 {
            assert_eq!(side.pool.amount_in_delta, 0);
        }
    }
    let positions: u128 = [true, false]
        .iter()
        .flat_map(|z| ledger.state().side(*z).positions.values())
        .map(|position| position.liquidity)
        .sum();
    assert_eq!(positions, ledger.global().liquidity_global);
}

#[test]
fn test_mint_burn_round_trip() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    let minted = ledger.mint(mint_params(-40, -20, TEN_POW_20, true), &mut tokens)?;
    assert_eq!(minted.position_id, 0);
    assert_eq!(minted.liquidity, 99855108194609381495771);
    assert_eq!(ledger.tick(true, -40).map(|t| t.liquidity_delta), Some(99855108194609381495771));
    assert_eq!(ledger.tick(true, -20).map(|t| t.liquidity_delta), Some(-99855108194609381495771));
    assert_conserved(&ledger);

    assert_eq!(ledger.claim_tick(true, 0)?, -20);
    let params = burn_params(0, -20, BURN_PERCENT_PRECISION, true);
    let preview = ledger.snapshot(params)?;
    let burned = ledger.burn(params, &mut tokens)?;
    assert_eq!(preview, burned);
    assert_eq!(burned.amount_in, 0);
    assert_eq!(burned.amount_out, 99999999999999999999);
    assert!(burned.closed);

    assert!(ledger.tick(true, -20).is_none());
    assert!(ledger.tick(true, -40).is_none());
    assert_eq!(ledger.state().side(true).index.ticks(), vec![-887260, 887260]);
    assert!(ledger.position(true, 0).is_none());
    assert_eq!(ledger.global().liquidity_global, 0);
    assert_eq!(
        tokens.transfers,
        vec![
            Transfer::Deposit(Token::Zero, TEN_POW_20),
            Transfer::Withdraw(Token::Zero, 99999999999999999999),
        ]
    );
    Ok(())
}

#[test]
fn test_mint_validation() -> eyre::Result<()> {
    let mut ledger = ledger_with(CoverPoolConfig::new(20, 5, 10).with_min_position_width(2))?;
    let mut tokens = RecordingMover::default();
    let cases = [
        (mint_params(-30, 0, 1_000, true), LedgerError::InvalidLowerTick(-30)),
        (mint_params(-60, -10, 1_000, true), LedgerError::InvalidUpperTick(-10)),
        (mint_params(-20, -40, 1_000, true), LedgerError::InvalidLowerTick(-20)),
        (mint_params(-60, -40, 1_000, true), LedgerError::PositionTooNarrow { min_width: 2 }),
        (mint_params(-80, -40, 0, true), LedgerError::InvalidPositionAmount),
        (mint_params(-887280, -40, 1_000, true), LedgerError::InvalidLowerTick(-887280)),
    ];
    for (params, expected) in cases {
        assert_eq!(ledger.mint(params, &mut tokens), Err(expected));
    }
    assert!(tokens.transfers.is_empty());
    assert_eq!(ledger.global().position_id_next, 0);
    Ok(())
}

#[test]
fn test_mint_twap_gating() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    assert_eq!(
        ledger.mint(mint_params(-40, -20, 1_000_000, false), &mut tokens),
        Err(LedgerError::InvalidPositionBoundsTwap { lower: -40, upper: -20, latest: 0 })
    );
    // the live segment itself is off limits in both directions
    assert_eq!(
        ledger.mint(mint_params(-20, 0, 1_000_000, true), &mut tokens),
        Err(LedgerError::InvalidPositionBoundsTwap { lower: -20, upper: 0, latest: 0 })
    );
    assert_eq!(
        ledger.mint(mint_params(0, 20, 1_000_000, false), &mut tokens),
        Err(LedgerError::InvalidPositionBoundsTwap { lower: 0, upper: 20, latest: 0 })
    );
    ledger.mint(mint_params(20, 40, 1_000_000, false), &mut tokens)?;
    assert_eq!(tokens.transfers, vec![Transfer::Deposit(Token::One, 1_000_000)]);
    Ok(())
}

#[test]
fn test_waits_for_observations() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    ledger.twap_mut().sufficient = false;
    assert_eq!(
        ledger.mint(mint_params(-40, -20, 1_000, true), &mut tokens),
        Err(LedgerError::WaitUntilEnoughObservations)
    );
    assert_eq!(ledger.sync(), Err(LedgerError::WaitUntilEnoughObservations));
    assert!(ledger.global().unlocked);
    Ok(())
}

#[test]
fn test_epoch_advances_once_per_move() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    ledger.mint(mint_params(-200, -20, TEN_POW_20, true), &mut tokens)?;

    advance(&mut ledger, 0, 100);
    ledger.sync()?;
    assert_eq!(ledger.global().epochs.current_epoch(), 0);

    advance(&mut ledger, -100, 150);
    let outcome = ledger.sync()?;
    assert_eq!((outcome.latest_tick, outcome.steps), (-100, -5));
    assert_eq!(ledger.global().epochs.current_epoch(), 1);
    assert_eq!(ledger.global().auction_start, 150);

    // nothing elapsed since the move
    advance(&mut ledger, -200, 150);
    ledger.sync()?;
    assert_eq!(ledger.global().epochs.current_epoch(), 1);
    assert_eq!(ledger.global().latest_tick, -100);
    assert_conserved(&ledger);
    Ok(())
}

#[test]
fn test_partial_step_and_fail_closed() -> eyre::Result<()> {
    let mut partial = ledger()?;
    advance(&mut partial, -100, 25);
    assert_eq!(partial.sync()?.latest_tick, -40);

    let config = CoverPoolConfig::new(20, 5, 10).with_auction_policy(AuctionPolicy::FailClosed);
    let mut closed = ledger_with(config)?;
    let mut tokens = RecordingMover::default();
    advance(&mut closed, -100, 25);
    assert_eq!(
        closed.mint(mint_params(-200, -120, 1_000, true), &mut tokens),
        Err(LedgerError::AuctionNotElapsed { required: 50, elapsed: 25 })
    );
    assert_eq!(closed.global().latest_tick, 0);
    advance(&mut closed, -100, 50);
    closed.mint(mint_params(-200, -120, 1_000, true), &mut tokens)?;
    assert_eq!(closed.global().latest_tick, -100);
    Ok(())
}

#[test]
fn test_auction_fills_are_claimed_pro_rata() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    let a = ledger.mint(mint_params(-60, -20, TEN_POW_20, true), &mut tokens)?;
    let b = ledger.mint(mint_params(-60, -20, TEN_POW_20 / 2, true), &mut tokens)?;
    assert_eq!((a.position_id, b.position_id), (0, 1));

    advance(&mut ledger, -20, 10);
    ledger.sync()?;
    assert_eq!(ledger.pool(true).liquidity, a.liquidity + b.liquidity);
    assert_conserved(&ledger);

    let first = ledger.swap(buy_from_pool0(30_000_000_000_000_000_000), &mut tokens)?;
    assert_eq!(first.amount_in, 30_000_000_000_000_000_000);
    assert_eq!(first.amount_out, 30072121420504176261);

    advance(&mut ledger, -60, 20);
    ledger.sync()?;
    assert_eq!(ledger.global().latest_tick, -40);
    let recorded = ledger
        .tick(true, -20)
        .and_then(|t| t.deltas_at(2))
        .cloned()
        .unwrap_or_default();
    assert_eq!(recorded.amount_in_delta, 30_000_000_000_000_000_000);
    assert_eq!(recorded.liquidity, a.liquidity + b.liquidity);
    assert_eq!(ledger.claim_tick(true, 0)?, -40);
    assert_eq!(ledger.claim_tick(true, 1)?, -40);
    assert_eq!(
        ledger.burn(burn_params(0, -20, 0, true), &mut tokens),
        Err(LedgerError::WrongTickClaimedAt { expected: -40, claimed: -20 })
    );

    let second = ledger.swap(buy_from_pool0(10_000_000_000_000_000_000), &mut tokens)?;
    assert_eq!(second.amount_in, 10_000_000_000_000_000_000);

    // half of a, out of the live segment
    let half = burn_params(0, -40, BURN_PERCENT_PRECISION / 2, true);
    let preview = ledger.snapshot(half)?;
    let a_half = ledger.burn(half, &mut tokens)?;
    assert_eq!(preview, a_half);
    assert_eq!(a_half.amount_in, 23333333333333333333);
    assert_eq!(a_half.liquidity_burned, b.liquidity);
    assert!(!a_half.closed);
    assert_conserved(&ledger);

    advance(&mut ledger, -60, 40);
    ledger.sync()?;
    assert_eq!(ledger.global().latest_tick, -60);
    assert_eq!(ledger.pool(true).liquidity, 0);
    assert_eq!(ledger.claim_tick(true, 0)?, -60);

    let a_rest = ledger.burn(burn_params(0, -60, BURN_PERCENT_PRECISION, true), &mut tokens)?;
    let b_all = ledger.burn(burn_params(1, -60, BURN_PERCENT_PRECISION, true), &mut tokens)?;
    assert!(a_rest.closed && b_all.closed);

    let paid_in = first.amount_in + second.amount_in;
    let claimed_in = a_half.amount_in + a_rest.amount_in + b_all.amount_in;
    assert_eq!(claimed_in, paid_in);

    let deposited = TEN_POW_20 + TEN_POW_20 / 2;
    let paid_out = first.amount_out
        + second.amount_out
        + a_half.amount_out
        + a_rest.amount_out
        + b_all.amount_out;
    assert!(paid_out <= deposited);
    assert!(deposited - paid_out < 10);

    assert_eq!(ledger.state().side(true).index.ticks(), vec![-887260, 887260]);
    assert!(ledger.state().side(true).ticks.is_empty());
    assert_eq!(ledger.global().liquidity_global, 0);
    Ok(())
}

#[test]
fn test_pool1_sweeps_upward() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    let minted = ledger.mint(mint_params(20, 60, TEN_POW_20, false), &mut tokens)?;

    advance(&mut ledger, 20, 10);
    ledger.sync()?;
    assert_eq!(ledger.pool(false).liquidity, minted.liquidity);

    let swapped = ledger.swap(buy_from_pool1(10_000_000_000_000_000_000), &mut tokens)?;
    assert_eq!(swapped.amount_in, 10_000_000_000_000_000_000);
    assert_eq!(swapped.amount_out, 10022029339037897812);
    assert!(swapped.sqrt_price_after > ledger.global().latest_price);

    // two of the three spreads are paid for
    advance(&mut ledger, 80, 30);
    ledger.sync()?;
    assert_eq!(ledger.global().latest_tick, 60);
    assert_eq!(ledger.claim_tick(false, 0)?, 60);

    let burned = ledger.burn(burn_params(0, 60, BURN_PERCENT_PRECISION, false), &mut tokens)?;
    assert!(swapped.amount_in - burned.amount_in <= 1);
    assert_eq!(burned.amount_out, 89977970660962102187);
    assert!(ledger.state().side(false).ticks.is_empty());
    assert_eq!(
        tokens.transfers[tokens.transfers.len() - 2..],
        [
            Transfer::Withdraw(Token::Zero, burned.amount_in),
            Transfer::Withdraw(Token::One, burned.amount_out),
        ]
    );
    Ok(())
}

#[test]
fn test_reversal_stashes_and_resumes() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    let minted = ledger.mint(mint_params(-60, -20, TEN_POW_20, true), &mut tokens)?;
    advance(&mut ledger, -20, 10);
    ledger.sync()?;
    ledger.swap(buy_from_pool0(10_000_000_000_000_000_000), &mut tokens)?;

    // the auction turns around mid-segment
    advance(&mut ledger, 0, 20);
    ledger.sync()?;
    assert_eq!(ledger.global().latest_tick, 0);
    assert_eq!(ledger.pool(true).liquidity, 0);
    let stash = ledger.tick(true, -40).map(|t| t.liquidity_delta);
    assert_eq!(stash, Some(-(minted.liquidity as i128)));
    assert_eq!(ledger.claim_tick(true, 0)?, -40);
    assert_conserved(&ledger);

    // an entered position cannot be topped up
    let top_up = MintParams {
        position_id: Some(0),
        ..mint_params(-60, -20, 1_000, true)
    };
    assert_eq!(ledger.mint(top_up, &mut tokens), Err(LedgerError::PositionAlreadyEntered(0)));
    let mismatched = MintParams {
        position_id: Some(0),
        ..mint_params(-80, -20, 1_000, true)
    };
    assert_eq!(ledger.mint(mismatched, &mut tokens), Err(LedgerError::PositionBoundsMismatch(0)));

    advance(&mut ledger, -40, 40);
    ledger.sync()?;
    assert_eq!(ledger.pool(true).liquidity, minted.liquidity);
    assert_eq!(ledger.claim_tick(true, 0)?, -40);

    advance(&mut ledger, -60, 50);
    ledger.sync()?;
    assert_eq!(ledger.claim_tick(true, 0)?, -60);
    let burned = ledger.burn(burn_params(0, -60, BURN_PERCENT_PRECISION, true), &mut tokens)?;
    assert_eq!(burned.amount_in, 10_000_000_000_000_000_000);
    assert_eq!(burned.amount_out, 89977970660962102186);
    assert!(ledger.state().side(true).ticks.is_empty());
    assert_conserved(&ledger);
    Ok(())
}

#[test]
fn test_claim_errors() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    ledger.mint(mint_params(-40, -20, TEN_POW_20, true), &mut tokens)?;
    assert_eq!(
        ledger.burn(burn_params(0, -20, BURN_PERCENT_PRECISION + 1, true), &mut tokens),
        Err(LedgerError::NotEnoughPositionLiquidity)
    );
    assert_eq!(
        ledger.burn(burn_params(7, -20, BURN_PERCENT_PRECISION, true), &mut tokens),
        Err(LedgerError::PositionNotFound(7))
    );
    assert_eq!(
        ledger.burn(burn_params(0, -40, BURN_PERCENT_PRECISION, true), &mut tokens),
        Err(LedgerError::WrongTickClaimedAt { expected: -20, claimed: -40 })
    );
    // the other direction keeps its own positions
    assert_eq!(
        ledger.burn(burn_params(0, -20, BURN_PERCENT_PRECISION, false), &mut tokens),
        Err(LedgerError::PositionNotFound(0))
    );
    Ok(())
}

#[test]
fn test_partial_burn_of_pending_position() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    let minted = ledger.mint(mint_params(-40, -20, TEN_POW_20, true), &mut tokens)?;
    let quarter = ledger.burn(burn_params(0, -20, BURN_PERCENT_PRECISION / 4, true), &mut tokens)?;
    assert_eq!(quarter.liquidity_burned, minted.liquidity / 4);
    let remaining = minted.liquidity - minted.liquidity / 4;
    assert_eq!(ledger.position(true, 0).map(|p| p.liquidity), Some(remaining));
    assert_eq!(ledger.tick(true, -20).map(|t| t.liquidity_delta), Some(-(remaining as i128)));
    assert_conserved(&ledger);

    let rest = ledger.burn(burn_params(0, -20, BURN_PERCENT_PRECISION, true), &mut tokens)?;
    assert!(quarter.amount_out + rest.amount_out <= TEN_POW_20);
    assert!(TEN_POW_20 - (quarter.amount_out + rest.amount_out) <= 2);
    Ok(())
}

#[test]
fn test_failed_withdrawal_rolls_back() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    ledger.mint(mint_params(-40, -20, TEN_POW_20, true), &mut tokens)?;
    let before = ledger.state().clone();

    let mut refusing = RecordingMover {
        refuse: true,
        ..Default::default()
    };
    advance(&mut ledger, -20, 10);
    let result = ledger.burn(burn_params(0, -20, BURN_PERCENT_PRECISION, true), &mut refusing);
    assert_eq!(result, Err(LedgerError::Transfer("transfers disabled".to_string())));
    // neither the burn nor the sync it triggered were kept
    assert_eq!(ledger.global(), &before.global);
    assert_eq!(ledger.position(true, 0), before.side(true).positions.get(&0));
    assert!(ledger.tick(true, -20).is_some());
    Ok(())
}

#[test]
fn test_quote_does_not_mutate() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    ledger.mint(mint_params(-60, -20, TEN_POW_20, true), &mut tokens)?;
    advance(&mut ledger, -20, 10);
    // the quote sees the pending auction move, the ledger does not
    let (amount_in, amount_out) = ledger.quote(buy_from_pool0(1_000_000))?;
    assert_eq!(amount_in, 1_000_000);
    assert!(amount_out > 0);
    assert_eq!(ledger.global().latest_tick, 0);
    assert_eq!(ledger.pool(true).liquidity, 0);

    let swapped = ledger.swap(buy_from_pool0(1_000_000), &mut tokens)?;
    assert_eq!((swapped.amount_in, swapped.amount_out), (amount_in, amount_out));
    Ok(())
}

#[test]
fn test_mint_hints() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    ledger.mint(mint_params(-60, -20, TEN_POW_20, true), &mut tokens)?;

    let hinted = MintParams {
        lower_old: Some(-887260),
        upper_old: Some(-887260),
        ..mint_params(-100, -80, TEN_POW_20, true)
    };
    ledger.mint(hinted, &mut tokens)?;
    assert_eq!(
        ledger.state().side(true).index.ticks(),
        vec![-887260, -100, -80, -60, -20, 887260]
    );

    let bad_lower = MintParams {
        lower_old: Some(-20),
        ..mint_params(-140, -120, TEN_POW_20, true)
    };
    assert_eq!(ledger.mint(bad_lower, &mut tokens), Err(LedgerError::InvalidLowerTick(-140)));
    let bad_upper = MintParams {
        upper_old: Some(-60),
        ..mint_params(-140, -120, TEN_POW_20, true)
    };
    assert_eq!(ledger.mint(bad_upper, &mut tokens), Err(LedgerError::InvalidUpperTick(-120)));
    Ok(())
}

#[test]
fn test_unfilled_refund_near_tick_bounds() -> eyre::Result<()> {
    let deposit = 1_000_000_000_000_000_000_000_000_000_000_000;
    for (latest, lower, upper, zero_for_one, target, refunded) in [
        (700000, 700040, 700100, false, 700200, 999999999999999999995311487602655),
        (-600000, -600100, -600040, true, -600200, 999999999999999999999969900774517),
    ] {
        let mut ledger = PoolLedger::new(
            CoverPoolConfig::new(20, 5, 10),
            MockTwap {
                tick: latest,
                sufficient: true,
            },
            MockClock { block: 0 },
        )?;
        let mut tokens = RecordingMover::default();
        ledger.mint(mint_params(lower, upper, deposit, zero_for_one), &mut tokens)?;

        // swept across the whole position without a single swap
        advance(&mut ledger, target, 100);
        ledger.sync()?;
        assert_eq!(ledger.global().latest_tick, target);
        let exit = if zero_for_one { lower } else { upper };
        assert_eq!(ledger.claim_tick(zero_for_one, 0)?, exit);

        let burned = ledger.burn(burn_params(0, exit, BURN_PERCENT_PRECISION, zero_for_one), &mut tokens)?;
        assert_eq!(burned.amount_in, 0);
        assert_eq!(burned.amount_out, refunded);
        assert!(ledger.state().side(zero_for_one).ticks.is_empty());
    }
    Ok(())
}

#[test]
fn test_claims_stay_within_their_epoch() -> eyre::Result<()> {
    let mut ledger = ledger()?;
    let mut tokens = RecordingMover::default();
    let a = ledger.mint(mint_params(-60, -20, TEN_POW_20, true), &mut tokens)?;
    advance(&mut ledger, -20, 10);
    ledger.sync()?;
    let filled = ledger.swap(buy_from_pool0(u128::MAX / 4), &mut tokens)?;
    assert_eq!(filled.amount_in, 49825308384327868814);

    // the auction turns around after a filled the segment below -20
    advance(&mut ledger, 0, 20);
    ledger.sync()?;
    let b = ledger.mint(mint_params(-40, -20, TEN_POW_20, true), &mut tokens)?;
    assert_eq!(ledger.global().epochs.current_epoch(), 2);

    // back down with no swaps: b's pass over -20 fills nothing
    advance(&mut ledger, -60, 40);
    ledger.sync()?;
    assert_eq!(ledger.global().latest_tick, -40);
    let records = ledger.tick(true, -20).map(|t| t.deltas.len());
    assert_eq!(records, Some(2));
    assert_eq!(ledger.claim_tick(true, b.position_id)?, -40);
    assert_eq!(ledger.claim_tick(true, a.position_id)?, -40);

    let b_all = ledger.burn(burn_params(b.position_id, -40, BURN_PERCENT_PRECISION, true), &mut tokens)?;
    assert_eq!(b_all.amount_in, 0);
    assert_eq!(b_all.amount_out, 99999999999999999999);

    let a_all = ledger.burn(burn_params(a.position_id, -40, BURN_PERCENT_PRECISION, true), &mut tokens)?;
    assert_eq!(a_all.amount_in, 49825308384327868813);
    assert_eq!(a_all.amount_out, 50024998748000306422);
    assert!(filled.amount_out + a_all.amount_out <= TEN_POW_20);
    assert!(ledger.state().side(true).ticks.is_empty());
    assert_conserved(&ledger);
    Ok(())
}
