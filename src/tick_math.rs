use crate::error::LedgerError;
use alloy::primitives::U256;

pub const MIN_TICK: i32 = -887272;
pub const MAX_TICK: i32 = -MIN_TICK;

/// `get_sqrt_ratio_at_tick(MIN_TICK)`
pub const MIN_SQRT_RATIO: U256 = U256::from_limbs([4295128739, 0, 0, 0]);
/// `get_sqrt_ratio_at_tick(MAX_TICK)` = 1461446703485210103287273052203988822378723970342
pub const MAX_SQRT_RATIO: U256 =
    U256::from_limbs([0x5d951d5263988d26, 0xefd1fc6a50648849, 0xfffd8963, 0]);

// 2^128 / sqrt(1.0001)^(2^i) for i in 0..20
const RATIO_FACTORS: [u128; 20] = [
    0xfffcb933bd6fad37aa2d162d1a594001,
    0xfff97272373d413259a46990580e213a,
    0xfff2e50f5f656932ef12357cf3c7fdcc,
    0xffe5caca7e10e4e61c3624eaa0941cd0,
    0xffcb9843d60f6159c9db58835c926644,
    0xff973b41fa98c081472e6896dfb254c0,
    0xff2ea16466c96a3843ec78b326b52861,
    0xfe5dee046a99a2a811c461f1969c3053,
    0xfcbe86c7900a88aedcffc83b479aa3a4,
    0xf987a7253ac413176f2b074cf7815e54,
    0xf3392b0822b70005940c7a398e4b70f3,
    0xe7159475a2c29b7443b29c7fa6e889d9,
    0xd097f3bdfd2022b8845ad8f792aa5825,
    0xa9f746462d870fdf8a65dc1f90e061e5,
    0x70d869a156d2a1b890bb3df62baf32f7,
    0x31be135f97d08fd981231505542fcfa6,
    0x9aa508b5b7a84e1c677de54f3e99bc9,
    0x5d6af8dedb81196699c329225ee604,
    0x2216e584f5fa1ea926041bedfe98,
    0x48a170391f7dc42444e8fa2,
];

/// Returns sqrt(1.0001^tick) as a Q64.96, rounded up.
pub fn get_sqrt_ratio_at_tick(tick: i32) -> Result<U256, LedgerError> {
    if !(MIN_TICK..=MAX_TICK).contains(&tick) {
        return Err(LedgerError::TickOutOfBounds(tick));
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio = if abs_tick & 0x1 != 0 {
        U256::from(RATIO_FACTORS[0])
    } else {
        U256::from(1u8) << 128usize
    };
    for (i, factor) in RATIO_FACTORS.iter().enumerate().skip(1) {
        if abs_tick & (1 << i) != 0 {
            ratio = (ratio * U256::from(*factor)) >> 128usize;
        }
    }
    if tick > 0 {
        ratio = U256::MAX / ratio;
    }

    // Q128.128 -> Q64.96, rounding up so that tick -> price -> tick is stable
    let rounding = if (ratio % (U256::from(1u8) << 32usize)).is_zero() { 0u8 } else { 1u8 };
    Ok((ratio >> 32usize) + U256::from(rounding))
}

/// Returns the greatest tick whose sqrt price does not exceed `sqrt_price_x96`.
///
/// Fails for prices outside `[MIN_SQRT_RATIO, MAX_SQRT_RATIO)`.
pub fn get_tick_at_sqrt_ratio(sqrt_price_x96: U256) -> Result<i32, LedgerError> {
    if sqrt_price_x96 < MIN_SQRT_RATIO || sqrt_price_x96 >= MAX_SQRT_RATIO {
        return Err(LedgerError::PriceOutOfBounds);
    }
    // get_sqrt_ratio_at_tick is strictly increasing, bisect on it
    let (mut low, mut high) = (MIN_TICK, MAX_TICK);
    while low < high {
        let mid = low + (high - low + 1) / 2;
        if get_sqrt_ratio_at_tick(mid)? <= sqrt_price_x96 {
            low = mid;
        } else {
            high = mid - 1;
        }
    }
    Ok(low)
}

/// Smallest and largest ticks usable with the given spacing. The upper bound
/// stays below `MAX_TICK` so its price converts back to a tick.
pub fn tick_bounds(tick_spread: i32) -> (i32, i32) {
    (
        (MIN_TICK / tick_spread) * tick_spread,
        ((MAX_TICK - 1) / tick_spread) * tick_spread,
    )
}
