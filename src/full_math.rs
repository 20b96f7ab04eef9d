use crate::error::LedgerError;
use alloy::primitives::{U256, U512};

/// Q64.96 unit.
pub const Q96: U256 = U256::from_limbs([0, 1 << 32, 0, 0]);

/// floor(a * b / denominator) with a 512-bit intermediate product.
pub fn mul_div(a: U256, b: U256, denominator: U256) -> Result<U256, LedgerError> {
    if denominator.is_zero() {
        return Err(LedgerError::Overflow);
    }
    let product = U512::from(a) * U512::from(b);
    narrow(product / U512::from(denominator))
}

/// ceil(a * b / denominator) with a 512-bit intermediate product.
pub fn mul_div_rounding_up(a: U256, b: U256, denominator: U256) -> Result<U256, LedgerError> {
    if denominator.is_zero() {
        return Err(LedgerError::Overflow);
    }
    let product = U512::from(a) * U512::from(b);
    let denominator = U512::from(denominator);
    let mut result = product / denominator;
    if !(product % denominator).is_zero() {
        result += U512::from(1u8);
    }
    narrow(result)
}

/// ceil(a / b)
pub fn div_rounding_up(a: U256, b: U256) -> Result<U256, LedgerError> {
    if b.is_zero() {
        return Err(LedgerError::Overflow);
    }
    let quotient = a / b;
    if (a % b).is_zero() {
        Ok(quotient)
    } else {
        Ok(quotient + U256::from(1u8))
    }
}

pub fn to_u128(value: U256) -> Result<u128, LedgerError> {
    u128::try_from(value).map_err(|_| LedgerError::Overflow)
}

pub(crate) fn narrow(value: U512) -> Result<U256, LedgerError> {
    if value > U512::from(U256::MAX) {
        return Err(LedgerError::Overflow);
    }
    Ok(U256::from(value))
}
