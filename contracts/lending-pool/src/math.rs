//! Fixed-point arithmetic at WAD (1e18) scale over a 256-bit domain.
//!
//! Rounding follows one rule: anything a participant owes rounds up, anything
//! paid out to a participant rounds down.

use crate::constants::WAD;
use crate::errors::LedgerError;

#[allow(clippy::assign_op_pattern, clippy::ptr_offset_with_cast)]
mod wide {
    use uint::construct_uint;

    construct_uint! {
        /// 256-bit unsigned integer, the native width of the math layer.
        pub struct U256(4);
    }

    construct_uint! {
        /// 512-bit unsigned integer, used only for intermediate products.
        pub struct U512(8);
    }
}

pub use wide::{U256, U512};

impl From<U256> for U512 {
    fn from(value: U256) -> Self {
        let U256(ref limbs) = value;
        let mut out = [0u64; 8];
        out[..4].copy_from_slice(limbs);
        U512(out)
    }
}

pub fn wad() -> U256 {
    U256::from(WAD)
}

/// Full 512-bit product of `a * b`, split into `(high, low)` 256-bit words.
pub fn full_mul(a: U256, b: U256) -> (U256, U256) {
    let U512(limbs) = U512::from(a) * U512::from(b);
    let low = U256([limbs[0], limbs[1], limbs[2], limbs[3]]);
    let high = U256([limbs[4], limbs[5], limbs[6], limbs[7]]);
    (high, low)
}

/// floor(a * b / c).
///
/// A product whose high word is nonzero is rejected with `Overflow` rather
/// than divided across 512 bits; inputs bounded to 128 bits never get there.
pub fn mul_div_down(a: U256, b: U256, c: U256) -> Result<U256, LedgerError> {
    if c.is_zero() {
        return Err(LedgerError::DivisionByZero);
    }
    let (high, low) = full_mul(a, b);
    if !high.is_zero() {
        return Err(LedgerError::Overflow);
    }
    Ok(low / c)
}

/// ceil(a * b / c).
pub fn mul_div_up(a: U256, b: U256, c: U256) -> Result<U256, LedgerError> {
    if c.is_zero() {
        return Err(LedgerError::DivisionByZero);
    }
    let (high, low) = full_mul(a, b);
    if !high.is_zero() {
        return Err(LedgerError::Overflow);
    }
    let quotient = low / c;
    if (low % c).is_zero() {
        Ok(quotient)
    } else {
        quotient.checked_add(U256::one()).ok_or(LedgerError::Overflow)
    }
}

/// Next borrow index after `elapsed` seconds of simple interest at
/// `rate_per_second`: `last + last * rate * elapsed / WAD`.
///
/// Callers keep `last_index` within [1 WAD, 1e20 WAD], the rate at or below
/// `MAX_RATE_PER_SECOND` and `elapsed` under a century.
pub fn linear_interest(
    last_index: U256,
    rate_per_second: U256,
    elapsed: U256,
) -> Result<U256, LedgerError> {
    let (product, _) = rate_per_second.overflowing_mul(elapsed);
    if !elapsed.is_zero() && product / elapsed != rate_per_second {
        return Err(LedgerError::Overflow);
    }
    let interest = mul_div_down(last_index, product, wad())?;
    let (next, _) = last_index.overflowing_add(interest);
    if next < last_index {
        return Err(LedgerError::Overflow);
    }
    Ok(next)
}

/// Current amount behind a scaled balance, rounded up.
pub fn to_actual(scaled: u128, index: u128) -> Result<u128, LedgerError> {
    narrow(mul_div_up(U256::from(scaled), U256::from(index), wad())?)
}

/// Scaled balance recorded for an actual amount, rounded up.
pub fn to_scaled(actual: u128, index: u128) -> Result<u128, LedgerError> {
    narrow(mul_div_up(U256::from(actual), wad(), U256::from(index))?)
}

/// `amount * ratio / WAD`, rounded down.
pub fn wad_mul_down(amount: u128, ratio: u128) -> Result<u128, LedgerError> {
    narrow(mul_div_down(U256::from(amount), U256::from(ratio), wad())?)
}

/// Narrows a 256-bit value to the 128-bit storage width.
pub fn narrow(value: U256) -> Result<u128, LedgerError> {
    if value.bits() > 128 {
        return Err(LedgerError::Overflow);
    }
    Ok(value.low_u128())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::SECONDS_PER_YEAR;

    fn u(v: u128) -> U256 {
        U256::from(v)
    }

    #[test]
    fn mul_div_rounds_in_both_directions() {
        assert_eq!(mul_div_down(u(7), u(3), u(2)).unwrap(), u(10));
        assert_eq!(mul_div_up(u(7), u(3), u(2)).unwrap(), u(11));
        assert_eq!(mul_div_up(u(8), u(3), u(2)).unwrap(), u(12));
        assert_eq!(mul_div_down(u(0), u(5), u(3)).unwrap(), U256::zero());
        assert_eq!(mul_div_up(u(0), u(5), u(3)).unwrap(), U256::zero());
    }

    #[test]
    fn mul_div_rejects_zero_divisor() {
        assert_eq!(mul_div_down(u(1), u(1), U256::zero()), Err(LedgerError::DivisionByZero));
        assert_eq!(mul_div_up(u(1), u(1), U256::zero()), Err(LedgerError::DivisionByZero));
    }

    #[test]
    fn mul_div_uses_full_width_intermediate() {
        // u128::MAX squared needs all 256 bits of the low word.
        let max = u(u128::MAX);
        assert_eq!(mul_div_down(max, max, max).unwrap(), max);
        assert_eq!(mul_div_down(U256::MAX, u(1), u(1)).unwrap(), U256::MAX);
        assert_eq!(mul_div_up(U256::MAX, u(3), u(3)), Err(LedgerError::Overflow));
    }

    #[test]
    fn mul_div_aborts_when_product_exceeds_native_width() {
        let two_128 = U256::one() << 128usize;
        // 2^256 / 2^200 would fit, but the high word is nonzero.
        let divisor = U256::one() << 200usize;
        assert_eq!(mul_div_down(two_128, two_128, divisor), Err(LedgerError::Overflow));
        assert_eq!(mul_div_up(two_128, two_128, divisor), Err(LedgerError::Overflow));
    }

    #[test]
    fn full_mul_splits_words() {
        let (high, low) = full_mul(U256::MAX, u(2));
        assert_eq!(high, U256::one());
        assert_eq!(low, U256::MAX - U256::one());
    }

    #[test]
    fn linear_interest_one_year_at_ten_percent() {
        let rate = u(3_170_979_198);
        let next = linear_interest(wad(), rate, u(SECONDS_PER_YEAR)).unwrap();
        assert_eq!(next, u(1_099_999_999_988_128_000));
    }

    #[test]
    fn linear_interest_is_identity_without_time_or_rate() {
        let index = u(1_234_567_890_123_456_789);
        assert_eq!(linear_interest(index, u(5_000), U256::zero()).unwrap(), index);
        assert_eq!(linear_interest(index, U256::zero(), u(86_400)).unwrap(), index);
    }

    #[test]
    fn linear_interest_detects_rate_time_overflow() {
        assert_eq!(
            linear_interest(wad(), U256::MAX, u(2)),
            Err(LedgerError::Overflow)
        );
    }

    #[test]
    fn linear_interest_detects_index_wraparound() {
        // interest = MAX / WAD fits, but MAX + interest wraps.
        assert_eq!(
            linear_interest(U256::MAX, u(1), u(1)),
            Err(LedgerError::Overflow)
        );
    }

    #[test]
    fn conversions_round_against_the_participant() {
        let one_and_half = WAD + WAD / 2;
        assert_eq!(to_actual(1, one_and_half).unwrap(), 2);
        assert_eq!(to_scaled(1, 3 * WAD).unwrap(), 1);
        assert_eq!(to_scaled(500 * WAD, WAD).unwrap(), 500 * WAD);
        assert_eq!(to_actual(500 * WAD, WAD).unwrap(), 500 * WAD);
        assert_eq!(wad_mul_down(1_000 * WAD, 800_000_000_000_000_000).unwrap(), 800 * WAD);
        assert_eq!(wad_mul_down(3, WAD / 2).unwrap(), 1);
    }

    #[test]
    fn round_trip_never_loses_value_to_the_ledger() {
        let indices = [
            WAD,
            WAD + 1,
            1_079_999_999_977_888_000,
            3 * WAD + 7,
            1_000 * WAD - 1,
        ];
        let balances = [1u128, 3, 999, 500 * WAD, 863_999_999_982_310_400_000, u64::MAX as u128];
        for &index in indices.iter() {
            for &scaled in balances.iter() {
                let actual = to_actual(scaled, index).unwrap();
                let back = to_actual(to_scaled(actual, index).unwrap(), index).unwrap();
                assert!(back >= actual);
            }
        }
    }

    #[test]
    fn to_scaled_rejects_zero_index() {
        assert_eq!(to_scaled(1, 0), Err(LedgerError::DivisionByZero));
    }

    #[test]
    fn narrow_rejects_values_above_storage_width() {
        assert_eq!(narrow(u(u128::MAX)).unwrap(), u128::MAX);
        assert_eq!(narrow(u(u128::MAX) + U256::one()), Err(LedgerError::Overflow));
    }
}
