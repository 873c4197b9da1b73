//! Borrow index accrual from elapsed time and utilization.

use crate::codec::{GlobalVolume, RateState};
use crate::constants::{BASE_RATE, WAD};
use crate::errors::LedgerError;
use crate::math::{linear_interest, mul_div_down, narrow, U256};

/// Outcome of one accrual step.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Accrual {
    pub state: RateState,
    pub previous_index: u128,
    pub rate_per_second: u128,
    /// Set only when the borrow index actually changed.
    pub index_moved: bool,
}

impl Accrual {
    fn unchanged(state: RateState) -> Self {
        Self {
            state,
            previous_index: state.borrow_index,
            rate_per_second: 0,
            index_moved: false,
        }
    }
}

/// `total_borrows / total_liquidity` in WAD, zero for an empty pool.
pub fn utilization(volume: &GlobalVolume) -> Result<u128, LedgerError> {
    if volume.total_borrows == 0 || volume.total_liquidity == 0 {
        return Ok(0);
    }
    narrow(mul_div_down(
        U256::from(volume.total_borrows),
        U256::from(WAD),
        U256::from(volume.total_liquidity),
    )?)
}

/// Per-second borrow rate: a single linear segment through `BASE_RATE`.
pub fn borrow_rate(volume: &GlobalVolume, rate_slope: u128) -> Result<u128, LedgerError> {
    let util = utilization(volume)?;
    let variable = narrow(mul_div_down(
        U256::from(util),
        U256::from(rate_slope),
        U256::from(WAD),
    )?)?;
    BASE_RATE.checked_add(variable).ok_or(LedgerError::Overflow)
}

/// Advances `rates` to `now`.
///
/// Running it twice at the same instant is a no-op, and the index never
/// decreases. An index that no longer fits 128 bits fails the whole step.
pub fn accrue(
    rates: RateState,
    volume: &GlobalVolume,
    now: u32,
    rate_slope: u128,
) -> Result<Accrual, LedgerError> {
    if now <= rates.last_update_time {
        return Ok(Accrual::unchanged(rates));
    }
    let elapsed = now - rates.last_update_time;
    let clock_only = RateState {
        last_update_time: now,
        ..rates
    };

    if volume.total_borrows == 0 || volume.total_liquidity == 0 {
        return Ok(Accrual::unchanged(clock_only));
    }

    let rate = borrow_rate(volume, rate_slope)?;
    let next = linear_interest(
        U256::from(rates.borrow_index),
        U256::from(rate),
        U256::from(elapsed),
    )?;
    let next_index = narrow(next).map_err(|_| LedgerError::IndexOverflow)?;

    if next_index == rates.borrow_index {
        return Ok(Accrual {
            rate_per_second: rate,
            ..Accrual::unchanged(clock_only)
        });
    }

    Ok(Accrual {
        state: RateState {
            borrow_index: next_index,
            ..clock_only
        },
        previous_index: rates.borrow_index,
        rate_per_second: rate,
        index_moved: true,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::{DEFAULT_RATE_SLOPE, SECONDS_PER_YEAR};

    const YEAR: u32 = SECONDS_PER_YEAR as u32;

    fn volume(total_liquidity: u128, total_borrows: u128) -> GlobalVolume {
        GlobalVolume {
            total_liquidity,
            total_borrows,
        }
    }

    #[test]
    fn utilization_and_rate() {
        let v = volume(1_000 * WAD, 800 * WAD);
        assert_eq!(utilization(&v).unwrap(), 800_000_000_000_000_000);
        assert_eq!(borrow_rate(&v, DEFAULT_RATE_SLOPE).unwrap(), 2_536_783_358);
        assert_eq!(borrow_rate(&volume(0, 0), DEFAULT_RATE_SLOPE).unwrap(), 0);
    }

    #[test]
    fn one_year_at_eighty_percent_utilization() {
        let accrual = accrue(
            RateState::genesis(0),
            &volume(1_000 * WAD, 800 * WAD),
            YEAR,
            DEFAULT_RATE_SLOPE,
        )
        .unwrap();
        assert!(accrual.index_moved);
        assert_eq!(accrual.previous_index, WAD);
        assert_eq!(accrual.state.borrow_index, 1_079_999_999_977_888_000);
        assert_eq!(accrual.state.liquidity_index, WAD);
        assert_eq!(accrual.state.last_update_time, YEAR);
    }

    #[test]
    fn same_instant_is_idempotent() {
        let v = volume(1_000 * WAD, 500 * WAD);
        let first = accrue(RateState::genesis(10), &v, 5_000, DEFAULT_RATE_SLOPE).unwrap();
        let second = accrue(first.state, &v, 5_000, DEFAULT_RATE_SLOPE).unwrap();
        assert_eq!(second.state, first.state);
        assert!(!second.index_moved);
    }

    #[test]
    fn idle_pool_only_advances_the_clock() {
        let start = RateState::genesis(100);
        let accrual = accrue(start, &volume(1_000 * WAD, 0), 100 + YEAR, DEFAULT_RATE_SLOPE).unwrap();
        assert!(!accrual.index_moved);
        assert_eq!(accrual.state.borrow_index, WAD);
        assert_eq!(accrual.state.last_update_time, 100 + YEAR);
    }

    #[test]
    fn rate_rounding_to_zero_leaves_index_alone() {
        // utilization floors to zero, so no rate applies
        let accrual = accrue(RateState::genesis(0), &volume(10 * WAD * WAD, 1), 60, DEFAULT_RATE_SLOPE).unwrap();
        assert!(!accrual.index_moved);
        assert_eq!(accrual.state.borrow_index, WAD);
        assert_eq!(accrual.state.last_update_time, 60);
    }

    #[test]
    fn index_is_monotonic() {
        let v = volume(1_000 * WAD, 999 * WAD);
        let mut rates = RateState::genesis(0);
        for now in [1u32, 2, 60, 3_600, 86_400, YEAR, 2 * YEAR, 10 * YEAR] {
            let accrual = accrue(rates, &v, now, DEFAULT_RATE_SLOPE).unwrap();
            assert!(accrual.state.borrow_index >= rates.borrow_index);
            rates = accrual.state;
        }
    }

    #[test]
    fn clock_never_moves_backwards() {
        let start = RateState::genesis(500);
        let accrual = accrue(start, &volume(WAD, WAD), 400, DEFAULT_RATE_SLOPE).unwrap();
        assert_eq!(accrual.state, start);
    }

    #[test]
    fn index_beyond_storage_width_is_fatal() {
        let rates = RateState {
            borrow_index: u128::MAX - 1,
            liquidity_index: WAD,
            last_update_time: 0,
        };
        assert_eq!(
            accrue(rates, &volume(WAD, WAD), YEAR, DEFAULT_RATE_SLOPE),
            Err(LedgerError::IndexOverflow)
        );
    }
}
