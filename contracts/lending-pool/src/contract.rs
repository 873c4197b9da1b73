use soroban_sdk::{contract, contractimpl, log, Address, Env, U256};

use crate::accrual::{self, Accrual};
use crate::codec::{Account, GlobalVolume, RateState};
use crate::constants::*;
use crate::errors::LedgerError;
use crate::events::*;
use crate::guard::{self, ReentrancyLock};
use crate::helpers::*;
use crate::math::{to_actual, to_scaled, wad_mul_down};
use crate::storage::*;

#[contract]
pub struct LendingPool;

#[contractimpl]
impl LendingPool {
    /// Seeds the pool for `asset`. `rate_slope` is the per-second WAD borrow
    /// rate at 100% utilization.
    pub fn initialize(env: Env, asset: Address, rate_slope: u128) -> Result<(), LedgerError> {
        if is_initialized(&env) {
            return Err(LedgerError::AlreadyInitialized);
        }
        if rate_slope > MAX_RATE_PER_SECOND {
            return Err(LedgerError::InvalidConfig);
        }
        let now = current_time(&env)?;
        write_asset(&env, &asset);
        write_rate_slope(&env, rate_slope);
        write_rates(&env, &RateState::genesis(now));
        write_volume(&env, &GlobalVolume::default());
        bump_core_ttl(&env);
        Ok(())
    }

    /// Deposit collateral; it also becomes lendable liquidity.
    pub fn deposit(env: Env, user: Address, amount: U256) -> Result<(), LedgerError> {
        let asset = ensure_initialized(&env)?;
        ensure_user_auth(&env, &user);
        let amount = validate_amount(&amount)?;
        let lock = ReentrancyLock::acquire(&env)?;
        let (_, mut volume) = Self::accrue_stored(&env)?;

        let mut account = read_account(&env, &user);
        account.collateral = account
            .collateral
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        volume.total_liquidity = volume
            .total_liquidity
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;

        pull(&env, &asset, &user, amount)?;
        write_account(&env, &user, &account);
        write_volume(&env, &volume);

        drop(lock);
        Deposit { user, amount }.publish(&env);
        Ok(())
    }

    pub fn withdraw(env: Env, user: Address, amount: U256) -> Result<(), LedgerError> {
        let asset = ensure_initialized(&env)?;
        ensure_user_auth(&env, &user);
        let amount = validate_amount(&amount)?;
        let lock = ReentrancyLock::acquire(&env)?;
        let (rates, mut volume) = Self::accrue_stored(&env)?;

        let mut account = read_account(&env, &user);
        if amount > account.collateral {
            return Err(LedgerError::InsufficientCollateral);
        }
        if amount > volume.available() {
            return Err(LedgerError::InsufficientLiquidity);
        }
        let remaining = Account {
            collateral: account.collateral - amount,
            ..account
        };
        if !is_position_healthy(&remaining, rates.borrow_index)? {
            return Err(LedgerError::PositionUnhealthy);
        }

        account = remaining;
        volume.total_liquidity -= amount;
        write_account(&env, &user, &account);
        write_volume(&env, &volume);
        push(&env, &asset, &user, amount)?;

        drop(lock);
        Withdraw { user, amount }.publish(&env);
        Ok(())
    }

    /// Borrow against deposited collateral, up to `LTV` of it.
    pub fn borrow(env: Env, user: Address, amount: U256) -> Result<(), LedgerError> {
        let asset = ensure_initialized(&env)?;
        ensure_user_auth(&env, &user);
        let amount = validate_amount(&amount)?;
        let lock = ReentrancyLock::acquire(&env)?;
        let (rates, mut volume) = Self::accrue_stored(&env)?;

        if amount > volume.available() {
            return Err(LedgerError::InsufficientLiquidity);
        }
        let mut account = read_account(&env, &user);
        let current_debt = to_actual(account.scaled_debt, rates.borrow_index)?;
        let max_debt = wad_mul_down(account.collateral, LTV)?;
        let next_debt = current_debt
            .checked_add(amount)
            .ok_or(LedgerError::PositionUnhealthy)?;
        if next_debt > max_debt {
            return Err(LedgerError::PositionUnhealthy);
        }

        // rounds up: debt is never under-recorded
        let scaled_delta = to_scaled(amount, rates.borrow_index)?;
        if scaled_delta > u128::MAX - account.scaled_debt {
            return Err(LedgerError::AmountOverflow);
        }
        account.scaled_debt += scaled_delta;
        volume.total_borrows += amount;

        write_account(&env, &user, &account);
        write_volume(&env, &volume);
        push(&env, &asset, &user, amount)?;

        drop(lock);
        Borrow {
            user,
            amount,
            scaled_delta,
            total_borrows: volume.total_borrows,
        }
        .publish(&env);
        Ok(())
    }

    /// Repay up to `amount`; anything above the outstanding debt is ignored.
    pub fn repay(env: Env, user: Address, amount: U256) -> Result<(), LedgerError> {
        let asset = ensure_initialized(&env)?;
        ensure_user_auth(&env, &user);
        let amount = validate_amount(&amount)?;
        let lock = ReentrancyLock::acquire(&env)?;
        let (rates, mut volume) = Self::accrue_stored(&env)?;

        let mut account = read_account(&env, &user);
        if account.scaled_debt == 0 {
            return Err(LedgerError::NoDebtToRepay);
        }
        let debt = to_actual(account.scaled_debt, rates.borrow_index)?;
        let repay_amount = amount.min(debt);
        if repay_amount < amount {
            log!(&env, "repay capped at outstanding debt", amount, debt);
        }

        pull(&env, &asset, &user, repay_amount)?;
        let scaled_repaid = settle_debt(&mut account, repay_amount, debt, rates.borrow_index)?;
        volume.total_borrows -= repay_amount.min(volume.total_borrows);
        write_account(&env, &user, &account);
        write_volume(&env, &volume);

        drop(lock);
        Repay {
            user,
            amount: repay_amount,
            scaled_repaid,
            total_borrows: volume.total_borrows,
        }
        .publish(&env);
        Ok(())
    }

    /// Cover up to `debt_to_cover` of an unhealthy borrower's debt and take
    /// the same amount of their collateral, 1:1 with no bonus.
    ///
    /// Settlement uses the collateral actually seized, so debt is never
    /// forgiven beyond what was recovered. A borrower with no collateral
    /// left cannot be liquidated and fails with `InsufficientCollateral`.
    pub fn liquidate(
        env: Env,
        liquidator: Address,
        borrower: Address,
        debt_to_cover: U256,
    ) -> Result<(), LedgerError> {
        let asset = ensure_initialized(&env)?;
        ensure_user_auth(&env, &liquidator);
        let debt_to_cover = validate_amount(&debt_to_cover)?;
        if liquidator == borrower {
            return Err(LedgerError::SelfLiquidation);
        }
        let lock = ReentrancyLock::acquire(&env)?;
        let (rates, mut volume) = Self::accrue_stored(&env)?;

        let mut account = read_account(&env, &borrower);
        if is_position_healthy(&account, rates.borrow_index)? {
            return Err(LedgerError::PositionHealthy);
        }
        let debt = to_actual(account.scaled_debt, rates.borrow_index)?;
        let debt_covered = debt_to_cover.min(debt);
        let collateral_seized = debt_covered.min(account.collateral);
        if collateral_seized == 0 {
            return Err(LedgerError::InsufficientCollateral);
        }
        if collateral_seized < debt_covered {
            log!(&env, "seizure capped at borrower collateral", debt_covered, collateral_seized);
        }

        pull(&env, &asset, &liquidator, collateral_seized)?;
        settle_debt(&mut account, collateral_seized, debt, rates.borrow_index)?;
        account.collateral -= collateral_seized;
        volume.total_borrows -= collateral_seized.min(volume.total_borrows);
        volume.total_liquidity = volume
            .total_liquidity
            .checked_sub(collateral_seized)
            .ok_or(LedgerError::Overflow)?;
        write_account(&env, &borrower, &account);
        write_volume(&env, &volume);
        push(&env, &asset, &liquidator, collateral_seized)?;

        drop(lock);
        Liquidate {
            liquidator,
            borrower,
            debt_covered: collateral_seized,
            collateral_seized,
        }
        .publish(&env);
        Ok(())
    }

    /// Refresh the borrow index without touching any account.
    pub fn accrue_interest(env: Env) -> Result<(), LedgerError> {
        ensure_initialized(&env)?;
        let lock = ReentrancyLock::acquire(&env)?;
        Self::accrue_stored(&env)?;
        drop(lock);
        Ok(())
    }

    pub fn asset(env: Env) -> Result<Address, LedgerError> {
        ensure_initialized(&env)
    }

    pub fn get_rate_slope(env: Env) -> Result<u128, LedgerError> {
        ensure_initialized(&env)?;
        read_rate_slope(&env)
    }

    pub fn is_healthy(env: Env, user: Address) -> Result<bool, LedgerError> {
        let rates = Self::guarded_projection(&env)?;
        is_position_healthy(&read_account(&env, &user), rates.borrow_index)
    }

    pub fn get_user_collateral(env: Env, user: Address) -> Result<u128, LedgerError> {
        Self::guarded_view(&env)?;
        Ok(read_account(&env, &user).collateral)
    }

    /// Current debt of `user`, including interest up to this instant.
    pub fn get_user_debt(env: Env, user: Address) -> Result<u128, LedgerError> {
        let rates = Self::guarded_projection(&env)?;
        to_actual(read_account(&env, &user).scaled_debt, rates.borrow_index)
    }

    pub fn get_scaled_debt(env: Env, user: Address) -> Result<u128, LedgerError> {
        Self::guarded_view(&env)?;
        Ok(read_account(&env, &user).scaled_debt)
    }

    pub fn get_borrow_index(env: Env) -> Result<u128, LedgerError> {
        Ok(Self::guarded_projection(&env)?.borrow_index)
    }

    pub fn get_liquidity_index(env: Env) -> Result<u128, LedgerError> {
        Self::guarded_view(&env)?;
        Ok(read_rates(&env)?.liquidity_index)
    }

    /// Timestamp of the last stored accrual.
    pub fn get_last_update_time(env: Env) -> Result<u32, LedgerError> {
        Self::guarded_view(&env)?;
        Ok(read_rates(&env)?.last_update_time)
    }

    pub fn get_total_liquidity(env: Env) -> Result<u128, LedgerError> {
        Self::guarded_view(&env)?;
        Ok(read_volume(&env)?.total_liquidity)
    }

    pub fn get_total_borrows(env: Env) -> Result<u128, LedgerError> {
        Self::guarded_view(&env)?;
        Ok(read_volume(&env)?.total_borrows)
    }

    pub fn get_available_liquidity(env: Env) -> Result<u128, LedgerError> {
        Self::guarded_view(&env)?;
        Ok(read_volume(&env)?.available())
    }

    pub fn get_utilization(env: Env) -> Result<u128, LedgerError> {
        Self::guarded_view(&env)?;
        accrual::utilization(&read_volume(&env)?)
    }

    /// Per-second WAD borrow rate at the current utilization.
    pub fn get_borrow_rate(env: Env) -> Result<u128, LedgerError> {
        Self::guarded_view(&env)?;
        accrual::borrow_rate(&read_volume(&env)?, read_rate_slope(&env)?)
    }
}

impl LendingPool {
    /// Accrual step shared by every mutating operation: advances the stored
    /// rate state to now and returns it with the current volume.
    fn accrue_stored(env: &Env) -> Result<(RateState, GlobalVolume), LedgerError> {
        let rates = read_rates(env)?;
        let volume = read_volume(env)?;
        let accrual = Self::project(env, rates, &volume)?;

        if accrual.state != rates {
            write_rates(env, &accrual.state);
        }
        if accrual.index_moved {
            InterestAccrued {
                previous_index: accrual.previous_index,
                borrow_index: accrual.state.borrow_index,
                rate_per_second: accrual.rate_per_second,
                timestamp: accrual.state.last_update_time,
            }
            .publish(env);
        } else if accrual.state.last_update_time != rates.last_update_time {
            log!(env, "clock advanced without index change", accrual.state.last_update_time);
        }
        Ok((accrual.state, volume))
    }

    fn project(env: &Env, rates: RateState, volume: &GlobalVolume) -> Result<Accrual, LedgerError> {
        accrual::accrue(rates, volume, current_time(env)?, read_rate_slope(env)?)
    }

    fn guarded_view(env: &Env) -> Result<(), LedgerError> {
        ensure_initialized(env)?;
        guard::ensure_unlocked(env)
    }

    /// Rate state as of now, computed without writing it back.
    fn guarded_projection(env: &Env) -> Result<RateState, LedgerError> {
        Self::guarded_view(env)?;
        let rates = read_rates(env)?;
        let volume = read_volume(env)?;
        Ok(Self::project(env, rates, &volume)?.state)
    }
}

/// Healthy while debt stays within `LIQUIDATION_THRESHOLD` of collateral.
fn is_position_healthy(account: &Account, borrow_index: u128) -> Result<bool, LedgerError> {
    if account.scaled_debt == 0 {
        return Ok(true);
    }
    let debt = to_actual(account.scaled_debt, borrow_index)?;
    let limit = wad_mul_down(account.collateral, LIQUIDATION_THRESHOLD)?;
    Ok(debt <= limit)
}

/// Removes `paid` of actual debt from `account` and returns the scaled amount
/// removed. Paying the full debt clears the scaled balance exactly.
fn settle_debt(
    account: &mut Account,
    paid: u128,
    debt: u128,
    borrow_index: u128,
) -> Result<u128, LedgerError> {
    let scaled = if paid == debt {
        account.scaled_debt
    } else {
        to_scaled(paid, borrow_index)?
    };
    account.scaled_debt = account
        .scaled_debt
        .checked_sub(scaled)
        .ok_or(LedgerError::Overflow)?;
    Ok(scaled)
}
