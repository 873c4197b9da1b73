use soroban_sdk::{token, Address, Env, U256};

use crate::errors::LedgerError;

pub fn ensure_user_auth(_env: &Env, user: &Address) {
    user.require_auth();
}

/// Validates a caller-supplied amount: nonzero and within 128 bits.
pub fn validate_amount(amount: &U256) -> Result<u128, LedgerError> {
    let amount = amount.to_u128().ok_or(LedgerError::AmountOverflow)?;
    if amount == 0 {
        return Err(LedgerError::ZeroAmount);
    }
    Ok(amount)
}

pub fn to_i128(amount: u128) -> Result<i128, LedgerError> {
    i128::try_from(amount).map_err(|_| LedgerError::AmountOverflow)
}

/// Ledger timestamp narrowed to the 32-bit clock kept in the rate state.
pub fn current_time(env: &Env) -> Result<u32, LedgerError> {
    u32::try_from(env.ledger().timestamp()).map_err(|_| LedgerError::Overflow)
}

/// Moves `amount` of the asset from `from` into the pool.
pub fn pull(env: &Env, asset: &Address, from: &Address, amount: u128) -> Result<(), LedgerError> {
    if amount == 0 {
        return Ok(());
    }
    let token_client = token::Client::new(env, asset);
    token_client.transfer(from, &env.current_contract_address(), &to_i128(amount)?);
    Ok(())
}

/// Moves `amount` of the asset from the pool to `to`.
pub fn push(env: &Env, asset: &Address, to: &Address, amount: u128) -> Result<(), LedgerError> {
    if amount == 0 {
        return Ok(());
    }
    let token_client = token::Client::new(env, asset);
    token_client.transfer(&env.current_contract_address(), to, &to_i128(amount)?);
    Ok(())
}
