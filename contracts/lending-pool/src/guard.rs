//! Invocation-scoped mutual exclusion.
//!
//! The flag sits in temporary storage and is cleared before every successful
//! return; a failed invocation is rolled back by the host, flag included, so
//! it never outlives the call that set it.

use soroban_sdk::Env;

use crate::errors::LedgerError;
use crate::storage::DataKey;

pub fn is_locked(env: &Env) -> bool {
    env.storage().temporary().has(&DataKey::Locked)
}

pub fn enter(env: &Env) -> Result<(), LedgerError> {
    if is_locked(env) {
        return Err(LedgerError::ReentrancyDetected);
    }
    env.storage().temporary().set(&DataKey::Locked, &true);
    Ok(())
}

pub fn exit(env: &Env) {
    env.storage().temporary().remove(&DataKey::Locked);
}

/// For views that must not answer while a mutation is in flight.
pub fn ensure_unlocked(env: &Env) -> Result<(), LedgerError> {
    if is_locked(env) {
        return Err(LedgerError::ReentrancyDetected);
    }
    Ok(())
}

/// Holds the guard for the lifetime of one operation and releases it on drop.
pub struct ReentrancyLock {
    env: Env,
}

impl ReentrancyLock {
    pub fn acquire(env: &Env) -> Result<Self, LedgerError> {
        enter(env)?;
        Ok(Self { env: env.clone() })
    }
}

impl Drop for ReentrancyLock {
    fn drop(&mut self) {
        exit(&self.env);
    }
}
