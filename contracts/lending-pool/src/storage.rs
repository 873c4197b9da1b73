use soroban_sdk::{contracttype, Address, BytesN, Env};

use crate::codec::{
    decode_account, decode_rates, decode_volume, encode_account, encode_rates, encode_volume,
    from_be_bytes, to_be_bytes, Account, GlobalVolume, RateState, Word,
};
use crate::constants::{TTL_EXTEND_TO, TTL_THRESHOLD};
use crate::errors::LedgerError;

// Storage key types for the contract
#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Asset,            // Address of the underlying token
    RateSlope,        // u128, per-second WAD rate at full utilization
    Volume,           // BytesN<32>, packed GlobalVolume
    Rates,            // BytesN<32>, packed RateState
    Account(Address), // BytesN<32>, packed Account
    Locked,           // bool, temporary; present only while an operation runs
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage().persistent().has(&DataKey::Asset)
}

pub fn ensure_initialized(env: &Env) -> Result<Address, LedgerError> {
    let asset: Address = env
        .storage()
        .persistent()
        .get(&DataKey::Asset)
        .ok_or(LedgerError::NotInitialized)?;
    bump_core_ttl(env);
    Ok(asset)
}

pub fn write_asset(env: &Env, asset: &Address) {
    env.storage().persistent().set(&DataKey::Asset, asset);
}

pub fn read_rate_slope(env: &Env) -> Result<u128, LedgerError> {
    env.storage()
        .persistent()
        .get(&DataKey::RateSlope)
        .ok_or(LedgerError::NotInitialized)
}

pub fn write_rate_slope(env: &Env, slope: u128) {
    env.storage().persistent().set(&DataKey::RateSlope, &slope);
}

fn read_word(env: &Env, key: &DataKey) -> Option<Word> {
    env.storage()
        .persistent()
        .get::<_, BytesN<32>>(key)
        .map(|bytes| from_be_bytes(&bytes.to_array()))
}

fn write_word(env: &Env, key: &DataKey, word: Word) {
    let bytes = BytesN::from_array(env, &to_be_bytes(word));
    env.storage().persistent().set(key, &bytes);
}

pub fn read_volume(env: &Env) -> Result<GlobalVolume, LedgerError> {
    read_word(env, &DataKey::Volume)
        .map(decode_volume)
        .ok_or(LedgerError::NotInitialized)
}

pub fn write_volume(env: &Env, volume: &GlobalVolume) {
    write_word(env, &DataKey::Volume, encode_volume(volume));
}

pub fn read_rates(env: &Env) -> Result<RateState, LedgerError> {
    read_word(env, &DataKey::Rates)
        .map(decode_rates)
        .ok_or(LedgerError::NotInitialized)
}

pub fn write_rates(env: &Env, rates: &RateState) {
    write_word(env, &DataKey::Rates, encode_rates(rates));
}

/// Missing accounts read as zero balances.
pub fn read_account(env: &Env, user: &Address) -> Account {
    let key = DataKey::Account(user.clone());
    let account = read_word(env, &key).map(decode_account).unwrap_or_default();
    bump_account_ttl(env, user);
    account
}

/// Zeroed accounts are dropped from storage instead of kept as empty words.
pub fn write_account(env: &Env, user: &Address, account: &Account) {
    let key = DataKey::Account(user.clone());
    if account.is_empty() {
        env.storage().persistent().remove(&key);
        return;
    }
    write_word(env, &key, encode_account(account));
    bump_account_ttl(env, user);
}

pub fn bump_core_ttl(env: &Env) {
    let persistent = env.storage().persistent();
    for key in [
        DataKey::Asset,
        DataKey::RateSlope,
        DataKey::Volume,
        DataKey::Rates,
    ] {
        if persistent.has(&key) {
            persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
        }
    }
}

pub fn bump_account_ttl(env: &Env, user: &Address) {
    let persistent = env.storage().persistent();
    let key = DataKey::Account(user.clone());
    if persistent.has(&key) {
        persistent.extend_ttl(&key, TTL_THRESHOLD, TTL_EXTEND_TO);
    }
}
