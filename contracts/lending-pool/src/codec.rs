//! Packing of pool records into single 256-bit storage words.
//!
//! Encoders assume every field already fits its slot; decoders are total.
//!
//! | Record      | Field            | Bits    |
//! |-------------|------------------|---------|
//! | Account     | collateral       | 0-127   |
//! | Account     | scaled_debt      | 128-255 |
//! | GlobalVolume| total_borrows    | 0-127   |
//! | GlobalVolume| total_liquidity  | 128-255 |
//! | RateState   | last_update_time | 0-31    |
//! | RateState   | liquidity_index  | 32-127  |
//! | RateState   | borrow_index     | 128-255 |

use crate::constants::{MAX_LIQUIDITY_INDEX, WAD};
use crate::math::U256;

pub type Word = U256;

/// Per-participant balances. `scaled_debt` is debt divided by the borrow
/// index at the time it was recorded.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Account {
    pub collateral: u128,
    pub scaled_debt: u128,
}

impl Account {
    pub fn is_empty(&self) -> bool {
        self.collateral == 0 && self.scaled_debt == 0
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct GlobalVolume {
    pub total_liquidity: u128,
    pub total_borrows: u128,
}

impl GlobalVolume {
    pub fn available(&self) -> u128 {
        self.total_liquidity.saturating_sub(self.total_borrows)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RateState {
    pub borrow_index: u128,
    pub liquidity_index: u128,
    pub last_update_time: u32,
}

impl RateState {
    pub fn genesis(now: u32) -> Self {
        Self {
            borrow_index: WAD,
            liquidity_index: WAD,
            last_update_time: now,
        }
    }
}

fn join(high: u128, low: u128) -> Word {
    (U256::from(high) << 128usize) | U256::from(low)
}

fn split(word: Word) -> (u128, u128) {
    ((word >> 128usize).low_u128(), word.low_u128())
}

pub fn encode_account(account: &Account) -> Word {
    join(account.scaled_debt, account.collateral)
}

pub fn decode_account(word: Word) -> Account {
    let (scaled_debt, collateral) = split(word);
    Account {
        collateral,
        scaled_debt,
    }
}

pub fn encode_volume(volume: &GlobalVolume) -> Word {
    join(volume.total_liquidity, volume.total_borrows)
}

pub fn decode_volume(word: Word) -> GlobalVolume {
    let (total_liquidity, total_borrows) = split(word);
    GlobalVolume {
        total_liquidity,
        total_borrows,
    }
}

pub fn encode_rates(rates: &RateState) -> Word {
    debug_assert!(rates.liquidity_index <= MAX_LIQUIDITY_INDEX);
    let low = (rates.liquidity_index << 32) | rates.last_update_time as u128;
    join(rates.borrow_index, low)
}

pub fn decode_rates(word: Word) -> RateState {
    let (borrow_index, low) = split(word);
    RateState {
        borrow_index,
        liquidity_index: low >> 32,
        last_update_time: (low & u32::MAX as u128) as u32,
    }
}

/// Big-endian byte image of a word, the form kept in contract storage.
pub fn to_be_bytes(word: Word) -> [u8; 32] {
    let U256(limbs) = word;
    let mut out = [0u8; 32];
    for (i, limb) in limbs.iter().rev().enumerate() {
        out[i * 8..(i + 1) * 8].copy_from_slice(&limb.to_be_bytes());
    }
    out
}

pub fn from_be_bytes(bytes: &[u8; 32]) -> Word {
    let mut limbs = [0u64; 4];
    for (i, chunk) in bytes.chunks_exact(8).enumerate() {
        let mut limb = [0u8; 8];
        limb.copy_from_slice(chunk);
        limbs[3 - i] = u64::from_be_bytes(limb);
    }
    U256(limbs)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn account_fields_land_in_their_halves() {
        let collateral_only = encode_account(&Account {
            collateral: 1,
            scaled_debt: 0,
        });
        assert_eq!(collateral_only, U256::one());

        let debt_only = encode_account(&Account {
            collateral: 0,
            scaled_debt: 1,
        });
        assert_eq!(debt_only, U256::one() << 128usize);
    }

    #[test]
    fn volume_keeps_borrows_low_and_liquidity_high() {
        let volume = GlobalVolume {
            total_liquidity: 1_000 * WAD,
            total_borrows: 800 * WAD,
        };
        let word = encode_volume(&volume);
        assert_eq!(word.low_u128(), 800 * WAD);
        assert_eq!((word >> 128usize).low_u128(), 1_000 * WAD);
        assert_eq!(decode_volume(word), volume);
    }

    #[test]
    fn rate_state_layout() {
        let rates = RateState {
            borrow_index: 1_079_999_999_977_888_000,
            liquidity_index: WAD,
            last_update_time: 1_700_000_000,
        };
        let word = encode_rates(&rates);
        assert_eq!(word.low_u128() & 0xffff_ffff, 1_700_000_000);
        assert_eq!(word.low_u128() >> 32, WAD);
        assert_eq!((word >> 128usize).low_u128(), rates.borrow_index);
        assert_eq!(decode_rates(word), rates);
    }

    #[test]
    fn extremes_survive_packing() {
        let account = Account {
            collateral: u128::MAX,
            scaled_debt: u128::MAX - 1,
        };
        assert_eq!(decode_account(encode_account(&account)), account);

        let rates = RateState {
            borrow_index: u128::MAX,
            liquidity_index: MAX_LIQUIDITY_INDEX,
            last_update_time: u32::MAX,
        };
        assert_eq!(decode_rates(encode_rates(&rates)), rates);
    }

    #[test]
    fn decoding_is_total() {
        let rates = decode_rates(U256::MAX);
        assert_eq!(rates.borrow_index, u128::MAX);
        assert_eq!(rates.liquidity_index, MAX_LIQUIDITY_INDEX);
        assert_eq!(rates.last_update_time, u32::MAX);

        assert_eq!(decode_account(U256::zero()), Account::default());
        assert!(decode_account(U256::zero()).is_empty());
    }

    #[test]
    fn byte_image_is_big_endian() {
        let bytes = to_be_bytes(U256::one());
        assert_eq!(bytes[31], 1);
        assert!(bytes[..31].iter().all(|b| *b == 0));

        let word = encode_rates(&RateState::genesis(42));
        assert_eq!(from_be_bytes(&to_be_bytes(word)), word);
    }
}
