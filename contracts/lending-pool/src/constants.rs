pub const WAD: u128 = 1_000_000_000_000_000_000u128; // 1e18
pub const SECONDS_PER_YEAR: u128 = 365 * 24 * 60 * 60;

pub const LTV: u128 = 800_000_000_000_000_000u128; // 0.80 WAD, borrow-time cap
pub const LIQUIDATION_THRESHOLD: u128 = 850_000_000_000_000_000u128; // 0.85 WAD

pub const BASE_RATE: u128 = 0;
pub const DEFAULT_RATE_SLOPE: u128 = 3_170_979_198u128; // 10% APR per second at full utilization
pub const MAX_RATE_PER_SECOND: u128 = 158_548_959_918u128; // 500% APR per second

pub const MAX_LIQUIDITY_INDEX: u128 = (1u128 << 96) - 1;

pub const TTL_THRESHOLD: u32 = 100_000;
pub const TTL_EXTEND_TO: u32 = 200_000;
