#![no_std]

pub mod accrual;
pub mod codec;
pub mod constants;
mod contract;
pub mod errors;
pub mod events;
pub mod guard;
mod helpers;
pub mod math;
mod storage;

pub use contract::{LendingPool, LendingPoolClient};
pub use errors::LedgerError;
