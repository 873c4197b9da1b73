use soroban_sdk::contracterror;

/// Every way a pool operation or view can fail.
///
/// Discriminants are grouped by kind and are part of the contract ABI, so
/// they must never be renumbered.
#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum LedgerError {
    // Input validation
    ZeroAmount = 1,
    AmountOverflow = 2,

    // Solvency
    InsufficientCollateral = 10,
    InsufficientLiquidity = 11,
    PositionUnhealthy = 12,
    PositionHealthy = 13,
    NoDebtToRepay = 14,
    SelfLiquidation = 15,

    // Arithmetic domain
    DivisionByZero = 20,
    Overflow = 21,
    IndexOverflow = 22,

    // Mutual exclusion
    ReentrancyDetected = 30,

    // Lifecycle
    AlreadyInitialized = 40,
    NotInitialized = 41,
    InvalidConfig = 42,
}
