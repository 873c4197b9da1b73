use soroban_sdk::{contractevent, Address};

/// Collateral credited to `user` after the asset was pulled in.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deposit {
    #[topic]
    pub user: Address,
    pub amount: u128,
}

/// Collateral released to `user`.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Withdraw {
    #[topic]
    pub user: Address,
    pub amount: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Borrow {
    #[topic]
    pub user: Address,
    pub amount: u128,
    pub scaled_delta: u128,
    pub total_borrows: u128,
}

/// `amount` is what was actually pulled, never more than the debt.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Repay {
    #[topic]
    pub user: Address,
    pub amount: u128,
    pub scaled_repaid: u128,
    pub total_borrows: u128,
}

/// Carries the effective values settled, capped by the borrower's collateral.
#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Liquidate {
    #[topic]
    pub liquidator: Address,
    #[topic]
    pub borrower: Address,
    pub debt_covered: u128,
    pub collateral_seized: u128,
}

#[contractevent]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InterestAccrued {
    pub previous_index: u128,
    pub borrow_index: u128,
    pub rate_per_second: u128,
    pub timestamp: u32,
}
