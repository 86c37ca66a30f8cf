//! Amount and fee utilities.
//!
//! # Data Flow
//! ```text
//! user / bridge input ("1.5")
//!     → units.rs (decimal string → minor units, display formatting)
//!     → fees.rs  (range checks, gas minimums, fee deduction for display)
//! ```
//!
//! All arithmetic is on `U256` minor units; balances may exceed 64 bits.

pub mod fees;
pub mod units;

use thiserror::Error;

pub use fees::{
    check_gas_amount, check_gas_price, expected_amount_after_fees, fee_from_gas,
    is_amount_within_range, is_within_available_balance, MINIMAL_GAS_AMOUNT, MINIMAL_GAS_PRICE,
    MIN_TRANSFER_AMOUNT,
};
pub use units::{format_amount, to_minor_units, NATIVE_DECIMALS};

/// Errors produced by amount conversion and range checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Input is not a non-negative decimal number.
    #[error("{0}")]
    Parse(String),

    /// Value is below the allowed minimum.
    #[error("The amount must be greater than {0}")]
    BelowMinimum(String),
}
