//! Balance range checks, gas minimums and fee arithmetic.

use alloy::primitives::U256;

use super::{format_amount, AmountError};

/// Smallest transferable amount (one minor unit).
pub const MIN_TRANSFER_AMOUNT: U256 = U256::from_limbs([1, 0, 0, 0]);

/// Minimal gas amount accepted by the network.
pub const MINIMAL_GAS_AMOUNT: u64 = 20_000;

/// Minimal gas price in minor units (100 nano).
pub const MINIMAL_GAS_PRICE: U256 = U256::from_limbs([100_000_000_000, 0, 0, 0]);

/// True when `amount` does not exceed `available`.
pub fn is_within_available_balance(amount: U256, available: U256) -> bool {
    amount <= available
}

/// True when `amount` is at least one minor unit and does not exceed `max`.
pub fn is_amount_within_range(amount: U256, max: U256) -> bool {
    amount >= MIN_TRANSFER_AMOUNT && amount <= max
}

/// Amount that will actually move once fees are paid.
///
/// When `requested + fee` exceeds `available`, the fee is taken out of the
/// transfer so that `returned + fee == available`. Saturates at zero when the
/// fee alone exceeds the balance.
pub fn expected_amount_after_fees(requested: U256, fee: U256, available: U256) -> U256 {
    if requested.saturating_add(fee) > available {
        available.saturating_sub(fee)
    } else {
        requested
    }
}

/// Total fee for a transaction.
pub fn fee_from_gas(gas_amount: u64, gas_price: U256) -> U256 {
    U256::from(gas_amount).saturating_mul(gas_price)
}

/// Reject gas amounts below [`MINIMAL_GAS_AMOUNT`].
pub fn check_gas_amount(gas_amount: u64) -> Result<(), AmountError> {
    if gas_amount < MINIMAL_GAS_AMOUNT {
        return Err(AmountError::BelowMinimum(MINIMAL_GAS_AMOUNT.to_string()));
    }
    Ok(())
}

/// Reject gas prices below [`MINIMAL_GAS_PRICE`].
pub fn check_gas_price(gas_price: U256) -> Result<(), AmountError> {
    if gas_price < MINIMAL_GAS_PRICE {
        return Err(AmountError::BelowMinimum(format_amount(MINIMAL_GAS_PRICE)));
    }
    Ok(())
}
