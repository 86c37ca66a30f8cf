//! Pre-build checks applied to every draft before the node is contacted.

use crate::amount::{
    check_gas_amount, check_gas_price, format_amount, is_amount_within_range, is_within_available_balance,
    MIN_TRANSFER_AMOUNT,
};
use crate::draft::types::{Draft, GasSettings};
use crate::error::{Result, TxError};

/// Address type prefixes: P2PKH, P2MPKH, P2SH, P2C.
const MAX_ADDRESS_TYPE: u8 = 3;
const MIN_ADDRESS_BYTES: usize = 33;

/// Check that `address` is a well-formed base58 address.
pub fn check_address(address: &str) -> Result<()> {
    let invalid = || TxError::Validation(format!("Address format is incorrect: '{}'", address));
    if address.is_empty() {
        return Err(invalid());
    }
    let bytes = bs58::decode(address).into_vec().map_err(|_| invalid())?;
    match bytes.first() {
        Some(prefix) if *prefix <= MAX_ADDRESS_TYPE && bytes.len() >= MIN_ADDRESS_BYTES => Ok(()),
        _ => Err(invalid()),
    }
}

fn check_gas(gas: &GasSettings) -> Result<()> {
    if let Some(amount) = gas.gas_amount {
        check_gas_amount(amount)?;
    }
    if let Some(price) = gas.gas_price {
        check_gas_price(price)?;
    }
    Ok(())
}

fn check_bytecode(bytecode: &str) -> Result<()> {
    if bytecode.trim().is_empty() {
        return Err(TxError::Validation("Bytecode is required".to_string()));
    }
    alloy::hex::decode(bytecode.trim())
        .map_err(|_| TxError::Validation("Bytecode must be hex encoded".to_string()))?;
    Ok(())
}

/// Validate a draft the way the send form does before submitting it.
pub fn validate_draft(draft: &Draft) -> Result<()> {
    check_gas(draft.gas())?;

    let available = draft.source().available_balance;
    let check_amount = |amount| {
        if is_amount_within_range(amount, available) {
            Ok(())
        } else if !is_within_available_balance(amount, available) {
            Err(TxError::Validation(format!(
                "Amount exceeds the available balance of {}",
                format_amount(available)
            )))
        } else {
            Err(TxError::Validation(format!(
                "Amount must be at least {}",
                format_amount(MIN_TRANSFER_AMOUNT)
            )))
        }
    };

    match draft {
        Draft::Transfer(d) => {
            check_address(&d.destination)?;
            check_amount(d.amount)
        }
        Draft::DeployContract(d) => {
            check_bytecode(&d.bytecode)?;
            for field in &d.initial_fields {
                field.validate()?;
            }
            d.amount.map_or(Ok(()), check_amount)
        }
        Draft::CallContract(d) => {
            check_bytecode(&d.bytecode)?;
            d.amount.map_or(Ok(()), check_amount)
        }
    }
}
