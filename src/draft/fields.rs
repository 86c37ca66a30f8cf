//! Typed contract fields and their `value:Type` text form.

use alloy::primitives::{I256, U256};
use serde::{Deserialize, Deserializer, Serialize};

use crate::draft::validation::check_address;
use crate::error::{Result, TxError};

/// Field types accepted by contract deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    Bool,
    I256,
    U256,
    ByteVec,
    Address,
}

impl FieldType {
    fn as_str(&self) -> &'static str {
        match self {
            FieldType::Bool => "Bool",
            FieldType::I256 => "I256",
            FieldType::U256 => "U256",
            FieldType::ByteVec => "ByteVec",
            FieldType::Address => "Address",
        }
    }
}

impl std::str::FromStr for FieldType {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Bool" => Ok(FieldType::Bool),
            "I256" => Ok(FieldType::I256),
            "U256" => Ok(FieldType::U256),
            "ByteVec" => Ok(FieldType::ByteVec),
            "Address" => Ok(FieldType::Address),
            other => Err(TxError::Validation(format!("Invalid fields: unknown type '{}'", other))),
        }
    }
}

/// A single initial contract field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractField {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(deserialize_with = "scalar_as_string")]
    pub value: String,
}

impl ContractField {
    /// Build a field, checking that the value matches its type.
    pub fn new(field_type: FieldType, value: impl Into<String>) -> Result<Self> {
        let field = Self {
            field_type,
            value: value.into(),
        };
        field.validate()?;
        Ok(field)
    }

    pub fn validate(&self) -> Result<()> {
        let value = self.value.as_str();
        let valid = match self.field_type {
            FieldType::Bool => value == "true" || value == "false",
            FieldType::I256 => I256::from_dec_str(value).is_ok(),
            FieldType::U256 => U256::from_str_radix(value, 10).is_ok(),
            FieldType::ByteVec => alloy::hex::decode(value).is_ok(),
            FieldType::Address => check_address(value).is_ok(),
        };
        if !valid {
            return Err(TxError::Validation(format!(
                "Invalid fields: '{}' is not a valid {}",
                value,
                self.field_type.as_str()
            )));
        }
        Ok(())
    }
}

/// Parse `"value:Type,value:Type"` into typed fields. Blank input yields no fields.
pub fn parse_fields(input: &str) -> Result<Vec<ContractField>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input.split(',').map(parse_field).collect()
}

fn parse_field(entry: &str) -> Result<ContractField> {
    let (value, field_type) = entry
        .split_once(':')
        .ok_or_else(|| TxError::Validation(format!("Invalid fields: '{}' has no type", entry.trim())))?;
    ContractField::new(field_type.trim().parse()?, value.trim())
}

/// Inverse of [`parse_fields`].
pub fn encode_fields(fields: &[ContractField]) -> String {
    fields
        .iter()
        .map(|f| format!("{}:{}", f.value, f.field_type.as_str()))
        .collect::<Vec<_>>()
        .join(",")
}

// Session requests send booleans and numbers as JSON scalars.
fn scalar_as_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!("unsupported field value {}", other))),
    }
}
