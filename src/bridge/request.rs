//! Inbound signing requests and their mapping to drafts.

use std::str::FromStr;

use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::amount::to_minor_units;
use crate::draft::{
    CallContractDraft, ContractField, DeployContractDraft, Draft, DraftKind, GasSettings, TransferDraft,
};
use crate::error::{Result, TxError};
use crate::wallet::AddressBook;

/// A request delivered by the session protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    /// Session the request belongs to.
    pub topic: String,
    /// Correlation id echoed in the response.
    pub id: u64,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// Supported signing methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Transfer,
    DeployContract,
    CallContract,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        self.draft_kind().as_str()
    }

    pub fn draft_kind(&self) -> DraftKind {
        match self {
            RequestMethod::Transfer => DraftKind::Transfer,
            RequestMethod::DeployContract => DraftKind::DeployContract,
            RequestMethod::CallContract => DraftKind::CallContract,
        }
    }
}

impl FromStr for RequestMethod {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "transfer" | "alph_signTransferTx" => Ok(RequestMethod::Transfer),
            "deploy-contract" | "alph_signContractCreationTx" => Ok(RequestMethod::DeployContract),
            "call-contract" | "alph_signScriptTx" => Ok(RequestMethod::CallContract),
            other => Err(TxError::UnsupportedRequestMethod(other.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DestinationParam {
    address: String,
    alph_amount: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TransferParams {
    signer_address: String,
    destinations: Vec<DestinationParam>,
    gas_amount: Option<u64>,
    gas_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeployParams {
    signer_address: String,
    bytecode: String,
    #[serde(default)]
    initial_fields: Vec<ContractField>,
    alph_amount: Option<String>,
    issue_token_amount: Option<String>,
    gas_amount: Option<u64>,
    gas_price: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CallParams {
    signer_address: String,
    bytecode: String,
    alph_amount: Option<String>,
    gas_amount: Option<u64>,
    gas_price: Option<String>,
}

fn params<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T> {
    serde_json::from_value(value.clone())
        .map_err(|e| TxError::Validation(format!("Invalid request parameters: {}", e)))
}

fn gas(gas_amount: Option<u64>, gas_price: Option<&str>) -> Result<GasSettings> {
    Ok(GasSettings {
        gas_amount,
        gas_price: gas_price.map(to_minor_units).transpose()?,
    })
}

fn optional_amount(value: Option<&str>) -> Result<Option<U256>> {
    Ok(value.map(to_minor_units).transpose()?)
}

/// Decode `request` into a draft whose source is resolved in `addresses`.
pub fn map_request(request: &SessionRequest, addresses: &AddressBook) -> Result<Draft> {
    let method: RequestMethod = request.method.parse()?;
    let draft = match method {
        RequestMethod::Transfer => {
            let p: TransferParams = params(&request.params)?;
            let source = addresses.resolve(&p.signer_address)?;
            let destination = match p.destinations.as_slice() {
                [only] => only,
                [] => return Err(TxError::Validation("No destination given".to_string())),
                _ => {
                    return Err(TxError::Validation(
                        "Only one destination per transfer is supported".to_string(),
                    ))
                }
            };
            Draft::Transfer(TransferDraft {
                source,
                destination: destination.address.clone(),
                amount: to_minor_units(&destination.alph_amount)?,
                gas: gas(p.gas_amount, p.gas_price.as_deref())?,
            })
        }
        RequestMethod::DeployContract => {
            let p: DeployParams = params(&request.params)?;
            let source = addresses.resolve(&p.signer_address)?;
            let issue_token_amount = p
                .issue_token_amount
                .as_deref()
                .map(|raw| {
                    U256::from_str_radix(raw.trim(), 10)
                        .map_err(|_| TxError::Validation(format!("Invalid token amount '{}'", raw)))
                })
                .transpose()?;
            Draft::DeployContract(DeployContractDraft {
                source,
                bytecode: p.bytecode,
                initial_fields: p.initial_fields,
                amount: optional_amount(p.alph_amount.as_deref())?,
                issue_token_amount,
                gas: gas(p.gas_amount, p.gas_price.as_deref())?,
            })
        }
        RequestMethod::CallContract => {
            let p: CallParams = params(&request.params)?;
            let source = addresses.resolve(&p.signer_address)?;
            Draft::CallContract(CallContractDraft {
                source,
                bytecode: p.bytecode,
                amount: optional_amount(p.alph_amount.as_deref())?,
                gas: gas(p.gas_amount, p.gas_price.as_deref())?,
            })
        }
    };
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::AddressRecord;
    use crate::draft::FieldType;
    use serde_json::json;

    fn book() -> AddressBook {
        let book = AddressBook::new();
        book.insert(AddressRecord::new("signer", "02aa", U256::from(10u64).pow(U256::from(19u64))));
        book
    }

    fn request(method: &str, params: Value) -> SessionRequest {
        SessionRequest {
            topic: "t".into(),
            id: 1,
            method: method.into(),
            params,
        }
    }

    #[test]
    fn test_method_aliases() {
        assert_eq!("alph_signTransferTx".parse::<RequestMethod>().unwrap(), RequestMethod::Transfer);
        assert_eq!("deploy-contract".parse::<RequestMethod>().unwrap(), RequestMethod::DeployContract);
        assert_eq!("alph_signScriptTx".parse::<RequestMethod>().unwrap(), RequestMethod::CallContract);
        assert!(matches!(
            "alph_signMessage".parse::<RequestMethod>(),
            Err(TxError::UnsupportedRequestMethod(_))
        ));
    }

    #[test]
    fn test_map_transfer() {
        let req = request(
            "transfer",
            json!({
                "signerAddress": "signer",
                "destinations": [{ "address": "dest", "alphAmount": "1.5" }],
                "gasAmount": 20000,
                "gasPrice": "0.0000001"
            }),
        );
        let Draft::Transfer(draft) = map_request(&req, &book()).unwrap() else {
            panic!("expected a transfer");
        };
        assert_eq!(draft.source.public_key, "02aa");
        assert_eq!(draft.amount, U256::from(1_500_000_000_000_000_000u128));
        assert_eq!(draft.gas.gas_amount, Some(20_000));
        assert_eq!(draft.gas.gas_price, Some(U256::from(100_000_000_000u64)));
    }

    #[test]
    fn test_map_deploy_with_fields() {
        let req = request(
            "alph_signContractCreationTx",
            json!({
                "signerAddress": "signer",
                "bytecode": "0102",
                "initialFields": [{ "type": "U256", "value": 7 }, { "type": "Bool", "value": true }],
                "issueTokenAmount": "1000"
            }),
        );
        let Draft::DeployContract(draft) = map_request(&req, &book()).unwrap() else {
            panic!("expected a deployment");
        };
        assert_eq!(draft.initial_fields[0].field_type, FieldType::U256);
        assert_eq!(draft.initial_fields[0].value, "7");
        assert_eq!(draft.initial_fields[1].value, "true");
        assert_eq!(draft.issue_token_amount, Some(U256::from(1000u64)));
        assert!(draft.amount.is_none());
    }

    #[test]
    fn test_unknown_signer() {
        let req = request("alph_signScriptTx", json!({ "signerAddress": "X", "bytecode": "00" }));
        let err = map_request(&req, &book()).unwrap_err();
        assert_eq!(err.to_string(), "Unknown signer address: X");
    }

    #[test]
    fn test_multiple_destinations_rejected() {
        let req = request(
            "transfer",
            json!({
                "signerAddress": "signer",
                "destinations": [
                    { "address": "a", "alphAmount": "1" },
                    { "address": "b", "alphAmount": "1" }
                ]
            }),
        );
        assert!(matches!(map_request(&req, &book()), Err(TxError::Validation(_))));
    }

    #[test]
    fn test_bad_amount() {
        let req = request(
            "transfer",
            json!({
                "signerAddress": "signer",
                "destinations": [{ "address": "a", "alphAmount": "abc" }]
            }),
        );
        assert!(matches!(map_request(&req, &book()), Err(TxError::AmountParse(_))));
    }
}
