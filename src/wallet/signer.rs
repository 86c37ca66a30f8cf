//! Transaction signing keyed by source address.
//!
//! # Security
//! - Private keys are loaded ONLY from environment variables
//! - Keys are never logged or serialized

use std::collections::HashMap;

use alloy::primitives::B256;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;

use crate::client::{ClientError, ClientResult};

/// Environment variable holding `<address>=<hex key>` pairs, comma separated.
pub const SIGNER_KEYS_ENV_VAR: &str = "TXFLOW_SIGNER_KEYS";

/// An unlocked signing capability.
#[async_trait]
pub trait TxSigner: Send + Sync {
    /// Sign a transaction id on behalf of `address`; returns hex `r||s`.
    async fn sign(&self, address: &str, tx_id: &str) -> ClientResult<String>;
}

/// secp256k1 keys indexed by wallet address hash.
#[derive(Default)]
pub struct KeyringSigner {
    keys: HashMap<String, PrivateKeySigner>,
}

impl KeyringSigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a key for `address` from a hex string (with or without 0x prefix).
    pub fn add_key(&mut self, address: &str, private_key_hex: &str) -> ClientResult<()> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| ClientError::Signing(format!("Invalid private key for {}: {}", address, e)))?;
        tracing::info!(address = %address, "Signing key loaded");
        self.keys.insert(address.to_string(), signer);
        Ok(())
    }

    /// Parse `addr=key,addr=key`.
    pub fn from_pairs(pairs: &str) -> ClientResult<Self> {
        let mut keyring = Self::new();
        for pair in pairs.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (address, key) = pair
                .split_once('=')
                .ok_or_else(|| ClientError::Signing("Expected <address>=<key> pairs".to_string()))?;
            keyring.add_key(address.trim(), key.trim())?;
        }
        Ok(keyring)
    }

    /// Load keys from [`SIGNER_KEYS_ENV_VAR`].
    pub fn from_env() -> ClientResult<Self> {
        let pairs = std::env::var(SIGNER_KEYS_ENV_VAR).map_err(|_| {
            ClientError::Signing(format!("Environment variable {} not set", SIGNER_KEYS_ENV_VAR))
        })?;
        Self::from_pairs(&pairs)
    }

    pub fn has_key(&self, address: &str) -> bool {
        self.keys.contains_key(address)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl std::fmt::Debug for KeyringSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringSigner")
            .field("addresses", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[async_trait]
impl TxSigner for KeyringSigner {
    async fn sign(&self, address: &str, tx_id: &str) -> ClientResult<String> {
        let signer = self
            .keys
            .get(address)
            .ok_or_else(|| ClientError::Signing(format!("No signing key for {}", address)))?;
        let hash: B256 = tx_id
            .parse()
            .map_err(|e| ClientError::Signing(format!("Invalid transaction id '{}': {}", tx_id, e)))?;
        let signature = signer
            .sign_hash(&hash)
            .await
            .map_err(|e| ClientError::Signing(format!("Signing failed: {}", e)))?;
        Ok(alloy::hex::encode(&signature.as_bytes()[..64]))
    }
}
