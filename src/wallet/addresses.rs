//! The local address set.

use std::sync::Arc;

use alloy::primitives::U256;
use dashmap::DashMap;

use crate::client::TransactionClient;
use crate::config::AddressEntry;
use crate::draft::AddressRecord;
use crate::error::{Result, TxError};

/// Thread-safe set of known addresses keyed by hash.
///
/// Balances are written only by [`AddressBook::refresh_balance`], which the
/// lifecycle engine calls after a successful send.
#[derive(Debug, Clone, Default)]
pub struct AddressBook {
    inner: Arc<DashMap<String, AddressRecord>>,
}

impl AddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from configuration. Balances start at zero until refreshed.
    pub fn from_entries(entries: &[AddressEntry]) -> Self {
        let book = Self::new();
        for entry in entries {
            book.insert(AddressRecord::new(entry.hash.clone(), entry.public_key.clone(), U256::ZERO));
        }
        book
    }

    pub fn insert(&self, record: AddressRecord) {
        self.inner.insert(record.hash.clone(), record);
    }

    pub fn get(&self, hash: &str) -> Option<AddressRecord> {
        self.inner.get(hash).map(|r| r.value().clone())
    }

    /// Resolve a textual signer address against the set.
    pub fn resolve(&self, hash: &str) -> Result<AddressRecord> {
        self.get(hash)
            .ok_or_else(|| TxError::UnknownSignerAddress(hash.to_string()))
    }

    /// All addresses, ordered by hash.
    pub fn all(&self) -> Vec<AddressRecord> {
        let mut records: Vec<_> = self.inner.iter().map(|r| r.value().clone()).collect();
        records.sort_by(|a, b| a.hash.cmp(&b.hash));
        records
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Fetch the balance of `hash` from the node and store it.
    pub async fn refresh_balance(&self, client: &dyn TransactionClient, hash: &str) -> Result<U256> {
        let balance = client.fetch_balance(hash).await?;
        match self.inner.get_mut(hash) {
            Some(mut record) => {
                record.available_balance = balance;
                tracing::debug!(address = %hash, balance = %balance, "Balance refreshed");
                Ok(balance)
            }
            None => Err(TxError::UnknownSignerAddress(hash.to_string())),
        }
    }

    /// Refresh every address; returns how many refreshes failed.
    pub async fn refresh_all(&self, client: &dyn TransactionClient) -> usize {
        let mut failures = 0;
        for record in self.all() {
            if let Err(e) = self.refresh_balance(client, &record.hash).await {
                tracing::warn!(address = %record.hash, error = %e, "Balance refresh failed");
                failures += 1;
            }
        }
        failures
    }
}
