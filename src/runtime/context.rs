//! Shared wiring of the wallet components from configuration.

use std::sync::Arc;

use crate::client::{NodeClient, TransactionClient};
use crate::config::WalletConfig;
use crate::error::Result;
use crate::wallet::{AddressBook, Argon2PasswordGate, KeyringSigner, PasswordGate};

/// Everything a lifecycle run needs, built once per process.
pub struct WalletContext {
    pub config: WalletConfig,
    pub node: Arc<NodeClient>,
    pub addresses: AddressBook,
    pub password_gate: Option<Arc<dyn PasswordGate>>,
}

impl WalletContext {
    /// Build the node client, keyring and address set. Signing keys are read
    /// from the environment.
    pub fn from_config(config: WalletConfig) -> Result<Self> {
        let keyring = KeyringSigner::from_env()?;
        for entry in &config.wallet.addresses {
            if !keyring.has_key(&entry.hash) {
                tracing::warn!(address = %entry.hash, "No signing key for configured address");
            }
        }

        let node = Arc::new(NodeClient::new(&config.node, Arc::new(keyring))?);
        let addresses = AddressBook::from_entries(&config.wallet.addresses);

        let password_gate = match (&config.wallet.password_required, &config.wallet.password_hash) {
            (true, Some(hash)) => Some(Arc::new(Argon2PasswordGate::new(hash.clone())?) as Arc<dyn PasswordGate>),
            _ => None,
        };

        Ok(Self {
            config,
            node,
            addresses,
            password_gate,
        })
    }

    pub fn client(&self) -> Arc<dyn TransactionClient> {
        self.node.clone()
    }

    /// Refresh every balance; failures are logged and counted.
    pub async fn refresh_balances(&self) -> usize {
        let failures = self.addresses.refresh_all(self.node.as_ref()).await;
        tracing::info!(addresses = self.addresses.len(), failures, "Balances refreshed");
        failures
    }
}
