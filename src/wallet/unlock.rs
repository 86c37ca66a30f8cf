//! Local approval gate for the password step.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use async_trait::async_trait;

use crate::error::{Result, TxError};

/// Resolves a password to approve or deny a send.
#[async_trait]
pub trait PasswordGate: Send + Sync {
    async fn verify(&self, password: &str) -> Result<bool>;
}

/// Verifies against an argon2 PHC string.
#[derive(Clone)]
pub struct Argon2PasswordGate {
    phc: String,
}

impl Argon2PasswordGate {
    pub fn new(phc: impl Into<String>) -> Result<Self> {
        let phc = phc.into();
        PasswordHash::new(&phc).map_err(|e| TxError::Validation(format!("Invalid password hash: {}", e)))?;
        Ok(Self { phc })
    }
}

impl std::fmt::Debug for Argon2PasswordGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Argon2PasswordGate")
    }
}

#[async_trait]
impl PasswordGate for Argon2PasswordGate {
    async fn verify(&self, password: &str) -> Result<bool> {
        let phc = self.phc.clone();
        let password = password.to_owned();
        // Argon2 is deliberately slow; keep it off the runtime threads.
        tokio::task::spawn_blocking(move || {
            PasswordHash::new(&phc)
                .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
                .unwrap_or(false)
        })
        .await
        .map_err(|e| TxError::Validation(format!("Password check aborted: {}", e)))
    }
}
