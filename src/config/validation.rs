//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate node URLs and timeouts
//! - Check that a password hash exists when a password is required
//! - Detect duplicate addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WalletConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use argon2::PasswordHash;
use thiserror::Error;

use crate::amount::to_minor_units;
use crate::config::schema::WalletConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &WalletConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let urls = std::iter::once(("node.rpc_url", &config.node.rpc_url))
        .chain(config.node.failover_urls.iter().map(|u| ("node.failover_urls", u)));
    for (field, raw) in urls {
        match url::Url::parse(raw) {
            Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {}
            Ok(u) => errors.push(ValidationError::new(field, format!("unsupported scheme '{}'", u.scheme()))),
            Err(e) => errors.push(ValidationError::new(field, format!("invalid URL '{}': {}", raw, e))),
        }
    }

    if config.node.request_timeout_secs == 0 {
        errors.push(ValidationError::new("node.request_timeout_secs", "must be greater than 0"));
    }
    if config.node.pending_ttl_secs == 0 {
        errors.push(ValidationError::new("node.pending_ttl_secs", "must be greater than 0"));
    }

    if config.wallet.password_required {
        match config.wallet.password_hash.as_deref() {
            None | Some("") => errors.push(ValidationError::new(
                "wallet.password_hash",
                "required when password_required is set",
            )),
            Some(hash) => {
                if let Err(e) = PasswordHash::new(hash) {
                    errors.push(ValidationError::new("wallet.password_hash", format!("not a PHC string: {}", e)));
                }
            }
        }
    }

    let mut seen = HashSet::new();
    for entry in &config.wallet.addresses {
        if entry.hash.trim().is_empty() {
            errors.push(ValidationError::new("wallet.addresses", "address hash is empty"));
        } else if !seen.insert(entry.hash.as_str()) {
            errors.push(ValidationError::new("wallet.addresses", format!("duplicate address '{}'", entry.hash)));
        }
    }

    if let Some(limit) = &config.bridge.max_auto_approve_amount {
        if let Err(e) = to_minor_units(limit) {
            errors.push(ValidationError::new("bridge.max_auto_approve_amount", e.to_string()));
        }
    }

    if config.bridge.queue_capacity == 0 {
        errors.push(ValidationError::new("bridge.queue_capacity", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::AddressEntry;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&WalletConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = WalletConfig::default();
        config.node.rpc_url = "not a url".into();
        config.node.request_timeout_secs = 0;
        config.wallet.password_required = true;
        config.bridge.max_auto_approve_amount = Some("lots".into());
        let entry = AddressEntry {
            hash: "a".into(),
            public_key: "02".into(),
        };
        config.wallet.addresses = vec![entry.clone(), entry];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.field == "wallet.password_hash"));
        assert!(errors.iter().any(|e| e.message.contains("duplicate")));
    }
}
