//! Session protocol seam and the one-shot pending request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bridge::request::SessionRequest;
use crate::error::Result;

/// Application error code of the session protocol.
pub const INTERNAL_ERROR_CODE: i64 = -32000;

/// Reason attached to a session disconnect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReason {
    pub code: i64,
    pub message: String,
}

impl ErrorReason {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            code: INTERNAL_ERROR_CODE,
            message: message.into(),
        }
    }
}

/// Outbound half of the session protocol.
#[async_trait]
pub trait SessionTransport: Send + Sync {
    /// Deliver the result of request `id` on `topic`.
    async fn respond(&self, topic: &str, id: u64, result: Value) -> Result<()>;

    /// Close `topic` with `reason`.
    async fn disconnect(&self, topic: &str, reason: ErrorReason) -> Result<()>;
}

/// An accepted request awaiting its single terminal answer.
#[derive(Debug)]
#[must_use = "an accepted request must be answered"]
pub struct PendingRequest {
    topic: String,
    id: u64,
}

impl PendingRequest {
    pub fn new(request: &SessionRequest) -> Self {
        Self {
            topic: request.topic.clone(),
            id: request.id,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub async fn respond(self, transport: &dyn SessionTransport, result: Value) -> Result<()> {
        transport.respond(&self.topic, self.id, result).await
    }

    pub async fn reject(self, transport: &dyn SessionTransport, reason: ErrorReason) -> Result<()> {
        tracing::info!(topic = %self.topic, id = self.id, code = reason.code, message = %reason.message, "Closing session");
        transport.disconnect(&self.topic, reason).await
    }
}
