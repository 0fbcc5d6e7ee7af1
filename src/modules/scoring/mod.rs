//! External scoring job collaborator
//!
//! One HTTPS endpoint accepts a job payload and acknowledges it. Completion
//! is reported later through the scoring completion webhook.

mod webhook_client;

pub use webhook_client::{sign_body, ScoringWebhookClient};

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Body posted to the scoring endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringJobPayload {
    pub app_id: Uuid,
    /// Unix epoch milliseconds
    pub timestamp: i64,
    pub empresa: String,
    pub rfc: String,
    pub files: BTreeMap<String, Option<String>>,
    pub questionnaire: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringCallError {
    #[error("scoring endpoint returned HTTP {0}")]
    Status(u16),

    #[error("scoring endpoint unreachable: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ScoringJobClient: Send + Sync {
    /// Issue the job. Any 2xx is an acknowledgement; the body is not read.
    async fn submit(&self, payload: &ScoringJobPayload) -> Result<(), ScoringCallError>;
}
