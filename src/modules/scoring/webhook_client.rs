use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::Sha256;

use super::{ScoringCallError, ScoringJobClient, ScoringJobPayload};
use crate::core::config::ScoringConfig;
use crate::shared::constants::{SCORING_API_KEY_HEADER, SCORING_SIGNATURE_HEADER};

type HmacSha256 = Hmac<Sha256>;

/// Hex HMAC-SHA256 of a request body under the shared scoring key
pub fn sign_body(key: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Posts scoring jobs to the configured webhook
pub struct ScoringWebhookClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl ScoringWebhookClient {
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            client: Client::new(),
            url: config.webhook_url.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ScoringJobClient for ScoringWebhookClient {
    async fn submit(&self, payload: &ScoringJobPayload) -> Result<(), ScoringCallError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| ScoringCallError::Transport(format!("payload encoding: {}", e)))?;

        let mut request = self
            .client
            .post(&self.url)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(key) = &self.api_key {
            request = request
                .header(SCORING_API_KEY_HEADER, key)
                .header(SCORING_SIGNATURE_HEADER, sign_body(key, &body));
        }

        tracing::debug!("Submitting scoring job for study {}", payload.app_id);

        let response = request
            .body(body)
            .send()
            .await
            .map_err(|e| ScoringCallError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "Scoring endpoint rejected study {}: HTTP {}",
                payload.app_id,
                status
            );
            return Err(ScoringCallError::Status(status.as_u16()));
        }

        Ok(())
    }
}
