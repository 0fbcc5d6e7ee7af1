use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use std::time::Duration;

use super::jwks::JwksClient;
use super::model::{Identity, TokenClaims};
use crate::core::error::AppError;

/// Turns a bearer token into a proven identity
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AppError>;
}

/// RS256 access token validator backed by the provider's JWKS
pub struct JwtValidator {
    jwks_client: Arc<JwksClient>,
    issuer: String,
    audience: String,
    leeway: u64,
}

impl JwtValidator {
    pub fn new(
        jwks_client: Arc<JwksClient>,
        issuer: String,
        audience: String,
        leeway: Duration,
    ) -> Self {
        Self {
            jwks_client,
            issuer,
            audience,
            leeway: leeway.as_secs(),
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.leeway = self.leeway;
        validation.validate_nbf = true;
        validation
    }
}

#[async_trait]
impl TokenVerifier for JwtValidator {
    async fn verify(&self, token: &str) -> Result<Identity, AppError> {
        let header = decode_header(token).map_err(|e| AppError::Auth(e.to_string()))?;

        if header.alg != Algorithm::RS256 {
            return Err(AppError::Auth(format!(
                "Unsupported algorithm: {:?}. Only RS256 is allowed",
                header.alg
            )));
        }

        let kid = header
            .kid
            .ok_or_else(|| AppError::Auth("Missing kid in token header".to_string()))?;

        let decoding_key = self
            .jwks_client
            .get_key(&kid)
            .await
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let claims = decode::<TokenClaims>(token, &decoding_key, &self.validation())
            .map_err(|e| AppError::Auth(e.to_string()))?
            .claims;

        if claims.sub.trim().is_empty() {
            return Err(AppError::Auth("Token has an empty subject".to_string()));
        }

        Ok(Identity {
            sub: claims.sub,
            email: claims.email.filter(|e| !e.trim().is_empty()),
        })
    }
}
