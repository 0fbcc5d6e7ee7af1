use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub minio: MinIOConfig,
    pub scoring: ScoringConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub issuer: String,
    pub audience: String,
    /// JWKS endpoint, derived from the issuer unless set explicitly
    pub jwks_url: String,
    pub jwks_cache_ttl: Duration,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// MinIO/S3 storage configuration for study documents
#[derive(Debug, Clone)]
pub struct MinIOConfig {
    /// MinIO/S3 endpoint URL
    pub endpoint: String,
    /// Endpoint used when building document locators handed to clients
    pub public_endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
}

/// External scoring job (webhook) configuration
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub webhook_url: String,
    /// Shared secret sent with every job and expected on completion callbacks
    pub api_key: Option<String>,
    pub timeout: Duration,
    /// Require PendingReview/Corrected before approve/reject
    pub strict_review: bool,
}

/// Target of the generated BigQuery analytics views
#[derive(Debug, Clone)]
pub struct AnalyticsConfig {
    pub project: String,
    pub dataset: String,
    pub source_table: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            minio: MinIOConfig::from_env()?,
            scoring: ScoringConfig::from_env()?,
            analytics: AnalyticsConfig::from_env(),
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        Ok(Self {
            url,
            max_connections: parse_or("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?,
            min_connections: parse_or("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?,
            acquire_timeout_secs: parse_or(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_or("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_or("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWKS_CACHE_TTL_SECS: u64 = 3600; // 1 hour
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60;

    pub fn from_env() -> Result<Self, String> {
        let issuer = env::var("AUTH_ISSUER")
            .map_err(|_| "AUTH_ISSUER environment variable is required".to_string())?;

        let audience = env::var("AUTH_AUDIENCE")
            .map_err(|_| "AUTH_AUDIENCE environment variable is required".to_string())?;

        let jwks_url = env::var("AUTH_JWKS_URL")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| format!("{}/jwks", issuer.trim_end_matches('/')));

        let jwks_cache_ttl_secs = parse_or("JWKS_CACHE_TTL", Self::DEFAULT_JWKS_CACHE_TTL_SECS)?;
        let jwt_leeway_secs = parse_or("JWT_LEEWAY", Self::DEFAULT_JWT_LEEWAY_SECS)?;

        Ok(Self {
            issuer,
            audience,
            jwks_url,
            jwks_cache_ttl: Duration::from_secs(jwks_cache_ttl_secs),
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Credit IQ API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Credit study intake, review and scoring API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl MinIOConfig {
    pub fn from_env() -> Result<Self, String> {
        let endpoint =
            env::var("MINIO_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());
        let public_endpoint =
            env::var("MINIO_PUBLIC_ENDPOINT").unwrap_or_else(|_| endpoint.clone());
        let access_key = env::var("MINIO_ACCESS_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let secret_key = env::var("MINIO_SECRET_KEY").unwrap_or_else(|_| "minioadmin".to_string());
        let bucket =
            env::var("MINIO_BUCKET").unwrap_or_else(|_| "credit-iq-documents".to_string());
        let region = env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string());

        Ok(Self {
            endpoint,
            public_endpoint,
            access_key,
            secret_key,
            bucket,
            region,
        })
    }
}

impl ScoringConfig {
    /// Client-side wait before a job is detached and treated as cancelled
    pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

    pub fn from_env() -> Result<Self, String> {
        let webhook_url = env::var("SCORING_WEBHOOK_URL")
            .map_err(|_| "SCORING_WEBHOOK_URL environment variable is required".to_string())?;

        let api_key = env::var("SCORING_API_KEY").ok().filter(|s| !s.is_empty());
        let timeout_secs = parse_or("SCORING_TIMEOUT_SECS", Self::DEFAULT_TIMEOUT_SECS)?;
        let strict_review = parse_or("STUDY_STRICT_REVIEW", false)?;

        Ok(Self {
            webhook_url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            strict_review,
        })
    }
}

impl AnalyticsConfig {
    pub fn from_env() -> Self {
        Self {
            project: env::var("ANALYTICS_PROJECT").unwrap_or_else(|_| "credit-iq".to_string()),
            dataset: env::var("ANALYTICS_DATASET")
                .unwrap_or_else(|_| "analisis_credit_iq".to_string()),
            source_table: env::var("ANALYTICS_SOURCE_TABLE")
                .unwrap_or_else(|_| "solicitudes_raw_latest".to_string()),
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            project: "credit-iq".to_string(),
            dataset: "analisis_credit_iq".to_string(),
            source_table: "solicitudes_raw_latest".to_string(),
        }
    }
}

/// Read `key` from the environment, falling back to `default` when unset.
fn parse_or<T>(key: &str, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} has an invalid value: {}", key, raw)),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        let value: u64 = parse_or("CREDIT_IQ_TEST_UNSET_VARIABLE", 15).unwrap();
        assert_eq!(value, 15);
    }

    #[test]
    fn test_swagger_credentials_require_both_parts() {
        let mut swagger = SwaggerConfig {
            username: Some("admin".to_string()),
            password: None,
            title: String::new(),
            version: String::new(),
            description: String::new(),
        };
        assert_eq!(swagger.credentials(), None);

        swagger.password = Some("secret".to_string());
        assert_eq!(swagger.credentials(), Some("admin:secret".to_string()));
    }

    #[test]
    fn test_default_scoring_timeout_matches_reference() {
        assert_eq!(ScoringConfig::DEFAULT_TIMEOUT_SECS, 15);
    }
}
