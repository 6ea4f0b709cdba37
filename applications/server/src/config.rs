/// Server configuration
use crate::error::{Result, ServerError};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_server")]
    pub server: ServerSettings,

    #[serde(default = "default_storage")]
    pub storage: StorageSettings,

    #[serde(default = "default_identity")]
    pub identity: IdentitySettings,

    #[serde(default = "default_payments")]
    pub payments: PaymentSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageSettings {
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IdentitySettings {
    /// Identity provider project; tokens must carry it as audience
    #[serde(default)]
    pub project_id: Option<String>,

    /// Base64-encoded service-account JSON
    #[serde(default)]
    pub service_account: Option<String>,

    /// Public signing keys of the identity provider (JWK set)
    #[serde(default = "default_jwks_url")]
    pub jwks_url: String,

    #[serde(default = "default_key_cache_secs")]
    pub key_cache_secs: u64,

    /// HS256 secret for local development; replaces the managed provider
    #[serde(default)]
    pub shared_secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentSettings {
    #[serde(default)]
    pub stripe_secret_key: String,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Public site origin used for checkout redirects
    #[serde(default)]
    pub site_domain: String,

    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_product_name")]
    pub product_name: String,
}

#[derive(Debug, Deserialize)]
struct ServiceAccount {
    project_id: Option<String>,
}

impl IdentitySettings {
    /// Shared secret, if one is configured and non-empty
    pub fn shared_secret(&self) -> Option<&str> {
        self.shared_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Project id from the explicit setting, else from the service account
    pub fn resolve_project_id(&self) -> Result<Option<String>> {
        if let Some(id) = self.project_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return Ok(Some(id.to_string()));
        }

        let Some(encoded) = self
            .service_account
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        else {
            return Ok(None);
        };

        let decoded = STANDARD
            .decode(encoded)
            .map_err(|e| ServerError::Config(format!("service account is not base64: {}", e)))?;
        let account: ServiceAccount = serde_json::from_slice(&decoded)
            .map_err(|e| ServerError::Config(format!("service account is not JSON: {}", e)))?;

        Ok(account.project_id.filter(|s| !s.is_empty()))
    }
}

impl ServerConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self> {
        let mut settings = config::Config::builder();

        // Load from config file if it exists
        let config_path = PathBuf::from("config.toml");
        if config_path.exists() {
            settings = settings.add_source(config::File::from(config_path));
        }

        // Override with environment variables, e.g. BLOODBRIDGE_SERVER__PORT
        settings = settings.add_source(
            config::Environment::with_prefix("BLOODBRIDGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let project_id = self.identity.resolve_project_id()?;
        if project_id.is_none() && self.identity.shared_secret().is_none() {
            return Err(ServerError::Config(
                "identity provider is not configured (set BLOODBRIDGE_IDENTITY__PROJECT_ID, \
                 BLOODBRIDGE_IDENTITY__SERVICE_ACCOUNT or BLOODBRIDGE_IDENTITY__SHARED_SECRET)"
                    .to_string(),
            ));
        }

        if self.payments.stripe_secret_key.trim().is_empty() {
            return Err(ServerError::Config(
                "payment processor key is required (set BLOODBRIDGE_PAYMENTS__STRIPE_SECRET_KEY)"
                    .to_string(),
            ));
        }

        let site = self.payments.site_domain.trim();
        if !site.starts_with("http://") && !site.starts_with("https://") {
            return Err(ServerError::Config(format!(
                "site domain must start with http:// or https:// (got {:?})",
                site
            )));
        }
        url::Url::parse(site)
            .map_err(|e| ServerError::Config(format!("site domain: {}", e)))?;

        let currency = &self.payments.currency;
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ServerError::Config(format!(
                "currency must be a three-letter code (got {:?})",
                currency
            )));
        }

        Ok(())
    }
}

// Default values
fn default_server() -> ServerSettings {
    ServerSettings {
        host: default_host(),
        port: default_port(),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_storage() -> StorageSettings {
    StorageSettings {
        database_url: default_database_url(),
    }
}

fn default_database_url() -> String {
    "sqlite://./data/bloodbridge.db".to_string()
}

fn default_identity() -> IdentitySettings {
    IdentitySettings {
        project_id: None,
        service_account: None,
        jwks_url: default_jwks_url(),
        key_cache_secs: default_key_cache_secs(),
        shared_secret: None,
    }
}

fn default_jwks_url() -> String {
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com"
        .to_string()
}

fn default_key_cache_secs() -> u64 {
    3600
}

fn default_payments() -> PaymentSettings {
    PaymentSettings {
        stripe_secret_key: String::new(),
        api_base: default_api_base(),
        site_domain: String::new(),
        currency: default_currency(),
        product_name: default_product_name(),
    }
}

fn default_api_base() -> String {
    "https://api.stripe.com".to_string()
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_product_name() -> String {
    "BloodBridge donation".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            storage: default_storage(),
            identity: default_identity(),
            payments: default_payments(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> ServerConfig {
        let mut config = ServerConfig::default();
        config.identity.project_id = Some("blood-bridge".to_string());
        config.payments.stripe_secret_key = "sk_test_123".to_string();
        config.payments.site_domain = "https://bloodbridge.example".to_string();
        config
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.storage.database_url, "sqlite://./data/bloodbridge.db");
        assert_eq!(config.identity.key_cache_secs, 3600);
        assert_eq!(config.payments.currency, "usd");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_project_id_from_service_account() {
        let mut config = valid();
        config.identity.project_id = None;
        config.identity.service_account =
            Some(STANDARD.encode(r#"{"type":"service_account","project_id":"from-account"}"#));

        assert_eq!(
            config.identity.resolve_project_id().unwrap().as_deref(),
            Some("from-account")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_undecodable_service_account() {
        let mut config = valid();
        config.identity.project_id = None;
        config.identity.service_account = Some("not base64 !!".to_string());
        assert!(config.validate().is_err());

        config.identity.service_account = Some(STANDARD.encode("not json"));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_shared_secret_is_enough_identity() {
        let mut config = valid();
        config.identity.project_id = None;
        config.identity.shared_secret = Some("dev-secret".to_string());
        assert!(config.validate().is_ok());

        config.identity.shared_secret = Some("   ".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_payment_settings_validated() {
        let mut config = valid();
        config.payments.stripe_secret_key = String::new();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.payments.site_domain = "bloodbridge.example".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.payments.currency = "dollars".to_string();
        assert!(config.validate().is_err());

        let mut config = valid();
        config.payments.currency = "BDT".to_string();
        assert!(config.validate().is_ok());
    }
}
