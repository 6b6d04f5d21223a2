use crate::utils::signature::SignatureAlgorithm;
use anyhow::{Context, Result, anyhow};
use std::env;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Credentials and endpoints for the remote asset store
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Tenant name (CLOUDINARY_CLOUD_NAME)
    pub cloud_name: String,

    /// API key used for signed uploads (CLOUDINARY_API_KEY)
    pub api_key: String,

    /// API secret used to sign uploads (CLOUDINARY_API_SECRET)
    pub api_secret: String,

    /// Upload API base (default: "https://api.cloudinary.com")
    pub api_base_url: String,

    /// Delivery base for transform URLs (default: "https://res.cloudinary.com")
    pub delivery_base_url: String,

    /// Digest for upload signatures (CLOUDINARY_SIGNATURE_ALGORITHM, default: sha1)
    pub signature_algorithm: SignatureAlgorithm,
}

// Keeps credentials out of logs
impl fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &"<redacted>")
            .field("api_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("delivery_base_url", &self.delivery_base_url)
            .field("signature_algorithm", &self.signature_algorithm)
            .finish()
    }
}

pub const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";
pub const DEFAULT_DELIVERY_BASE_URL: &str = "https://res.cloudinary.com";

/// Base URLs are stored without surrounding whitespace or a trailing slash
pub fn normalize_base_url(value: &str) -> String {
    value.trim().trim_end_matches('/').to_string()
}

impl CloudinaryConfig {
    pub fn new(cloud_name: &str, api_key: &str, api_secret: &str) -> Self {
        Self {
            cloud_name: cloud_name.to_string(),
            api_key: api_key.to_string(),
            api_secret: api_secret.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            delivery_base_url: DEFAULT_DELIVERY_BASE_URL.to_string(),
            signature_algorithm: SignatureAlgorithm::default(),
        }
    }

    /// Point both the upload API and delivery at one base URL (used against mock servers)
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = normalize_base_url(base);
        self.api_base_url = base.clone();
        self.delivery_base_url = base;
        self
    }

    /// Load credentials from environment variables. All three are required.
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| -> Result<String> {
            env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow!("{} must be set", name))
        };

        let base_url = |name: &str, default: &str| -> String {
            normalize_base_url(&env::var(name).unwrap_or_else(|_| default.to_string()))
        };

        let signature_algorithm = match env::var("CLOUDINARY_SIGNATURE_ALGORITHM") {
            Ok(value) => value
                .parse()
                .map_err(|e| anyhow!("CLOUDINARY_SIGNATURE_ALGORITHM: {}", e))?,
            Err(_) => SignatureAlgorithm::default(),
        };

        let config = Self {
            cloud_name: required("CLOUDINARY_CLOUD_NAME")?,
            api_key: required("CLOUDINARY_API_KEY")?,
            api_secret: required("CLOUDINARY_API_SECRET")?,
            api_base_url: base_url("CLOUDINARY_API_BASE_URL", DEFAULT_API_BASE_URL),
            delivery_base_url: base_url(
                "CLOUDINARY_DELIVERY_BASE_URL",
                DEFAULT_DELIVERY_BASE_URL,
            ),
            signature_algorithm,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("CLOUDINARY_API_BASE_URL", &self.api_base_url),
            ("CLOUDINARY_DELIVERY_BASE_URL", &self.delivery_base_url),
        ] {
            Url::parse(value).with_context(|| format!("{} is not a valid URL", name))?;
        }
        Ok(())
    }
}

/// Application configuration, built once at startup and passed explicitly
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Maximum accepted upload size in bytes (default: 10 MB)
    pub max_file_size: usize,

    /// Directory for staged uploads (default: process working directory)
    pub temp_dir: PathBuf,

    /// Default width of each comparison panel in pixels (default: 512)
    pub display_width: u32,

    /// Timeout for outbound HTTP calls in seconds (default: 60)
    pub http_timeout_secs: u64,

    /// Allowed CORS Origins (comma separated)
    pub allowed_origins: Vec<String>,

    pub cloudinary: CloudinaryConfig,
}

impl AppConfig {
    pub fn new(cloudinary: CloudinaryConfig) -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MB
            temp_dir: PathBuf::from("."),
            display_width: 512,
            http_timeout_secs: 60,
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            cloudinary,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let default = Self::new(CloudinaryConfig::from_env()?);

        Ok(Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            temp_dir: env::var("TEMP_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.temp_dir),

            display_width: env::var("DISPLAY_WIDTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.display_width),

            http_timeout_secs: env::var("HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.http_timeout_secs),

            allowed_origins: env::var("ALLOWED_ORIGINS")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(default.allowed_origins),

            cloudinary: default.cloudinary,
        })
    }

    /// Create config for development and tests (dummy credentials, staging in `temp_dir`)
    pub fn development(temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.into(),
            http_timeout_secs: 5,
            ..Self::new(CloudinaryConfig::new("demo", "test_key", "test_secret"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::new(CloudinaryConfig::new("demo", "key", "secret"));
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.display_width, 512);
        assert_eq!(config.temp_dir, PathBuf::from("."));
        assert_eq!(config.cloudinary.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.cloudinary.delivery_base_url, DEFAULT_DELIVERY_BASE_URL);
        assert_eq!(config.cloudinary.signature_algorithm, SignatureAlgorithm::Sha1);
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url(" https://api.cloudinary.com/ "),
            "https://api.cloudinary.com"
        );
        assert_eq!(
            normalize_base_url("https://res.cloudinary.com//"),
            "https://res.cloudinary.com"
        );
        assert_eq!(
            normalize_base_url(DEFAULT_DELIVERY_BASE_URL),
            DEFAULT_DELIVERY_BASE_URL
        );
    }

    #[test]
    fn test_development_config() {
        let config = AppConfig::development("/tmp/staging");
        assert_eq!(config.temp_dir, PathBuf::from("/tmp/staging"));
        assert_eq!(config.http_timeout_secs, 5);
        assert_eq!(config.cloudinary.cloud_name, "demo");
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = CloudinaryConfig::new("demo", "my-key-123", "super-secret");
        let printed = format!("{:?}", AppConfig::new(config));
        assert!(printed.contains("demo"));
        assert!(!printed.contains("my-key-123"));
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn test_with_base_url_trims_slash() {
        let config = CloudinaryConfig::new("demo", "k", "s").with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(config.delivery_base_url, "http://127.0.0.1:9000");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = CloudinaryConfig::new("demo", "k", "s");
        config.api_base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }
}
