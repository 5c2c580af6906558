use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub views: ViewConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    pub base_url: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the persisted session database
    pub data_dir: String,
}

#[derive(Debug, Clone)]
pub struct ViewConfig {
    /// Audit log entries shown per page in the admin panel
    pub audit_page_size: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_seconds: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            audit_page_size: crate::views::pagination::DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let base_url = std::env::var("HELPDESK_API_URL")
            .unwrap_or_else(|_| ApiConfig::default().base_url);

        let timeout_seconds = std::env::var("HELPDESK_HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        let data_dir =
            std::env::var("HELPDESK_DATA_DIR").unwrap_or_else(|_| "./data".to_string());

        let audit_page_size = match std::env::var("HELPDESK_AUDIT_PAGE_SIZE") {
            Ok(raw) => raw.trim().parse().map_err(|_| {
                ConfigError::ValidationError(format!(
                    "HELPDESK_AUDIT_PAGE_SIZE must be a positive integer, got {raw:?}"
                ))
            })?,
            Err(_) => ViewConfig::default().audit_page_size,
        };

        let config = Config {
            api: ApiConfig {
                base_url,
                timeout_seconds,
            },
            storage: StorageConfig { data_dir },
            views: ViewConfig { audit_page_size },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.api.base_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "HELPDESK_API_URL is not a valid URL ({}): {e}",
                self.api.base_url
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::ValidationError(format!(
                "HELPDESK_API_URL must use http or https, got {}",
                url.scheme()
            )));
        }

        if self.views.audit_page_size == 0 {
            return Err(ConfigError::ValidationError(
                "HELPDESK_AUDIT_PAGE_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.api.timeout_seconds == 0 {
            tracing::warn!("HTTP timeout is 0 seconds; every request will time out immediately");
        }

        Ok(())
    }
}
