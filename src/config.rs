use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use url::Url;

use crate::{Error, Result};

pub const DEFAULT_ASSET_URL: &str = "/content/images/";
pub const DEFAULT_ACL: &str = "public-read";

/// Adapter configuration as handed over by the host.
///
/// Keys are accepted in snake_case or in the host's camelCase spelling
/// (`accessKeyId`, `pathPrefix`, ...).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    #[serde(alias = "accessKeyId")]
    pub access_key_id: String,
    #[serde(alias = "secretAccessKey")]
    pub secret_access_key: String,
    pub region: String,
    pub bucket: String,
    pub endpoint: Option<String>,
    #[serde(alias = "pathPrefix")]
    pub path_prefix: String,
    #[serde(alias = "assetUrl")]
    pub asset_url: String,
    pub acl: String,
    #[serde(alias = "forcePathStyle")]
    pub force_path_style: bool,
}

impl AdapterConfig {
    /// Build a configuration with the four required fields and defaults for the rest.
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        bucket: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            bucket: bucket.into(),
            ..Self::default()
        }
    }

    pub fn with_asset_url(mut self, asset_url: impl Into<String>) -> Self {
        self.asset_url = asset_url.into();
        self
    }

    pub fn with_path_prefix(mut self, path_prefix: impl Into<String>) -> Self {
        self.path_prefix = path_prefix.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Apply defaults to blank optional fields and check the required ones.
    ///
    /// Required fields are checked in declaration order so the error always
    /// names the first missing one.
    pub fn validated(mut self) -> Result<Self> {
        let required = [
            ("accessKeyId", &self.access_key_id),
            ("secretAccessKey", &self.secret_access_key),
            ("region", &self.region),
            ("bucket", &self.bucket),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::missing(field));
            }
        }

        self.endpoint = self.endpoint.and_then(|e| {
            let trimmed = e.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        });
        if self.asset_url.trim().is_empty() {
            self.asset_url = DEFAULT_ASSET_URL.to_string();
        }
        if self.acl.trim().is_empty() {
            self.acl = DEFAULT_ACL.to_string();
        }

        if !self.root_relative() {
            Url::parse(&self.asset_url)
                .map_err(|e| Error::configuration("assetUrl", e.to_string()))?;
        }

        Ok(self)
    }

    /// Whether returned URLs are root-relative paths rather than absolute URLs.
    pub fn root_relative(&self) -> bool {
        self.asset_url.starts_with('/')
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            secret_access_key: String::new(),
            region: String::new(),
            bucket: String::new(),
            endpoint: None,
            path_prefix: String::new(),
            asset_url: DEFAULT_ASSET_URL.to_string(),
            acl: DEFAULT_ACL.to_string(),
            force_path_style: false,
        }
    }
}

impl fmt::Debug for AdapterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterConfig")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("endpoint", &self.endpoint)
            .field("path_prefix", &self.path_prefix)
            .field("asset_url", &self.asset_url)
            .field("acl", &self.acl)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Configuration of the standalone server, loaded from file + environment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: AdapterConfig,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load configuration from disk and environment.
    ///
    /// Environment keys use the `GHOST_S3_` prefix and `__` between
    /// sections, e.g. `GHOST_S3_STORAGE__ACCESS_KEY_ID`.
    pub fn load() -> Result<Self> {
        let config_path =
            env::var("GHOST_S3_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load from `config_path` (skipped when absent) plus environment.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let mut builder = config::Config::builder();

        if config_path.exists() {
            builder = builder.add_source(config::File::from(PathBuf::from(config_path)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("GHOST_S3")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let mut config: Self = settings.try_deserialize()?;

        if config.logging.level.trim().is_empty() {
            config.logging.level = "info".to_string();
        }

        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 2368,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}
