use std::env;
use std::fmt::{self, Display};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::info;

use crate::client::ClientConfig;
use crate::constants::config::*;
use crate::errors::ConfigError;
use crate::metadata::DuplicatePolicy;
use crate::source::{RecordFormat, SourceLocation, SourceParams};
use crate::types::ContainerName;

/// Which backend serves both record sources.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    /// Local newline-delimited or JSON files.
    #[default]
    Local,
    /// Blob storage; requires a storage connection string.
    Blob,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" | "file" => Ok(BackendKind::Local),
            "blob" | "azure" => Ok(BackendKind::Blob),
            other => Err(format!("unknown backend '{other}' (expected local or blob)")),
        }
    }
}

impl Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Local => f.write_str("local"),
            BackendKind::Blob => f.write_str("blob"),
        }
    }
}

/// Name and format of one record source.
///
/// `name` is a file path for the local backend and a blob name for blob storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceSpec {
    /// Path or blob name.
    pub name: String,
    /// Record layout.
    pub format: RecordFormat,
}

impl SourceSpec {
    /// Describe one source.
    pub fn new(name: impl Into<String>, format: RecordFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }
}

/// Top-level configuration for the workflow.
#[derive(Clone)]
pub struct AppConfig {
    /// Recommendation endpoint settings.
    pub client: ClientConfig,
    /// Number of recommendations requested per user action.
    pub recommendation_count: usize,
    /// Backend serving both sources.
    pub backend: BackendKind,
    /// Container holding both sources when `backend` is `Blob`.
    pub blob_container: ContainerName,
    /// User-interaction source.
    pub interactions: SourceSpec,
    /// Article-metadata source.
    pub articles: SourceSpec,
    /// Storage connection string for the blob backend.
    pub storage_connection_string: Option<String>,
    /// Base directory for relative local paths (working directory when unset).
    pub data_dir: Option<PathBuf>,
    /// Duplicate `article_id` resolution.
    pub duplicate_policy: DuplicatePolicy,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("client", &self.client)
            .field("recommendation_count", &self.recommendation_count)
            .field("backend", &self.backend)
            .field("blob_container", &self.blob_container)
            .field("interactions", &self.interactions)
            .field("articles", &self.articles)
            .field(
                "storage_connection_string",
                &self.storage_connection_string.as_ref().map(|_| "<redacted>"),
            )
            .field("data_dir", &self.data_dir)
            .field("duplicate_policy", &self.duplicate_policy)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            client: ClientConfig::default(),
            recommendation_count: DEFAULT_RECOMMENDATION_COUNT,
            backend: BackendKind::default(),
            blob_container: DEFAULT_BLOB_CONTAINER.to_string(),
            interactions: SourceSpec::new(DEFAULT_INTERACTIONS_SOURCE, RecordFormat::JsonLines),
            articles: SourceSpec::new(DEFAULT_ARTICLES_SOURCE, RecordFormat::JsonLines),
            storage_connection_string: None,
            data_dir: None,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }
}

impl AppConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using `lookup` as the variable source; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_secs: u64 = load_or(&lookup, ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS)?;
        let require_key = match var(&lookup, ENV_REQUIRE_FUNCTION_KEY) {
            Some(raw) => parse_flag(ENV_REQUIRE_FUNCTION_KEY, &raw)?,
            None => false,
        };
        let client = ClientConfig::new(
            var(&lookup, ENV_ENDPOINT).unwrap_or_else(|| {
                info!("{ENV_ENDPOINT} not set, using default: {DEFAULT_ENDPOINT}");
                DEFAULT_ENDPOINT.to_string()
            }),
        )
        .with_function_key(var(&lookup, ENV_FUNCTION_KEY))
        .with_require_key(require_key)
        .with_timeout(Duration::from_secs(timeout_secs));

        let storage_connection_string = var(&lookup, ENV_STORAGE_CONNECTION_STRING);
        if storage_connection_string.is_none() {
            info!("{ENV_STORAGE_CONNECTION_STRING} not set");
        }

        Ok(Self {
            client,
            recommendation_count: load_or(
                &lookup,
                ENV_RECOMMENDATION_COUNT,
                DEFAULT_RECOMMENDATION_COUNT,
            )?,
            backend: load_or(&lookup, ENV_SOURCE_BACKEND, BackendKind::Local)?,
            blob_container: load_or(
                &lookup,
                ENV_BLOB_CONTAINER,
                DEFAULT_BLOB_CONTAINER.to_string(),
            )?,
            interactions: SourceSpec::new(
                load_or(
                    &lookup,
                    ENV_INTERACTIONS_SOURCE,
                    DEFAULT_INTERACTIONS_SOURCE.to_string(),
                )?,
                load_or(&lookup, ENV_INTERACTIONS_FORMAT, RecordFormat::JsonLines)?,
            ),
            articles: SourceSpec::new(
                load_or(
                    &lookup,
                    ENV_ARTICLES_SOURCE,
                    DEFAULT_ARTICLES_SOURCE.to_string(),
                )?,
                load_or(&lookup, ENV_ARTICLES_FORMAT, RecordFormat::JsonLines)?,
            ),
            storage_connection_string,
            data_dir: None,
            duplicate_policy: DuplicatePolicy::default(),
        })
    }

    /// Override the recommendation endpoint settings.
    pub fn with_client(mut self, client: ClientConfig) -> Self {
        self.client = client;
        self
    }

    /// Override the number of recommendations per request.
    pub fn with_recommendation_count(mut self, count: usize) -> Self {
        self.recommendation_count = count;
        self
    }

    /// Select the backend.
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Override the blob container.
    pub fn with_blob_container(mut self, container: impl Into<ContainerName>) -> Self {
        self.blob_container = container.into();
        self
    }

    /// Override the interactions source.
    pub fn with_interactions(mut self, spec: SourceSpec) -> Self {
        self.interactions = spec;
        self
    }

    /// Override the articles source.
    pub fn with_articles(mut self, spec: SourceSpec) -> Self {
        self.articles = spec;
        self
    }

    /// Set or clear the storage connection string.
    pub fn with_storage_connection_string(mut self, raw: Option<String>) -> Self {
        self.storage_connection_string = raw.filter(|value| !value.trim().is_empty());
        self
    }

    /// Resolve relative local paths against `data_dir`.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Override duplicate `article_id` resolution.
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Load parameters of the interactions source.
    pub fn interactions_params(&self) -> SourceParams {
        self.params_for(&self.interactions)
    }

    /// Load parameters of the articles source.
    pub fn articles_params(&self) -> SourceParams {
        self.params_for(&self.articles)
    }

    fn params_for(&self, spec: &SourceSpec) -> SourceParams {
        let location = match self.backend {
            BackendKind::Local => SourceLocation::local(&spec.name),
            BackendKind::Blob => SourceLocation::blob(&self.blob_container, &spec.name),
        };
        SourceParams::new(location, spec.format)
    }
}

fn var<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn load_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match var(lookup, key) {
        Some(raw) => raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
            key,
            value: raw.clone(),
            reason: err.to_string(),
        }),
        None => Ok(default),
    }
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
