use std::time::Duration;

use chrono::Utc;
use tracing::info;
use ureq::Agent;

use crate::constants::config::DEFAULT_TIMEOUT_SECS;
use crate::constants::source::BLOB_BACKEND_ID;
use crate::errors::SourceError;
use crate::source::format::preview;
use crate::source::{SourceBackend, SourceLocation};
use crate::transport::blob::StorageCredentials;

/// Reads whole blobs over HTTP.
///
/// A backend built without credentials still registers, so blob locations
/// fail with `MissingCredential` instead of `NoBackend`.
pub struct BlobBackend {
    credentials: Option<StorageCredentials>,
    agent: Agent,
}

impl BlobBackend {
    /// Create a backend with optional credentials and the default timeout.
    pub fn new(credentials: Option<StorageCredentials>) -> Self {
        Self {
            credentials,
            agent: build_agent(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Create a backend from an optional storage connection string.
    pub fn from_connection_string(raw: Option<&str>) -> Result<Self, SourceError> {
        let credentials = raw
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(StorageCredentials::from_connection_string)
            .transpose()?;
        Ok(Self::new(credentials))
    }

    /// Override the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(timeout);
        self
    }

    /// Whether a storage credential is configured.
    pub fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }
}

fn build_agent(timeout: Duration) -> Agent {
    let config = Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build();
    Agent::new_with_config(config)
}

impl SourceBackend for BlobBackend {
    fn id(&self) -> &str {
        BLOB_BACKEND_ID
    }

    fn supports(&self, location: &SourceLocation) -> bool {
        matches!(location, SourceLocation::Blob { .. })
    }

    fn read(&self, location: &SourceLocation) -> Result<String, SourceError> {
        let SourceLocation::Blob { container, blob } = location else {
            return Err(SourceError::NoBackend {
                location: location.label(),
            });
        };
        let credentials =
            self.credentials
                .as_ref()
                .ok_or_else(|| SourceError::MissingCredential {
                    backend: BLOB_BACKEND_ID.to_string(),
                })?;

        let url = credentials.blob_url(container, blob);
        let headers = credentials.sign_get(container, blob, Utc::now())?;
        let mut request = self
            .agent
            .get(&url)
            .header("x-ms-date", headers.date.as_str())
            .header("x-ms-version", headers.version);
        if let Some(authorization) = headers.authorization.as_deref() {
            request = request.header("Authorization", authorization);
        }

        info!("[article_recs:blob] downloading {}", location);
        let response = request.call().map_err(|err| SourceError::Unavailable {
            location: location.label(),
            reason: format!("blob request failed: {err}"),
        })?;
        let status = response.status().as_u16();
        if status == 404 {
            return Err(SourceError::NotFound {
                location: location.label(),
            });
        }
        let mut body = response.into_body();
        let text = body
            .with_config()
            .limit(u64::MAX)
            .read_to_string()
            .map_err(|err| SourceError::Unavailable {
                location: location.label(),
                reason: format!("failed reading blob body: {err}"),
            })?;
        if !(200..300).contains(&status) {
            return Err(SourceError::Unavailable {
                location: location.label(),
                reason: format!("HTTP {status}: {}", preview(&text)),
            });
        }
        info!(
            "[article_recs:blob] downloaded {} ({} bytes)",
            location,
            text.len()
        );
        Ok(text)
    }
}
