//! Synchronous client for the remote recommendation endpoint.
//!
//! One call is one `POST` with `{"user_id": .., "n_recommendations": ..}`.
//! There is no retry; callers decide whether to try again.

use std::io;
use std::time::Duration;

use serde::Serialize;
use tracing::{info, warn};
use ureq::Agent;

use crate::constants::client::{FUNCTION_KEY_HEADER, JSON_CONTENT_TYPE};
use crate::constants::config::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use crate::data::Identifier;
use crate::errors::RecommendError;
use crate::source::format::preview;
use crate::types::EndpointUrl;

/// Endpoint settings for `RecommendationClient`.
#[derive(Clone)]
pub struct ClientConfig {
    /// Full URL of the recommendation endpoint.
    pub endpoint: EndpointUrl,
    /// Static access key sent as `x-functions-key` when present.
    pub function_key: Option<String>,
    /// Refuse to call when no access key is configured.
    pub require_key: bool,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("function_key", &self.function_key.as_ref().map(|_| "<redacted>"))
            .field("require_key", &self.require_key)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENDPOINT)
    }
}

impl ClientConfig {
    /// Config for `endpoint` with no key and the default timeout.
    pub fn new(endpoint: impl Into<EndpointUrl>) -> Self {
        Self {
            endpoint: endpoint.into(),
            function_key: None,
            require_key: false,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set or clear the access key. Blank keys count as absent.
    pub fn with_function_key(mut self, key: Option<String>) -> Self {
        self.function_key = key.filter(|value| !value.trim().is_empty());
        self
    }

    /// Require an access key before any request is sent.
    pub fn with_require_key(mut self, require_key: bool) -> Self {
        self.require_key = require_key;
        self
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct RecommendRequest<'a> {
    user_id: &'a Identifier,
    n_recommendations: usize,
}

/// Client for the recommendation endpoint.
pub struct RecommendationClient {
    config: ClientConfig,
    agent: Agent,
}

impl RecommendationClient {
    /// Build a client; no connection is opened until `recommend`.
    pub fn new(config: ClientConfig) -> Self {
        let agent_config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(config.timeout))
            .build();
        Self {
            agent: Agent::new_with_config(agent_config),
            config,
        }
    }

    /// Active endpoint settings.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a call would be refused for lack of an access key.
    pub fn missing_required_key(&self) -> bool {
        self.config.require_key && self.config.function_key.is_none()
    }

    /// Request up to `count` article ids for `user_id`.
    ///
    /// The returned order is the endpoint's relevance order. The endpoint may
    /// return fewer than `count` ids, or none.
    pub fn recommend(
        &self,
        user_id: &Identifier,
        count: usize,
    ) -> Result<Vec<Identifier>, RecommendError> {
        if self.missing_required_key() {
            return Err(RecommendError::MissingCredential);
        }
        let payload = serde_json::to_string(&RecommendRequest {
            user_id,
            n_recommendations: count,
        })
        .map_err(|err| RecommendError::Transport(format!("failed encoding request: {err}")))?;

        let mut request = self
            .agent
            .post(&self.config.endpoint)
            .header("Content-Type", JSON_CONTENT_TYPE);
        if let Some(key) = self.config.function_key.as_deref() {
            request = request.header(FUNCTION_KEY_HEADER, key);
        }

        info!(
            "[article_recs:client] requesting {} recommendation(s) for user {}",
            count, user_id
        );
        let response = request
            .send(payload.as_str())
            .map_err(|err| self.classify(err))?;
        let status = response.status().as_u16();
        let mut body = response.into_body();
        let text = body.with_config().limit(u64::MAX).read_to_string();

        if !(200..300).contains(&status) {
            let body = text.unwrap_or_default();
            warn!(
                "[article_recs:client] endpoint returned HTTP {}: {}",
                status,
                preview(&body)
            );
            return Err(RecommendError::Http { status, body });
        }
        let text = text.map_err(|err| self.classify(err))?;
        let ids: Vec<Identifier> = serde_json::from_str(&text).map_err(|err| {
            RecommendError::Decode(format!("{err} (body: {})", preview(&text)))
        })?;
        info!(
            "[article_recs:client] received {} recommendation(s) for user {}",
            ids.len(),
            user_id
        );
        Ok(ids)
    }

    fn classify(&self, err: ureq::Error) -> RecommendError {
        let endpoint = self.config.endpoint.clone();
        match err {
            ureq::Error::Timeout(_) => RecommendError::Timeout { endpoint },
            ureq::Error::Io(ref io_err) if io_err.kind() == io::ErrorKind::TimedOut => {
                RecommendError::Timeout { endpoint }
            }
            ureq::Error::Io(_) | ureq::Error::ConnectionFailed | ureq::Error::HostNotFound => {
                RecommendError::Connection {
                    endpoint,
                    reason: err.to_string(),
                }
            }
            other => RecommendError::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_key_counts_as_absent() {
        let config = ClientConfig::new("http://localhost/api").with_function_key(Some("  ".into()));
        assert_eq!(config.function_key, None);
    }

    #[test]
    fn required_key_is_checked_before_any_request() {
        // Port 9 on localhost is never contacted because the check comes first.
        let client = RecommendationClient::new(
            ClientConfig::new("http://127.0.0.1:9/api/recommend").with_require_key(true),
        );
        assert!(client.missing_required_key());
        assert!(matches!(
            client.recommend(&Identifier::from(1), 5),
            Err(RecommendError::MissingCredential)
        ));
    }

    #[test]
    fn request_body_uses_endpoint_field_names() {
        let user = Identifier::from("u-1");
        let body = serde_json::to_value(RecommendRequest {
            user_id: &user,
            n_recommendations: 5,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"user_id": "u-1", "n_recommendations": 5})
        );
    }

    #[test]
    fn debug_output_redacts_key() {
        let config =
            ClientConfig::new("http://localhost/api").with_function_key(Some("s3cret".into()));
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
