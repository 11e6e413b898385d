//! Blob storage addressing and request authentication.
//!
//! Credentials come from a storage connection string of `key=value` pairs
//! separated by `;`. Reads are authorized either with Shared Key signing
//! (HMAC-SHA256 over the canonical request, keyed by the account key) or by
//! appending a shared access signature to the URL.

use std::collections::HashMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::constants::blob::{
    API_VERSION, DEFAULT_ENDPOINT_SUFFIX, DEFAULT_PROTOCOL, DEV_ACCOUNT_KEY, DEV_ACCOUNT_NAME,
    DEV_BLOB_ENDPOINT,
};
use crate::errors::SourceError;

type HmacSha256 = Hmac<Sha256>;

/// How requests against the blob endpoint are authorized.
#[derive(Clone)]
pub enum BlobAuth {
    /// Shared Key signing with a decoded account key.
    SharedKey {
        /// Storage account name.
        account: String,
        /// Decoded account key bytes.
        key: Vec<u8>,
    },
    /// Shared access signature appended as the query string.
    Sas(String),
}

// Hand-written so the account key never lands in logs.
impl std::fmt::Debug for BlobAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlobAuth::SharedKey { account, .. } => f
                .debug_struct("SharedKey")
                .field("account", account)
                .finish_non_exhaustive(),
            BlobAuth::Sas(_) => f.write_str("Sas(..)"),
        }
    }
}

/// Parsed storage credentials plus the blob service endpoint.
#[derive(Clone, Debug)]
pub struct StorageCredentials {
    blob_endpoint: String,
    auth: BlobAuth,
}

/// Headers to attach to one signed request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignedHeaders {
    /// Value for `x-ms-date`.
    pub date: String,
    /// Value for `x-ms-version`.
    pub version: &'static str,
    /// Value for `Authorization`, absent for SAS requests.
    pub authorization: Option<String>,
}

impl StorageCredentials {
    /// Parse a storage connection string.
    pub fn from_connection_string(raw: &str) -> Result<Self, SourceError> {
        let pairs = parse_pairs(raw)?;
        let get = |key: &str| pairs.get(key).map(String::as_str).filter(|v| !v.is_empty());

        if get("usedevelopmentstorage").is_some_and(|value| value.eq_ignore_ascii_case("true")) {
            return Ok(Self {
                blob_endpoint: DEV_BLOB_ENDPOINT.to_string(),
                auth: BlobAuth::SharedKey {
                    account: DEV_ACCOUNT_NAME.to_string(),
                    key: decode_key(DEV_ACCOUNT_KEY)?,
                },
            });
        }

        let account = get("accountname");
        let blob_endpoint = match (get("blobendpoint"), account) {
            (Some(endpoint), _) => endpoint.trim_end_matches('/').to_string(),
            (None, Some(account)) => format!(
                "{}://{}.blob.{}",
                get("defaultendpointsprotocol").unwrap_or(DEFAULT_PROTOCOL),
                account,
                get("endpointsuffix").unwrap_or(DEFAULT_ENDPOINT_SUFFIX)
            ),
            (None, None) => {
                return Err(SourceError::ConnectionString(
                    "missing AccountName or BlobEndpoint".to_string(),
                ));
            }
        };

        let auth = match (get("accountkey"), get("sharedaccesssignature")) {
            (Some(key), _) => {
                let account = account.ok_or_else(|| {
                    SourceError::ConnectionString("AccountKey requires AccountName".to_string())
                })?;
                BlobAuth::SharedKey {
                    account: account.to_string(),
                    key: decode_key(key)?,
                }
            }
            (None, Some(sas)) => BlobAuth::Sas(sas.trim_start_matches('?').to_string()),
            (None, None) => {
                return Err(SourceError::ConnectionString(
                    "missing AccountKey or SharedAccessSignature".to_string(),
                ));
            }
        };

        Ok(Self {
            blob_endpoint,
            auth,
        })
    }

    /// Blob service endpoint without a trailing slash.
    pub fn blob_endpoint(&self) -> &str {
        &self.blob_endpoint
    }

    /// Authorization mode.
    pub fn auth(&self) -> &BlobAuth {
        &self.auth
    }

    /// Full request URL for a blob, including the SAS query when used.
    pub fn blob_url(&self, container: &str, blob: &str) -> String {
        let base = format!(
            "{}/{}/{}",
            self.blob_endpoint,
            percent_encode_path(container),
            percent_encode_path(blob.trim_start_matches('/'))
        );
        match &self.auth {
            BlobAuth::Sas(token) => format!("{base}?{token}"),
            BlobAuth::SharedKey { .. } => base,
        }
    }

    /// Build the headers for a `GET` of `container/blob` at time `now`.
    pub fn sign_get(
        &self,
        container: &str,
        blob: &str,
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders, SourceError> {
        let date = now.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let authorization = match &self.auth {
            BlobAuth::Sas(_) => None,
            BlobAuth::SharedKey { account, key } => {
                let resource = format!(
                    "/{}{}/{}/{}",
                    account,
                    endpoint_path(&self.blob_endpoint),
                    percent_encode_path(container),
                    percent_encode_path(blob.trim_start_matches('/'))
                );
                let string_to_sign = format!(
                    "GET\n{}x-ms-date:{}\nx-ms-version:{}\n{}",
                    "\n".repeat(11),
                    date,
                    API_VERSION,
                    resource
                );
                let mut mac = HmacSha256::new_from_slice(key).map_err(|err| {
                    SourceError::ConnectionString(format!("unusable account key: {err}"))
                })?;
                mac.update(string_to_sign.as_bytes());
                let signature = STANDARD.encode(mac.finalize().into_bytes());
                Some(format!("SharedKey {account}:{signature}"))
            }
        };
        Ok(SignedHeaders {
            date,
            version: API_VERSION,
            authorization,
        })
    }
}

fn parse_pairs(raw: &str) -> Result<HashMap<String, String>, SourceError> {
    let mut pairs = HashMap::new();
    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let (key, value) = segment.split_once('=').ok_or_else(|| {
            SourceError::ConnectionString(format!("segment without '=': '{segment}'"))
        })?;
        pairs.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
    }
    if pairs.is_empty() {
        return Err(SourceError::ConnectionString("empty".to_string()));
    }
    Ok(pairs)
}

fn decode_key(key: &str) -> Result<Vec<u8>, SourceError> {
    STANDARD
        .decode(key)
        .map_err(|err| SourceError::ConnectionString(format!("AccountKey is not base64: {err}")))
}

/// Path component of an endpoint URL (`""` when the endpoint has none).
fn endpoint_path(endpoint: &str) -> &str {
    let after_scheme = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    match after_scheme.find('/') {
        Some(idx) => after_scheme[idx..].trim_end_matches('/'),
        None => "",
    }
}

/// Percent-encode everything except unreserved characters and `/`.
fn percent_encode_path(raw: &str) -> String {
    let mut encoded = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{other:02X}")),
        }
    }
    encoded
}
