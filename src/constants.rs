/// Environment variable names and defaults read by `AppConfig::from_env`.
pub mod config {
    /// Recommendation endpoint URL.
    pub const ENV_ENDPOINT: &str = "RECS_ENDPOINT";
    /// Static access key forwarded to the endpoint.
    pub const ENV_FUNCTION_KEY: &str = "RECS_FUNCTION_KEY";
    /// Whether a missing access key blocks the request.
    pub const ENV_REQUIRE_FUNCTION_KEY: &str = "RECS_REQUIRE_FUNCTION_KEY";
    /// Request timeout in whole seconds.
    pub const ENV_TIMEOUT_SECS: &str = "RECS_TIMEOUT_SECS";
    /// Number of recommendations requested per call.
    pub const ENV_RECOMMENDATION_COUNT: &str = "RECS_RECOMMENDATION_COUNT";
    /// Source backend selector (`local` or `blob`).
    pub const ENV_SOURCE_BACKEND: &str = "RECS_SOURCE_BACKEND";
    /// Blob container holding both record sources.
    pub const ENV_BLOB_CONTAINER: &str = "RECS_BLOB_CONTAINER";
    /// Interaction records path (local) or blob name (blob).
    pub const ENV_INTERACTIONS_SOURCE: &str = "RECS_INTERACTIONS_SOURCE";
    /// Interaction records format (`jsonl` or `json`).
    pub const ENV_INTERACTIONS_FORMAT: &str = "RECS_INTERACTIONS_FORMAT";
    /// Article metadata path (local) or blob name (blob).
    pub const ENV_ARTICLES_SOURCE: &str = "RECS_ARTICLES_SOURCE";
    /// Article metadata format (`jsonl` or `json`).
    pub const ENV_ARTICLES_FORMAT: &str = "RECS_ARTICLES_FORMAT";
    /// Storage connection string.
    pub const ENV_STORAGE_CONNECTION_STRING: &str = "AZURE_STORAGE_CONNECTION_STRING";

    /// Default recommendation endpoint.
    pub const DEFAULT_ENDPOINT: &str =
        "https://projet10func-frcmc6egdyamhzhe.francecentral-01.azurewebsites.net/api/recommend";
    /// Default request timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
    /// Default number of recommendations per request.
    pub const DEFAULT_RECOMMENDATION_COUNT: usize = 5;
    /// Default blob container.
    pub const DEFAULT_BLOB_CONTAINER: &str = "processed-data";
    /// Default interaction records location.
    pub const DEFAULT_INTERACTIONS_SOURCE: &str = "processed_data/user_interactions.json";
    /// Default article metadata location.
    pub const DEFAULT_ARTICLES_SOURCE: &str = "processed_data/articles_metadata.json";
}

/// Constants used by the recommendation client wire contract.
pub mod client {
    /// Header carrying the static endpoint access key.
    pub const FUNCTION_KEY_HEADER: &str = "x-functions-key";
    /// Content type sent with every request.
    pub const JSON_CONTENT_TYPE: &str = "application/json";
}

/// Constants used when reading and decoding record sources.
pub mod source {
    /// Backend id of the local filesystem backend.
    pub const FILE_BACKEND_ID: &str = "local_file";
    /// Backend id of the blob storage backend.
    pub const BLOB_BACKEND_ID: &str = "blob_storage";
    /// Max characters of a malformed line echoed into warnings.
    pub const MALFORMED_PREVIEW_CHARS: usize = 100;
}

/// Constants used by blob storage request signing.
pub mod blob {
    /// Storage REST API version sent as `x-ms-version`.
    pub const API_VERSION: &str = "2021-08-06";
    /// Default endpoint suffix for public cloud accounts.
    pub const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";
    /// Default endpoint protocol.
    pub const DEFAULT_PROTOCOL: &str = "https";
    /// Well-known development storage account name.
    pub const DEV_ACCOUNT_NAME: &str = "devstoreaccount1";
    /// Well-known development storage account key.
    pub const DEV_ACCOUNT_KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
    /// Well-known development storage blob endpoint.
    pub const DEV_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";
}

/// Placeholders applied when rendering article cards.
pub mod render {
    /// Placeholder for a missing title or category.
    pub const MISSING_TEXT: &str = "N/A";
    /// Placeholder for a missing article URL.
    pub const MISSING_URL: &str = "#";
}
