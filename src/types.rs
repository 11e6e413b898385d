/// Canonical string form of an identifier, used as a lookup key.
/// Examples: `10`, `article-42`
pub type CanonicalId = String;
/// Identifier for a registered source backend.
/// Examples: `local_file`, `blob_storage`
pub type BackendId = String;
/// Blob storage container name.
/// Example: `processed-data`
pub type ContainerName = String;
/// Blob name inside a container (may contain `/`).
/// Example: `exports/user_interactions.json`
pub type BlobName = String;
/// Human-readable rendering of a source location used in logs and errors.
/// Examples: `processed_data/articles_metadata.json`, `blob://processed-data/articles.json`
pub type LocationLabel = String;
/// Raw endpoint URL.
/// Example: `https://example.azurewebsites.net/api/recommend`
pub type EndpointUrl = String;
