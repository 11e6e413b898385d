#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Recommendation endpoint client.
pub mod client;
/// Application configuration loaded from the environment.
pub mod config;
/// Centralized constants used across sources, client, and rendering.
pub mod constants;
/// Identifier and record types.
pub mod data;
/// Distinct, ordered user ids.
pub mod directory;
/// Reusable example runners shared by downstream crates.
pub mod example_apps;
/// Record loading and memoization.
pub mod ingestion;
/// Article metadata index.
pub mod metadata;
/// Record source descriptors and built-in backends.
pub mod source;
/// Input transports used by backends (filesystem and blob storage).
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Load-once workflow producing article cards.
pub mod workflow;

mod errors;

pub use client::{ClientConfig, RecommendationClient};
pub use config::{AppConfig, BackendKind, SourceSpec};
pub use data::{ArticleRecord, Identifier, InteractionRecord};
pub use directory::UserDirectory;
pub use errors::{ConfigError, RecommendError, SourceError, WorkflowHalt};
pub use ingestion::{LoadReport, RecordCache, RecordLoader};
pub use metadata::{DuplicatePolicy, MetadataIndex};
pub use source::{
    BlobBackend, FileBackend, RecordFormat, SourceBackend, SourceLocation, SourceParams,
};
pub use types::{BackendId, BlobName, CanonicalId, ContainerName, EndpointUrl, LocationLabel};
pub use workflow::{ArticleCard, Prepared, Workflow};
