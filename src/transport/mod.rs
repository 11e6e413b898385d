/// Blob storage connection strings and request signing.
pub mod blob;
/// Local filesystem reads.
pub mod fs;
