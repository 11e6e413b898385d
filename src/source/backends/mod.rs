mod blob_backend;
mod file_backend;

pub use blob_backend::BlobBackend;
pub use file_backend::FileBackend;
