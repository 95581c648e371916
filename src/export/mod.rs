//! Model persistence module
//!
//! The fitted pipeline is stored as a bincode payload inside a gzip stream,
//! wrapped with magic bytes and a format version so stale or foreign files
//! are rejected on load.

mod serializer;

pub use serializer::{load_model, save_model, ArtifactMetadata, ModelArtifact};
