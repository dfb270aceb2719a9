//! Artifact persistence adapters.
//!
//! - `ArtifactCache` - process-wide write-behind cache
//! - `MySqlArtifactSink` - operator application's MySQL tables
//! - `CachedArtifactSink` - cache in front of an optional database

mod artifact_cache;
mod cached_artifact_sink;
mod mysql_artifact_sink;

pub use artifact_cache::ArtifactCache;
pub use cached_artifact_sink::CachedArtifactSink;
pub use mysql_artifact_sink::MySqlArtifactSink;
