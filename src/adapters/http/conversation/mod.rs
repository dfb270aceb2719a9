//! HTTP adapter for conversation endpoints.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{AskRequest, AskResponse, ExtractedArtifacts, ProviderConfigDto};
pub use routes::conversation_routes;
