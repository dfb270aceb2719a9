//! HTTP adapter for solution publishing.

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::{PublishMetadata, PublishRequest, PublishResponse};
pub use routes::publishing_routes;
