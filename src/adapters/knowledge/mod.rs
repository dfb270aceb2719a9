//! Knowledge base adapters.

mod http_knowledge_base;

pub use http_knowledge_base::{HttpKnowledgeBase, UnconfiguredKnowledgeBase};
