//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the engine and the outside world. Adapters implement these ports.
//!
//! ## Engine Ports
//!
//! - `CheckpointStore` - Durable conversation state
//! - `ReasoningCapability` - Language-model invocation
//! - `ReasoningResolver` - Per-request provider selection
//! - `ToolHandler` - One named side-effecting tool
//!
//! ## Collaborator Ports
//!
//! - `ArtifactSink` - Write-behind persistence of documents and metadata
//! - `KnowledgeBase` - External retrieval service
//! - `CredentialSource` - Per-user AI settings

mod artifact_sink;
mod checkpoint_store;
mod credential_source;
mod knowledge_base;
mod reasoning;
mod reasoning_resolver;
mod tool_handler;

pub use artifact_sink::{ArtifactSink, ArtifactSinkError, ConversationRecord, StoredArtifacts};
pub use checkpoint_store::{apply_append, CheckpointError, CheckpointStore, CheckpointUpdate};
pub use credential_source::{CredentialError, CredentialSource};
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseError, KnowledgeSnippet};
pub use reasoning::{
    AIError, FinishReason, ProposedToolCall, ProviderInfo, ReasoningCapability, ReasoningRequest,
    ReasoningResponse, RequestMetadata, TokenUsage,
};
pub use reasoning_resolver::{
    ModelProfile, ProviderKind, ProviderSettings, ReasoningResolver, ResolveRequest,
    MISSING_CONFIGURATION_MESSAGE,
};
pub use tool_handler::{required_string, ToolContext, ToolExecutionError, ToolHandler, ToolOutput};
