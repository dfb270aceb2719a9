//! Foundation module - Shared domain primitives.
//!
//! Identifiers, validation errors and the state machine trait that the
//! conversation engine is built from.

mod errors;
mod ids;
mod state_machine;

pub use errors::ValidationError;
pub use ids::{AgentId, ConversationId, ToolCallId, UserId};
pub use state_machine::StateMachine;
