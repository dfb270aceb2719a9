//! Application layer - the conversation engine and its handlers.
//!
//! The driver composes the agent step, the tool dispatcher and the router
//! into one resumable loop; handlers adapt raw requests to it.

pub mod agent_step;
pub mod cancellation;
pub mod conversation_locks;
pub mod driver;
pub mod errors;
pub mod handlers;
pub mod tool_dispatcher;

pub use agent_step::AgentStep;
pub use cancellation::{CancelRegistry, CancelToken, TurnRegistration};
pub use conversation_locks::{ConversationGuard, ConversationLocks};
pub use driver::{ConversationDriver, TurnOutcome, TurnRequest, TurnStatus};
pub use errors::EngineError;
pub use tool_dispatcher::{DispatchOutcome, ToolDispatcher};
