//! Conversation module - turn history, persisted state and its invariants.

mod repair;
mod state;
mod transcript;
mod turn;

pub use repair::{
    find_dangling, repair, repair_in_place, satisfies_protocol, ProtocolViolation,
    INCOMPLETE_EXECUTION_MESSAGE,
};
pub use state::{ConversationState, RoutingHint};
pub use transcript::{project, TranscriptEntry, TranscriptRole};
pub use turn::{AgentReply, HumanTurn, ToolRequest, ToolResult, Turn, TurnKind};
