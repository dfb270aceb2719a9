//! Conversation command and query handlers.

mod ask;
mod cancel_turn;
mod get_artifacts;
mod get_conversation;

pub use ask::{AskCommand, AskError, AskHandler};
pub use cancel_turn::{CancelTurnCommand, CancelTurnHandler, CancelTurnResult};
pub use get_artifacts::{ArtifactsView, GetArtifactsHandler, GetArtifactsQuery};
pub use get_conversation::{ConversationView, GetConversationHandler, GetConversationQuery};
