//! Application handlers.
//!
//! Command and query handlers that sit between the HTTP adapter and the
//! conversation driver.

pub mod conversation;
pub mod publishing;

pub use conversation::{
    // Commands
    AskCommand, AskError, AskHandler,
    CancelTurnCommand, CancelTurnHandler, CancelTurnResult,
    // Queries
    ArtifactsView, ConversationView,
    GetArtifactsHandler, GetArtifactsQuery,
    GetConversationHandler, GetConversationQuery,
};
pub use publishing::{PublishSolutionCommand, PublishSolutionHandler, PublishSolutionResult};
