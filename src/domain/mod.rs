//! Domain layer containing the conversation engine's types and decisions.
//!
//! # Module Organization
//!
//! - `foundation` - Identifiers, validation errors, state machine trait
//! - `conversation` - Turns, persisted state, transcript projection, repair
//! - `routing` - Routing table and the pure router
//! - `agents` - Agent profiles and the workflow catalog
//! - `tools` - Tool definitions, wire names and artifacts
//! - `engine` - Driver phase state machine

pub mod agents;
pub mod conversation;
pub mod engine;
pub mod foundation;
pub mod routing;
pub mod tools;
