//! Idea Agent - multi-agent conversation engine
//!
//! Turns a project idea into a requirements document and then a technical
//! solution through a resumable loop of agents, tools and routing decisions,
//! checkpointed after every step.

pub mod adapters;
pub mod application;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod ports;
