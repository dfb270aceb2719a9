//! Publishing handlers: one-shot solution documents outside the agent loop.

mod publish_solution;

pub use publish_solution::{PublishSolutionCommand, PublishSolutionHandler, PublishSolutionResult};
