//! Routing module - declarative routing table and the pure router over it.

mod router;
mod table;

pub use router::{LastTurn, ResultSummary, Router, RoutingDecision};
pub use table::{Disposition, RoutingRule, RoutingTable};
