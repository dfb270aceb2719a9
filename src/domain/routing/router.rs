//! Pure routing decisions.

use crate::domain::conversation::{AgentReply, Turn};
use crate::domain::foundation::AgentId;

use super::table::{Disposition, RoutingTable};

/// What the driver does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingDecision {
    /// Invoke the named agent (the active one, or itself again after tools).
    RunAgent(AgentId),
    /// Execute the tool requests on the last reply.
    DispatchTools,
    /// Suspend until the human speaks.
    AwaitHuman,
    /// Make the named agent active and run it.
    Handoff(AgentId),
    /// End the conversation.
    Terminal,
}

/// One tool result reduced to what routing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSummary {
    pub tool: Option<String>,
    pub is_error: bool,
}

/// The last turn of a history, reduced to what routing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastTurn {
    Empty,
    Human,
    AgentReply { has_tool_requests: bool },
    /// The trailing run of tool results, in history order.
    ToolResults(Vec<ResultSummary>),
}

impl LastTurn {
    /// Summarizes the tail of `turns`.
    ///
    /// Results that carry no tool name borrow it from the request they
    /// answer on the reply preceding the run.
    pub fn of(turns: &[Turn]) -> Self {
        let last = match turns.last() {
            Some(turn) => turn,
            None => return LastTurn::Empty,
        };
        match last {
            Turn::Human(_) => LastTurn::Human,
            Turn::AgentReply(reply) => LastTurn::AgentReply {
                has_tool_requests: reply.has_tool_requests(),
            },
            Turn::ToolResult(_) => {
                let run_start = turns
                    .iter()
                    .rposition(|t| !matches!(t, Turn::ToolResult(_)))
                    .map_or(0, |i| i + 1);
                let requester: Option<&AgentReply> =
                    run_start.checked_sub(1).and_then(|i| turns[i].as_agent_reply());
                let results = turns[run_start..]
                    .iter()
                    .filter_map(Turn::as_tool_result)
                    .map(|r| ResultSummary {
                        tool: r.tool_name.clone().or_else(|| {
                            requester
                                .and_then(|reply| reply.request(&r.request_id))
                                .map(|req| req.name.clone())
                        }),
                        is_error: r.is_error,
                    })
                    .collect();
                LastTurn::ToolResults(results)
            }
        }
    }
}

/// Maps the last turn to the next stage using a routing table.
#[derive(Debug, Clone, Default)]
pub struct Router {
    table: RoutingTable,
}

impl Router {
    pub fn new(table: RoutingTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn route(&self, current_agent: &AgentId, last: &LastTurn) -> RoutingDecision {
        match last {
            LastTurn::Empty => RoutingDecision::AwaitHuman,
            LastTurn::Human => RoutingDecision::RunAgent(current_agent.clone()),
            LastTurn::AgentReply {
                has_tool_requests: true,
            } => RoutingDecision::DispatchTools,
            LastTurn::AgentReply {
                has_tool_requests: false,
            } => RoutingDecision::AwaitHuman,
            LastTurn::ToolResults(results) => self.route_results(current_agent, results),
        }
    }

    /// Convenience over [`LastTurn::of`] + [`Router::route`].
    pub fn route_history(&self, current_agent: &AgentId, turns: &[Turn]) -> RoutingDecision {
        self.route(current_agent, &LastTurn::of(turns))
    }

    // Failed results never move control; the agent gets to react to them.
    fn route_results(&self, current_agent: &AgentId, results: &[ResultSummary]) -> RoutingDecision {
        let mut winner = Disposition::Continue;
        for result in results.iter().filter(|r| !r.is_error) {
            let Some(tool) = result.tool.as_deref() else {
                continue;
            };
            let disposition = self.table.disposition_for(tool, current_agent);
            if disposition.outranks(&winner) {
                winner = disposition;
            }
        }

        match winner {
            Disposition::Continue => RoutingDecision::RunAgent(current_agent.clone()),
            Disposition::Handoff { next_agent } if &next_agent == current_agent => {
                RoutingDecision::RunAgent(next_agent)
            }
            Disposition::Handoff { next_agent } => RoutingDecision::Handoff(next_agent),
            Disposition::Terminal => RoutingDecision::Terminal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{ToolRequest, ToolResult};
    use crate::domain::foundation::ToolCallId;
    use crate::domain::routing::RoutingRule;
    use serde_json::json;

    fn agent(name: &str) -> AgentId {
        AgentId::new(name).unwrap()
    }

    fn router() -> Router {
        Router::new(RoutingTable::reference(
            &agent("requirement-gathering"),
            &agent("developer"),
        ))
    }

    fn request(id: &str, name: &str) -> ToolRequest {
        ToolRequest::new(ToolCallId::new(id), name, json!({}))
    }

    fn exchange(by: &str, requests: &[ToolRequest]) -> Vec<Turn> {
        let mut turns = vec![
            Turn::human("hi"),
            AgentReply::with_tools(agent(by), "", requests.to_vec()).into(),
        ];
        for req in requests {
            turns.push(ToolResult::success(req, json!("ok")).into());
        }
        turns
    }

    #[test]
    fn human_turn_runs_the_active_agent() {
        let decision = router().route_history(&agent("developer"), &[Turn::human("hi")]);
        assert_eq!(decision, RoutingDecision::RunAgent(agent("developer")));
    }

    #[test]
    fn reply_with_tools_dispatches() {
        let turns = vec![AgentReply::with_tools(
            agent("developer"),
            "",
            vec![request("a", "search_knowledge_base")],
        )
        .into()];
        assert_eq!(
            router().route_history(&agent("developer"), &turns),
            RoutingDecision::DispatchTools
        );
    }

    #[test]
    fn plain_reply_awaits_human() {
        let turns = vec![AgentReply::text(agent("developer"), "hello").into()];
        assert_eq!(
            router().route_history(&agent("developer"), &turns),
            RoutingDecision::AwaitHuman
        );
    }

    #[test]
    fn empty_history_awaits_human() {
        assert_eq!(
            router().route_history(&agent("developer"), &[]),
            RoutingDecision::AwaitHuman
        );
    }

    #[test]
    fn saved_requirements_hand_off_to_developer() {
        let turns = exchange("requirement-gathering", &[request("a", "save_requirements")]);
        assert_eq!(
            router().route_history(&agent("requirement-gathering"), &turns),
            RoutingDecision::Handoff(agent("developer"))
        );
    }

    #[test]
    fn saved_solution_is_terminal() {
        let turns = exchange("developer", &[request("a", "save_solution")]);
        assert_eq!(
            router().route_history(&agent("developer"), &turns),
            RoutingDecision::Terminal
        );
    }

    #[test]
    fn lookup_returns_to_same_agent() {
        let turns = exchange("developer", &[request("a", "search_knowledge_base")]);
        assert_eq!(
            router().route_history(&agent("developer"), &turns),
            RoutingDecision::RunAgent(agent("developer"))
        );
    }

    #[test]
    fn terminal_wins_over_lookup_in_one_batch() {
        let turns = exchange(
            "developer",
            &[request("a", "search_knowledge_base"), request("b", "save_solution")],
        );
        assert_eq!(
            router().route_history(&agent("developer"), &turns),
            RoutingDecision::Terminal
        );
    }

    #[test]
    fn failed_terminal_tool_returns_to_agent() {
        let req = request("a", "save_solution");
        let turns = vec![
            AgentReply::with_tools(agent("developer"), "", vec![req.clone()]).into(),
            ToolResult::error(&req, "database down").into(),
        ];
        assert_eq!(
            router().route_history(&agent("developer"), &turns),
            RoutingDecision::RunAgent(agent("developer"))
        );
    }

    #[test]
    fn nameless_result_borrows_tool_name_from_request() {
        let req = request("a", "save_solution");
        let turns = vec![
            AgentReply::with_tools(agent("developer"), "", vec![req]).into(),
            Turn::ToolResult(ToolResult {
                request_id: ToolCallId::new("a"),
                tool_name: None,
                payload: json!("ok"),
                is_error: false,
            }),
        ];
        assert_eq!(
            router().route_history(&agent("developer"), &turns),
            RoutingDecision::Terminal
        );
    }

    #[test]
    fn first_handoff_in_request_order_wins() {
        let table = RoutingTable::new(vec![
            RoutingRule {
                tool: "to_b".to_string(),
                from_agent: None,
                disposition: Disposition::Handoff {
                    next_agent: agent("b"),
                },
            },
            RoutingRule {
                tool: "to_c".to_string(),
                from_agent: None,
                disposition: Disposition::Handoff {
                    next_agent: agent("c"),
                },
            },
        ]);
        let turns = exchange("a", &[request("1", "to_c"), request("2", "to_b")]);
        assert_eq!(
            Router::new(table).route_history(&agent("a"), &turns),
            RoutingDecision::Handoff(agent("c"))
        );
    }
}
