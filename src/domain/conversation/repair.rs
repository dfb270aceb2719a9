//! Repair of dangling tool requests.
//!
//! A run that crashed between recording an agent reply and recording the
//! results of the tools it requested leaves a history that no reasoning
//! provider will accept. Before a conversation resumes, [`repair`] closes the
//! gap with placeholder results so the next agent step sees a well-formed
//! history.
//!
//! The protocol: every tool request in an agent reply is answered by exactly
//! one tool result in the run of tool results that immediately follows the
//! reply, before the next human turn or agent reply.

use std::collections::HashSet;

use serde_json::json;

use super::turn::{AgentReply, ToolResult, Turn};
use crate::domain::foundation::ToolCallId;

/// Diagnostic carried by synthesized results.
pub const INCOMPLETE_EXECUTION_MESSAGE: &str = "prior execution did not complete";

/// A detected gap in the protocol: the reply at `reply_index` has requests
/// with no result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolViolation {
    pub reply_index: usize,
    pub missing: Vec<ToolCallId>,
}

/// Finds unanswered requests on the most recent agent reply.
pub fn find_dangling(turns: &[Turn]) -> Option<ProtocolViolation> {
    let (reply_index, reply) = turns
        .iter()
        .enumerate()
        .rev()
        .find_map(|(i, t)| t.as_agent_reply().map(|r| (i, r)))?;

    let answered = answered_ids(&turns[reply_index + 1..]);
    let missing: Vec<ToolCallId> = reply
        .tool_requests
        .iter()
        .filter(|req| !answered.contains(&req.id))
        .map(|req| req.id.clone())
        .collect();

    if missing.is_empty() {
        None
    } else {
        Some(ProtocolViolation {
            reply_index,
            missing,
        })
    }
}

/// Returns a copy of the history with the protocol restored.
pub fn repair(history: &[Turn]) -> Vec<Turn> {
    let mut turns = history.to_vec();
    repair_in_place(&mut turns);
    turns
}

/// Restores the protocol in place, returning what was fixed.
///
/// Placeholders are inserted in request order directly after the results
/// the reply did receive; for a history that ends in the dangling reply
/// this is a plain append.
pub fn repair_in_place(turns: &mut Vec<Turn>) -> Option<ProtocolViolation> {
    let violation = find_dangling(turns)?;

    let reply = match turns[violation.reply_index].as_agent_reply() {
        Some(reply) => reply.clone(),
        None => return None,
    };
    let placeholders: Vec<Turn> = violation
        .missing
        .iter()
        .filter_map(|id| reply.request(id))
        .map(|req| {
            Turn::ToolResult(ToolResult {
                request_id: req.id.clone(),
                tool_name: Some(req.name.clone()),
                payload: json!({ "error": INCOMPLETE_EXECUTION_MESSAGE }),
                is_error: true,
            })
        })
        .collect();

    let insert_at = violation.reply_index + 1 + result_run_len(&turns[violation.reply_index + 1..]);
    turns.splice(insert_at..insert_at, placeholders);

    Some(violation)
}

/// Checks the protocol across the whole history.
pub fn satisfies_protocol(turns: &[Turn]) -> bool {
    turns.iter().enumerate().all(|(i, turn)| match turn {
        Turn::AgentReply(reply) => reply_is_answered(reply, &turns[i + 1..]),
        _ => true,
    })
}

fn reply_is_answered(reply: &AgentReply, rest: &[Turn]) -> bool {
    let run = &rest[..result_run_len(rest)];
    reply.tool_requests.iter().all(|req| {
        run.iter()
            .filter_map(Turn::as_tool_result)
            .filter(|r| r.request_id == req.id)
            .count()
            == 1
    })
}

fn answered_ids(rest: &[Turn]) -> HashSet<ToolCallId> {
    rest[..result_run_len(rest)]
        .iter()
        .filter_map(Turn::as_tool_result)
        .map(|r| r.request_id.clone())
        .collect()
}

fn result_run_len(rest: &[Turn]) -> usize {
    rest.iter()
        .take_while(|t| matches!(t, Turn::ToolResult(_)))
        .count()
}
