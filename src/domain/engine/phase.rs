//! Driver phase state machine.
//!
//! ```text
//! AwaitingHuman --human message--> RunningAgent
//! RunningAgent --reply without tools--> AwaitingHuman
//! RunningAgent --reply with tools--> DispatchingTools
//! DispatchingTools --results routed--> RunningAgent | Terminal
//! ```
//!
//! `RunningAgent -> AwaitingHuman` also covers the iteration cap and
//! cancellation, which stop the loop at the last stable checkpoint.
//! `Terminal -> RunningAgent` reopens a finished conversation when the human
//! writes again.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::StateMachine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriverPhase {
    AwaitingHuman,
    RunningAgent,
    DispatchingTools,
    Terminal,
}

impl StateMachine for DriverPhase {
    fn can_transition_to(&self, target: &Self) -> bool {
        use DriverPhase::*;
        matches!(
            (self, target),
            (AwaitingHuman, RunningAgent)
                | (RunningAgent, AwaitingHuman)
                | (RunningAgent, DispatchingTools)
                | (DispatchingTools, RunningAgent)
                | (DispatchingTools, AwaitingHuman)
                | (DispatchingTools, Terminal)
                | (Terminal, RunningAgent)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use DriverPhase::*;
        match self {
            AwaitingHuman => vec![RunningAgent],
            RunningAgent => vec![AwaitingHuman, DispatchingTools],
            DispatchingTools => vec![RunningAgent, AwaitingHuman, Terminal],
            Terminal => vec![RunningAgent],
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, DriverPhase::Terminal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DriverPhase; 4] = [
        DriverPhase::AwaitingHuman,
        DriverPhase::RunningAgent,
        DriverPhase::DispatchingTools,
        DriverPhase::Terminal,
    ];

    #[test]
    fn human_message_starts_the_agent() {
        assert_eq!(
            DriverPhase::AwaitingHuman.transition_to(DriverPhase::RunningAgent),
            Ok(DriverPhase::RunningAgent)
        );
    }

    #[test]
    fn tools_cannot_run_without_an_agent_reply() {
        assert!(DriverPhase::AwaitingHuman
            .transition_to(DriverPhase::DispatchingTools)
            .is_err());
    }

    #[test]
    fn only_tool_routing_reaches_terminal() {
        for phase in ALL {
            let allowed = phase.can_transition_to(&DriverPhase::Terminal);
            assert_eq!(allowed, phase == DriverPhase::DispatchingTools, "{:?}", phase);
        }
    }

    #[test]
    fn terminal_is_reported_terminal_but_can_reopen() {
        assert!(DriverPhase::Terminal.is_terminal());
        assert!(DriverPhase::Terminal.can_transition_to(&DriverPhase::RunningAgent));
        assert!(!DriverPhase::AwaitingHuman.is_terminal());
    }

    #[test]
    fn can_transition_to_is_consistent_with_valid_transitions() {
        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(&to),
                    from.valid_transitions().contains(&to),
                    "{:?} -> {:?}",
                    from,
                    to
                );
            }
        }
    }
}
