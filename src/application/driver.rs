//! Conversation Driver - the resumable control loop behind `/ask`.
//!
//! One inbound human message runs as follows:
//!
//! 1. take the conversation's run lock
//! 2. load (or create) the checkpoint and repair dangling tool requests
//! 3. append the human turn and run the active agent
//! 4. while the router says so, dispatch tools, hand off, or run the agent
//!    again, checkpointing after every completed step
//! 5. stop when the agent waits for the human, the conversation is terminal,
//!    the turn is cancelled or the iteration cap is hit
//!
//! Nothing from a step that failed halfway is ever written.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::domain::agents::{AgentProfile, Workflow};
use crate::domain::conversation::{
    project, repair_in_place, AgentReply, ConversationState, RoutingHint, Turn,
};
use crate::domain::engine::DriverPhase;
use crate::domain::foundation::{AgentId, ConversationId, StateMachine, UserId};
use crate::domain::routing::{Router, RoutingDecision};
use crate::domain::tools::Artifact;
use crate::ports::{
    ArtifactSink, CheckpointStore, CheckpointUpdate, ConversationRecord, ProviderSettings,
    ReasoningCapability, ReasoningResolver, RequestMetadata, ResolveRequest, ToolContext,
};

use super::agent_step::AgentStep;
use super::cancellation::{CancelRegistry, CancelToken};
use super::conversation_locks::ConversationLocks;
use super::errors::EngineError;
use super::tool_dispatcher::ToolDispatcher;

const TITLE_CHARS: usize = 80;

/// One inbound human message.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    /// Absent for a new conversation; the driver generates an id.
    pub conversation_id: Option<ConversationId>,
    pub user_id: Option<UserId>,
    pub message: String,
    pub provider: Option<ProviderSettings>,
}

impl TurnRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            conversation_id: None,
            user_id: None,
            message: message.into(),
            provider: None,
        }
    }

    pub fn in_conversation(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    pub fn from_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_provider(mut self, settings: ProviderSettings) -> Self {
        self.provider = Some(settings);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    /// The loop reached a resting point (waiting for the human, or terminal).
    Completed,
    /// Stopped early on request; the conversation resumes with the next message.
    Cancelled,
}

impl TurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStatus::Completed => "completed",
            TurnStatus::Cancelled => "cancelled",
        }
    }
}

/// What one inbound message produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub conversation_id: ConversationId,
    pub response: String,
    pub status: TurnStatus,
    pub active_agent: AgentId,
    pub routing_hint: RoutingHint,
    /// Documents captured by tools during this turn, in save order.
    pub artifacts: Vec<Artifact>,
    /// Agent invocations made during this turn.
    pub iterations: u32,
}

pub struct ConversationDriver {
    store: Arc<dyn CheckpointStore>,
    resolver: Arc<dyn ReasoningResolver>,
    dispatcher: Arc<ToolDispatcher>,
    sink: Arc<dyn ArtifactSink>,
    workflow: Arc<Workflow>,
    router: Router,
    step: AgentStep,
    locks: ConversationLocks,
    cancellations: CancelRegistry,
    max_iterations: u32,
}

impl ConversationDriver {
    pub fn new(
        store: Arc<dyn CheckpointStore>,
        resolver: Arc<dyn ReasoningResolver>,
        dispatcher: Arc<ToolDispatcher>,
        sink: Arc<dyn ArtifactSink>,
        workflow: Arc<Workflow>,
        engine: &EngineConfig,
    ) -> Self {
        Self {
            router: Router::new(workflow.routing.clone()),
            store,
            resolver,
            dispatcher,
            sink,
            workflow,
            step: AgentStep::default(),
            locks: ConversationLocks::new(engine.lock_policy),
            cancellations: CancelRegistry::new(),
            max_iterations: engine.max_iterations,
        }
    }

    pub fn with_agent_step(mut self, step: AgentStep) -> Self {
        self.step = step;
        self
    }

    pub fn store(&self) -> &Arc<dyn CheckpointStore> {
        &self.store
    }

    /// Asks the running turn of `id` to stop after its current step.
    pub fn cancel(&self, id: &ConversationId) -> bool {
        let found = self.cancellations.cancel(id);
        tracing::info!(conversation_id = %id, running = found, "Cancellation requested");
        found
    }

    pub fn is_running(&self, id: &ConversationId) -> bool {
        self.cancellations.is_running(id)
    }

    /// Processes one human message end to end.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a blank message
    /// - `Busy` when the conversation is mid-turn and the lock policy rejects
    /// - `Configuration` when no model settings can be resolved
    /// - `Transient` when a collaborator fails; state stays at the last
    ///   completed step
    /// - `LoopBoundExceeded` when the agent keeps going past the cap
    pub async fn handle_turn(&self, request: TurnRequest) -> Result<TurnOutcome, EngineError> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(EngineError::invalid_input("question cannot be empty"));
        }
        let id = request
            .conversation_id
            .clone()
            .unwrap_or_else(ConversationId::generate);

        let guard = self.locks.acquire(&id).await?;
        let registration = self.cancellations.register(&id);

        let outcome = self.run_turn(&id, &request, message, registration.token()).await;

        drop(registration);
        drop(guard);
        self.locks.prune_idle();

        match &outcome {
            Ok(done) => tracing::info!(
                conversation_id = %id,
                status = done.status.as_str(),
                agent = %done.active_agent,
                hint = %done.routing_hint,
                iterations = done.iterations,
                "Turn finished"
            ),
            Err(e) => tracing::warn!(conversation_id = %id, status = e.status(), error = %e, "Turn failed"),
        }
        outcome
    }

    async fn run_turn(
        &self,
        id: &ConversationId,
        request: &TurnRequest,
        message: &str,
        token: &CancelToken,
    ) -> Result<TurnOutcome, EngineError> {
        let capability = self
            .resolver
            .resolve(&ResolveRequest::conversation(request.user_id, request.provider.clone()))
            .await?;

        let mut state = match self.store.find(id).await? {
            Some(state) => state,
            None => {
                tracing::info!(conversation_id = %id, agent = %self.workflow.entry_agent, "Starting conversation");
                ConversationState::new(id.clone(), self.workflow.entry_agent.clone(), request.user_id)
            }
        };
        if state.user_id.is_none() {
            state.user_id = request.user_id;
        }

        if let Some(violation) = repair_in_place(&mut state.turns) {
            tracing::warn!(
                conversation_id = %id,
                reply_index = violation.reply_index,
                missing = violation.missing.len(),
                "Closed dangling tool requests left by an interrupted run"
            );
            state.routing_hint = RoutingHint::Continuing;
        }

        let mut phase = if state.is_terminal() {
            tracing::info!(conversation_id = %id, agent = %state.active_agent, "Reopening finished conversation");
            DriverPhase::Terminal
        } else {
            DriverPhase::AwaitingHuman
        };
        phase = advance(phase, DriverPhase::RunningAgent)?;

        let mut run = TurnRun {
            driver: self,
            capability,
            metadata: RequestMetadata::new(id.clone(), Uuid::new_v4().to_string())
                .with_user(state.user_id),
            state,
            persisted: false,
            artifacts: Vec::new(),
            responses: Vec::new(),
        };
        run.state.turns.push(Turn::human(message));

        let mut iterations = 0u32;
        let mut status = TurnStatus::Completed;

        loop {
            if iterations > 0 && token.is_cancelled() {
                tracing::info!(conversation_id = %id, iterations, "Turn cancelled");
                run.rest().await?;
                status = TurnStatus::Cancelled;
                break;
            }
            if iterations >= self.max_iterations {
                tracing::warn!(conversation_id = %id, limit = self.max_iterations, "Iteration cap reached");
                run.rest().await?;
                return Err(EngineError::LoopBoundExceeded {
                    limit: self.max_iterations,
                });
            }

            let profile = self.profile_for(&run.state.active_agent)?;
            let reply = run.agent_step(profile).await?;
            iterations += 1;

            let decision = self.router.route_history(&run.state.active_agent, &run.state.turns);
            tracing::debug!(conversation_id = %id, agent = %profile.id, decision = ?decision, "Routed agent reply");

            match decision {
                RoutingDecision::DispatchTools => {
                    phase = advance(phase, DriverPhase::DispatchingTools)?;
                    let next = run.dispatch(profile, &reply).await?;
                    match next {
                        RoutingDecision::Terminal => {
                            advance(phase, DriverPhase::Terminal)?;
                            break;
                        }
                        _ => phase = advance(phase, DriverPhase::RunningAgent)?,
                    }
                }
                _ => {
                    advance(phase, DriverPhase::AwaitingHuman)?;
                    break;
                }
            }
        }

        let outcome = TurnOutcome {
            conversation_id: id.clone(),
            response: run.response_text(),
            status,
            active_agent: run.state.active_agent.clone(),
            routing_hint: run.state.routing_hint.clone(),
            artifacts: run.artifacts,
            iterations,
        };
        self.record(&run.state).await;
        Ok(outcome)
    }

    fn profile_for(&self, agent: &AgentId) -> Result<&AgentProfile, EngineError> {
        self.workflow
            .agent(agent)
            .ok_or_else(|| EngineError::internal(format!("agent '{}' is not declared in the workflow", agent)))
    }

    async fn record(&self, state: &ConversationState) {
        let record = ConversationRecord {
            conversation_id: state.conversation_id.clone(),
            user_id: state.user_id,
            title: title_of(state),
            active_agent: state.active_agent.clone(),
            status: state.routing_hint.to_string(),
            message_count: project(&state.turns).len(),
            updated_at: state.updated_at,
        };
        if let Err(e) = self.sink.record_conversation(&record).await {
            tracing::warn!(conversation_id = %state.conversation_id, error = %e, "Failed to record conversation metadata");
        }
    }
}

/// Mutable state of one inbound turn.
struct TurnRun<'a> {
    driver: &'a ConversationDriver,
    capability: Arc<dyn ReasoningCapability>,
    metadata: RequestMetadata,
    state: ConversationState,
    /// False until the first checkpoint of this turn is written.
    persisted: bool,
    artifacts: Vec<Artifact>,
    responses: Vec<String>,
}

impl TurnRun<'_> {
    async fn agent_step(&mut self, profile: &AgentProfile) -> Result<AgentReply, EngineError> {
        let tools = self.driver.dispatcher.definitions_for(profile);
        let reply = self
            .driver
            .step
            .run(
                self.capability.as_ref(),
                profile,
                &self.state.turns,
                tools,
                self.metadata.clone(),
            )
            .await?;

        if !reply.content.trim().is_empty() {
            self.responses.push(reply.content.clone());
        }
        let hint = if reply.has_tool_requests() {
            RoutingHint::PendingTools
        } else {
            RoutingHint::AwaitingHuman
        };
        let agent = self.state.active_agent.clone();
        self.checkpoint(vec![reply.clone().into()], agent, hint).await?;
        Ok(reply)
    }

    /// Runs the reply's tools, records their results and returns where the
    /// conversation goes next.
    async fn dispatch(&mut self, profile: &AgentProfile, reply: &AgentReply) -> Result<RoutingDecision, EngineError> {
        let context = ToolContext {
            conversation_id: self.state.conversation_id.clone(),
            user_id: self.state.user_id,
            agent: profile.id.clone(),
        };
        let outcomes = self
            .driver
            .dispatcher
            .dispatch_all(profile, &reply.tool_requests, &context)
            .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            self.artifacts.extend(outcome.artifact);
            results.push(Turn::ToolResult(outcome.result));
        }

        let mut preview = self.state.turns.clone();
        preview.extend(results.iter().cloned());
        let active = self.state.active_agent.clone();
        let decision = self.driver.router.route_history(&active, &preview);
        tracing::debug!(
            conversation_id = %self.state.conversation_id,
            agent = %active,
            results = results.len(),
            decision = ?decision,
            "Routed tool results"
        );

        let (next_agent, hint) = match &decision {
            RoutingDecision::Handoff(next) => {
                tracing::info!(conversation_id = %self.state.conversation_id, from = %active, to = %next, "Handing off");
                (next.clone(), RoutingHint::Handoff(next.clone()))
            }
            RoutingDecision::Terminal => (active, RoutingHint::Terminal),
            RoutingDecision::RunAgent(agent) => (agent.clone(), RoutingHint::Continuing),
            RoutingDecision::DispatchTools | RoutingDecision::AwaitHuman => {
                (active, RoutingHint::AwaitingHuman)
            }
        };
        self.checkpoint(results, next_agent, hint).await?;
        Ok(decision)
    }

    /// Marks the conversation as waiting for the human at its current point.
    async fn rest(&mut self) -> Result<(), EngineError> {
        let agent = self.state.active_agent.clone();
        self.checkpoint(Vec::new(), agent, RoutingHint::AwaitingHuman).await
    }

    async fn checkpoint(&mut self, turns: Vec<Turn>, active_agent: AgentId, routing_hint: RoutingHint) -> Result<(), EngineError> {
        let store = &self.driver.store;
        if self.persisted {
            self.state = store
                .append_and_save(
                    &self.state.conversation_id,
                    turns,
                    CheckpointUpdate {
                        active_agent,
                        routing_hint,
                    },
                )
                .await?;
        } else {
            // First write of the turn carries the human message and any
            // repaired placeholders, so it replaces the stored state whole.
            self.state.turns.extend(turns);
            self.state.active_agent = active_agent;
            self.state.routing_hint = routing_hint;
            self.state = store.save(&self.state).await?;
            self.persisted = true;
        }
        Ok(())
    }

    /// Last conversational text of this turn, or the last tool message when
    /// the agent ended on a silent tool call.
    fn response_text(&self) -> String {
        if let Some(text) = self.responses.last() {
            return text.clone();
        }
        self.state
            .turns
            .last()
            .and_then(Turn::as_tool_result)
            .map(|r| r.payload_text())
            .unwrap_or_default()
    }
}

fn advance(from: DriverPhase, to: DriverPhase) -> Result<DriverPhase, EngineError> {
    from.transition_to(to)
        .map_err(|e| EngineError::internal(e.to_string()))
}

fn title_of(state: &ConversationState) -> String {
    state
        .turns
        .iter()
        .find_map(|t| match t {
            Turn::Human(human) => Some(human.content.chars().take(TITLE_CHARS).collect()),
            _ => None,
        })
        .unwrap_or_else(|| "New conversation".to_string())
}
