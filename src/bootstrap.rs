//! Wires configuration into a ready-to-serve [`AppState`].
//!
//! Every collaborator is chosen here from [`AppConfig`]: checkpoint backend,
//! artifact persistence, retrieval service, credential lookup and the
//! workflow document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::adapters::ai::ProviderResolver;
use crate::adapters::credentials::LaravelCredentialSource;
use crate::adapters::http::AppState;
use crate::adapters::knowledge::{HttpKnowledgeBase, UnconfiguredKnowledgeBase};
use crate::adapters::persistence::{ArtifactCache, CachedArtifactSink, MySqlArtifactSink};
use crate::adapters::storage::{FileCheckpointStore, InMemoryCheckpointStore, RedisCheckpointStore};
use crate::adapters::tools::{SaveArtifactTool, SearchKnowledgeBaseTool};
use crate::application::{AgentStep, ConversationDriver, ToolDispatcher};
use crate::config::{AppConfig, CheckpointBackend};
use crate::domain::agents::{Workflow, WorkflowError};
use crate::ports::{
    ArtifactSink, ArtifactSinkError, CheckpointError, CheckpointStore, KnowledgeBase,
    KnowledgeBaseError, ReasoningResolver, ToolHandler,
};

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Cannot read workflow file {path}: {source}")]
    WorkflowFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid workflow: {0}")]
    Workflow(#[from] WorkflowError),

    #[error("Checkpoint store unavailable: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Artifact database unavailable: {0}")]
    ArtifactSink(#[from] ArtifactSinkError),

    #[error("Knowledge base client failed: {0}")]
    KnowledgeBase(#[from] KnowledgeBaseError),

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

/// Builds every collaborator and the HTTP state around one driver.
pub async fn build_app_state(config: &AppConfig) -> Result<AppState, BootstrapError> {
    // ── Workflow ─────────────────────────────────────────────────────
    let workflow = Arc::new(load_workflow(config.engine.workflow_file.as_deref())?);
    tracing::info!(
        entry_agent = %workflow.entry_agent,
        agents = workflow.agents.len(),
        "workflow loaded"
    );

    // ── Checkpoints ──────────────────────────────────────────────────
    let store = build_checkpoint_store(config).await?;

    // ── Artifacts ────────────────────────────────────────────────────
    let sink = build_artifact_sink(config).await?;

    // ── Tools ────────────────────────────────────────────────────────
    let knowledge_base = build_knowledge_base(config)?;
    let dispatcher = Arc::new(build_dispatcher(sink.clone(), knowledge_base, config.knowledge.top_k));
    for tool in workflow.tool_names() {
        if !dispatcher.contains(tool) {
            tracing::warn!(tool = %tool, "workflow offers a tool with no handler");
        }
    }

    // ── Model resolution ─────────────────────────────────────────────
    let resolver = build_resolver(config);

    let driver = Arc::new(ConversationDriver::new(
        store,
        resolver.clone(),
        dispatcher,
        sink.clone(),
        workflow,
        &config.engine,
    )
    .with_agent_step(AgentStep::new(config.ai.max_tokens, config.ai.temperature)));
    tracing::info!(
        max_iterations = config.engine.max_iterations,
        lock_policy = ?config.engine.lock_policy,
        "conversation driver ready"
    );

    Ok(AppState::new(driver, resolver, sink, &config.ai))
}

/// The configured workflow document, or the built-in two-agent workflow.
pub fn load_workflow(path: Option<&Path>) -> Result<Workflow, BootstrapError> {
    match path {
        Some(path) => {
            let document = std::fs::read_to_string(path).map_err(|source| BootstrapError::WorkflowFile {
                path: path.to_path_buf(),
                source,
            })?;
            Ok(Workflow::from_yaml(&document)?)
        }
        None => Ok(Workflow::reference()?),
    }
}

async fn build_checkpoint_store(config: &AppConfig) -> Result<Arc<dyn CheckpointStore>, BootstrapError> {
    let store: Arc<dyn CheckpointStore> = match config.checkpoint.backend {
        CheckpointBackend::Memory => {
            tracing::warn!("in-memory checkpoints: conversations are lost on restart");
            Arc::new(InMemoryCheckpointStore::new())
        }
        CheckpointBackend::File => {
            tracing::info!(path = %config.checkpoint.data_dir.display(), "file checkpoints ready");
            Arc::new(FileCheckpointStore::new(&config.checkpoint.data_dir))
        }
        CheckpointBackend::Redis => {
            let url = config
                .redis
                .url()
                .ok_or(BootstrapError::MissingConfig("IDEA_AGENT__REDIS__URL"))?;
            let store = RedisCheckpointStore::connect(
                url,
                config.checkpoint.key_prefix.clone(),
                config.redis.timeout(),
            )
            .await?;
            tracing::info!(prefix = %config.checkpoint.key_prefix, "redis checkpoints ready");
            Arc::new(store)
        }
    };
    Ok(store)
}

async fn build_artifact_sink(config: &AppConfig) -> Result<Arc<dyn ArtifactSink>, BootstrapError> {
    let mut sink = CachedArtifactSink::new(Arc::new(ArtifactCache::new()));

    match config.database.url() {
        Some(url) => {
            let mysql = MySqlArtifactSink::connect_lazy(&config.database, url)?;
            if let Err(e) = mysql.ensure_schema().await {
                tracing::warn!(error = %e, "artifact tables not verified; writes stay cached until MySQL recovers");
            }
            sink = sink.with_backend(Arc::new(mysql));
            tracing::info!("artifact write-behind to MySQL enabled");
        }
        None => tracing::info!("no database configured; artifacts are cached in memory only"),
    }

    Ok(Arc::new(sink))
}

fn build_knowledge_base(config: &AppConfig) -> Result<Arc<dyn KnowledgeBase>, BootstrapError> {
    let kb: Arc<dyn KnowledgeBase> = match config.knowledge.base_url() {
        Some(url) => {
            tracing::info!(url = %url, index = %config.knowledge.index_name, "knowledge base client ready");
            Arc::new(HttpKnowledgeBase::new(
                url,
                config.knowledge.index_name.clone(),
                config.knowledge.timeout(),
            )?)
        }
        None => {
            tracing::info!("no knowledge base configured; searches return an error result");
            Arc::new(UnconfiguredKnowledgeBase)
        }
    };
    Ok(kb)
}

/// Handlers for every tool the engine knows.
pub fn build_dispatcher(
    sink: Arc<dyn ArtifactSink>,
    knowledge_base: Arc<dyn KnowledgeBase>,
    top_k: usize,
) -> ToolDispatcher {
    let handlers: Vec<Arc<dyn ToolHandler>> = vec![
        Arc::new(SaveArtifactTool::requirements(sink.clone())),
        Arc::new(SaveArtifactTool::solution(sink)),
        Arc::new(SearchKnowledgeBaseTool::new(knowledge_base, top_k)),
    ];
    ToolDispatcher::new(handlers)
}

fn build_resolver(config: &AppConfig) -> Arc<dyn ReasoningResolver> {
    let mut resolver = ProviderResolver::new(config.ai.clone());
    match config.credentials.base_url() {
        Some(url) => {
            tracing::info!(url = %url, "per-user AI credentials enabled");
            resolver = resolver.with_credentials(Arc::new(LaravelCredentialSource::new(
                url,
                config.credentials.cache_ttl(),
            )));
        }
        None if !config.ai.has_openai() && !config.ai.has_anthropic() => {
            tracing::warn!("no AI keys configured; requests must carry provider_config");
        }
        None => {}
    }
    Arc::new(resolver)
}
