//! Server application state shared across handlers

use crate::chat::ChatService;
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::generation::{ChatResponder, ResearchGenerator};
use crate::orchestrator::Orchestrator;
use crate::shutdown::ShutdownState;
use crate::storage::{ChatStore, DocumentWorkspace, ReportStore};
use std::sync::Arc;

/// Shared state for the server: the stores, the orchestrator, and the chat
/// engine, all as explicit injected objects with lifecycle tied to the
/// service process.
#[derive(Clone)]
pub struct ServerAppState {
    /// Report store (durable id -> report mapping)
    pub reports: Arc<ReportStore>,

    /// Chat session store (per-report transcripts)
    pub chats: Arc<ChatStore>,

    /// Uploaded-document workspace
    pub documents: Arc<DocumentWorkspace>,

    /// Job orchestrator (generation task lifecycle)
    pub orchestrator: Arc<Orchestrator>,

    /// Chat engine over completed reports
    pub chat_service: Arc<ChatService>,

    /// Shutdown state
    pub shutdown_state: ShutdownState,
}

impl ServerAppState {
    /// Build the full state graph from configuration and the two external
    /// generation collaborators.
    pub fn new(
        config: &ServerConfig,
        generator: Arc<dyn ResearchGenerator>,
        responder: Arc<dyn ChatResponder>,
    ) -> Result<Self, ApiError> {
        let reports = Arc::new(ReportStore::open(&config.data_dir)?);
        let chats = Arc::new(ChatStore::open(&config.data_dir)?);
        let documents = Arc::new(DocumentWorkspace::new(config.doc_path.clone()));

        let orchestrator = Arc::new(Orchestrator::new(
            reports.clone(),
            chats.clone(),
            documents.clone(),
            generator,
        ));

        let chat_service = Arc::new(ChatService::new(reports.clone(), chats.clone(), responder));

        Ok(Self {
            reports,
            chats,
            documents,
            orchestrator,
            chat_service,
            shutdown_state: ShutdownState::new(),
        })
    }
}
