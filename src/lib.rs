#![allow(clippy::too_many_arguments)] // Handlers and constructors take the full state graph

// Module declarations
pub mod chat;
pub mod config;
pub mod error;
pub mod generation;
pub mod models;
pub mod orchestrator;
pub mod shutdown;
pub mod storage;

// Server module (HTTP API)
pub mod server;

// Re-export the core surface for embedding and tests
pub use chat::ChatService;
pub use error::ApiError;
pub use orchestrator::{Orchestrator, SubmitOutcome};
pub use storage::{ChatStore, DocumentWorkspace, ReportStore};
