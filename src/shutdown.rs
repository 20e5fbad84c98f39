// Graceful shutdown handling for signal trapping

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared shutdown state across the application
#[derive(Clone)]
pub struct ShutdownState {
    /// Flag indicating shutdown has been requested
    shutdown_requested: Arc<AtomicBool>,
}

impl ShutdownState {
    /// Create a new shutdown state
    pub fn new() -> Self {
        Self {
            shutdown_requested: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Request a shutdown
    pub fn request_shutdown(&self) {
        self.shutdown_requested.store(true, Ordering::SeqCst);
        log::info!("Shutdown requested");
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Reset shutdown state (for testing)
    pub fn reset(&self) {
        self.shutdown_requested.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownState {
    fn default() -> Self {
        Self::new()
    }
}
