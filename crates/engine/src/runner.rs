use crate::error::EngineError;
use crate::orchestrator::RecommendationEngine;
use core_types::RecommendationSnapshot;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Serialises recommendation runs. The scheduler and manual triggers share
/// one gate, so two runs never interleave their reads and writes.
pub struct RunGate {
    engine: Arc<RecommendationEngine>,
    lock: Mutex<()>,
}

impl RunGate {
    pub fn new(engine: Arc<RecommendationEngine>) -> Self {
        Self {
            engine,
            lock: Mutex::new(()),
        }
    }

    /// Waits for any run in progress to finish, then runs.
    pub async fn run(&self) -> Result<RecommendationSnapshot, EngineError> {
        let _guard = self.lock.lock().await;
        self.engine.run().await
    }

    /// True while a run holds the gate.
    pub fn is_running(&self) -> bool {
        self.lock.try_lock().is_err()
    }
}
