use thiserror::Error;
use uuid::Uuid;

/// A collaborator behind one of the engine's ports failed.
#[derive(Error, Debug)]
pub enum PortError {
    #[error("API client error: {0}")]
    ApiClient(#[from] api_client::error::ApiError),

    #[error("Database error: {0}")]
    Database(#[from] database::DbError),

    #[error("{0}")]
    Unavailable(String),
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Signal engine error: {0}")]
    Signal(#[from] signals::SignalError),

    #[error("Snapshot for run {run_id} could not be saved: {source}")]
    SnapshotNotSaved {
        run_id: Uuid,
        #[source]
        source: PortError,
    },
}
