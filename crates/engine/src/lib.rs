//! # Engine Crate
//!
//! The recommendation orchestrator. It reads settings, holdings and prices
//! through ports, runs the signal, allocation and diff steps, and appends one
//! immutable snapshot per run.
//!
//! ## Architectural Principles
//!
//! - **Ports, Not Globals:** Every collaborator arrives as an `Arc<dyn Port>`.
//!   Production wiring lives in `adapters`; tests substitute in-memory fakes.
//! - **Failures Are Snapshots:** A missing price feed or unreadable store is
//!   recorded as a tagged snapshot, so the audit trail has no gaps.
//! - **One Run At A Time:** `RunGate` serialises the scheduler and manual
//!   triggers; the engine itself is stateless.

pub mod adapters;
pub mod error;
pub mod orchestrator;
pub mod ports;
pub mod runner;
pub mod scheduler;

pub use error::{EngineError, PortError};
pub use orchestrator::{Ports, RecommendationEngine, STANDARD_NOTES};
pub use ports::{HoldingsStore, PriceHistoryProvider, SettingsStore, SnapshotStore};
pub use runner::RunGate;
pub use scheduler::WeeklySchedule;
