//! # Database Crate
//!
//! The persistent side of the advisor: portfolio settings, paper holdings and
//! the append-only archive of recommendation snapshots, all in one SQLite file.
//!
//! ## Architectural Principles
//!
//! - **Adapter:** All SQL lives here. The rest of the application sees typed
//!   values (`PortfolioSettings`, `Holdings`, `RecommendationSnapshot`) and
//!   never a row.
//! - **Forgiving Reads:** A missing or garbled setting falls back to its
//!   default and every value read back is clamped, so a hand-edited database
//!   cannot push an out-of-range parameter into a run.
//! - **Append-Only Snapshots:** Recommendations are inserted, never updated.
//!
//! ## Public API
//!
//! - `connect`: The async function to establish the database connection pool.
//! - `run_migrations`: Applies the embedded schema.
//! - `DbRepository`: All high-level data access methods.
//! - `DbError`: The specific error types that can be returned from this crate.

pub mod connection;
pub mod error;
pub mod repository;

pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use repository::{DbRepository, snapshot_key};
