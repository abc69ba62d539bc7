//! # Core Types
//!
//! The shared vocabulary of the rebalancing advisor. Every other crate speaks in
//! these types: price histories go in, signals, weight vectors and trade
//! instructions come out, and a `RecommendationSnapshot` records one full run.
//!
//! This crate holds data only. It performs no I/O and owns no policy beyond the
//! small invariants of its containers (identifier normalisation, date ordering).

pub mod enums;
pub mod error;
pub mod ids;
pub mod market;
pub mod portfolio;
pub mod snapshot;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::TradeSide;
pub use error::CoreError;
pub use ids::{CASH, normalize_instrument};
pub use market::{PricePoint, PriceSeries};
pub use portfolio::{Holdings, WeightVector};
pub use snapshot::{RecommendationSnapshot, RunFailure, SignalOutcome};
pub use structs::{Exclusion, ExclusionReason, SkipReason, SkippedTrade, Signal, TradeInstruction};
