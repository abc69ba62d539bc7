//! # Signal Library
//!
//! Ranks a universe of instruments by risk-adjusted momentum: total return over
//! a long lookback divided by annualised volatility over a shorter one.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of databases, HTTP or clocks.
//!   It depends only on `core-types` and `configuration`.
//! - **Explicit Outcomes:** Every instrument in the input is either ranked or
//!   reported as an `Exclusion` with a reason. Nothing is dropped silently, and
//!   "not enough history" is a result, not an error.
//! - **Deterministic:** Same prices and parameters, same ranking. Ties are
//!   broken by instrument identifier.
//!
//! ## Public API
//!
//! - `SignalEngine`: validated parameters plus the `rank` operation.
//! - `SignalSet`: the ranked signals, the exclusions and the outcome tag.
//! - `metrics`: the momentum and volatility primitives.

pub mod engine;
pub mod error;
pub mod metrics;

pub use engine::{SignalEngine, SignalParams, SignalSet};
pub use error::SignalError;
