//! # Portfolio Crate
//!
//! Values a set of holdings at last known prices and diffs it against a target
//! allocation, producing the ordered list of trades that would close the gap.
//!
//! ## Architectural Principles
//!
//! - **Valuation vs. Diffing:** `value_holdings` only measures the portfolio.
//!   `PortfolioDiffer` consumes that measurement and a target, and decides what
//!   to trade. Neither mutates the holdings; executing trades is out of scope.
//! - **Missing Prices Are Data:** An instrument without a usable price is left
//!   out of the valuation and reported as a skipped trade, never guessed at.
//!
//! ## Public API
//!
//! - `value_holdings` / `Valuation`: total value and current weights.
//! - `PortfolioDiffer` / `RebalancePlan`: the ordered trade list.

pub mod differ;
pub mod valuation;

pub use differ::{PortfolioDiffer, RebalancePlan};
pub use valuation::{Valuation, value_holdings};
