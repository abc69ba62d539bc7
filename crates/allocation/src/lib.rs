//! # Allocation
//!
//! Turns a ranked selection into a target weight vector: equal weights across
//! the top `n`, each capped at a per-position maximum, with whatever the cap
//! leaves over swept into `CASH`.

pub mod builder;

pub use builder::AllocationBuilder;
