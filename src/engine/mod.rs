//! Reconciliation engine for vmpower
//!
//! The engine takes one inventory snapshot and the operator-chosen power-on
//! set, then brings the node in line:
//! 1. Diffing - the power-off set is the inventory minus the power-on set
//! 2. Executing - start/stop passes with parallelism and per-VM outcomes

pub mod differ;
pub mod executor;

pub use differ::{inventory_names, power_off_set};
pub use executor::{Action, Outcome, PassSummary, run_pass};
