//! # sdom-model: Formulation and solve layer
//!
//! Builds the capacity-expansion + chronological-dispatch MILP from an input
//! bundle, solves it (once, or twice for the resilience workflow), and
//! extracts structured results.
//!
//! ## Problem Overview
//!
//! ```text
//! minimize    annualized VRE + storage + balancing (+ trade) cost
//!
//! subject to:
//!   hourly supply/demand balance (copper plate)
//!   clean-energy share of net-adjusted demand
//!   per-technology VRE balance with free curtailment
//!   balancing dispatch within built capacity
//!   storage envelope: charge-xor-discharge, cyclic SOC,
//!                     duration window, cycle-life cap
//!   hydro budget / trade gating per the selected sub-formulations
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sdom_model::{build_model, export_results, solve, SolverConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut model = build_model(std::path::Path::new("cases/base"), 8760, false, "base")?;
//!     let results = solve(&mut model, &SolverConfig::default())?;
//!     if results.is_optimal() {
//!         export_results(&results, std::path::Path::new("results"))?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! The model is plain data ([`linear::LinearModel`]): builders read from the
//! symbol registry and append rows; the solver backends materialize the IR
//! only at solve time. This is what lets the two-stage resilience workflow
//! re-bound existing variables between stages instead of rebuilding them.

pub mod backend;
pub mod constraints;
pub mod export;
pub mod formulations;
pub mod linear;
pub mod objective;
pub mod registry;
pub mod results;
pub mod solve;
pub mod test_fixtures;

pub use backend::{backend_for, MilpBackend, SolveStatus, SolverConfig, SolverOutcome};
pub use export::export_results;
pub use results::{
    DispatchRow, PlantBuild, SdomResults, SolutionData, StorageCapacity, StorageRow, SummaryRow,
};
pub use solve::{build_model, solve, SdomModel};
