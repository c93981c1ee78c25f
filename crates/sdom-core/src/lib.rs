//! # sdom-core: Shared data model for the storage deployment optimizer
//!
//! Core types used across the workspace: the immutable [`InputBundle`]
//! produced by the case loader, formulation selection enums, the unified
//! [`SdomError`] type, and unit/financial helpers.
//!
//! The model-building and solving layers live in `sdom-model`; CSV parsing
//! of case directories lives in `sdom-io`. This crate has no I/O of its own.

mod bundle;
mod error;
mod formulation;
mod units;

pub use bundle::{
    BalancingUnit, HydroBounds, InputBundle, ResilienceScalars, StorageTech, SystemScalars,
    TradeSeries, VrePlant,
};
pub use error::{SdomError, SdomResult};
pub use formulation::{FormulationMap, HydroMode, TradeMode, DAY_HOURS, MONTH_HOURS};
pub use units::{capital_recovery_factor, MW_TO_KW};
