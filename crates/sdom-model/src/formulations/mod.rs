//! Pluggable sub-formulations.
//!
//! Each variant contributes extra variables, constraints, and objective
//! terms through the [`FormulationBlock`] trait; the model builder composes
//! whatever the formulation map selected. At most one variant per axis is
//! active.

mod hydro;
pub mod resilience;
mod trade;

pub use hydro::{BudgetHydro, RunOfRiverHydro};
pub use trade::PriceNetLoadTrade;

use crate::linear::{LinExpr, LinearModel};
use crate::registry::ModelRegistry;
use sdom_core::{FormulationMap, HydroMode, SdomResult};

/// A variant-specific block of the model.
///
/// `declare` adds the block's variables and records their handles in the
/// registry; `constraints` emits its rows; `objective_terms` returns labeled
/// cost contributions for the ledger.
pub trait FormulationBlock {
    fn id(&self) -> &'static str;

    fn declare(&self, model: &mut LinearModel, reg: &mut ModelRegistry) -> SdomResult<()>;

    fn constraints(&self, model: &mut LinearModel, reg: &ModelRegistry) -> SdomResult<()>;

    fn objective_terms(&self, _reg: &ModelRegistry) -> Vec<(String, LinExpr)> {
        Vec::new()
    }
}

/// Instantiate the blocks selected by the formulation map, in a fixed axis
/// order (hydro, then trade) so row emission stays deterministic.
pub fn blocks_for(map: FormulationMap) -> Vec<Box<dyn FormulationBlock>> {
    let mut blocks: Vec<Box<dyn FormulationBlock>> = Vec::new();
    match map.hydro {
        HydroMode::RunOfRiver => blocks.push(Box::new(RunOfRiverHydro)),
        mode => blocks.push(Box::new(BudgetHydro::new(mode))),
    }
    if map.trade.is_enabled() {
        blocks.push(Box::new(PriceNetLoadTrade));
    }
    blocks
}
