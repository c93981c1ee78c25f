//! Hydro axis: run-of-river or budget-constrained dispatch.

use super::FormulationBlock;
use crate::linear::{LinExpr, LinearModel, Sense};
use crate::registry::{HydroDispatch, ModelRegistry};
use sdom_core::{HydroMode, SdomError, SdomResult};

/// Hydro pinned to the scaled historical profile. Contributes no variables
/// or rows; the balance reads the profile as a parameter.
pub struct RunOfRiverHydro;

impl FormulationBlock for RunOfRiverHydro {
    fn id(&self) -> &'static str {
        "run-of-river-hydro"
    }

    fn declare(&self, _model: &mut LinearModel, reg: &mut ModelRegistry) -> SdomResult<()> {
        reg.sym.hydro = HydroDispatch::Fixed;
        Ok(())
    }

    fn constraints(&self, _model: &mut LinearModel, _reg: &ModelRegistry) -> SdomResult<()> {
        Ok(())
    }
}

/// Hydro dispatched freely within hourly bounds, holding each budget
/// period's energy to the scaled profile total. Monthly and daily variants
/// differ only in how the horizon is partitioned.
pub struct BudgetHydro {
    mode: HydroMode,
}

impl BudgetHydro {
    pub fn new(mode: HydroMode) -> Self {
        debug_assert!(mode.is_budgeted());
        Self { mode }
    }
}

impl FormulationBlock for BudgetHydro {
    fn id(&self) -> &'static str {
        match self.mode {
            HydroMode::MonthlyBudget => "monthly-budget-hydro",
            _ => "daily-budget-hydro",
        }
    }

    fn declare(&self, model: &mut LinearModel, reg: &mut ModelRegistry) -> SdomResult<()> {
        let bounds = reg.bundle().hydro_bounds.clone().ok_or_else(|| {
            SdomError::Config("budget hydro requires lahy_max/lahy_min bounds".into())
        })?;
        let alpha = reg.bundle().scalars.alpha_hydro;
        let vars = (0..reg.n_hours())
            .map(|h| {
                model.add_var(
                    format!("GenHydro[{}]", h + 1),
                    alpha * bounds.lower_mw[h],
                    alpha * bounds.upper_mw[h],
                )
            })
            .collect();
        reg.sym.hydro = HydroDispatch::Scheduled(vars);
        Ok(())
    }

    fn constraints(&self, model: &mut LinearModel, reg: &ModelRegistry) -> SdomResult<()> {
        let HydroDispatch::Scheduled(vars) = &reg.sym.hydro else {
            return Err(SdomError::Other(
                "budget hydro constraints emitted before its variables".into(),
            ));
        };
        for (b, period) in self.mode.budget_periods(reg.n_hours())?.iter().enumerate() {
            let budget: f64 = period.clone().map(|h| reg.hydro_scaled(h)).sum();
            let mut expr = LinExpr::new();
            for h in period.clone() {
                expr.add_term(vars[h], 1.0);
            }
            model.add_row(format!("HydroBudget[{}]", b + 1), expr, Sense::Eq, budget);
        }
        Ok(())
    }
}
