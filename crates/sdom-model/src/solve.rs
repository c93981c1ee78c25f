//! Solve orchestration: build a model from a case, run the single-shot or
//! two-stage solve, and extract results.
//!
//! A model instance owns its symbol registry and constraint list for its
//! whole solve. Between resilience stages the orchestrator re-parameterizes
//! through registry overrides and re-bounds existing variables; no variable
//! is ever recreated.

use crate::backend::{backend_for, MilpBackend, SolveStatus, SolverConfig, SolverOutcome};
use crate::constraints;
use crate::formulations::{blocks_for, resilience, FormulationBlock};
use crate::linear::LinearModel;
use crate::objective::{self, CostLedger};
use crate::registry::{HydroDispatch, ModelRegistry, StageOverrides};
use crate::results::{extract, SdomResults};
use sdom_core::{InputBundle, SdomError, SdomResult};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// A built model, ready to solve.
pub struct SdomModel {
    name: String,
    bundle: Arc<InputBundle>,
    registry: ModelRegistry,
    linear: LinearModel,
    ledger: CostLedger,
    blocks: Vec<Box<dyn FormulationBlock>>,
    resilience: bool,
}

impl std::fmt::Debug for SdomModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdomModel")
            .field("name", &self.name)
            .field("bundle", &self.bundle)
            .field("registry", &self.registry)
            .field("linear", &self.linear)
            .field("ledger", &self.ledger)
            .field("blocks", &self.blocks.iter().map(|b| b.id()).collect::<Vec<_>>())
            .field("resilience", &self.resilience)
            .finish()
    }
}

/// Load a case directory and build a model over `n_hours` hours.
pub fn build_model(
    input_dir: &Path,
    n_hours: usize,
    resilience: bool,
    name: &str,
) -> SdomResult<SdomModel> {
    let bundle = sdom_io::load_case(input_dir, n_hours)?;
    SdomModel::from_bundle(bundle, resilience, name)
}

/// Solve a built model and extract results. Termination conditions other
/// than optimal are reported on the results object; only backend failures
/// surface as errors.
pub fn solve(model: &mut SdomModel, config: &SolverConfig) -> SdomResult<SdomResults> {
    let backend = backend_for(config)?;
    if model.resilience {
        model.solve_two_stage(backend.as_ref(), config)
    } else {
        model.solve_single(backend.as_ref(), config)
    }
}

impl SdomModel {
    /// Build from an already-loaded bundle: declare every symbol, let the
    /// selected sub-formulations contribute theirs, and assemble the cost
    /// ledger.
    pub fn from_bundle(bundle: InputBundle, resilience: bool, name: &str) -> SdomResult<Self> {
        if resilience && bundle.resilience.is_none() {
            return Err(SdomError::Config(
                "resilience solve requested but the Scalars table has no outage parameters".into(),
            ));
        }
        let bundle = Arc::new(bundle);
        let mut linear = LinearModel::new(name);
        let mut registry = ModelRegistry::declare(bundle.clone(), &mut linear);
        let blocks = blocks_for(bundle.formulations);
        for block in &blocks {
            block.declare(&mut linear, &mut registry)?;
        }
        let ledger = objective::assemble(&registry, &blocks);
        info!(
            model = name,
            columns = linear.stats().columns,
            binaries = linear.stats().binaries,
            "model declared"
        );
        Ok(Self {
            name: name.to_string(),
            bundle,
            registry,
            linear,
            ledger,
            blocks,
            resilience,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bundle(&self) -> &InputBundle {
        &self.bundle
    }

    pub fn stats(&self) -> crate::linear::ModelStats {
        self.linear.stats()
    }

    /// Emit the default row set: common system constraints plus the active
    /// sub-formulation rows.
    fn assemble_default_rows(&mut self) -> SdomResult<()> {
        self.linear.clear_rows();
        constraints::assemble_system(&mut self.linear, &self.registry, true)?;
        for block in &self.blocks {
            block.constraints(&mut self.linear, &self.registry)?;
        }
        self.linear.set_objective(self.ledger.total());
        Ok(())
    }

    fn solve_single(
        &mut self,
        backend: &dyn MilpBackend,
        config: &SolverConfig,
    ) -> SdomResult<SdomResults> {
        self.assemble_default_rows()?;
        // The operation stage of the resilience workflow must oversize
        // balancing to refill depleted storage, so this cap is single-stage
        // only.
        constraints::emit_peak_residual_cap(&mut self.linear, &self.registry);
        let outcome = backend.solve(&self.linear, config)?;
        self.report(&outcome)
    }

    fn solve_two_stage(
        &mut self,
        backend: &dyn MilpBackend,
        config: &SolverConfig,
    ) -> SdomResult<SdomResults> {
        let res = self
            .bundle
            .resilience
            .clone()
            .ok_or_else(|| SdomError::Config("missing resilience scalars".into()))?;
        let n = self.bundle.n_hours;
        let window = res.outage_window(n)?;
        let critical_load = res.critical_load(&self.bundle.demand_mw);
        info!(
            outage_start = window.start + 1,
            backup_hours = res.backup_hours,
            critical_load,
            "resilience design stage"
        );

        // ---- Stage A: size storage to ride through the outage alone. ----
        let mut stage_demand = vec![0.0; n];
        for h in window.clone() {
            stage_demand[h] = critical_load;
        }
        self.registry.set_overrides(StageOverrides {
            demand: Some(stage_demand),
            alpha_nuclear: Some(0.0),
            alpha_hydro: Some(0.0),
            alpha_other: Some(0.0),
            clean_target: Some(0.0),
        });
        for &build in self
            .registry
            .sym
            .pv
            .build
            .iter()
            .chain(self.registry.sym.wind.build.iter())
        {
            self.linear.fix(build, 0.0);
        }
        for &cap in &self.registry.sym.balancing.capacity {
            self.linear.fix(cap, 0.0);
        }
        if let Some(trade) = &self.registry.sym.trade {
            for &var in trade.imports.iter().chain(trade.exports.iter()) {
                self.linear.fix(var, 0.0);
            }
        }
        if let HydroDispatch::Scheduled(vars) = &self.registry.sym.hydro {
            for &var in vars {
                self.linear.fix(var, 0.0);
            }
        }

        self.linear.clear_rows();
        // The design stage keeps the hourly machinery but leaves the initial
        // state of charge free: the outage may land anywhere in the year.
        constraints::assemble_system(&mut self.linear, &self.registry, false)?;
        resilience::emit_stage_a_rows(&mut self.linear, &self.registry, &window, critical_load);
        self.linear.set_objective(self.ledger.total());

        let design = backend.solve(&self.linear, config)?;
        if design.status != SolveStatus::Optimal {
            warn!(status = ?design.status, "design stage did not reach optimality");
            return self.report(&design);
        }
        let design_values = design
            .values
            .as_ref()
            .ok_or_else(|| SdomError::Solver("design stage returned no solution".into()))?;

        // ---- Transition: carry sizings as lower bounds, restore the year. ----
        self.registry.clear_overrides();
        let sym = &self.registry.sym;
        for (j, _) in self.registry.storage_techs().iter().enumerate() {
            for &(cap, sized) in &[
                (sym.storage.charge_cap[j], design_values[sym.storage.charge_cap[j].index()]),
                (
                    sym.storage.discharge_cap[j],
                    design_values[sym.storage.discharge_cap[j].index()],
                ),
                (
                    sym.storage.energy_cap[j],
                    design_values[sym.storage.energy_cap[j].index()],
                ),
            ] {
                let (_, upper) = self.linear.bounds(cap);
                self.linear.set_lower_bound(cap, sized.max(0.0).min(upper));
            }
        }
        for &build in sym.pv.build.iter().chain(sym.wind.build.iter()) {
            self.linear.set_bounds(build, 0.0, 1.0);
        }
        for (k, unit) in self.registry.balancing_units().iter().enumerate() {
            self.linear.set_bounds(
                sym.balancing.capacity[k],
                unit.min_capacity_mw,
                unit.max_capacity_mw,
            );
            for h in 0..n {
                if window.contains(&h) {
                    // No balancing generation during the designated outage.
                    self.linear.fix(sym.balancing.gen[k][h], 0.0);
                } else {
                    self.linear.set_bounds(sym.balancing.gen[k][h], 0.0, f64::INFINITY);
                }
            }
        }
        if let (Some(trade), Some(series)) = (&sym.trade, self.bundle.trade.as_ref()) {
            for h in 0..n {
                self.linear.set_bounds(trade.imports[h], 0.0, series.import_cap_mw[h]);
                self.linear.set_bounds(trade.exports[h], 0.0, series.export_cap_mw[h]);
            }
        }
        if let (HydroDispatch::Scheduled(vars), Some(bounds)) =
            (&self.registry.sym.hydro, self.bundle.hydro_bounds.as_ref())
        {
            let alpha = self.bundle.scalars.alpha_hydro;
            for (h, &var) in vars.iter().enumerate() {
                self.linear
                    .set_bounds(var, alpha * bounds.lower_mw[h], alpha * bounds.upper_mw[h]);
            }
        }

        // ---- Stage B: full-year co-optimization with the SOC reserve. ----
        info!("resilience operation stage");
        self.assemble_default_rows()?;
        resilience::emit_stage_b_reserve(
            &mut self.linear,
            &self.registry,
            &window,
            res.soc_restore_hours,
            res.backup_hours,
        );
        let outcome = backend.solve(&self.linear, config)?;
        self.report(&outcome)
    }

    fn report(&self, outcome: &SolverOutcome) -> SdomResult<SdomResults> {
        match outcome.status {
            SolveStatus::Optimal => {}
            status => warn!(?status, "solver finished without an optimal solution"),
        }
        Ok(extract(
            &self.name,
            &self.registry,
            &self.ledger,
            self.linear.stats(),
            outcome,
        ))
    }
}
