//! Objective assembly: the annualized total-cost expression, built term by
//! term into a ledger so the extractor can report the same decomposition the
//! objective was minimized over.

use crate::formulations::FormulationBlock;
use crate::linear::LinExpr;
use crate::registry::ModelRegistry;
use sdom_core::MW_TO_KW;

/// Labeled cost terms whose sum is the objective.
#[derive(Debug, Clone, Default)]
pub struct CostLedger {
    entries: Vec<(String, LinExpr)>,
}

impl CostLedger {
    pub fn push(&mut self, label: impl Into<String>, expr: LinExpr) {
        self.entries.push((label.into(), expr));
    }

    pub fn entries(&self) -> &[(String, LinExpr)] {
        &self.entries
    }

    /// The full objective expression.
    pub fn total(&self) -> LinExpr {
        let mut total = LinExpr::new();
        for (_, expr) in &self.entries {
            total += expr.clone();
        }
        total
    }

    /// Evaluate every entry against a primal value vector.
    pub fn evaluate(&self, values: &[f64]) -> Vec<(String, f64)> {
        self.entries
            .iter()
            .map(|(label, expr)| (label.clone(), expr.value(values)))
            .collect()
    }
}

/// Build the cost ledger: VRE, storage and balancing terms plus whatever the
/// active sub-formulations contribute (trade).
pub fn assemble(reg: &ModelRegistry, blocks: &[Box<dyn FormulationBlock>]) -> CostLedger {
    let mut ledger = CostLedger::default();
    let crf_vre = reg.crf_vre();
    let r = reg.discount_rate();

    // VRE: CAPEX and transmission CAPEX are annualized together through the
    // shared VRE recovery factor; FOM is a plain annual cost.
    for (label, plants, build) in [
        ("Solar PV", reg.pv_plants(), &reg.sym.pv.build),
        ("Wind", reg.wind_plants(), &reg.sym.wind.build),
    ] {
        let mut capex = LinExpr::new();
        let mut fom = LinExpr::new();
        for (p, plant) in plants.iter().enumerate() {
            capex.add_term(
                build[p],
                crf_vre
                    * (MW_TO_KW * plant.capex_per_kw + plant.trans_cap_cost)
                    * plant.capacity_mw,
            );
            fom.add_term(
                build[p],
                MW_TO_KW * plant.fom_per_kw_yr * plant.capacity_mw,
            );
        }
        ledger.push(format!("{label} CAPEX"), capex);
        ledger.push(format!("{label} FOM"), fom);
    }

    // Storage: power cost split by the cost ratio between the charge and
    // discharge sides; VOM charged on discharge only.
    for (j, tech) in reg.storage_techs().iter().enumerate() {
        let crf = tech.crf(r);
        let charge_cap = reg.sym.storage.charge_cap[j];
        let discharge_cap = reg.sym.storage.discharge_cap[j];

        let mut power_capex = LinExpr::new();
        power_capex.add_term(
            charge_cap,
            crf * MW_TO_KW * tech.cost_ratio * tech.p_capex_per_kw,
        );
        power_capex.add_term(
            discharge_cap,
            crf * MW_TO_KW * (1.0 - tech.cost_ratio) * tech.p_capex_per_kw,
        );
        ledger.push(format!("{} Power-CAPEX", tech.name), power_capex);

        ledger.push(
            format!("{} Energy-CAPEX", tech.name),
            LinExpr::term(
                reg.sym.storage.energy_cap[j],
                crf * MW_TO_KW * tech.e_capex_per_kwh,
            ),
        );

        let mut fom = LinExpr::new();
        fom.add_term(charge_cap, MW_TO_KW * tech.cost_ratio * tech.fom_per_kw_yr);
        fom.add_term(
            discharge_cap,
            MW_TO_KW * (1.0 - tech.cost_ratio) * tech.fom_per_kw_yr,
        );
        ledger.push(format!("{} FOM", tech.name), fom);

        let mut vom = LinExpr::new();
        for h in 0..reg.n_hours() {
            vom.add_term(reg.sym.storage.discharge[j][h], tech.vom_per_mwh);
        }
        ledger.push(format!("{} VOM", tech.name), vom);
    }

    // Balancing units.
    let mut capex = LinExpr::new();
    let mut fom = LinExpr::new();
    let mut fuel = LinExpr::new();
    let mut vom = LinExpr::new();
    for (k, unit) in reg.balancing_units().iter().enumerate() {
        let cap = reg.sym.balancing.capacity[k];
        capex.add_term(cap, unit.crf(r) * MW_TO_KW * unit.capex_per_kw);
        fom.add_term(cap, MW_TO_KW * unit.fom_per_kw_yr);
        for h in 0..reg.n_hours() {
            let gen = reg.sym.balancing.gen[k][h];
            fuel.add_term(gen, unit.fuel_price * unit.heat_rate);
            vom.add_term(gen, unit.vom_per_mwh);
        }
    }
    ledger.push("Thermal CAPEX", capex);
    ledger.push("Thermal FOM", fom);
    ledger.push("Thermal Fuel", fuel);
    ledger.push("Thermal VOM", vom);

    for block in blocks {
        for (label, expr) in block.objective_terms(reg) {
            ledger.push(label, expr);
        }
    }

    ledger
}
