//! Resilience axis: extra rows for the two-stage outage workflow.
//!
//! Unlike the hydro and trade axes these rows are not composed into a single
//! build: the solve orchestrator emits the design-stage rows before the
//! first solve and the reserve rows before the second, re-bounding the same
//! variables in between.

use crate::linear::{LinExpr, LinearModel, Sense};
use crate::registry::ModelRegistry;
use std::collections::HashSet;
use std::ops::Range;

/// Design-stage rows: storage alone must ride through the outage window.
///
/// For every window hour the discharge-efficiency-adjusted stored energy
/// must cover the cumulative critical load of the remaining window; the
/// fleet must also carry the critical load in discharge power and hold a
/// full ride-through of energy.
pub fn emit_stage_a_rows(
    model: &mut LinearModel,
    reg: &ModelRegistry,
    window: &Range<usize>,
    critical_load_mw: f64,
) {
    let s = &reg.sym.storage;
    let techs = reg.storage_techs();

    for h in window.clone() {
        let mut expr = LinExpr::new();
        for (j, tech) in techs.iter().enumerate() {
            expr.add_term(s.soc[j][h], tech.sqrt_eff());
        }
        let remaining = (window.end - h) as f64;
        model.add_row(
            format!("BackupEnergy[{}]", h + 1),
            expr,
            Sense::Geq,
            remaining * critical_load_mw,
        );
    }

    let mut power = LinExpr::new();
    for j in 0..techs.len() {
        power.add_term(s.discharge_cap[j], 1.0);
    }
    model.add_row("BackupPower", power, Sense::Geq, critical_load_mw);

    let mut energy = LinExpr::new();
    for (j, tech) in techs.iter().enumerate() {
        energy.add_term(s.energy_cap[j], tech.sqrt_eff());
    }
    model.add_row(
        "BackupEnergyCap",
        energy,
        Sense::Geq,
        window.len() as f64 * critical_load_mw,
    );
}

/// Operation-stage reserve: outside the outage window (and a restore grace
/// period after it, while depleted storage refills), stored energy must
/// cover the rolling worst-case residual load of the next `backup_hours`
/// hours. The rolling window wraps with the cyclic hour order.
pub fn emit_stage_b_reserve(
    model: &mut LinearModel,
    reg: &ModelRegistry,
    window: &Range<usize>,
    restore_hours: usize,
    backup_hours: usize,
) {
    let n = reg.n_hours();
    let s = &reg.sym.storage;
    let techs = reg.storage_techs();

    let exempt: HashSet<usize> = (window.start..window.end + restore_hours)
        .map(|h| h % n)
        .collect();

    for h in 0..n {
        if exempt.contains(&h) {
            continue;
        }
        let mut expr = LinExpr::new();
        for (j, tech) in techs.iter().enumerate() {
            expr.add_term(s.soc[j][h], tech.sqrt_eff());
        }
        let mut rhs = 0.0;
        for step in 0..backup_hours {
            let hh = (h + step) % n;
            rhs += reg.demand(hh);
            // Residual load nets out full VRE availability: generation plus
            // curtailment of each technology.
            for (p, plant) in reg.pv_plants().iter().enumerate() {
                expr.add_term(reg.sym.pv.build[p], plant.availability_mw(hh));
            }
            for (w, plant) in reg.wind_plants().iter().enumerate() {
                expr.add_term(reg.sym.wind.build[w], plant.availability_mw(hh));
            }
        }
        model.add_row(format!("SocReserve[{}]", h + 1), expr, Sense::Geq, rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ModelRegistry;
    use crate::test_fixtures::{flat_cf_plant, unit_and_storage_bundle};
    use std::sync::Arc;

    #[test]
    fn test_backup_energy_counts_down_remaining_window() {
        let bundle = unit_and_storage_bundle(48, 30.0, 10.0);
        let mut model = LinearModel::new("t");
        let reg = ModelRegistry::declare(Arc::new(bundle), &mut model);
        emit_stage_a_rows(&mut model, &reg, &(10..16), 50.0);

        let first = model.row("BackupEnergy[11]").unwrap();
        assert_eq!(first.sense, Sense::Geq);
        assert!((first.rhs - 6.0 * 50.0).abs() < 1e-9);
        let last = model.row("BackupEnergy[16]").unwrap();
        assert!((last.rhs - 50.0).abs() < 1e-9);

        let cap = model.row("BackupEnergyCap").unwrap();
        assert!((cap.rhs - 6.0 * 50.0).abs() < 1e-9);
        let sqrt_eff = reg.storage_techs()[0].sqrt_eff();
        assert!((cap.expr.coefficient(reg.sym.storage.energy_cap[0]) - sqrt_eff).abs() < 1e-9);

        let power = model.row("BackupPower").unwrap();
        assert!((power.rhs - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_reserve_skips_window_and_grace() {
        let bundle = unit_and_storage_bundle(48, 30.0, 10.0);
        let mut model = LinearModel::new("t");
        let reg = ModelRegistry::declare(Arc::new(bundle), &mut model);
        emit_stage_b_reserve(&mut model, &reg, &(10..16), 4, 6);

        assert!(model.row("SocReserve[11]").is_none());
        assert!(model.row("SocReserve[16]").is_none());
        // Grace period covers hours 17-20 (0-based 16..20).
        assert!(model.row("SocReserve[20]").is_none());
        assert!(model.row("SocReserve[21]").is_some());
        assert!(model.row("SocReserve[1]").is_some());
    }

    #[test]
    fn test_reserve_rolls_over_residual_demand() {
        let mut bundle = unit_and_storage_bundle(24, 30.0, 10.0);
        bundle.pv_plants.push(flat_cf_plant("101", 0.5, 100.0, 24));
        let mut model = LinearModel::new("t");
        let reg = ModelRegistry::declare(Arc::new(bundle), &mut model);
        emit_stage_b_reserve(&mut model, &reg, &(0..2), 0, 4);

        let row = model.row("SocReserve[23]").unwrap();
        // Four hours of 30 MW demand.
        assert!((row.rhs - 120.0).abs() < 1e-9);
        // VRE availability offsets the residual: 4 hours * 50 MW on the
        // build fraction, moved to the left-hand side.
        assert!((row.expr.coefficient(reg.sym.pv.build[0]) - 200.0).abs() < 1e-9);
    }
}
