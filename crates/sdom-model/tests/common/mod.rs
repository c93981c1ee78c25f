//! Shared checks for solved scenarios: the invariants every feasible
//! solution must satisfy, verified against the extracted tables.
#![allow(dead_code)]

use sdom_core::InputBundle;
use sdom_model::SdomResults;

pub const TOL: f64 = 1e-3;

pub fn assert_feasibility_invariants(results: &SdomResults, bundle: &InputBundle) {
    let solution = results
        .solution
        .as_ref()
        .expect("invariants require an extracted solution");

    // Hourly supply/demand balance, trade and storage included.
    for row in &solution.dispatch {
        let supply = row.solar_gen_mw
            + row.wind_gen_mw
            + row.thermal_mw
            + row.hydro_mw
            + row.nuclear_mw
            + row.other_renewables_mw
            + row.imports_mw
            - row.exports_mw
            - row.storage_net_mw;
        assert!(
            (supply - row.load_mw).abs() < TOL,
            "hour {}: supply {} != load {}",
            row.hour,
            supply,
            row.load_mw
        );
    }

    // Charge-xor-discharge and the SOC envelope.
    for row in &solution.storage {
        assert!(
            row.charge_mw.min(row.discharge_mw) < TOL,
            "hour {} {}: simultaneous charge {} and discharge {}",
            row.hour,
            row.technology,
            row.charge_mw,
            row.discharge_mw
        );
        assert!(row.soc_mwh > -TOL, "negative state of charge");
        let cap = solution
            .storage_capacity
            .iter()
            .find(|c| c.technology == row.technology)
            .unwrap();
        assert!(
            row.soc_mwh <= cap.energy_mwh + TOL,
            "hour {} {}: SOC {} above energy capacity {}",
            row.hour,
            row.technology,
            row.soc_mwh,
            cap.energy_mwh
        );
    }

    // Coupled power equality and the duration window.
    for (tech, cap) in bundle.storage.iter().zip(&solution.storage_capacity) {
        assert_eq!(tech.name, cap.technology);
        if tech.coupled {
            assert!(
                (cap.charge_mw - cap.discharge_mw).abs() < TOL,
                "{}: coupled charge {} != discharge {}",
                tech.name,
                cap.charge_mw,
                cap.discharge_mw
            );
        }
        let sqrt_eff = tech.sqrt_eff();
        assert!(
            cap.energy_mwh >= tech.min_duration_h * cap.discharge_mw / sqrt_eff - TOL,
            "{}: energy below the duration window",
            tech.name
        );
        assert!(
            cap.energy_mwh <= tech.max_duration_h * cap.discharge_mw / sqrt_eff + TOL,
            "{}: energy above the duration window",
            tech.name
        );
    }

    // Clean-energy cap with the net-load-adjusted denominator.
    let thermal: f64 = solution.dispatch.iter().map(|d| d.thermal_mw).sum();
    let demand: f64 = solution.dispatch.iter().map(|d| d.load_mw).sum();
    let storage_net: f64 = solution.dispatch.iter().map(|d| d.storage_net_mw).sum();
    let allowed = (1.0 - bundle.scalars.clean_target) * (demand + storage_net);
    assert!(
        thermal <= allowed + TOL * demand.max(1.0),
        "balancing energy {thermal} exceeds the clean-share allowance {allowed}"
    );

    // The decomposition reproduces the objective.
    let decomposed: f64 = solution
        .cost_decomposition
        .iter()
        .map(|(_, v)| v)
        .sum();
    assert!(
        (decomposed - solution.total_cost).abs() < solution.total_cost.abs().max(1.0) * 1e-4,
        "cost decomposition {decomposed} != total {}",
        solution.total_cost
    );
}

/// Net state-of-charge drift around the cyclic horizon must vanish.
pub fn assert_cyclic_soc_closure(results: &SdomResults, bundle: &InputBundle) {
    let solution = results.solution.as_ref().unwrap();
    for tech in &bundle.storage {
        let sqrt_eff = tech.sqrt_eff();
        let mut net = 0.0;
        for row in solution.storage.iter().filter(|r| r.technology == tech.name) {
            net += sqrt_eff * row.charge_mw - row.discharge_mw / sqrt_eff;
        }
        assert!(
            net.abs() < TOL * bundle.n_hours as f64,
            "{}: SOC drifts by {net} around the cycle",
            tech.name
        );
    }
}
