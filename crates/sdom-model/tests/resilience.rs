//! Two-stage resilience workflow over a small constructed system.

mod common;

use common::{assert_feasibility_invariants, TOL};
use sdom_core::ResilienceScalars;
use sdom_model::test_fixtures::{constant_demand_bundle, gas_unit, storage_tech};
use sdom_model::{solve, SdomModel, SolverConfig};

fn resilience_bundle() -> sdom_core::InputBundle {
    let n = 168;
    let mut bundle = constant_demand_bundle(n, 30.0);
    bundle.balancing.push(gas_unit("GasCC", 10.0));
    let mut tech = storage_tech("Li-Ion");
    tech.efficiency = 1.0;
    tech.min_duration_h = 1.0;
    tech.max_duration_h = 100.0;
    tech.p_capex_per_kw = 10.0;
    tech.e_capex_per_kwh = 5.0;
    tech.fom_per_kw_yr = 0.0;
    tech.vom_per_mwh = 0.0;
    tech.max_cycles = 100_000.0;
    bundle.storage.push(tech);
    bundle.resilience = Some(ResilienceScalars {
        critical_load_frac: 0.0,
        backup_hours: 24,
        outage_start_hour: 100,
        soc_restore_hours: 24,
        critical_peak_load_mw: 50.0,
    });
    bundle
}

/// The design stage must size the fleet for a 24-hour, 50 MW ride-through
/// (at unit efficiency: at least 1200 MWh), and the operation stage must
/// run the full horizon with no balancing generation inside the outage
/// window.
#[test]
fn two_stage_solve_sizes_storage_and_blocks_outage_balancing() {
    let bundle = resilience_bundle();
    let mut model = SdomModel::from_bundle(bundle.clone(), true, "resilience").unwrap();
    let results = solve(&mut model, &SolverConfig::default()).unwrap();
    assert!(results.is_optimal(), "status: {:?}", results.status);
    assert_feasibility_invariants(&results, &bundle);

    let solution = results.solution.as_ref().unwrap();
    let energy: f64 = solution
        .storage_capacity
        .iter()
        .map(|c| c.energy_mwh)
        .sum();
    assert!(
        energy >= 24.0 * 50.0 - 1.0,
        "storage energy {energy} below the ride-through requirement"
    );
    let discharge_power: f64 = solution
        .storage_capacity
        .iter()
        .map(|c| c.discharge_mw)
        .sum();
    assert!(discharge_power >= 50.0 - TOL);

    // Outage window: 1-indexed hours 100..=123.
    for row in &solution.dispatch {
        if (100..=123).contains(&row.hour) {
            assert!(
                row.thermal_mw < TOL,
                "hour {}: balancing ran during the outage",
                row.hour
            );
            // Demand is riding on storage alone.
            assert!((row.storage_net_mw + 30.0).abs() < TOL);
        }
    }

    // The year still balances and the unit serves demand (and refills
    // storage) outside the window.
    let thermal: f64 = solution.dispatch.iter().map(|d| d.thermal_mw).sum();
    assert!(thermal > 0.0);
}

/// Requesting the resilience workflow without outage scalars in the case is
/// a configuration error, caught before any build.
#[test]
fn resilience_without_scalars_is_config_error() {
    let mut bundle = resilience_bundle();
    bundle.resilience = None;
    let err = SdomModel::from_bundle(bundle, true, "broken").unwrap_err();
    assert!(err.to_string().contains("outage parameters"));
}

/// An outage window overrunning the horizon is rejected by validation.
#[test]
fn outage_window_must_fit_horizon() {
    let mut bundle = resilience_bundle();
    bundle.resilience.as_mut().unwrap().outage_start_hour = 160;
    assert!(bundle.validate().is_err());
}
