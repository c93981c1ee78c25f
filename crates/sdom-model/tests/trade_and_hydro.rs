//! Scenarios exercising the trade and hydro sub-formulation axes.

mod common;

use common::{assert_cyclic_soc_closure, assert_feasibility_invariants, TOL};
use sdom_core::{HydroBounds, HydroMode, TradeMode, TradeSeries};
use sdom_model::test_fixtures::{constant_demand_bundle, flat_cf_plant, gas_unit, storage_tech};
use sdom_model::{solve, SdomModel, SolverConfig};

/// Storage arbitrage against a two-price trade profile: near-free wind in
/// the first half of the day charges a coupled four-hour technology and
/// saturates the export cap; the second half is served from storage alone.
/// The net-load indicator must gate exports out of positive-net-load hours.
#[test]
fn storage_shifts_surplus_against_two_price_trade() {
    let n = 24;
    let mut bundle = constant_demand_bundle(n, 100.0);
    bundle.scalars.clean_target = 1.0;
    let mut tech = storage_tech("PHS");
    tech.efficiency = 1.0;
    tech.min_duration_h = 4.0;
    tech.max_duration_h = 4.0;
    // Tiny but nonzero so degenerate extra cycling never enters an optimum.
    tech.vom_per_mwh = 0.01;
    tech.fom_per_kw_yr = 0.0;
    tech.p_capex_per_kw = 10.0;
    tech.e_capex_per_kwh = 5.0;
    bundle.storage.push(tech);
    // 255 MW of near-free wind availability in the first half, none after.
    let mut wind = flat_cf_plant("w1", 0.0, 300.0, n);
    wind.capex_per_kw = 0.1;
    wind.fom_per_kw_yr = 0.0;
    for h in 0..12 {
        wind.capacity_factors[h] = 0.85;
    }
    bundle.wind_plants.push(wind);
    bundle.formulations.trade = TradeMode::PriceNetLoad;
    bundle.trade = Some(TradeSeries {
        import_cap_mw: vec![0.0; n],
        import_price: vec![1000.0; n],
        export_cap_mw: vec![50.0; n],
        export_price: vec![5.0; n],
    });

    let mut model = SdomModel::from_bundle(bundle.clone(), false, "arbitrage").unwrap();
    let results = solve(&mut model, &SolverConfig::default()).unwrap();
    assert!(results.is_optimal(), "status: {:?}", results.status);
    assert_feasibility_invariants(&results, &bundle);
    assert_cyclic_soc_closure(&results, &bundle);

    let solution = results.solution.as_ref().unwrap();
    for row in &solution.dispatch {
        assert!(row.imports_mw < TOL, "imports are capped at zero");
        if row.hour <= 12 {
            // Surplus hours: net load is negative, exports saturate the cap
            // and storage only charges.
            assert!((row.exports_mw - 50.0).abs() < TOL, "hour {}", row.hour);
            assert!(row.storage_net_mw > -TOL);
        } else {
            // Deficit hours: positive net load forbids exports; storage
            // serves the full demand.
            assert!(row.exports_mw < TOL, "hour {}", row.hour);
            assert!((row.storage_net_mw + 100.0).abs() < TOL);
        }
    }
    let charged: f64 = solution
        .dispatch
        .iter()
        .map(|d| d.storage_net_mw.max(0.0))
        .sum();
    assert!((charged - 1200.0).abs() < 1.0, "charged {charged}");

    // The duration window is pinned at four hours.
    let cap = &solution.storage_capacity[0];
    assert!((cap.energy_mwh - 4.0 * cap.discharge_mw).abs() < TOL * 10.0);
    assert!(cap.energy_mwh >= 1200.0 - 1.0);

    let revenue = solution
        .cost_decomposition
        .iter()
        .find(|(label, _)| label == "Exports Revenue")
        .map(|(_, v)| *v)
        .unwrap();
    assert!(revenue < 0.0, "export revenue lowers the objective");
}

/// A binding monthly hydro budget over a 744-hour January: dispatched hydro
/// energy must hit the period budget exactly while staying inside the
/// hourly bounds.
#[test]
fn monthly_hydro_budget_binds_exactly() {
    let n = 744;
    let mut bundle = constant_demand_bundle(n, 100.0);
    bundle.balancing.push(gas_unit("GasCC", 10.0));
    bundle.formulations.hydro = HydroMode::MonthlyBudget;
    // Budget = half of what the upper bound would allow.
    bundle.hydro_mw = vec![20.0; n];
    bundle.hydro_bounds = Some(HydroBounds {
        upper_mw: vec![40.0; n],
        lower_mw: vec![0.0; n],
    });

    let mut model = SdomModel::from_bundle(bundle.clone(), false, "hydro_budget").unwrap();
    let results = solve(&mut model, &SolverConfig::default()).unwrap();
    assert!(results.is_optimal(), "status: {:?}", results.status);
    assert_feasibility_invariants(&results, &bundle);

    let solution = results.solution.as_ref().unwrap();
    let dispatched: f64 = solution.dispatch.iter().map(|d| d.hydro_mw).sum();
    let budget: f64 = bundle.hydro_mw.iter().sum();
    assert!(
        (dispatched - budget).abs() < TOL * n as f64,
        "hydro energy {dispatched} != budget {budget}"
    );
    for row in &solution.dispatch {
        assert!(row.hydro_mw <= 40.0 + TOL);
        assert!(row.hydro_mw >= -TOL);
    }
    // Free hydro displaces fuel: the unit never runs above the residual.
    for row in &solution.dispatch {
        assert!((row.thermal_mw + row.hydro_mw - 100.0).abs() < TOL);
    }
}

/// A daily budget with a horizon that is not a whole number of days must be
/// rejected before any model is built.
#[test]
fn daily_budget_rejects_ragged_horizon() {
    let n = 30;
    let mut bundle = constant_demand_bundle(n, 100.0);
    bundle.balancing.push(gas_unit("GasCC", 10.0));
    bundle.formulations.hydro = HydroMode::DailyBudget;
    bundle.hydro_mw = vec![20.0; n];
    bundle.hydro_bounds = Some(HydroBounds {
        upper_mw: vec![40.0; n],
        lower_mw: vec![0.0; n],
    });

    let err = bundle.validate().unwrap_err();
    assert!(err.to_string().contains("daily budget"));
}
