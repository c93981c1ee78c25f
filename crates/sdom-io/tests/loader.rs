//! Loader error paths over on-disk case directories.

use sdom_core::{HydroMode, SdomError, TradeMode};
use sdom_io::load_case;
use std::path::Path;

fn write(dir: &Path, name: &str, contents: &str) {
    std::fs::write(dir.join(name), contents).unwrap();
}

fn hourly(n: usize, value: f64) -> String {
    let mut out = String::from("*Hour,Value\n");
    for h in 1..=n {
        out.push_str(&format!("{h},{value}\n"));
    }
    out
}

fn write_minimal_case(dir: &Path, n: usize) {
    write(
        dir,
        "Scalars.csv",
        "Parameter,Value\n\
         r,0.06\n\
         GenMix_Target,0.5\n\
         alpha_Nuclear,1.0\n\
         alpha_Hydro,1.0\n\
         alpha_OtherRenewables,1.0\n\
         LifeTimeVRE,30\n",
    );
    write(
        dir,
        "Formulations.csv",
        "Component,Formulation\n\
         hydro,RunOfRiverFormulation\n\
         Imports,NotModel\n\
         Exports,NotModel\n",
    );
    write(dir, "Load_hourly.csv", &hourly(n, 100.0));
    write(dir, "Nucl_hourly.csv", &hourly(n, 0.0));
    write(dir, "lahy_hourly.csv", &hourly(n, 10.0));
    write(dir, "otre_hourly.csv", &hourly(n, 0.0));
    let mut cf = String::from("Hour,101\n");
    for h in 1..=n {
        cf.push_str(&format!("{h},0.2\n"));
    }
    write(dir, "CFSolar.csv", &cf);
    write(
        dir,
        "CapSolar.csv",
        "sc_gid,capacity,CAPEX_M,trans_cap_cost,FOM_M\n101,50,800,0,10\n",
    );
    let mut cf = String::from("Hour,w1\n");
    for h in 1..=n {
        cf.push_str(&format!("{h},0.4\n"));
    }
    write(dir, "CFWind.csv", &cf);
    write(
        dir,
        "CapWind.csv",
        "sc_gid,capacity,CAPEX_M,trans_cap_cost,FOM_M\nw1,200,900,0,12\n",
    );
    write(
        dir,
        "StorageData.csv",
        ",Li-Ion\n\
         P_Capex,300\nE_Capex,150\nEff,0.85\nMin_Duration,1\nMax_Duration,10\n\
         Max_P,10000\nCoupled,1\nFOM,5\nVOM,0.1\nLifetime,15\nCostRatio,0.5\nMaxCycles,3250\n",
    );
    write(
        dir,
        "Data_BalancingUnits.csv",
        ",GasCC\n\
         MinCapacity,0\nMaxCapacity,10000\nLifetime,30\nCapex,940\n\
         HeatRate,6.4\nFuelCost,4.1\nVOM,2.2\nFOM,13.2\n",
    );
}

#[test]
fn minimal_case_loads() {
    let tmp = tempfile::tempdir().unwrap();
    write_minimal_case(tmp.path(), 24);
    let bundle = load_case(tmp.path(), 24).unwrap();
    assert_eq!(bundle.n_hours, 24);
    assert_eq!(bundle.formulations.hydro, HydroMode::RunOfRiver);
    assert_eq!(bundle.formulations.trade, TradeMode::Disabled);
    assert_eq!(bundle.storage.len(), 1);
    assert!(bundle.storage[0].coupled);
    assert_eq!(bundle.balancing[0].name, "GasCC");
    assert!((bundle.scalars.clean_target - 0.5).abs() < 1e-9);
    assert!(bundle.resilience.is_none());
}

#[test]
fn missing_storage_table_is_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    write_minimal_case(tmp.path(), 24);
    std::fs::remove_file(tmp.path().join("StorageData.csv")).unwrap();
    let err = load_case(tmp.path(), 24).unwrap_err();
    assert!(matches!(err, SdomError::Config(_)), "{err}");
}

#[test]
fn unknown_formulation_is_config_error() {
    let tmp = tempfile::tempdir().unwrap();
    write_minimal_case(tmp.path(), 24);
    write(
        tmp.path(),
        "Formulations.csv",
        "Component,Formulation\nhydro,WeeklyBudgetFormulation\nImports,NotModel\nExports,NotModel\n",
    );
    let err = load_case(tmp.path(), 24).unwrap_err();
    assert!(err.to_string().contains("invalid hydro formulation"));
}

#[test]
fn mixed_trade_formulations_are_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    write_minimal_case(tmp.path(), 24);
    write(
        tmp.path(),
        "Formulations.csv",
        "Component,Formulation\n\
         hydro,RunOfRiverFormulation\n\
         Imports,CapacityPriceNetLoadFormulation\n\
         Exports,NotModel\n",
    );
    let err = load_case(tmp.path(), 24).unwrap_err();
    assert!(err.to_string().contains("must agree"));
}

#[test]
fn budget_hydro_requires_bound_tables() {
    let tmp = tempfile::tempdir().unwrap();
    write_minimal_case(tmp.path(), 24);
    write(
        tmp.path(),
        "Formulations.csv",
        "Component,Formulation\n\
         hydro,DailyBudgetFormulation\n\
         Imports,NotModel\n\
         Exports,NotModel\n",
    );
    let err = load_case(tmp.path(), 24).unwrap_err();
    assert!(matches!(err, SdomError::Config(_)), "{err}");
}

#[test]
fn budget_hydro_loads_bounds_and_validates_budget() {
    let tmp = tempfile::tempdir().unwrap();
    write_minimal_case(tmp.path(), 24);
    write(
        tmp.path(),
        "Formulations.csv",
        "Component,Formulation\n\
         hydro,DailyBudgetFormulation\n\
         Imports,NotModel\n\
         Exports,NotModel\n",
    );
    write(tmp.path(), "lahy_max_hourly.csv", &hourly(24, 40.0));
    write(tmp.path(), "lahy_min_hourly.csv", &hourly(24, 0.0));
    let bundle = load_case(tmp.path(), 24).unwrap();
    assert!(bundle.hydro_bounds.is_some());

    // Push the profile above the upper bound: the daily budget becomes
    // unattainable.
    write(tmp.path(), "lahy_hourly.csv", &hourly(24, 60.0));
    let err = load_case(tmp.path(), 24).unwrap_err();
    assert!(matches!(err, SdomError::Data(_)), "{err}");
}

#[test]
fn trade_case_requires_all_four_series() {
    let tmp = tempfile::tempdir().unwrap();
    write_minimal_case(tmp.path(), 24);
    write(
        tmp.path(),
        "Formulations.csv",
        "Component,Formulation\n\
         hydro,RunOfRiverFormulation\n\
         Imports,CapacityPriceNetLoadFormulation\n\
         Exports,CapacityPriceNetLoadFormulation\n",
    );
    write(tmp.path(), "Import_Cap.csv", &hourly(24, 80.0));
    write(tmp.path(), "Import_Prices.csv", &hourly(24, 30.0));
    write(tmp.path(), "Export_Cap.csv", &hourly(24, 60.0));
    let err = load_case(tmp.path(), 24).unwrap_err();
    assert!(err.to_string().contains("Export_Prices"), "{err}");

    write(tmp.path(), "Export_Prices.csv", &hourly(24, 25.0));
    let bundle = load_case(tmp.path(), 24).unwrap();
    let trade = bundle.trade.unwrap();
    assert!((trade.import_cap_mw[0] - 80.0).abs() < 1e-9);
    assert!((trade.export_price[5] - 25.0).abs() < 1e-9);
}

#[test]
fn resilience_scalars_are_picked_up() {
    let tmp = tempfile::tempdir().unwrap();
    write_minimal_case(tmp.path(), 24);
    write(
        tmp.path(),
        "Scalars.csv",
        "Parameter,Value\n\
         r,0.06\n\
         GenMix_Target,0.5\n\
         alpha_Nuclear,1.0\n\
         alpha_Hydro,1.0\n\
         alpha_OtherRenewables,1.0\n\
         LifeTimeVRE,30\n\
         CriticalLoadFrac,0.3\n\
         max_backup_power_dur,6\n\
         outage_start_hour,10\n\
         SOC_restore_hours,4\n\
         critical_peak_load,0\n",
    );
    let bundle = load_case(tmp.path(), 24).unwrap();
    let res = bundle.resilience.unwrap();
    assert_eq!(res.backup_hours, 6);
    assert_eq!(res.outage_start_hour, 10);
    assert!((res.critical_load(&bundle.demand_mw) - 30.0).abs() < 1e-9);
}
