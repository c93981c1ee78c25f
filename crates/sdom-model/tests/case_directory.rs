//! End-to-end: a case directory on disk through load, build, solve, export.

mod common;

use common::assert_feasibility_invariants;
use sdom_model::{build_model, export_results, solve, SolverConfig};
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

fn write_case(dir: &Path, n: usize) {
    write(
        dir,
        "Scalars.csv",
        "Parameter,Value\n\
         r,0.06\n\
         GenMix_Target,0.0\n\
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
    write(dir, "Load_hourly_2050.csv", &hourly(n, 100.0));
    write(dir, "Nucl_hourly_2019.csv", &hourly(n, 0.0));
    write(dir, "lahy_hourly_2019.csv", &hourly(n, 0.0));
    write(dir, "otre_hourly_2019.csv", &hourly(n, 0.0));

    // Plant 102 has no cost row, plant 103 has no CF column: both drop.
    let mut cf_solar = String::from("Hour,101,102\n");
    for h in 1..=n {
        cf_solar.push_str(&format!("{h},0.2,0.3\n"));
    }
    write(dir, "CFSolar_2050.csv", &cf_solar);
    write(
        dir,
        "CapSolar_2050.csv",
        "sc_gid,capacity,CAPEX_M,trans_cap_cost,FOM_M,latitude,longitude\n\
         101,50,800,0,10,35.0,-106.0\n\
         103,60,700,0,9,36.0,-105.0\n",
    );
    let mut cf_wind = String::from("Hour,w1\n");
    for h in 1..=n {
        cf_wind.push_str(&format!("{h},0.5\n"));
    }
    write(dir, "CFWind_2050.csv", &cf_wind);
    write(
        dir,
        "CapWind_2050.csv",
        "sc_gid,capacity,CAPEX_M,trans_cap_cost,FOM_M,latitude,longitude\n\
         w1,200,900,0,12,,\n",
    );
    write(
        dir,
        "StorageData_2050.csv",
        ",Li-Ion\n\
         P_Capex,300\n\
         E_Capex,150\n\
         Eff,0.85\n\
         Min_Duration,1\n\
         Max_Duration,10\n\
         Max_P,10000\n\
         Coupled,1\n\
         FOM,5\n\
         VOM,0.1\n\
         Lifetime,15\n\
         CostRatio,0.5\n\
         MaxCycles,3250\n",
    );
    write(
        dir,
        "Data_BalancingUnits.csv",
        ",GasCC\n\
         MinCapacity,0\n\
         MaxCapacity,10000\n\
         Lifetime,30\n\
         Capex,940.6\n\
         HeatRate,6.4\n\
         FuelCost,4.11\n\
         VOM,2.23\n\
         FOM,13.25\n",
    );
}

#[test]
fn case_directory_solves_and_exports() {
    let case_dir = tempfile::tempdir().unwrap();
    let out_dir = tempfile::tempdir().unwrap();
    write_case(case_dir.path(), 24);

    let mut model = build_model(case_dir.path(), 24, false, "smoke").unwrap();
    let bundle = model.bundle().clone();
    // Misaligned plants dropped; the aligned ones survive.
    assert_eq!(bundle.pv_plants.len(), 1);
    assert_eq!(bundle.pv_plants[0].id, "101");
    assert_eq!(bundle.wind_plants.len(), 1);

    let results = solve(&mut model, &SolverConfig::default()).unwrap();
    assert!(results.is_optimal(), "status: {:?}", results.status);
    assert_feasibility_invariants(&results, &bundle);

    // Cheap gas, expensive VRE: nothing gets built.
    let solution = results.solution.as_ref().unwrap();
    for plant in &solution.plant_builds {
        assert!(plant.built_mw < 1e-6, "{} should not be built", plant.id);
    }

    export_results(&results, out_dir.path()).unwrap();
    for name in [
        "OutputGeneration_smoke.csv",
        "OutputStorage_smoke.csv",
        "OutputSummary_smoke.csv",
        "OutputThermalGeneration_smoke.csv",
        "OutputInstalledPowerPlants_smoke.csv",
    ] {
        let path = out_dir.path().join(name);
        assert!(path.is_file(), "missing {name}");
        let contents = std::fs::read_to_string(path).unwrap();
        assert!(contents.lines().count() > 1, "{name} has no data rows");
    }

    let summary =
        std::fs::read_to_string(out_dir.path().join("OutputSummary_smoke.csv")).unwrap();
    assert!(summary.starts_with("Metric,Technology,Optimal Value,Unit"));
    assert!(summary.contains("Total cost"));
}
