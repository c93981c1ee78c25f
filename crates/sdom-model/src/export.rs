//! CSV export of solve results.
//!
//! Writes the output file set into a caller-supplied directory, one file per
//! view, named `Output<View>_<case>.csv`.

use crate::results::SdomResults;
use anyhow::Context;
use sdom_core::SdomResult;
use std::path::Path;
use tracing::{info, warn};

/// Write the dispatch, storage, summary, per-unit thermal, and installed
/// plant tables. A results object without a solution (infeasible, unbounded
/// or timed-out solve) exports nothing.
pub fn export_results(results: &SdomResults, output_dir: &Path) -> SdomResult<()> {
    let Some(solution) = &results.solution else {
        warn!(
            status = ?results.status,
            "no solution available; skipping result export"
        );
        return Ok(());
    };
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))
        .map_err(sdom_core::SdomError::from)?;
    let case = &results.case;

    let path = output_dir.join(format!("OutputGeneration_{case}.csv"));
    let mut w = writer(&path)?;
    w.write_record([
        "Scenario",
        "Hour",
        "Solar PV Generation (MW)",
        "Solar PV Curtailment (MW)",
        "Wind Generation (MW)",
        "Wind Curtailment (MW)",
        "All Thermal Generation (MW)",
        "Hydro Generation (MW)",
        "Nuclear Generation (MW)",
        "Other Renewables Generation (MW)",
        "Imports (MW)",
        "Storage Charge/Discharge (MW)",
        "Exports (MW)",
        "Load (MW)",
    ])?;
    for row in &solution.dispatch {
        w.write_record([
            case.clone(),
            row.hour.to_string(),
            row.solar_gen_mw.to_string(),
            row.solar_curt_mw.to_string(),
            row.wind_gen_mw.to_string(),
            row.wind_curt_mw.to_string(),
            row.thermal_mw.to_string(),
            row.hydro_mw.to_string(),
            row.nuclear_mw.to_string(),
            row.other_renewables_mw.to_string(),
            row.imports_mw.to_string(),
            row.storage_net_mw.to_string(),
            row.exports_mw.to_string(),
            row.load_mw.to_string(),
        ])?;
    }
    w.flush().map_err(sdom_core::SdomError::from)?;

    let path = output_dir.join(format!("OutputStorage_{case}.csv"));
    let mut w = writer(&path)?;
    w.write_record([
        "Hour",
        "Technology",
        "Charging power (MW)",
        "Discharging power (MW)",
        "State of charge (MWh)",
    ])?;
    for row in &solution.storage {
        w.write_record([
            row.hour.to_string(),
            row.technology.clone(),
            row.charge_mw.to_string(),
            row.discharge_mw.to_string(),
            row.soc_mwh.to_string(),
        ])?;
    }
    w.flush().map_err(sdom_core::SdomError::from)?;

    let path = output_dir.join(format!("OutputSummary_{case}.csv"));
    let mut w = writer(&path)?;
    w.write_record(["Metric", "Technology", "Optimal Value", "Unit"])?;
    for row in &solution.summary {
        w.write_record([
            row.metric.clone(),
            row.technology.clone(),
            row.value.to_string(),
            row.unit.clone(),
        ])?;
    }
    w.flush().map_err(sdom_core::SdomError::from)?;

    let path = output_dir.join(format!("OutputThermalGeneration_{case}.csv"));
    let mut w = writer(&path)?;
    let mut header = vec!["Hour".to_string()];
    header.extend(solution.thermal_by_unit.iter().map(|(name, _)| name.clone()));
    w.write_record(&header)?;
    let n_hours = solution.dispatch.len();
    for h in 0..n_hours {
        let mut record = vec![(h + 1).to_string()];
        record.extend(
            solution
                .thermal_by_unit
                .iter()
                .map(|(_, series)| series[h].to_string()),
        );
        w.write_record(&record)?;
    }
    w.flush().map_err(sdom_core::SdomError::from)?;

    let path = output_dir.join(format!("OutputInstalledPowerPlants_{case}.csv"));
    let mut w = writer(&path)?;
    w.write_record([
        "sc_gid",
        "Technology",
        "Capacity (MW)",
        "Built Fraction",
        "Built Capacity (MW)",
        "Latitude",
        "Longitude",
    ])?;
    for plant in &solution.plant_builds {
        let coord = |c: Option<f64>| c.map(|v| v.to_string()).unwrap_or_default();
        w.write_record([
            plant.id.clone(),
            plant.technology.clone(),
            plant.capacity_mw.to_string(),
            plant.fraction.to_string(),
            plant.built_mw.to_string(),
            coord(plant.latitude),
            coord(plant.longitude),
        ])?;
    }
    w.flush().map_err(sdom_core::SdomError::from)?;

    info!(dir = %output_dir.display(), case, "results exported");
    Ok(())
}

fn writer(path: &Path) -> SdomResult<csv::Writer<std::fs::File>> {
    csv::Writer::from_path(path).map_err(|e| {
        sdom_core::SdomError::Io(std::io::Error::other(format!(
            "creating {}: {e}",
            path.display()
        )))
    })
}
