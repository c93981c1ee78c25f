//! Case loading: resolve the fixed file set, parse tables, align plant sets,
//! and assemble a validated [`InputBundle`].
//!
//! Recoverable problems (a plant present in only one of the CF/cost tables,
//! or with incomplete numeric data) drop the plant with a logged warning.
//! Everything else fails fast before a model is built.

use crate::discover::CaseDirectory;
use crate::tables::{
    read_cf_matrix, read_formulations, read_hourly_series, read_param_matrix, read_plant_table,
    read_scalars, PlantRow,
};
use sdom_core::{
    BalancingUnit, FormulationMap, HydroBounds, HydroMode, InputBundle, ResilienceScalars,
    SdomError, SdomResult, StorageTech, SystemScalars, TradeMode, TradeSeries, VrePlant,
};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

const DEFAULT_VRE_LIFETIME_YEARS: f64 = 30.0;

/// Load and validate a case directory into an immutable input bundle.
pub fn load_case(input_dir: &Path, n_hours: usize) -> SdomResult<InputBundle> {
    info!(dir = %input_dir.display(), n_hours, "loading case");
    let case = CaseDirectory::scan(input_dir)?;

    let formulations = load_formulation_map(&case)?;
    let scalars_raw = read_scalars(&case.require("Scalars", "system scalar table")?)?;
    let scalars = load_system_scalars(&scalars_raw)?;
    let resilience = load_resilience_scalars(&scalars_raw);

    let demand_mw = read_hourly_series(&case.require("Load_hourly", "hourly demand")?, n_hours)?;
    let nuclear_mw =
        read_hourly_series(&case.require("Nucl_hourly", "hourly nuclear profile")?, n_hours)?;
    let hydro_mw =
        read_hourly_series(&case.require("lahy_hourly", "hourly large-hydro profile")?, n_hours)?;
    let other_renewables_mw = read_hourly_series(
        &case.require("otre_hourly", "hourly other-renewables profile")?,
        n_hours,
    )?;

    let pv_plants = load_vre_plants(&case, "CFSolar", "CapSolar", "solar", n_hours)?;
    let wind_plants = load_vre_plants(&case, "CFWind", "CapWind", "wind", n_hours)?;

    let storage = load_storage_table(&case)?;
    let balancing = load_balancing_table(&case)?;

    let hydro_bounds = if formulations.hydro.is_budgeted() {
        Some(HydroBounds {
            upper_mw: read_hourly_series(
                &case.require("lahy_max_hourly", "hourly hydro upper bound")?,
                n_hours,
            )?,
            lower_mw: read_hourly_series(
                &case.require("lahy_min_hourly", "hourly hydro lower bound")?,
                n_hours,
            )?,
        })
    } else {
        None
    };

    let trade = if formulations.trade.is_enabled() {
        Some(TradeSeries {
            import_cap_mw: read_hourly_series(
                &case.require("Import_Cap", "hourly import capacity")?,
                n_hours,
            )?,
            import_price: read_hourly_series(
                &case.require("Import_Prices", "hourly import prices")?,
                n_hours,
            )?,
            export_cap_mw: read_hourly_series(
                &case.require("Export_Cap", "hourly export capacity")?,
                n_hours,
            )?,
            export_price: read_hourly_series(
                &case.require("Export_Prices", "hourly export prices")?,
                n_hours,
            )?,
        })
    } else {
        None
    };

    let bundle = InputBundle {
        n_hours,
        scalars,
        resilience,
        demand_mw,
        nuclear_mw,
        hydro_mw,
        other_renewables_mw,
        hydro_bounds,
        pv_plants,
        wind_plants,
        storage,
        balancing,
        trade,
        formulations,
    };
    bundle.validate()?;
    info!(
        pv = bundle.pv_plants.len(),
        wind = bundle.wind_plants.len(),
        storage = bundle.storage.len(),
        balancing = bundle.balancing.len(),
        "case loaded"
    );
    Ok(bundle)
}

fn load_formulation_map(case: &CaseDirectory) -> SdomResult<FormulationMap> {
    let path = case.require("Formulations", "formulation selection table")?;
    let rows = read_formulations(&path)?;
    let get = |component: &str| -> SdomResult<&String> {
        rows.get(&component.to_lowercase()).ok_or_else(|| {
            SdomError::Config(format!(
                "Formulations table has no row for component '{component}'"
            ))
        })
    };
    let hydro = HydroMode::parse(get("hydro")?)?;
    let imports = TradeMode::parse(get("Imports")?)?;
    let exports = TradeMode::parse(get("Exports")?)?;
    if imports != exports {
        return Err(SdomError::Config(
            "Imports and Exports formulations must agree: model both or neither".into(),
        ));
    }
    Ok(FormulationMap {
        hydro,
        trade: imports,
    })
}

fn scalar_lookup<'a>(scalars: &'a HashMap<String, f64>, name: &str) -> Option<f64> {
    let wanted = crate::discover::normalize(name);
    scalars
        .iter()
        .find(|(k, _)| crate::discover::normalize(k) == wanted)
        .map(|(_, v)| *v)
}

fn required_scalar(scalars: &HashMap<String, f64>, name: &str) -> SdomResult<f64> {
    scalar_lookup(scalars, name)
        .ok_or_else(|| SdomError::Config(format!("Scalars table is missing '{name}'")))
}

fn load_system_scalars(scalars: &HashMap<String, f64>) -> SdomResult<SystemScalars> {
    let vre_lifetime_years = match scalar_lookup(scalars, "LifeTimeVRE") {
        Some(v) => v,
        None => {
            warn!(
                "Scalars table has no LifeTimeVRE row; defaulting to {} years",
                DEFAULT_VRE_LIFETIME_YEARS
            );
            DEFAULT_VRE_LIFETIME_YEARS
        }
    };
    Ok(SystemScalars {
        discount_rate: required_scalar(scalars, "r")?,
        clean_target: required_scalar(scalars, "GenMix_Target")?,
        alpha_nuclear: required_scalar(scalars, "alpha_Nuclear")?,
        alpha_hydro: required_scalar(scalars, "alpha_Hydro")?,
        alpha_other: required_scalar(scalars, "alpha_OtherRenewables")?,
        vre_lifetime_years,
    })
}

fn load_resilience_scalars(scalars: &HashMap<String, f64>) -> Option<ResilienceScalars> {
    let backup = scalar_lookup(scalars, "max_backup_power_dur")?;
    let outage_start = scalar_lookup(scalars, "outage_start_hour")?;
    Some(ResilienceScalars {
        critical_load_frac: scalar_lookup(scalars, "CriticalLoadFrac").unwrap_or(0.0),
        backup_hours: backup.round() as usize,
        outage_start_hour: outage_start.round() as usize,
        soc_restore_hours: scalar_lookup(scalars, "SOC_restore_hours")
            .map(|v| v.round() as usize)
            .unwrap_or(0),
        critical_peak_load_mw: scalar_lookup(scalars, "critical_peak_load").unwrap_or(0.0),
    })
}

/// Intersect the CF matrix with the capacity table, dropping plants present
/// in only one of them or carrying incomplete data.
fn load_vre_plants(
    case: &CaseDirectory,
    cf_logical: &str,
    cap_logical: &str,
    label: &str,
    n_hours: usize,
) -> SdomResult<Vec<VrePlant>> {
    let cf_path = case.require(cf_logical, &format!("{label} capacity factors"))?;
    let cap_path = case.require(cap_logical, &format!("{label} capacity/cost table"))?;
    let (cf_ids, cf_profiles) = read_cf_matrix(&cf_path, n_hours)?;
    let cap_rows = read_plant_table(&cap_path)?;
    let cap_by_id: HashMap<&str, &PlantRow> =
        cap_rows.iter().map(|r| (r.id.as_str(), r)).collect();

    for row in &cap_rows {
        if !cf_profiles.contains_key(&row.id) {
            warn!(
                "dropping {label} plant {}: present in the cost table but not the CF matrix",
                row.id
            );
        }
    }

    let mut plants = Vec::new();
    for id in cf_ids {
        let Some(row) = cap_by_id.get(id.as_str()) else {
            warn!("dropping {label} plant {id}: present in the CF matrix but not the cost table");
            continue;
        };
        let profile = &cf_profiles[&id];
        if profile.iter().any(|v| v.is_nan()) {
            warn!("dropping {label} plant {id}: incomplete capacity-factor profile");
            continue;
        }
        let (Some(capacity_mw), Some(capex_per_kw), Some(fom_per_kw_yr), Some(trans_cap_cost)) = (
            row.capacity_mw,
            row.capex_per_kw,
            row.fom_per_kw_yr,
            row.trans_cap_cost,
        ) else {
            warn!("dropping {label} plant {id}: incomplete cost data");
            continue;
        };
        plants.push(VrePlant {
            id,
            capacity_mw,
            capex_per_kw,
            fom_per_kw_yr,
            trans_cap_cost,
            latitude: row.latitude,
            longitude: row.longitude,
            capacity_factors: profile.clone(),
        });
    }
    if plants.is_empty() {
        warn!("no usable {label} plants remain after alignment");
    }
    Ok(plants)
}

fn matrix_value(
    values: &HashMap<(String, String), f64>,
    path_label: &str,
    param: &str,
    column: &str,
) -> SdomResult<f64> {
    values
        .get(&(param.to_string(), column.to_string()))
        .copied()
        .ok_or_else(|| {
            SdomError::Config(format!(
                "{path_label} is missing parameter '{param}' for '{column}'"
            ))
        })
}

fn load_storage_table(case: &CaseDirectory) -> SdomResult<Vec<StorageTech>> {
    let path = case.require("StorageData", "storage technology table")?;
    let (techs, values) = read_param_matrix(&path)?;
    let mut out = Vec::new();
    for name in techs {
        let v = |param: &str| matrix_value(&values, "StorageData", param, &name);
        out.push(StorageTech {
            p_capex_per_kw: v("P_Capex")?,
            e_capex_per_kwh: v("E_Capex")?,
            efficiency: v("Eff")?,
            min_duration_h: v("Min_Duration")?,
            max_duration_h: v("Max_Duration")?,
            max_power_mw: v("Max_P")?,
            coupled: v("Coupled")? != 0.0,
            fom_per_kw_yr: v("FOM")?,
            vom_per_mwh: v("VOM")?,
            lifetime_years: v("Lifetime")?,
            cost_ratio: v("CostRatio")?,
            max_cycles: v("MaxCycles")?,
            name,
        });
    }
    if out.is_empty() {
        return Err(SdomError::Config(
            "StorageData defines no storage technologies".into(),
        ));
    }
    Ok(out)
}

fn load_balancing_table(case: &CaseDirectory) -> SdomResult<Vec<BalancingUnit>> {
    let path = case.require("Data_BalancingUnits", "balancing unit table")?;
    let (units, values) = read_param_matrix(&path)?;
    let mut out = Vec::new();
    for name in units {
        let v = |param: &str| matrix_value(&values, "Data_BalancingUnits", param, &name);
        out.push(BalancingUnit {
            min_capacity_mw: v("MinCapacity")?,
            max_capacity_mw: v("MaxCapacity")?,
            lifetime_years: v("Lifetime")?,
            capex_per_kw: v("Capex")?,
            heat_rate: v("HeatRate")?,
            fuel_price: v("FuelCost")?,
            vom_per_mwh: v("VOM")?,
            fom_per_kw_yr: v("FOM")?,
            name,
        });
    }
    if out.is_empty() {
        return Err(SdomError::Config(
            "Data_BalancingUnits defines no balancing units".into(),
        ));
    }
    Ok(out)
}
