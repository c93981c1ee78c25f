//! Result extraction: primal values at optimality packaged as tabular views,
//! scalar aggregates, and the cost decomposition.

use crate::backend::{SolveStatus, SolverOutcome};
use crate::linear::ModelStats;
use crate::objective::CostLedger;
use crate::registry::{HydroDispatch, ModelRegistry};
use std::time::Duration;

/// One row of the per-hour dispatch table.
#[derive(Debug, Clone)]
pub struct DispatchRow {
    pub hour: usize,
    pub solar_gen_mw: f64,
    pub solar_curt_mw: f64,
    pub wind_gen_mw: f64,
    pub wind_curt_mw: f64,
    pub thermal_mw: f64,
    pub hydro_mw: f64,
    pub nuclear_mw: f64,
    pub other_renewables_mw: f64,
    pub imports_mw: f64,
    pub exports_mw: f64,
    /// Net storage flow: charging minus discharging.
    pub storage_net_mw: f64,
    pub load_mw: f64,
}

/// One row of the per-hour, per-technology storage table.
#[derive(Debug, Clone)]
pub struct StorageRow {
    pub hour: usize,
    pub technology: String,
    pub charge_mw: f64,
    pub discharge_mw: f64,
    pub soc_mwh: f64,
}

/// Installed capacities for one storage technology.
#[derive(Debug, Clone)]
pub struct StorageCapacity {
    pub technology: String,
    pub charge_mw: f64,
    pub discharge_mw: f64,
    pub energy_mwh: f64,
}

/// Build decision for one VRE plant.
#[derive(Debug, Clone)]
pub struct PlantBuild {
    pub id: String,
    pub technology: String,
    pub capacity_mw: f64,
    pub fraction: f64,
    pub built_mw: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// One metric/technology/value/unit row of the summary table.
#[derive(Debug, Clone)]
pub struct SummaryRow {
    pub metric: String,
    pub technology: String,
    pub value: f64,
    pub unit: String,
}

/// Everything extracted from an optimal solution.
#[derive(Debug, Clone)]
pub struct SolutionData {
    pub total_cost: f64,
    pub dispatch: Vec<DispatchRow>,
    pub storage: Vec<StorageRow>,
    pub storage_capacity: Vec<StorageCapacity>,
    pub balancing_capacity: Vec<(String, f64)>,
    /// Per-unit hourly generation, unit order as declared.
    pub thermal_by_unit: Vec<(String, Vec<f64>)>,
    pub plant_builds: Vec<PlantBuild>,
    /// Labeled objective terms; sums to `total_cost` within solver tolerance.
    pub cost_decomposition: Vec<(String, f64)>,
    pub summary: Vec<SummaryRow>,
}

/// The solve report: termination status, problem statistics, and (at
/// optimality) the extracted solution. Infeasible, unbounded and time-limit
/// terminations are reported here rather than as errors.
#[derive(Debug, Clone)]
pub struct SdomResults {
    pub case: String,
    pub status: SolveStatus,
    pub stats: ModelStats,
    pub solve_time: Duration,
    pub solution: Option<SolutionData>,
}

impl SdomResults {
    pub fn is_optimal(&self) -> bool {
        self.status == SolveStatus::Optimal
    }

    /// Whether a feasible incumbent is attached (time-limit runs may stop
    /// without one).
    pub fn has_incumbent(&self) -> bool {
        self.solution.is_some()
    }
}

/// Tiny denominator guard for duration/cycle ratios.
const RATIO_EPS: f64 = 1e-15;

pub(crate) fn extract(
    case: &str,
    reg: &ModelRegistry,
    ledger: &CostLedger,
    stats: ModelStats,
    outcome: &SolverOutcome,
) -> SdomResults {
    let Some(values) = &outcome.values else {
        return SdomResults {
            case: case.to_string(),
            status: outcome.status,
            stats,
            solve_time: outcome.solve_time,
            solution: None,
        };
    };
    let v = |id: crate::linear::VarId| values[id.index()];
    let n = reg.n_hours();

    let hydro_at = |h: usize| match &reg.sym.hydro {
        HydroDispatch::Fixed => reg.hydro_fixed(h),
        HydroDispatch::Scheduled(vars) => v(vars[h]),
    };

    let mut dispatch = Vec::with_capacity(n);
    for h in 0..n {
        let storage_net: f64 = (0..reg.storage_techs().len())
            .map(|j| v(reg.sym.storage.charge[j][h]) - v(reg.sym.storage.discharge[j][h]))
            .sum();
        dispatch.push(DispatchRow {
            hour: h + 1,
            solar_gen_mw: v(reg.sym.pv.gen[h]),
            solar_curt_mw: v(reg.sym.pv.curt[h]),
            wind_gen_mw: v(reg.sym.wind.gen[h]),
            wind_curt_mw: v(reg.sym.wind.curt[h]),
            thermal_mw: (0..reg.balancing_units().len())
                .map(|k| v(reg.sym.balancing.gen[k][h]))
                .sum(),
            hydro_mw: hydro_at(h),
            nuclear_mw: reg.nuclear_fixed(h),
            other_renewables_mw: reg.other_fixed(h),
            imports_mw: reg.sym.trade.as_ref().map_or(0.0, |t| v(t.imports[h])),
            exports_mw: reg.sym.trade.as_ref().map_or(0.0, |t| v(t.exports[h])),
            storage_net_mw: storage_net,
            load_mw: reg.demand(h),
        });
    }

    let mut storage = Vec::with_capacity(n * reg.storage_techs().len());
    for h in 0..n {
        for (j, tech) in reg.storage_techs().iter().enumerate() {
            storage.push(StorageRow {
                hour: h + 1,
                technology: tech.name.clone(),
                charge_mw: v(reg.sym.storage.charge[j][h]),
                discharge_mw: v(reg.sym.storage.discharge[j][h]),
                soc_mwh: v(reg.sym.storage.soc[j][h]),
            });
        }
    }

    let storage_capacity: Vec<StorageCapacity> = reg
        .storage_techs()
        .iter()
        .enumerate()
        .map(|(j, tech)| StorageCapacity {
            technology: tech.name.clone(),
            charge_mw: v(reg.sym.storage.charge_cap[j]),
            discharge_mw: v(reg.sym.storage.discharge_cap[j]),
            energy_mwh: v(reg.sym.storage.energy_cap[j]),
        })
        .collect();

    let balancing_capacity: Vec<(String, f64)> = reg
        .balancing_units()
        .iter()
        .enumerate()
        .map(|(k, unit)| (unit.name.clone(), v(reg.sym.balancing.capacity[k])))
        .collect();

    let thermal_by_unit: Vec<(String, Vec<f64>)> = reg
        .balancing_units()
        .iter()
        .enumerate()
        .map(|(k, unit)| {
            (
                unit.name.clone(),
                (0..n).map(|h| v(reg.sym.balancing.gen[k][h])).collect(),
            )
        })
        .collect();

    let mut plant_builds = Vec::new();
    for (tag, plants, sym) in [
        ("Solar PV", reg.pv_plants(), &reg.sym.pv),
        ("Wind", reg.wind_plants(), &reg.sym.wind),
    ] {
        for (p, plant) in plants.iter().enumerate() {
            let fraction = v(sym.build[p]);
            plant_builds.push(PlantBuild {
                id: plant.id.clone(),
                technology: tag.to_string(),
                capacity_mw: plant.capacity_mw,
                fraction,
                built_mw: fraction * plant.capacity_mw,
                latitude: plant.latitude,
                longitude: plant.longitude,
            });
        }
    }

    let cost_decomposition = ledger.evaluate(values);
    let total_cost = outcome.objective.unwrap_or_else(|| ledger.total().value(values));

    let summary = build_summary(
        reg,
        &dispatch,
        &storage_capacity,
        &balancing_capacity,
        &plant_builds,
        &cost_decomposition,
        total_cost,
        values,
    );

    SdomResults {
        case: case.to_string(),
        status: outcome.status,
        stats,
        solve_time: outcome.solve_time,
        solution: Some(SolutionData {
            total_cost,
            dispatch,
            storage,
            storage_capacity,
            balancing_capacity,
            thermal_by_unit,
            plant_builds,
            cost_decomposition,
            summary,
        }),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_summary(
    reg: &ModelRegistry,
    dispatch: &[DispatchRow],
    storage_capacity: &[StorageCapacity],
    balancing_capacity: &[(String, f64)],
    plant_builds: &[PlantBuild],
    cost_decomposition: &[(String, f64)],
    total_cost: f64,
    values: &[f64],
) -> Vec<SummaryRow> {
    let mut rows = Vec::new();
    let mut push = |metric: &str, technology: &str, value: f64, unit: &str| {
        rows.push(SummaryRow {
            metric: metric.to_string(),
            technology: technology.to_string(),
            value,
            unit: unit.to_string(),
        });
    };

    push("Total cost", "", total_cost, "$US");

    // Installed capacities.
    let thermal_cap: f64 = balancing_capacity.iter().map(|(_, c)| c).sum();
    let pv_cap: f64 = plant_builds
        .iter()
        .filter(|p| p.technology == "Solar PV")
        .map(|p| p.built_mw)
        .sum();
    let wind_cap: f64 = plant_builds
        .iter()
        .filter(|p| p.technology == "Wind")
        .map(|p| p.built_mw)
        .sum();
    for (name, cap) in balancing_capacity {
        push("Capacity", name, *cap, "MW");
    }
    push("Capacity", "Thermal", thermal_cap, "MW");
    push("Capacity", "Solar PV", pv_cap, "MW");
    push("Capacity", "Wind", wind_cap, "MW");
    push("Capacity", "All", thermal_cap + pv_cap + wind_cap, "MW");

    for cap in storage_capacity {
        push("Charge power capacity", &cap.technology, cap.charge_mw, "MW");
    }
    let charge_all: f64 = storage_capacity.iter().map(|c| c.charge_mw).sum();
    push("Charge power capacity", "All", charge_all, "MW");
    for cap in storage_capacity {
        push(
            "Discharge power capacity",
            &cap.technology,
            cap.discharge_mw,
            "MW",
        );
    }
    let discharge_all: f64 = storage_capacity.iter().map(|c| c.discharge_mw).sum();
    push("Discharge power capacity", "All", discharge_all, "MW");
    for cap in storage_capacity {
        push("Energy capacity", &cap.technology, cap.energy_mwh, "MWh");
    }
    let energy_all: f64 = storage_capacity.iter().map(|c| c.energy_mwh).sum();
    push("Energy capacity", "All", energy_all, "MWh");

    // Realized discharge duration.
    for (j, tech) in reg.storage_techs().iter().enumerate() {
        let cap = &storage_capacity[j];
        let duration = tech.sqrt_eff() * cap.energy_mwh / (cap.discharge_mw + RATIO_EPS);
        push("Duration", &tech.name, duration, "h");
    }

    // Annual energy.
    let thermal_gen: f64 = dispatch.iter().map(|d| d.thermal_mw).sum();
    let pv_gen: f64 = dispatch.iter().map(|d| d.solar_gen_mw).sum();
    let wind_gen: f64 = dispatch.iter().map(|d| d.wind_gen_mw).sum();
    let hydro_gen: f64 = dispatch.iter().map(|d| d.hydro_mw).sum();
    let nuclear_gen: f64 = dispatch.iter().map(|d| d.nuclear_mw).sum();
    let other_gen: f64 = dispatch.iter().map(|d| d.other_renewables_mw).sum();
    push("Total generation", "Thermal", thermal_gen, "MWh");
    push("Total generation", "Solar PV", pv_gen, "MWh");
    push("Total generation", "Wind", wind_gen, "MWh");
    push("Total generation", "Hydro", hydro_gen, "MWh");
    push("Total generation", "Nuclear", nuclear_gen, "MWh");
    push("Total generation", "Other renewables", other_gen, "MWh");

    let mut storage_discharge_all = 0.0;
    let mut storage_charge_all = 0.0;
    for (j, tech) in reg.storage_techs().iter().enumerate() {
        let discharged: f64 = (0..reg.n_hours())
            .map(|h| values[reg.sym.storage.discharge[j][h].index()])
            .sum();
        let charged: f64 = (0..reg.n_hours())
            .map(|h| values[reg.sym.storage.charge[j][h].index()])
            .sum();
        storage_discharge_all += discharged;
        storage_charge_all += charged;
        push("Storage energy discharging", &tech.name, discharged, "MWh");
        push("Storage energy charging", &tech.name, charged, "MWh");
        let cycles =
            discharged / (values[reg.sym.storage.energy_cap[j].index()] + RATIO_EPS);
        push("Equivalent number of cycles", &tech.name, cycles, "-");
    }
    push("Storage energy discharging", "All", storage_discharge_all, "MWh");
    push("Storage energy charging", "All", storage_charge_all, "MWh");
    push(
        "Total generation",
        "All",
        thermal_gen + pv_gen + wind_gen + hydro_gen + nuclear_gen + other_gen
            + storage_discharge_all,
        "MWh",
    );

    let total_demand: f64 = dispatch.iter().map(|d| d.load_mw).sum();
    push("Total demand", "demand", total_demand, "MWh");
    let total_imports: f64 = dispatch.iter().map(|d| d.imports_mw).sum();
    let total_exports: f64 = dispatch.iter().map(|d| d.exports_mw).sum();
    push("Total Imports/Exports", "Imports", total_imports, "MWh");
    push("Total Imports/Exports", "Exports", total_exports, "MWh");

    for (label, value) in cost_decomposition {
        push("Cost term", label, *value, "$US");
    }

    rows
}
