//! The immutable input bundle produced by the case loader.
//!
//! A bundle holds everything the model builder needs: system scalars, hourly
//! series, per-plant VRE tables, the storage and balancing-unit tables, trade
//! series, and the formulation selection. Bundles are immutable after
//! loading and freely shareable between model instances.

use crate::error::{SdomError, SdomResult};
use crate::formulation::FormulationMap;
use crate::units::capital_recovery_factor;

/// System-level scalar parameters from the `Scalars` table.
#[derive(Debug, Clone)]
pub struct SystemScalars {
    /// Discount rate `r`, per year.
    pub discount_rate: f64,
    /// Minimum clean-energy share of net-adjusted demand, in [0, 1].
    pub clean_target: f64,
    /// Activation factor for the nuclear profile.
    pub alpha_nuclear: f64,
    /// Activation factor for the large-hydro profile.
    pub alpha_hydro: f64,
    /// Activation factor for the other-renewables profile.
    pub alpha_other: f64,
    /// Shared lifetime for VRE annualization, years.
    pub vre_lifetime_years: f64,
}

/// Scalars consumed only by the two-stage resilience workflow.
#[derive(Debug, Clone)]
pub struct ResilienceScalars {
    /// Fraction of peak demand considered critical (used when no explicit
    /// critical peak load is given).
    pub critical_load_frac: f64,
    /// Outage ride-through duration, hours (`max_backup_power_dur`).
    pub backup_hours: usize,
    /// First hour of the designated outage window, 1-indexed.
    pub outage_start_hour: usize,
    /// Grace period after the outage during which the SOC reserve is not
    /// enforced, hours.
    pub soc_restore_hours: usize,
    /// Explicit critical peak load, MW; 0 means derive from the fraction.
    pub critical_peak_load_mw: f64,
}

impl ResilienceScalars {
    /// The constant critical load the storage fleet must ride through.
    pub fn critical_load(&self, demand: &[f64]) -> f64 {
        if self.critical_peak_load_mw > 0.0 {
            self.critical_peak_load_mw
        } else {
            let peak = demand.iter().cloned().fold(0.0_f64, f64::max);
            self.critical_load_frac * peak
        }
    }

    /// The outage window as a half-open 0-based hour range.
    pub fn outage_window(&self, n_hours: usize) -> SdomResult<std::ops::Range<usize>> {
        if self.outage_start_hour == 0 {
            return Err(SdomError::Data(
                "outage_start_hour is 1-indexed and must be positive".into(),
            ));
        }
        let start = self.outage_start_hour - 1;
        let end = start + self.backup_hours;
        if self.backup_hours == 0 || end > n_hours {
            return Err(SdomError::Data(format!(
                "outage window [{}, {}) does not fit a {}-hour horizon",
                start + 1,
                end + 1,
                n_hours
            )));
        }
        Ok(start..end)
    }
}

/// One VRE plant (PV or wind site) with its hourly capacity-factor profile.
#[derive(Debug, Clone)]
pub struct VrePlant {
    /// Site identifier (`sc_gid` in the capacity tables).
    pub id: String,
    /// Maximum buildable capacity, MW.
    pub capacity_mw: f64,
    /// Capital cost, $/kW.
    pub capex_per_kw: f64,
    /// Fixed O&M, $/kW-yr.
    pub fom_per_kw_yr: f64,
    /// Lump-sum transmission interconnection cost, $.
    pub trans_cap_cost: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Hourly capacity factors, one per model hour, in [0, 1].
    pub capacity_factors: Vec<f64>,
}

impl VrePlant {
    /// Available power at full build in hour `h` (0-based), MW.
    pub fn availability_mw(&self, h: usize) -> f64 {
        self.capacity_factors[h] * self.capacity_mw
    }
}

/// One storage technology column from the `StorageData` table.
#[derive(Debug, Clone)]
pub struct StorageTech {
    pub name: String,
    /// Power capital cost, $/kW.
    pub p_capex_per_kw: f64,
    /// Energy capital cost, $/kWh.
    pub e_capex_per_kwh: f64,
    /// Round-trip efficiency, in (0, 1].
    pub efficiency: f64,
    /// Minimum discharge duration, hours.
    pub min_duration_h: f64,
    /// Maximum discharge duration, hours.
    pub max_duration_h: f64,
    /// Maximum charge or discharge power, MW.
    pub max_power_mw: f64,
    /// Charge and discharge share equipment; power capacities must match.
    pub coupled: bool,
    /// Fixed O&M, $/kW-yr.
    pub fom_per_kw_yr: f64,
    /// Variable O&M on discharge, $/MWh.
    pub vom_per_mwh: f64,
    pub lifetime_years: f64,
    /// Fraction of power cost borne by the charge side, in [0, 1].
    pub cost_ratio: f64,
    /// Lifetime full-cycle budget.
    pub max_cycles: f64,
}

impl StorageTech {
    /// Square root of the round-trip efficiency, applied half on charge and
    /// half on discharge.
    pub fn sqrt_eff(&self) -> f64 {
        self.efficiency.sqrt()
    }

    pub fn crf(&self, discount_rate: f64) -> f64 {
        capital_recovery_factor(discount_rate, self.lifetime_years)
    }

    /// Allowed annual discharge throughput per MWh of energy capacity.
    pub fn annual_cycle_rate(&self) -> f64 {
        self.max_cycles / self.lifetime_years
    }
}

/// One dispatchable balancing unit from the `Data_BalancingUnits` table.
#[derive(Debug, Clone)]
pub struct BalancingUnit {
    pub name: String,
    pub min_capacity_mw: f64,
    pub max_capacity_mw: f64,
    pub lifetime_years: f64,
    /// Capital cost, $/kW.
    pub capex_per_kw: f64,
    /// Heat rate, MMBtu/MWh.
    pub heat_rate: f64,
    /// Fuel price, $/MMBtu.
    pub fuel_price: f64,
    /// Variable O&M, $/MWh.
    pub vom_per_mwh: f64,
    /// Fixed O&M, $/kW-yr.
    pub fom_per_kw_yr: f64,
}

impl BalancingUnit {
    pub fn crf(&self, discount_rate: f64) -> f64 {
        capital_recovery_factor(discount_rate, self.lifetime_years)
    }

    /// Fuel plus variable O&M cost of one MWh of generation.
    pub fn marginal_cost(&self) -> f64 {
        self.fuel_price * self.heat_rate + self.vom_per_mwh
    }
}

/// Hourly trade capacities and prices (present only when trade is modeled).
#[derive(Debug, Clone)]
pub struct TradeSeries {
    pub import_cap_mw: Vec<f64>,
    pub import_price: Vec<f64>,
    pub export_cap_mw: Vec<f64>,
    pub export_price: Vec<f64>,
}

/// Hourly hydro dispatch bounds (present only for budget hydro variants).
#[derive(Debug, Clone)]
pub struct HydroBounds {
    pub upper_mw: Vec<f64>,
    pub lower_mw: Vec<f64>,
}

/// Everything the model builder reads. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct InputBundle {
    pub n_hours: usize,
    pub scalars: SystemScalars,
    pub resilience: Option<ResilienceScalars>,
    pub demand_mw: Vec<f64>,
    pub nuclear_mw: Vec<f64>,
    pub hydro_mw: Vec<f64>,
    pub other_renewables_mw: Vec<f64>,
    pub hydro_bounds: Option<HydroBounds>,
    pub pv_plants: Vec<VrePlant>,
    pub wind_plants: Vec<VrePlant>,
    pub storage: Vec<StorageTech>,
    pub balancing: Vec<BalancingUnit>,
    pub trade: Option<TradeSeries>,
    pub formulations: FormulationMap,
}

impl InputBundle {
    /// The shared VRE capital recovery factor.
    pub fn crf_vre(&self) -> f64 {
        capital_recovery_factor(self.scalars.discount_rate, self.scalars.vre_lifetime_years)
    }

    pub fn peak_demand(&self) -> f64 {
        self.demand_mw.iter().cloned().fold(0.0_f64, f64::max)
    }

    /// Peak demand left after the fixed clean sources, bounding total
    /// balancing capacity.
    pub fn peak_residual_demand(&self) -> f64 {
        let s = &self.scalars;
        (0..self.n_hours)
            .map(|h| {
                self.demand_mw[h]
                    - s.alpha_nuclear * self.nuclear_mw[h]
                    - s.alpha_hydro * self.hydro_mw[h]
                    - s.alpha_other * self.other_renewables_mw[h]
            })
            .fold(0.0_f64, f64::max)
    }

    /// Peak hourly VRE availability at full build across all plants.
    pub fn peak_vre_availability(&self) -> f64 {
        (0..self.n_hours)
            .map(|h| {
                self.pv_plants
                    .iter()
                    .chain(self.wind_plants.iter())
                    .map(|p| p.availability_mw(h))
                    .sum::<f64>()
            })
            .fold(0.0_f64, f64::max)
    }

    /// Enforce the loader invariants that do not depend on how the tables
    /// were read. Fails fast with a [`SdomError::Data`] before any model is
    /// built.
    pub fn validate(&self) -> SdomResult<()> {
        let n = self.n_hours;
        if n == 0 {
            return Err(SdomError::Data("horizon must cover at least one hour".into()));
        }
        for (name, series) in [
            ("demand", &self.demand_mw),
            ("nuclear", &self.nuclear_mw),
            ("hydro", &self.hydro_mw),
            ("other renewables", &self.other_renewables_mw),
        ] {
            check_series(name, series, n)?;
        }

        let s = &self.scalars;
        if !(s.discount_rate > 0.0) || !s.discount_rate.is_finite() {
            return Err(SdomError::Data(format!(
                "discount rate must be positive, got {}",
                s.discount_rate
            )));
        }
        if !(0.0..=1.0).contains(&s.clean_target) {
            return Err(SdomError::Data(format!(
                "clean-energy target must lie in [0, 1], got {}",
                s.clean_target
            )));
        }
        if s.vre_lifetime_years <= 0.0 {
            return Err(SdomError::Data("VRE lifetime must be positive".into()));
        }

        for (label, plants) in [("solar", &self.pv_plants), ("wind", &self.wind_plants)] {
            for plant in plants.iter() {
                if plant.capacity_factors.len() != n {
                    return Err(SdomError::Data(format!(
                        "{label} plant {} has {} capacity factors for a {n}-hour horizon",
                        plant.id,
                        plant.capacity_factors.len()
                    )));
                }
                if plant.capacity_factors.iter().any(|cf| !(0.0..=1.0).contains(cf)) {
                    return Err(SdomError::Data(format!(
                        "{label} plant {} has a capacity factor outside [0, 1]",
                        plant.id
                    )));
                }
                for (field, value) in [
                    ("capacity", plant.capacity_mw),
                    ("CAPEX", plant.capex_per_kw),
                    ("FOM", plant.fom_per_kw_yr),
                    ("transmission cost", plant.trans_cap_cost),
                ] {
                    if !value.is_finite() || value < 0.0 {
                        return Err(SdomError::Data(format!(
                            "{label} plant {} has invalid {field} {value}",
                            plant.id
                        )));
                    }
                }
            }
        }

        for tech in &self.storage {
            if !(tech.efficiency > 0.0 && tech.efficiency <= 1.0) {
                return Err(SdomError::Data(format!(
                    "storage {} efficiency must lie in (0, 1], got {}",
                    tech.name, tech.efficiency
                )));
            }
            if tech.min_duration_h < 0.0 || tech.min_duration_h > tech.max_duration_h {
                return Err(SdomError::Data(format!(
                    "storage {} duration bounds [{}, {}] are inconsistent",
                    tech.name, tech.min_duration_h, tech.max_duration_h
                )));
            }
            if !(0.0..=1.0).contains(&tech.cost_ratio) {
                return Err(SdomError::Data(format!(
                    "storage {} cost ratio must lie in [0, 1], got {}",
                    tech.name, tech.cost_ratio
                )));
            }
            if tech.lifetime_years <= 0.0 {
                return Err(SdomError::Data(format!(
                    "storage {} lifetime must be positive",
                    tech.name
                )));
            }
            for (field, value) in [
                ("power CAPEX", tech.p_capex_per_kw),
                ("energy CAPEX", tech.e_capex_per_kwh),
                ("max power", tech.max_power_mw),
                ("FOM", tech.fom_per_kw_yr),
                ("VOM", tech.vom_per_mwh),
                ("max cycles", tech.max_cycles),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(SdomError::Data(format!(
                        "storage {} has invalid {field} {value}",
                        tech.name
                    )));
                }
            }
        }

        for unit in &self.balancing {
            if unit.min_capacity_mw < 0.0 || unit.min_capacity_mw > unit.max_capacity_mw {
                return Err(SdomError::Data(format!(
                    "balancing unit {} capacity bounds [{}, {}] are inconsistent",
                    unit.name, unit.min_capacity_mw, unit.max_capacity_mw
                )));
            }
            if unit.lifetime_years <= 0.0 {
                return Err(SdomError::Data(format!(
                    "balancing unit {} lifetime must be positive",
                    unit.name
                )));
            }
            for (field, value) in [
                ("CAPEX", unit.capex_per_kw),
                ("heat rate", unit.heat_rate),
                ("fuel price", unit.fuel_price),
                ("VOM", unit.vom_per_mwh),
                ("FOM", unit.fom_per_kw_yr),
            ] {
                if !value.is_finite() || value < 0.0 {
                    return Err(SdomError::Data(format!(
                        "balancing unit {} has invalid {field} {value}",
                        unit.name
                    )));
                }
            }
        }

        if let Some(trade) = &self.trade {
            for (name, series) in [
                ("import capacity", &trade.import_cap_mw),
                ("import price", &trade.import_price),
                ("export capacity", &trade.export_cap_mw),
                ("export price", &trade.export_price),
            ] {
                check_series(name, series, n)?;
            }
        }

        self.validate_hydro_budgets()?;

        if let Some(res) = &self.resilience {
            res.outage_window(n)?;
            if res.critical_load(&self.demand_mw) <= 0.0 {
                return Err(SdomError::Data(
                    "resilience requires a positive critical load".into(),
                ));
            }
        }

        Ok(())
    }

    /// Per budget period, the energy budget must be attainable inside the
    /// hourly dispatch bounds.
    fn validate_hydro_budgets(&self) -> SdomResult<()> {
        let mode = self.formulations.hydro;
        if !mode.is_budgeted() {
            return Ok(());
        }
        let bounds = self.hydro_bounds.as_ref().ok_or_else(|| {
            SdomError::Config("budget hydro formulations require lahy_max/lahy_min tables".into())
        })?;
        check_series("hydro upper bound", &bounds.upper_mw, self.n_hours)?;
        check_series("hydro lower bound", &bounds.lower_mw, self.n_hours)?;

        let alpha = self.scalars.alpha_hydro;
        for (b, period) in mode.budget_periods(self.n_hours)?.iter().enumerate() {
            let budget: f64 = period.clone().map(|h| alpha * self.hydro_mw[h]).sum();
            let lo: f64 = period.clone().map(|h| alpha * bounds.lower_mw[h]).sum();
            let hi: f64 = period.clone().map(|h| alpha * bounds.upper_mw[h]).sum();
            if budget < lo - 1e-6 || budget > hi + 1e-6 {
                return Err(SdomError::Data(format!(
                    "hydro budget {budget:.3} MWh for period {} lies outside the \
                     attainable range [{lo:.3}, {hi:.3}]",
                    b + 1
                )));
            }
            for h in period.clone() {
                if bounds.lower_mw[h] > bounds.upper_mw[h] {
                    return Err(SdomError::Data(format!(
                        "hydro bounds cross at hour {}",
                        h + 1
                    )));
                }
            }
        }
        Ok(())
    }
}

fn check_series(name: &str, series: &[f64], n_hours: usize) -> SdomResult<()> {
    if series.len() != n_hours {
        return Err(SdomError::Data(format!(
            "{name} series has {} entries for a {n_hours}-hour horizon",
            series.len()
        )));
    }
    for (h, v) in series.iter().enumerate() {
        if !v.is_finite() {
            return Err(SdomError::Data(format!(
                "{name} series is not finite at hour {}",
                h + 1
            )));
        }
        if *v < 0.0 {
            return Err(SdomError::Data(format!(
                "{name} series is negative at hour {}",
                h + 1
            )));
        }
    }
    Ok(())
}
