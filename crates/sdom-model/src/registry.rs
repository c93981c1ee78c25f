//! Symbol registry: every set, parameter and decision variable of the model,
//! declared with its domain and bounds, plus typed handles for the builders.
//!
//! The registry is the only read path for the objective and constraint
//! builders; parameter accessors apply stage overrides (demand replacement,
//! activation factors, clean target) so the two-stage orchestrator never
//! touches the immutable input bundle.

use crate::linear::{LinearModel, VarId};
use sdom_core::{BalancingUnit, InputBundle, ResilienceScalars, StorageTech, VrePlant};
use std::sync::Arc;

/// Per-technology VRE handles, one entry per plant or per hour.
#[derive(Debug, Clone)]
pub struct VreSymbols {
    /// Build fraction per plant, in [0, 1].
    pub build: Vec<VarId>,
    /// Dispatched generation per hour, MW.
    pub gen: Vec<VarId>,
    /// Curtailment per hour, MW.
    pub curt: Vec<VarId>,
}

/// Storage handles, outer index = technology, inner = hour.
#[derive(Debug, Clone)]
pub struct StorageSymbols {
    pub charge: Vec<Vec<VarId>>,
    pub discharge: Vec<Vec<VarId>>,
    pub soc: Vec<Vec<VarId>>,
    /// Binary charge-mode indicator per (tech, hour).
    pub charge_mode: Vec<Vec<VarId>>,
    pub charge_cap: Vec<VarId>,
    pub discharge_cap: Vec<VarId>,
    pub energy_cap: Vec<VarId>,
}

/// Balancing-unit handles.
#[derive(Debug, Clone)]
pub struct BalancingSymbols {
    pub capacity: Vec<VarId>,
    /// Generation per unit per hour.
    pub gen: Vec<Vec<VarId>>,
}

/// How hydro enters the hourly balance: pinned to the scaled profile
/// (run-of-river) or dispatched through per-hour variables (budget modes).
#[derive(Debug, Clone)]
pub enum HydroDispatch {
    Fixed,
    Scheduled(Vec<VarId>),
}

/// Trade handles, present only for the price/net-load formulation.
#[derive(Debug, Clone)]
pub struct TradeSymbols {
    pub imports: Vec<VarId>,
    pub exports: Vec<VarId>,
    /// Binary net-load sign indicator per hour: 1 when net load is positive.
    pub import_mode: Vec<VarId>,
}

/// Typed handles for every declared variable family.
#[derive(Debug, Clone)]
pub struct Symbols {
    pub pv: VreSymbols,
    pub wind: VreSymbols,
    pub storage: StorageSymbols,
    pub balancing: BalancingSymbols,
    pub hydro: HydroDispatch,
    pub trade: Option<TradeSymbols>,
}

/// Stage-specific parameter replacements. Applied by the orchestrator,
/// observed through the registry accessors.
#[derive(Debug, Clone, Default)]
pub struct StageOverrides {
    pub demand: Option<Vec<f64>>,
    pub alpha_nuclear: Option<f64>,
    pub alpha_hydro: Option<f64>,
    pub alpha_other: Option<f64>,
    pub clean_target: Option<f64>,
}

/// The model's symbol table plus parameter views.
#[derive(Debug)]
pub struct ModelRegistry {
    bundle: Arc<InputBundle>,
    overrides: StageOverrides,
    pub sym: Symbols,
}

impl ModelRegistry {
    /// Declare every base variable family into `model` in deterministic
    /// set-iteration order. Hydro and trade variables are contributed later
    /// by their sub-formulations.
    pub fn declare(bundle: Arc<InputBundle>, model: &mut LinearModel) -> Self {
        let n = bundle.n_hours;

        let declare_vre = |model: &mut LinearModel, plants: &[VrePlant], tag: &str| VreSymbols {
            build: plants
                .iter()
                .map(|p| model.add_var(format!("Y{tag}[{}]", p.id), 0.0, 1.0))
                .collect(),
            gen: (0..n)
                .map(|h| model.add_var(format!("Gen{tag}[{}]", h + 1), 0.0, f64::INFINITY))
                .collect(),
            curt: (0..n)
                .map(|h| model.add_var(format!("Curt{tag}[{}]", h + 1), 0.0, f64::INFINITY))
                .collect(),
        };

        let pv = declare_vre(model, &bundle.pv_plants, "PV");
        let wind = declare_vre(model, &bundle.wind_plants, "Wind");

        let balancing = BalancingSymbols {
            capacity: bundle
                .balancing
                .iter()
                .map(|u| {
                    model.add_var(
                        format!("CapBal[{}]", u.name),
                        u.min_capacity_mw,
                        u.max_capacity_mw,
                    )
                })
                .collect(),
            gen: bundle
                .balancing
                .iter()
                .map(|u| {
                    (0..n)
                        .map(|h| {
                            model.add_var(format!("GenBal[{},{}]", u.name, h + 1), 0.0, f64::INFINITY)
                        })
                        .collect()
                })
                .collect(),
        };

        let storage = StorageSymbols {
            charge_cap: bundle
                .storage
                .iter()
                .map(|t| model.add_var(format!("Pcha[{}]", t.name), 0.0, t.max_power_mw))
                .collect(),
            discharge_cap: bundle
                .storage
                .iter()
                .map(|t| model.add_var(format!("Pdis[{}]", t.name), 0.0, t.max_power_mw))
                .collect(),
            energy_cap: bundle
                .storage
                .iter()
                .map(|t| model.add_var(format!("Ecap[{}]", t.name), 0.0, f64::INFINITY))
                .collect(),
            charge: bundle
                .storage
                .iter()
                .map(|t| {
                    (0..n)
                        .map(|h| {
                            model.add_var(format!("PC[{},{}]", t.name, h + 1), 0.0, t.max_power_mw)
                        })
                        .collect()
                })
                .collect(),
            discharge: bundle
                .storage
                .iter()
                .map(|t| {
                    (0..n)
                        .map(|h| {
                            model.add_var(format!("PD[{},{}]", t.name, h + 1), 0.0, t.max_power_mw)
                        })
                        .collect()
                })
                .collect(),
            soc: bundle
                .storage
                .iter()
                .map(|t| {
                    (0..n)
                        .map(|h| {
                            model.add_var(format!("SOC[{},{}]", t.name, h + 1), 0.0, f64::INFINITY)
                        })
                        .collect()
                })
                .collect(),
            charge_mode: bundle
                .storage
                .iter()
                .map(|t| {
                    (0..n)
                        .map(|h| model.add_binary(format!("Ycha[{},{}]", t.name, h + 1)))
                        .collect()
                })
                .collect(),
        };

        Self {
            bundle,
            overrides: StageOverrides::default(),
            sym: Symbols {
                pv,
                wind,
                storage,
                balancing,
                hydro: HydroDispatch::Fixed,
                trade: None,
            },
        }
    }

    pub fn bundle(&self) -> &InputBundle {
        &self.bundle
    }

    pub fn n_hours(&self) -> usize {
        self.bundle.n_hours
    }

    pub fn set_overrides(&mut self, overrides: StageOverrides) {
        self.overrides = overrides;
    }

    pub fn clear_overrides(&mut self) {
        self.overrides = StageOverrides::default();
    }

    // ---- parameter views (override-aware) ----

    pub fn demand(&self, h: usize) -> f64 {
        match &self.overrides.demand {
            Some(d) => d[h],
            None => self.bundle.demand_mw[h],
        }
    }

    pub fn alpha_nuclear(&self) -> f64 {
        self.overrides
            .alpha_nuclear
            .unwrap_or(self.bundle.scalars.alpha_nuclear)
    }

    pub fn alpha_hydro(&self) -> f64 {
        self.overrides
            .alpha_hydro
            .unwrap_or(self.bundle.scalars.alpha_hydro)
    }

    pub fn alpha_other(&self) -> f64 {
        self.overrides
            .alpha_other
            .unwrap_or(self.bundle.scalars.alpha_other)
    }

    pub fn clean_target(&self) -> f64 {
        self.overrides
            .clean_target
            .unwrap_or(self.bundle.scalars.clean_target)
    }

    /// Nuclear contribution to the hour's supply, MW.
    pub fn nuclear_fixed(&self, h: usize) -> f64 {
        self.alpha_nuclear() * self.bundle.nuclear_mw[h]
    }

    /// Other-renewables contribution to the hour's supply, MW.
    pub fn other_fixed(&self, h: usize) -> f64 {
        self.alpha_other() * self.bundle.other_renewables_mw[h]
    }

    /// Scaled hydro profile value; the dispatched quantity under
    /// run-of-river, the budget source under the budget modes.
    pub fn hydro_scaled(&self, h: usize) -> f64 {
        self.alpha_hydro() * self.bundle.hydro_mw[h]
    }

    /// Hydro term of the hourly balance when dispatch is pinned; zero when a
    /// scheduled variable carries it instead.
    pub fn hydro_fixed(&self, h: usize) -> f64 {
        match self.sym.hydro {
            HydroDispatch::Fixed => self.hydro_scaled(h),
            HydroDispatch::Scheduled(_) => 0.0,
        }
    }

    pub fn storage_techs(&self) -> &[StorageTech] {
        &self.bundle.storage
    }

    pub fn balancing_units(&self) -> &[BalancingUnit] {
        &self.bundle.balancing
    }

    pub fn pv_plants(&self) -> &[VrePlant] {
        &self.bundle.pv_plants
    }

    pub fn wind_plants(&self) -> &[VrePlant] {
        &self.bundle.wind_plants
    }

    pub fn resilience(&self) -> Option<&ResilienceScalars> {
        self.bundle.resilience.as_ref()
    }

    pub fn discount_rate(&self) -> f64 {
        self.bundle.scalars.discount_rate
    }

    pub fn crf_vre(&self) -> f64 {
        self.bundle.crf_vre()
    }

    /// Peak demand net of the fixed clean sources under the current
    /// overrides; bounds total balancing capacity.
    pub fn peak_residual_demand(&self) -> f64 {
        (0..self.n_hours())
            .map(|h| {
                self.demand(h) - self.nuclear_fixed(h) - self.hydro_scaled(h) - self.other_fixed(h)
            })
            .fold(0.0_f64, f64::max)
    }

    /// Big-M for the net-load sign indicator: the greater of peak demand and
    /// peak VRE availability.
    pub fn trade_big_m(&self) -> f64 {
        self.bundle
            .peak_demand()
            .max(self.bundle.peak_vre_availability())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::unit_and_storage_bundle;

    #[test]
    fn test_declare_counts_and_bounds() {
        let bundle = Arc::new(unit_and_storage_bundle(24, 100.0, 10.0));
        let mut model = LinearModel::new("t");
        let reg = ModelRegistry::declare(bundle, &mut model);

        // One balancing unit, one storage tech, no plants.
        assert_eq!(reg.sym.balancing.capacity.len(), 1);
        assert_eq!(reg.sym.balancing.gen[0].len(), 24);
        assert_eq!(reg.sym.storage.charge.len(), 1);
        assert_eq!(reg.sym.storage.charge_mode[0].len(), 24);

        let stats = model.stats();
        // Hourly VRE dispatch/curtailment columns exist even with no plants
        // (48 per technology), plus the unit (1 + 24) and the storage family
        // (3 caps + 3*24 hourly + 24 binaries).
        assert_eq!(stats.columns, 48 + 48 + 25 + 99);
        assert_eq!(stats.binaries, 24);

        let (lo, hi) = model.bounds(reg.sym.storage.charge_cap[0]);
        assert_eq!(lo, 0.0);
        assert!(hi > 0.0);
    }

    #[test]
    fn test_overrides_replace_parameters() {
        let bundle = Arc::new(unit_and_storage_bundle(4, 100.0, 10.0));
        let mut model = LinearModel::new("t");
        let mut reg = ModelRegistry::declare(bundle, &mut model);

        assert_eq!(reg.demand(2), 100.0);
        reg.set_overrides(StageOverrides {
            demand: Some(vec![0.0, 0.0, 50.0, 0.0]),
            alpha_nuclear: Some(0.0),
            clean_target: Some(0.0),
            ..Default::default()
        });
        assert_eq!(reg.demand(2), 50.0);
        assert_eq!(reg.alpha_nuclear(), 0.0);
        assert_eq!(reg.clean_target(), 0.0);
        reg.clear_overrides();
        assert_eq!(reg.demand(2), 100.0);
    }
}
