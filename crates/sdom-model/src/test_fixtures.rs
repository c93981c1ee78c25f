//! Shared fixture builders for unit and integration tests.
//!
//! These construct small input bundles programmatically so tests do not need
//! case directories on disk.

use sdom_core::{
    BalancingUnit, FormulationMap, HydroMode, InputBundle, StorageTech, SystemScalars, TradeMode,
    VrePlant,
};

/// Flat-demand bundle with no plants, storage, or balancing units.
pub fn constant_demand_bundle(n_hours: usize, demand_mw: f64) -> InputBundle {
    InputBundle {
        n_hours,
        scalars: SystemScalars {
            discount_rate: 0.06,
            clean_target: 0.0,
            alpha_nuclear: 1.0,
            alpha_hydro: 1.0,
            alpha_other: 1.0,
            vre_lifetime_years: 30.0,
        },
        resilience: None,
        demand_mw: vec![demand_mw; n_hours],
        nuclear_mw: vec![0.0; n_hours],
        hydro_mw: vec![0.0; n_hours],
        other_renewables_mw: vec![0.0; n_hours],
        hydro_bounds: None,
        pv_plants: Vec::new(),
        wind_plants: Vec::new(),
        storage: Vec::new(),
        balancing: Vec::new(),
        trade: None,
        formulations: FormulationMap {
            hydro: HydroMode::RunOfRiver,
            trade: TradeMode::Disabled,
        },
    }
}

/// A free-to-build gas unit whose only cost is `fuel_price` per MWh
/// (heat rate 1, no CAPEX/FOM/VOM).
pub fn gas_unit(name: &str, fuel_price: f64) -> BalancingUnit {
    BalancingUnit {
        name: name.to_string(),
        min_capacity_mw: 0.0,
        max_capacity_mw: 100_000.0,
        lifetime_years: 30.0,
        capex_per_kw: 0.0,
        heat_rate: 1.0,
        fuel_price,
        vom_per_mwh: 0.0,
        fom_per_kw_yr: 0.0,
    }
}

/// A coupled Li-Ion-like storage technology with moderate costs.
pub fn storage_tech(name: &str) -> StorageTech {
    StorageTech {
        name: name.to_string(),
        p_capex_per_kw: 300.0,
        e_capex_per_kwh: 150.0,
        efficiency: 0.85,
        min_duration_h: 1.0,
        max_duration_h: 10.0,
        max_power_mw: 10_000.0,
        coupled: true,
        fom_per_kw_yr: 5.0,
        vom_per_mwh: 0.1,
        lifetime_years: 15.0,
        cost_ratio: 0.5,
        max_cycles: 3250.0,
    }
}

/// A VRE plant with a flat capacity-factor profile.
pub fn flat_cf_plant(id: &str, cf: f64, capacity_mw: f64, n_hours: usize) -> VrePlant {
    VrePlant {
        id: id.to_string(),
        capacity_mw,
        capex_per_kw: 800.0,
        fom_per_kw_yr: 10.0,
        trans_cap_cost: 0.0,
        latitude: None,
        longitude: None,
        capacity_factors: vec![cf; n_hours],
    }
}

/// One gas unit plus one storage technology on flat demand.
pub fn unit_and_storage_bundle(n_hours: usize, demand_mw: f64, fuel_price: f64) -> InputBundle {
    let mut bundle = constant_demand_bundle(n_hours, demand_mw);
    bundle.balancing.push(gas_unit("GasCC", fuel_price));
    bundle.storage.push(storage_tech("Li-Ion"));
    bundle
}
