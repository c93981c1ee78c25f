//! Constraint assembly: the common rows every configuration shares.
//!
//! Rows are emitted in fixed set-iteration order with stable names so LP
//! dumps and solver logs are reproducible for a given input.

use crate::linear::{LinExpr, LinearModel, Sense};
use crate::registry::{HydroDispatch, ModelRegistry};
use sdom_core::SdomResult;

/// Emit the system rows: hourly balance, clean-energy share, per-technology
/// VRE balance, balancing dispatch limits, and the storage operating
/// envelope.
///
/// `cyclic_soc` controls the state-of-charge recursion at the horizon edge:
/// the default model wraps hour 1 onto hour N, the resilience design stage
/// leaves the initial state free.
pub fn assemble_system(
    model: &mut LinearModel,
    reg: &ModelRegistry,
    cyclic_soc: bool,
) -> SdomResult<()> {
    emit_supply_balance(model, reg);
    emit_clean_share(model, reg);
    emit_vre_balance(model, reg);
    emit_balancing_dispatch(model, reg);
    emit_storage_envelope(model, reg, cyclic_soc);
    Ok(())
}

/// Supply/demand equality for every hour. Charging sits on the demand side,
/// curtailment appears nowhere here: curtailed energy is absorbed by the
/// per-technology VRE balance and is therefore free.
fn emit_supply_balance(model: &mut LinearModel, reg: &ModelRegistry) {
    for h in 0..reg.n_hours() {
        let mut expr = LinExpr::new();
        for j in 0..reg.storage_techs().len() {
            expr.add_term(reg.sym.storage.charge[j][h], 1.0);
            expr.add_term(reg.sym.storage.discharge[j][h], -1.0);
        }
        expr.add_term(reg.sym.pv.gen[h], -1.0);
        expr.add_term(reg.sym.wind.gen[h], -1.0);
        for k in 0..reg.balancing_units().len() {
            expr.add_term(reg.sym.balancing.gen[k][h], -1.0);
        }
        if let HydroDispatch::Scheduled(vars) = &reg.sym.hydro {
            expr.add_term(vars[h], -1.0);
        }
        if let Some(trade) = &reg.sym.trade {
            expr.add_term(trade.imports[h], -1.0);
            expr.add_term(trade.exports[h], 1.0);
        }
        let rhs = reg.nuclear_fixed(h) + reg.other_fixed(h) + reg.hydro_fixed(h) - reg.demand(h);
        model.add_row(format!("SupplyBalance[{}]", h + 1), expr, Sense::Eq, rhs);
    }
}

/// Balancing-unit energy may cover at most `1 - target` of net-load-adjusted
/// demand: demand plus storage charging minus storage discharging.
fn emit_clean_share(model: &mut LinearModel, reg: &ModelRegistry) {
    let allowed = 1.0 - reg.clean_target();
    let mut expr = LinExpr::new();
    let mut total_demand = 0.0;
    for h in 0..reg.n_hours() {
        total_demand += reg.demand(h);
        for k in 0..reg.balancing_units().len() {
            expr.add_term(reg.sym.balancing.gen[k][h], 1.0);
        }
        for j in 0..reg.storage_techs().len() {
            expr.add_term(reg.sym.storage.charge[j][h], -allowed);
            expr.add_term(reg.sym.storage.discharge[j][h], allowed);
        }
    }
    model.add_row("GenMixShare", expr, Sense::Leq, allowed * total_demand);
}

/// Dispatched generation plus curtailment equals the available capacity of
/// the built fraction, per VRE technology and hour.
fn emit_vre_balance(model: &mut LinearModel, reg: &ModelRegistry) {
    for (tag, plants, sym) in [
        ("Solar", reg.pv_plants(), &reg.sym.pv),
        ("Wind", reg.wind_plants(), &reg.sym.wind),
    ] {
        for h in 0..reg.n_hours() {
            let mut expr = LinExpr::term(sym.gen[h], 1.0);
            expr.add_term(sym.curt[h], 1.0);
            for (p, plant) in plants.iter().enumerate() {
                expr.add_term(sym.build[p], -plant.availability_mw(h));
            }
            model.add_row(format!("{tag}Balance[{}]", h + 1), expr, Sense::Eq, 0.0);
        }
    }
}

fn emit_balancing_dispatch(model: &mut LinearModel, reg: &ModelRegistry) {
    for (k, unit) in reg.balancing_units().iter().enumerate() {
        for h in 0..reg.n_hours() {
            let mut expr = LinExpr::term(reg.sym.balancing.gen[k][h], 1.0);
            expr.add_term(reg.sym.balancing.capacity[k], -1.0);
            model.add_row(
                format!("BalDispatch[{},{}]", unit.name, h + 1),
                expr,
                Sense::Leq,
                0.0,
            );
        }
    }
}

fn emit_storage_envelope(model: &mut LinearModel, reg: &ModelRegistry, cyclic_soc: bool) {
    let n = reg.n_hours();
    for (j, tech) in reg.storage_techs().iter().enumerate() {
        let s = &reg.sym.storage;
        let sqrt_eff = tech.sqrt_eff();

        for h in 0..n {
            // Charge-xor-discharge through the per-tech big-M (Max_P).
            let mut charge_mode = LinExpr::term(s.charge[j][h], 1.0);
            charge_mode.add_term(s.charge_mode[j][h], -tech.max_power_mw);
            model.add_row(
                format!("ChargeMode[{},{}]", tech.name, h + 1),
                charge_mode,
                Sense::Leq,
                0.0,
            );
            let mut discharge_mode = LinExpr::term(s.discharge[j][h], 1.0);
            discharge_mode.add_term(s.charge_mode[j][h], tech.max_power_mw);
            model.add_row(
                format!("DischargeMode[{},{}]", tech.name, h + 1),
                discharge_mode,
                Sense::Leq,
                tech.max_power_mw,
            );

            // Hourly dispatch within installed power capacity.
            let mut charge_cap = LinExpr::term(s.charge[j][h], 1.0);
            charge_cap.add_term(s.charge_cap[j], -1.0);
            model.add_row(
                format!("ChargeCap[{},{}]", tech.name, h + 1),
                charge_cap,
                Sense::Leq,
                0.0,
            );
            let mut discharge_cap = LinExpr::term(s.discharge[j][h], 1.0);
            discharge_cap.add_term(s.discharge_cap[j], -1.0);
            model.add_row(
                format!("DischargeCap[{},{}]", tech.name, h + 1),
                discharge_cap,
                Sense::Leq,
                0.0,
            );

            // Stored energy within installed energy capacity.
            let mut max_soc = LinExpr::term(s.soc[j][h], 1.0);
            max_soc.add_term(s.energy_cap[j], -1.0);
            model.add_row(
                format!("MaxSOC[{},{}]", tech.name, h + 1),
                max_soc,
                Sense::Leq,
                0.0,
            );
        }

        // State-of-charge recursion. Hour N precedes hour 1; no separate
        // initial-SOC variable exists.
        for h in 0..n {
            if h == 0 && !cyclic_soc {
                continue;
            }
            let prev = if h == 0 { n - 1 } else { h - 1 };
            let mut soc = LinExpr::term(s.soc[j][h], 1.0);
            soc.add_term(s.soc[j][prev], -1.0);
            soc.add_term(s.charge[j][h], -sqrt_eff);
            soc.add_term(s.discharge[j][h], 1.0 / sqrt_eff);
            model.add_row(
                format!("SOCBalance[{},{}]", tech.name, h + 1),
                soc,
                Sense::Eq,
                0.0,
            );
        }

        // Coupled technologies share charge/discharge equipment.
        if tech.coupled {
            let mut coupled = LinExpr::term(s.charge_cap[j], 1.0);
            coupled.add_term(s.discharge_cap[j], -1.0);
            model.add_row(format!("Coupled[{}]", tech.name), coupled, Sense::Eq, 0.0);
        }

        // Duration window relative to discharge power, corrected for
        // discharge efficiency.
        let mut min_dur = LinExpr::term(s.discharge_cap[j], tech.min_duration_h / sqrt_eff);
        min_dur.add_term(s.energy_cap[j], -1.0);
        model.add_row(
            format!("MinDuration[{}]", tech.name),
            min_dur,
            Sense::Leq,
            0.0,
        );
        let mut max_dur = LinExpr::term(s.energy_cap[j], 1.0);
        max_dur.add_term(s.discharge_cap[j], -tech.max_duration_h / sqrt_eff);
        model.add_row(
            format!("MaxDuration[{}]", tech.name),
            max_dur,
            Sense::Leq,
            0.0,
        );

        // Annualized cycle-life cap on discharge throughput.
        let mut cycles = LinExpr::new();
        for h in 0..n {
            cycles.add_term(s.discharge[j][h], 1.0);
        }
        cycles.add_term(s.energy_cap[j], -tech.annual_cycle_rate());
        model.add_row(format!("CycleCap[{}]", tech.name), cycles, Sense::Leq, 0.0);
    }
}

/// Bound total balancing capacity by the peak demand left after the fixed
/// clean sources.
pub fn emit_peak_residual_cap(model: &mut LinearModel, reg: &ModelRegistry) {
    if reg.balancing_units().is_empty() {
        return;
    }
    let mut expr = LinExpr::new();
    for k in 0..reg.balancing_units().len() {
        expr.add_term(reg.sym.balancing.capacity[k], 1.0);
    }
    model.add_row(
        "PeakResidualCap",
        expr,
        Sense::Leq,
        reg.peak_residual_demand(),
    );
}
