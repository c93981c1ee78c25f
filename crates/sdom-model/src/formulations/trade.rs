//! Trade axis: price-driven imports/exports gated by the net-load sign.
//!
//! A binary per hour ties trade direction to the sign of the net load
//! (demand minus every non-dispatchable clean source available that hour):
//! imports only when the net load is positive, exports only when it is not.

use super::FormulationBlock;
use crate::linear::{LinExpr, LinearModel, Sense, VarId};
use crate::registry::{HydroDispatch, ModelRegistry, TradeSymbols};
use sdom_core::{SdomError, SdomResult};

/// Sign-degeneracy offset for the net-load indicator.
const NET_LOAD_EPSILON: f64 = 1e-6;

pub struct PriceNetLoadTrade;

impl PriceNetLoadTrade {
    /// Net load of hour `h` as a linear expression of the build fractions.
    fn net_load(&self, reg: &ModelRegistry, h: usize) -> LinExpr {
        let mut expr = LinExpr::constant(
            reg.demand(h) - reg.nuclear_fixed(h) - reg.other_fixed(h) - reg.hydro_fixed(h),
        );
        for (p, plant) in reg.pv_plants().iter().enumerate() {
            expr.add_term(reg.sym.pv.build[p], -plant.availability_mw(h));
        }
        for (w, plant) in reg.wind_plants().iter().enumerate() {
            expr.add_term(reg.sym.wind.build[w], -plant.availability_mw(h));
        }
        if let HydroDispatch::Scheduled(vars) = &reg.sym.hydro {
            expr.add_term(vars[h], -1.0);
        }
        expr
    }
}

impl FormulationBlock for PriceNetLoadTrade {
    fn id(&self) -> &'static str {
        "price-net-load-trade"
    }

    fn declare(&self, model: &mut LinearModel, reg: &mut ModelRegistry) -> SdomResult<()> {
        let series = reg.bundle().trade.clone().ok_or_else(|| {
            SdomError::Config("price/net-load trade requires import/export cap and price tables".into())
        })?;
        let n = reg.n_hours();
        let imports: Vec<VarId> = (0..n)
            .map(|h| model.add_var(format!("Imp[{}]", h + 1), 0.0, series.import_cap_mw[h]))
            .collect();
        let exports: Vec<VarId> = (0..n)
            .map(|h| model.add_var(format!("Exp[{}]", h + 1), 0.0, series.export_cap_mw[h]))
            .collect();
        let import_mode: Vec<VarId> = (0..n)
            .map(|h| model.add_binary(format!("NetPos[{}]", h + 1)))
            .collect();
        reg.sym.trade = Some(TradeSymbols {
            imports,
            exports,
            import_mode,
        });
        Ok(())
    }

    fn constraints(&self, model: &mut LinearModel, reg: &ModelRegistry) -> SdomResult<()> {
        let Some(trade) = &reg.sym.trade else {
            return Err(SdomError::Other(
                "trade constraints emitted before its variables".into(),
            ));
        };
        let series = reg.bundle().trade.as_ref().ok_or_else(|| {
            SdomError::Config("price/net-load trade requires import/export series".into())
        })?;
        let big_m = reg.trade_big_m();
        let max_export_cap = series.export_cap_mw.iter().cloned().fold(0.0_f64, f64::max);

        for h in 0..reg.n_hours() {
            let v = trade.import_mode[h];
            let net_load = self.net_load(reg, h);

            // net_load <= M * V
            let mut pos = net_load.clone();
            pos.add_term(v, -big_m);
            model.add_row(format!("NetLoadSignPos[{}]", h + 1), pos, Sense::Leq, 0.0);

            // -net_load + eps <= M * (1 - V)
            let mut neg = -net_load;
            neg.add_term(v, big_m);
            model.add_row(
                format!("NetLoadSignNeg[{}]", h + 1),
                neg,
                Sense::Leq,
                big_m - NET_LOAD_EPSILON,
            );

            // Imports only under positive net load, bounded by demand.
            let mut imp = LinExpr::term(trade.imports[h], 1.0);
            imp.add_term(v, -reg.demand(h));
            model.add_row(format!("ImportGate[{}]", h + 1), imp, Sense::Leq, 0.0);

            // Exports only under non-positive net load.
            let mut exp = LinExpr::term(trade.exports[h], 1.0);
            exp.add_term(v, max_export_cap);
            model.add_row(
                format!("ExportGate[{}]", h + 1),
                exp,
                Sense::Leq,
                max_export_cap,
            );
        }
        Ok(())
    }

    fn objective_terms(&self, reg: &ModelRegistry) -> Vec<(String, LinExpr)> {
        let Some(trade) = &reg.sym.trade else {
            return Vec::new();
        };
        let Some(series) = reg.bundle().trade.as_ref() else {
            return Vec::new();
        };
        let mut import_cost = LinExpr::new();
        let mut export_revenue = LinExpr::new();
        for h in 0..reg.n_hours() {
            import_cost.add_term(trade.imports[h], series.import_price[h]);
            export_revenue.add_term(trade.exports[h], -series.export_price[h]);
        }
        vec![
            ("Imports Cost".to_string(), import_cost),
            ("Exports Revenue".to_string(), export_revenue),
        ]
    }
}
