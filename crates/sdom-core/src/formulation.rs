//! Formulation selection for the pluggable model axes.
//!
//! The `Formulations` input table picks one variant per axis. Wire names
//! follow the original case files (`RunOfRiverFormulation`, `NotModel`, ...).

use crate::error::{SdomError, SdomResult};

/// Hours in each calendar month of a non-leap year.
pub const MONTH_HOURS: [usize; 12] = [744, 672, 744, 720, 744, 720, 744, 744, 720, 744, 720, 744];

/// Hours in a daily hydro budget period.
pub const DAY_HOURS: usize = 24;

/// How large-hydro dispatch is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydroMode {
    /// Generation is pinned to the scaled historical profile.
    RunOfRiver,
    /// Generation is free within hourly bounds, with a monthly energy budget.
    MonthlyBudget,
    /// Generation is free within hourly bounds, with a daily energy budget.
    DailyBudget,
}

impl HydroMode {
    /// Parse a wire name from the `Formulations` table.
    pub fn parse(name: &str) -> SdomResult<Self> {
        match name.trim() {
            "RunOfRiverFormulation" => Ok(HydroMode::RunOfRiver),
            "MonthlyBudgetFormulation" => Ok(HydroMode::MonthlyBudget),
            "DailyBudgetFormulation" => Ok(HydroMode::DailyBudget),
            other => Err(SdomError::Config(format!(
                "invalid hydro formulation '{other}'; valid options are \
                 RunOfRiverFormulation, MonthlyBudgetFormulation, DailyBudgetFormulation"
            ))),
        }
    }

    /// Whether this mode dispatches hydro within an energy budget.
    pub fn is_budgeted(&self) -> bool {
        !matches!(self, HydroMode::RunOfRiver)
    }

    /// Partition `n_hours` into budget periods as half-open hour ranges
    /// (0-based). The horizon must end exactly on a period boundary.
    ///
    /// Returns an empty partition for run-of-river.
    pub fn budget_periods(&self, n_hours: usize) -> SdomResult<Vec<std::ops::Range<usize>>> {
        match self {
            HydroMode::RunOfRiver => Ok(Vec::new()),
            HydroMode::DailyBudget => {
                if n_hours == 0 || n_hours % DAY_HOURS != 0 {
                    return Err(SdomError::Data(format!(
                        "horizon of {n_hours} hours is not a whole number of {DAY_HOURS}-hour \
                         daily budget periods"
                    )));
                }
                Ok((0..n_hours / DAY_HOURS)
                    .map(|d| d * DAY_HOURS..(d + 1) * DAY_HOURS)
                    .collect())
            }
            HydroMode::MonthlyBudget => {
                let mut periods = Vec::new();
                let mut start = 0usize;
                for hours in MONTH_HOURS {
                    if start >= n_hours {
                        break;
                    }
                    periods.push(start..start + hours);
                    start += hours;
                }
                if start < n_hours || periods.last().map(|p| p.end) != Some(n_hours) {
                    return Err(SdomError::Data(format!(
                        "horizon of {n_hours} hours does not end on a calendar-month boundary"
                    )));
                }
                Ok(periods)
            }
        }
    }
}

/// Whether cross-border trade is modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeMode {
    /// No imports or exports; trade terms absent from the model.
    Disabled,
    /// Hourly capacity- and price-driven trade gated by the net-load sign.
    PriceNetLoad,
}

impl TradeMode {
    /// Parse a wire name from the `Formulations` table.
    pub fn parse(name: &str) -> SdomResult<Self> {
        match name.trim() {
            "NotModel" => Ok(TradeMode::Disabled),
            "CapacityPriceNetLoadFormulation" => Ok(TradeMode::PriceNetLoad),
            other => Err(SdomError::Config(format!(
                "invalid imports/exports formulation '{other}'; valid options are \
                 NotModel, CapacityPriceNetLoadFormulation"
            ))),
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, TradeMode::PriceNetLoad)
    }
}

/// The per-axis variant selection read from the `Formulations` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormulationMap {
    pub hydro: HydroMode,
    pub trade: TradeMode,
}
