//! Unit conventions and financial factors.
//!
//! Cost inputs follow per-kW conventions while the model operates in MW and
//! MWh; [`MW_TO_KW`] is the bridge. Capital costs are annualized with the
//! capital recovery factor.

/// Cost tables quote $/kW and $/kW-yr; the model works in MW.
pub const MW_TO_KW: f64 = 1000.0;

/// Compute the Capital Recovery Factor for annualizing investment costs
///
/// CRF = r(1+r)^n / ((1+r)^n - 1)
///
/// where r = discount rate, n = asset lifetime in years
pub fn capital_recovery_factor(rate: f64, lifetime_years: f64) -> f64 {
    if rate < 1e-10 {
        // No discounting
        1.0 / lifetime_years
    } else {
        rate * (1.0 + rate).powf(lifetime_years) / ((1.0 + rate).powf(lifetime_years) - 1.0)
    }
}
