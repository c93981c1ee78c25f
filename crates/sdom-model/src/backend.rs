//! Solver abstraction: materialize a [`LinearModel`] into `good_lp` and run
//! a MILP backend.
//!
//! CBC is the default backend; HiGHS is available behind the `solver-highs`
//! feature. Solver-native options are forwarded as string key/value pairs,
//! so callers can reach any CBC parameter without this crate naming it.

use crate::linear::{LinearModel, Sense, VarKind};
use good_lp::solvers::coin_cbc::coin_cbc;
use good_lp::{constraint, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel};
use sdom_core::{SdomError, SdomResult};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Solver selection and option passthrough.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Backend name: "cbc" (default) or "highs" (feature-gated).
    pub solver: String,
    /// Wall-clock limit forwarded to the solver, seconds.
    pub time_limit_seconds: Option<f64>,
    /// Relative MIP optimality gap.
    pub mip_gap: Option<f64>,
    /// Branch-and-bound worker threads.
    pub threads: Option<usize>,
    /// Additional solver-native options, forwarded verbatim.
    pub options: Vec<(String, String)>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            solver: "cbc".to_string(),
            time_limit_seconds: None,
            mip_gap: None,
            threads: None,
            options: Vec::new(),
        }
    }
}

/// Mapped solver termination condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    Infeasible,
    Unbounded,
    TimeLimit,
}

/// Outcome of one backend invocation. Primal values are indexed by
/// [`crate::linear::VarId`] and present only at optimality.
#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    pub objective: Option<f64>,
    pub values: Option<Vec<f64>>,
    pub solve_time: Duration,
}

/// A MILP solver able to consume the linear-model IR.
pub trait MilpBackend {
    fn id(&self) -> &'static str;
    fn solve(&self, model: &LinearModel, config: &SolverConfig) -> SdomResult<SolverOutcome>;
}

/// Pick the backend named by the configuration.
pub fn backend_for(config: &SolverConfig) -> SdomResult<Box<dyn MilpBackend>> {
    match config.solver.as_str() {
        "cbc" => Ok(Box::new(CbcBackend)),
        #[cfg(feature = "solver-highs")]
        "highs" => Ok(Box::new(HighsBackend)),
        other => Err(SdomError::Solver(format!(
            "unknown or unavailable solver '{other}'"
        ))),
    }
}

fn build_variables(model: &LinearModel, vars: &mut ProblemVariables) -> Vec<good_lp::Variable> {
    model
        .vars()
        .iter()
        .map(|def| match def.kind {
            VarKind::Binary => vars.add(variable().name(def.name.clone()).binary()),
            VarKind::Continuous => {
                let mut vd = variable().name(def.name.clone()).min(def.lower);
                if def.upper.is_finite() {
                    vd = vd.max(def.upper);
                }
                vars.add(vd)
            }
        })
        .collect()
}

fn to_expression(
    expr: &crate::linear::LinExpr,
    handles: &[good_lp::Variable],
) -> Expression {
    let mut out = Expression::from(expr.constant);
    for (v, c) in &expr.terms {
        out += *c * handles[v.index()];
    }
    out
}

fn outcome_from_values(
    model: &LinearModel,
    values: Vec<f64>,
    solve_time: Duration,
) -> SolverOutcome {
    let objective = model.objective().value(&values);
    SolverOutcome {
        status: SolveStatus::Optimal,
        objective: Some(objective),
        values: Some(values),
        solve_time,
    }
}

fn outcome_from_error(error: ResolutionError, solve_time: Duration) -> SdomResult<SolverOutcome> {
    let status = match &error {
        ResolutionError::Infeasible => SolveStatus::Infeasible,
        ResolutionError::Unbounded => SolveStatus::Unbounded,
        other => {
            let msg = other.to_string().to_lowercase();
            if msg.contains("stopped") || msg.contains("time") {
                SolveStatus::TimeLimit
            } else {
                return Err(SdomError::Solver(other.to_string()));
            }
        }
    };
    Ok(SolverOutcome {
        status,
        objective: None,
        values: None,
        solve_time,
    })
}

/// COIN-OR branch-and-cut, the default open-source MILP backend.
pub struct CbcBackend;

impl MilpBackend for CbcBackend {
    fn id(&self) -> &'static str {
        "cbc"
    }

    fn solve(&self, model: &LinearModel, config: &SolverConfig) -> SdomResult<SolverOutcome> {
        let start = Instant::now();
        let stats = model.stats();
        info!(
            model = model.name(),
            rows = stats.rows,
            columns = stats.columns,
            binaries = stats.binaries,
            "solving with CBC"
        );

        let mut vars = ProblemVariables::new();
        let handles = build_variables(model, &mut vars);
        let objective = to_expression(model.objective(), &handles);
        let mut problem = vars.minimise(objective).using(coin_cbc);

        if let Some(limit) = config.time_limit_seconds {
            problem.set_parameter("seconds", &limit.to_string());
        }
        if let Some(gap) = config.mip_gap {
            problem.set_parameter("ratioGap", &gap.to_string());
        }
        if let Some(threads) = config.threads {
            problem.set_parameter("threads", &threads.to_string());
        }
        for (key, value) in &config.options {
            debug!(key, value, "forwarding CBC option");
            problem.set_parameter(key, value);
        }

        for row in model.rows() {
            let lhs = to_expression(&row.expr, &handles);
            let cons = match row.sense {
                Sense::Leq => constraint::leq(lhs, row.rhs),
                Sense::Geq => constraint::geq(lhs, row.rhs),
                Sense::Eq => constraint::eq(lhs, row.rhs),
            };
            problem = problem.with(cons);
        }

        match problem.solve() {
            Ok(solution) => {
                let values = handles.iter().map(|v| solution.value(*v)).collect();
                Ok(outcome_from_values(model, values, start.elapsed()))
            }
            Err(error) => outcome_from_error(error, start.elapsed()),
        }
    }
}

/// HiGHS backend, available with the `solver-highs` feature.
#[cfg(feature = "solver-highs")]
pub struct HighsBackend;

#[cfg(feature = "solver-highs")]
impl MilpBackend for HighsBackend {
    fn id(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, model: &LinearModel, config: &SolverConfig) -> SdomResult<SolverOutcome> {
        use good_lp::solvers::highs::highs;

        let start = Instant::now();
        let stats = model.stats();
        info!(
            model = model.name(),
            rows = stats.rows,
            columns = stats.columns,
            binaries = stats.binaries,
            "solving with HiGHS"
        );
        if !config.options.is_empty() {
            debug!("HiGHS backend ignores solver-native option passthrough");
        }

        let mut vars = ProblemVariables::new();
        let handles = build_variables(model, &mut vars);
        let objective = to_expression(model.objective(), &handles);
        let mut problem = vars.minimise(objective).using(highs);

        for row in model.rows() {
            let lhs = to_expression(&row.expr, &handles);
            let cons = match row.sense {
                Sense::Leq => constraint::leq(lhs, row.rhs),
                Sense::Geq => constraint::geq(lhs, row.rhs),
                Sense::Eq => constraint::eq(lhs, row.rhs),
            };
            problem = problem.with(cons);
        }

        match problem.solve() {
            Ok(solution) => {
                let values = handles.iter().map(|v| solution.value(*v)).collect();
                Ok(outcome_from_values(model, values, start.elapsed()))
            }
            Err(error) => outcome_from_error(error, start.elapsed()),
        }
    }
}
