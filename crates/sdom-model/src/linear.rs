//! Model-as-data intermediate representation.
//!
//! The builders emit into a [`LinearModel`]: named variables with mutable
//! bounds and integrality, linear rows, and a linear objective. Keeping the
//! model as plain data keeps the constraint builders pure, lets the
//! two-stage orchestrator re-bound existing variables in place (no variable
//! is ever recreated between stages), and makes row/column statistics and
//! coefficient checks possible without a solver.

use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// Handle to a variable in a [`LinearModel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId(usize);

impl VarId {
    pub fn index(&self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Continuous,
    Binary,
}

/// A declared variable with its current bounds.
#[derive(Debug, Clone)]
pub struct VarDef {
    pub name: String,
    pub lower: f64,
    pub upper: f64,
    pub kind: VarKind,
}

/// A linear expression: sum of coefficient * variable terms plus a constant.
#[derive(Debug, Clone, Default)]
pub struct LinExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coef: f64) -> Self {
        Self {
            terms: vec![(var, coef)],
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.terms.push((var, coef));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty() && self.constant == 0.0
    }

    /// Evaluate against a primal value vector indexed by [`VarId`].
    pub fn value(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|(v, c)| c * values[v.index()])
                .sum::<f64>()
    }

    /// Coefficient of a variable, summed over duplicate terms.
    pub fn coefficient(&self, var: VarId) -> f64 {
        self.terms
            .iter()
            .filter(|(v, _)| *v == var)
            .map(|(_, c)| c)
            .sum()
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr::term(var, 1.0)
    }
}

impl Add for LinExpr {
    type Output = LinExpr;
    fn add(mut self, rhs: LinExpr) -> LinExpr {
        self += rhs;
        self
    }
}

impl AddAssign for LinExpr {
    fn add_assign(&mut self, rhs: LinExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl Sub for LinExpr {
    type Output = LinExpr;
    fn sub(mut self, rhs: LinExpr) -> LinExpr {
        self -= rhs;
        self
    }
}

impl SubAssign for LinExpr {
    fn sub_assign(&mut self, rhs: LinExpr) {
        self.terms
            .extend(rhs.terms.into_iter().map(|(v, c)| (v, -c)));
        self.constant -= rhs.constant;
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;
    fn mul(mut self, rhs: f64) -> LinExpr {
        for (_, c) in &mut self.terms {
            *c *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;
    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

/// Row sense of a linear constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Leq,
    Geq,
    Eq,
}

/// A named linear constraint `expr (sense) rhs`.
#[derive(Debug, Clone)]
pub struct RowDef {
    pub name: String,
    pub expr: LinExpr,
    pub sense: Sense,
    pub rhs: f64,
}

/// Problem size statistics, reported alongside results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelStats {
    pub rows: usize,
    pub columns: usize,
    pub binaries: usize,
}

/// The assembled problem: variables, rows, and a minimization objective.
#[derive(Debug, Clone)]
pub struct LinearModel {
    name: String,
    vars: Vec<VarDef>,
    rows: Vec<RowDef>,
    objective: LinExpr,
}

impl LinearModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vars: Vec::new(),
            rows: Vec::new(),
            objective: LinExpr::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_var(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        debug_assert!(lower <= upper, "variable bounds crossed");
        self.vars.push(VarDef {
            name: name.into(),
            lower,
            upper,
            kind: VarKind::Continuous,
        });
        VarId(self.vars.len() - 1)
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.vars.push(VarDef {
            name: name.into(),
            lower: 0.0,
            upper: 1.0,
            kind: VarKind::Binary,
        });
        VarId(self.vars.len() - 1)
    }

    pub fn var(&self, id: VarId) -> &VarDef {
        &self.vars[id.index()]
    }

    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    pub fn bounds(&self, id: VarId) -> (f64, f64) {
        let def = &self.vars[id.index()];
        (def.lower, def.upper)
    }

    pub fn set_bounds(&mut self, id: VarId, lower: f64, upper: f64) {
        debug_assert!(lower <= upper, "variable bounds crossed");
        let def = &mut self.vars[id.index()];
        def.lower = lower;
        def.upper = upper;
    }

    pub fn set_lower_bound(&mut self, id: VarId, lower: f64) {
        self.vars[id.index()].lower = lower;
    }

    pub fn set_upper_bound(&mut self, id: VarId, upper: f64) {
        self.vars[id.index()].upper = upper;
    }

    /// Pin a variable to a single value.
    pub fn fix(&mut self, id: VarId, value: f64) {
        self.set_bounds(id, value, value);
    }

    /// Name-indexed variable lookup (linear scan; intended for tests and
    /// debugging, not hot paths).
    pub fn lookup(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|v| v.name == name).map(VarId)
    }

    pub fn add_row(&mut self, name: impl Into<String>, expr: LinExpr, sense: Sense, rhs: f64) {
        self.rows.push(RowDef {
            name: name.into(),
            expr,
            sense,
            rhs,
        });
    }

    pub fn rows(&self) -> &[RowDef] {
        &self.rows
    }

    pub fn row(&self, name: &str) -> Option<&RowDef> {
        self.rows.iter().find(|r| r.name == name)
    }

    /// Drop every row, keeping all variables and their current bounds.
    /// Used between resilience stages.
    pub fn clear_rows(&mut self) {
        self.rows.clear();
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn stats(&self) -> ModelStats {
        ModelStats {
            rows: self.rows.len(),
            columns: self.vars.len(),
            binaries: self
                .vars
                .iter()
                .filter(|v| v.kind == VarKind::Binary)
                .count(),
        }
    }
}
