//! The SMT solver seam (spec §4.5).
//!
//! This is the only module that touches the `z3` crate directly. It
//! exposes exactly the combined theory of integers, Booleans and linear
//! real arithmetic with incremental `check-sat-assuming` and UNSAT-core
//! extraction that the encoder and search driver need, so that no
//! implementation detail of the backend leaks past this contract.

use z3::ast::{Ast, Bool, Int, Real};
use z3::{Config, Context, SatResult, Solver};

use crate::rational::Rational;

/// The outcome of a `check-sat-assuming` query.
pub enum CheckResult<'ctx> {
    /// The assumptions are satisfiable; the model can be inspected with
    /// [`SmtSolver::eval_int`], [`SmtSolver::eval_real`] and [`SmtSolver::eval_bool`].
    Sat,
    /// The assumptions are unsatisfiable; the returned vector is an UNSAT core.
    Unsat(Vec<Bool<'ctx>>),
    /// The solver could not determine satisfiability (e.g. it timed out).
    Unknown(Option<String>),
}

/// A thin wrapper around a `z3::Context` + `z3::Solver` pair, owning the
/// context for the lifetime of a single diagnosability search.
pub struct SmtSolver {
    context: Context,
}

impl SmtSolver {
    /// Creates a fresh solver with default configuration.
    pub fn new() -> Self {
        let config = Config::new();
        SmtSolver {
            context: Context::new(&config),
        }
    }

    /// The underlying context, used by callers to build ASTs.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Creates a named integer variable.
    pub fn new_int(&self, name: &str) -> Int<'_> {
        Int::new_const(&self.context, name)
    }

    /// Creates a named real (rational) variable.
    pub fn new_real(&self, name: &str) -> Real<'_> {
        Real::new_const(&self.context, name)
    }

    /// Creates a named boolean variable.
    pub fn new_bool(&self, name: &str) -> Bool<'_> {
        Bool::new_const(&self.context, name)
    }

    /// Creates a real-valued constant from an exact rational.
    pub fn rational_const(&self, value: Rational) -> Real<'_> {
        Real::from_real(&self.context, value.numerator() as i32, value.denominator() as i32)
    }

    /// Creates an integer constant.
    pub fn int_const(&self, value: i64) -> Int<'_> {
        Int::from_i64(&self.context, value)
    }
}

impl Default for SmtSolver {
    fn default() -> Self {
        Self::new()
    }
}

/// An incremental solver session built over a [`SmtSolver`] context.
///
/// Hard constraints are asserted directly with [`Session::assert`]; goals
/// that must be retractable between rounds (`bound == k`, `cptFault ==
/// DELTA`, `faultOccurs`, observability toggles) are passed as assumption
/// literals to [`Session::check_assuming`] instead, per spec §9's
/// "assumption literals are mandatory" design note.
pub struct Session<'ctx> {
    solver: Solver<'ctx>,
}

impl<'ctx> Session<'ctx> {
    /// Creates a new incremental session over the given context.
    pub fn new(smt: &'ctx SmtSolver) -> Self {
        Session {
            solver: Solver::new(&smt.context),
        }
    }

    /// Asserts a hard constraint, never retracted for the lifetime of the session.
    pub fn assert(&self, constraint: &Bool<'ctx>) {
        self.solver.assert(constraint);
    }

    /// Checks satisfiability under the given assumption literals, without
    /// adding them as permanent constraints.
    pub fn check_assuming(&self, assumptions: &[Bool<'ctx>]) -> CheckResult<'ctx> {
        match self.solver.check_assumptions(assumptions) {
            SatResult::Sat => CheckResult::Sat,
            SatResult::Unsat => CheckResult::Unsat(self.solver.get_unsat_core()),
            SatResult::Unknown => CheckResult::Unknown(self.solver.get_reason_unknown()),
        }
    }

    /// Evaluates an integer term in the current model.
    ///
    /// Only meaningful right after [`Session::check_assuming`] returned [`CheckResult::Sat`].
    pub fn eval_int(&self, term: &Int<'ctx>) -> Option<i64> {
        let model = self.solver.get_model()?;
        model.eval(term, true)?.as_i64()
    }

    /// Evaluates a boolean term in the current model.
    pub fn eval_bool(&self, term: &Bool<'ctx>) -> Option<bool> {
        let model = self.solver.get_model()?;
        model.eval(term, true)?.as_bool()
    }

    /// Evaluates a real term in the current model, as an exact rational.
    pub fn eval_real(&self, term: &Real<'ctx>) -> Option<Rational> {
        let model = self.solver.get_model()?;
        let (num, den) = model.eval(term, true)?.as_real()?;
        Some(Rational::new(num, den))
    }
}
