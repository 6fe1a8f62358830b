//! The incremental bounded search driver (spec §2 component 5, §4.4).
//!
//! Extends the horizon one step at a time, pushes step-specific
//! assumption literals and checks satisfiability without ever resetting
//! the solver, so lemmas learned at horizon k survive into horizon k+1.

use std::fmt;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use z3::ast::{Ast, Bool};

use crate::automaton::Automaton;
use crate::diagnostics::{self, Witness};
use crate::encoding::Encoder;
use crate::error::Result;
use crate::rational::Rational;
use crate::solver::{CheckResult, Session, SmtSolver};

/// The two possible bounded verdicts (spec §1, §4.4).
pub enum Verdict {
    /// A critical pair exists within the horizon: the fault is not ∆-diagnosable.
    NotDiagnosable(Witness),
    /// No critical pair exists up to `BOUND`: ∆-diagnosable within the horizon.
    Diagnosable,
}

/// The full result of a bounded search: the verdict plus the last
/// UNSAT core seen, for the suggestion mapper (spec §4.6).
pub struct SearchReport {
    pub verdict: Verdict,
    pub stats: SearchStats,
    pub last_core: Option<Vec<String>>,
    /// One "Increase the bound: `<k>`" message per round that did not
    /// return sat, in the order the rounds ran (spec §6).
    pub round_messages: Vec<String>,
}

/// Timing and round-count statistics for a completed search.
#[derive(Debug, Default, Clone)]
pub struct SearchStats {
    rounds: usize,
    time: Duration,
}

impl SearchStats {
    /// The number of horizons examined before a verdict was reached.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Total wall-clock time spent in the solver.
    pub fn time(&self) -> Duration {
        self.time
    }
}

impl fmt::Display for SearchStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rounds: {}, total_time {:.3}", self.rounds, self.time.as_secs_f64())
    }
}

/// Runs the bounded search described in spec §4.4 to completion (SAT,
/// definitive UNSAT, or horizon exhaustion).
pub fn search(automaton: &Automaton, bound: i64, delta: Rational) -> Result<SearchReport> {
    let smt = SmtSolver::new();
    let session = Session::new(&smt);
    let mut encoder = Encoder::new(&smt, &session, automaton);

    let assumption_delta = smt.new_bool("d0");
    session.assert(
        &assumption_delta.implies(&encoder.vars().delta()._eq(&smt.rational_const(delta))),
    );

    let mut stats = SearchStats::default();
    let mut last_core: Option<Vec<String>> = None;
    let mut round_messages: Vec<String> = Vec::new();

    let mut cpt: i64 = 1;
    while cpt <= bound {
        let idx = encoder.extend(&smt, &session);

        let assumption_bound = smt.new_bool(&format!("b{}", cpt));
        let assumption_fault_delta = smt.new_bool(&format!("f{}", cpt));
        let assumption_fault_occurred = smt.new_bool(&format!("fo{}", cpt));

        session.assert(
            &assumption_bound.implies(&encoder.vars().bound()._eq(&smt.int_const((idx + 1) as i64))),
        );
        session.assert(&assumption_fault_delta.implies(
            &encoder.vars().cpt_fault[idx + 1]._eq(&smt.rational_const(delta)),
        ));
        session.assert(
            &assumption_fault_occurred.implies(&encoder.vars().fault_occurs[idx]._eq(&Bool::from_bool(smt.context(), true))),
        );

        let mut assumptions: Vec<Bool> = vec![
            assumption_delta.clone(),
            assumption_bound,
            assumption_fault_delta,
            assumption_fault_occurred,
        ];
        assumptions.extend(encoder.vars().observability_literals().iter().cloned());

        let start = Instant::now();
        let result = session.check_assuming(&assumptions);
        stats.time += start.elapsed();
        stats.rounds += 1;

        match result {
            CheckResult::Sat => {
                let witness = diagnostics::decode(automaton, encoder.vars(), &session, idx)?;
                info!("sat at horizon {}", idx + 1);
                return Ok(SearchReport {
                    verdict: Verdict::NotDiagnosable(witness),
                    stats,
                    last_core,
                    round_messages,
                });
            }
            CheckResult::Unsat(core) => {
                last_core = Some(core.iter().map(|b| b.to_string()).collect());
                debug!("unsat at horizon {}, increasing bound", idx + 1);
                round_messages.push(format!("Increase the bound: {}", idx + 1));
            }
            CheckResult::Unknown(reason) => {
                // Spec §7: an unknown/timeout status is recoverable, not fatal;
                // treat it conservatively as "increase the bound" and move on.
                warn!(
                    "solver returned unknown at horizon {}: {}",
                    idx + 1,
                    reason.as_deref().unwrap_or("no reason given")
                );
                round_messages.push(format!("Increase the bound: {}", idx + 1));
            }
        }
        cpt += 1;
    }

    Ok(SearchReport {
        verdict: Verdict::Diagnosable,
        stats,
        last_core,
        round_messages,
    })
}
