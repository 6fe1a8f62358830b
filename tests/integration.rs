//! Black-box integration tests over whole input files (spec §8 seed
//! suite): a small automaton description goes in, an expected
//! [`Verdict`] comes out.

use delta_diagnose::search::Verdict;
use delta_diagnose::{check_diagnosability, parser};

fn run(input: &str) -> Verdict {
    check_diagnosability(input).unwrap().verdict
}

fn assert_unsat(input: &str) {
    match run(input) {
        Verdict::Diagnosable => {}
        Verdict::NotDiagnosable(w) => panic!("expected UNSAT, got a witness at horizon {}", w.horizon),
    }
}

fn assert_sat(input: &str) -> delta_diagnose::diagnostics::Witness {
    match run(input) {
        Verdict::NotDiagnosable(w) => w,
        Verdict::Diagnosable => panic!("expected SAT, got UNSAT"),
    }
}

/// Scenario 1: `q0 -f-> q1`, no observable event anywhere. No
/// observable synchronization is possible, so the pair can never be
/// forced to agree on a timed trace: UNSAT regardless of DELTA.
#[test]
fn scenario1_no_observable_is_unsat() {
    let input = "Initial_state 0 BOUND 3 DELTA 0 {} {} Clocks {}\n0 f 1 0 0\n";
    assert_unsat(input);
}

/// Scenario 2: `q0 -f-> q1 -a-> q2` on the faulty side,
/// `q0 -a-> q2` on the normal side. A single observable `a`
/// synchronizes the two runs immediately after the fault: SAT.
#[test]
fn scenario2_observable_right_after_fault_is_sat() {
    let input = "Initial_state 0 BOUND 4 DELTA 0 {a} {} Clocks {c1}\n\
                 0 f 1 0 0\n\
                 1 a 2 0 0\n\
                 0 a 2 0 0\n";
    let witness = assert_sat(input);
    assert!(witness.fault_occurs.iter().any(|&b| b));
}

/// Scenario 3: same automaton as scenario 2, but DELTA=5 and an
/// invariant `c1 <= 3` on q1 bounds how long the faulty run may linger
/// before firing `a`. The faulty run cannot accrue 5 time units while
/// obeying the invariant, so the instance stays UNSAT within a small
/// horizon.
#[test]
fn scenario3_unreachable_delta_under_invariant_is_unsat() {
    let input = "Initial_state 0 BOUND 4 DELTA 5 {a} {} Clocks {c1}\n\
                 0 f 1 0 0\n\
                 1 a 2 0 0\n\
                 0 a 2 0 0\n\
                 \n\
                 invariant:\n\
                 1 c1<=3\n";
    assert_unsat(input);
}

/// Scenario 6: an automaton with no fault transition at all is UNSAT
/// at every horizon, and `faultOccurs` never holds.
#[test]
fn scenario6_no_fault_event_is_unsat() {
    let input = "Initial_state 0 BOUND 3 DELTA 0 {a} {} Clocks {}\n0 b 1 0 0\n";
    assert_unsat(input);
}

/// Boundary behavior: `BOUND = 0` allows no unrolling beyond the
/// initial step; with DELTA > 0 this is always UNSAT since `cptFault`
/// stays 0 at step 0.
#[test]
fn boundary_bound_zero_is_unsat_for_positive_delta() {
    let input = "Initial_state 0 BOUND 0 DELTA 1 {a} {} Clocks {}\n0 f 1 0 0\n1 a 2 0 0\n";
    assert_unsat(input);
}

/// Re-parsing a file produces the same transition count and initial
/// state as the original parse (spec §8 round-trip property, restated
/// over the same textual input since the crate has no serializer).
#[test]
fn reparsing_same_input_is_idempotent() {
    let input = "Initial_state 0 BOUND 4 DELTA 0 {a} {} Clocks {c1}\n\
                 0 f 1 0 0\n\
                 1 a 2 c1>=1 0\n\
                 0 a 2 0 0\n";
    let first = parser::parse(input).unwrap();
    let second = parser::parse(input).unwrap();
    assert_eq!(
        first.automaton.num_transitions(),
        second.automaton.num_transitions()
    );
    assert_eq!(first.automaton.initial_state(), second.automaton.initial_state());
    assert_eq!(first.bound, second.bound);
    assert_eq!(first.delta, second.delta);
}

/// Two runs at equal BOUND and DELTA over the same input yield the
/// same verdict (spec §8 round-trip property).
#[test]
fn same_input_yields_same_verdict_across_runs() {
    let input = "Initial_state 0 BOUND 4 DELTA 0 {a} {} Clocks {c1}\n\
                 0 f 1 0 0\n\
                 1 a 2 0 0\n\
                 0 a 2 0 0\n";
    let first = matches!(run(input), Verdict::NotDiagnosable(_));
    let second = matches!(run(input), Verdict::NotDiagnosable(_));
    assert_eq!(first, second);
}
