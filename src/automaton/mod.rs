//! The timed automaton model: states with invariants, transitions with
//! guards/resets/event labels, and the reachability precomputation that
//! turns the transition list into a follower relation usable by the
//! constraint encoder.

mod preprocess;

use std::fmt;

use crate::error::{Error, Result};
use crate::rational::Rational;

/// The index of a state in [`Automaton::states`].
pub type StateIndex = usize;
/// The index of a transition in [`Automaton::transitions`]; also the
/// identity used throughout the encoder (see spec §9: index-based
/// adjacency, no owning references between transitions and states).
pub type TransitionIndex = usize;
/// The index of a clock, `0..clock_num`.
pub type ClockIndex = usize;

/// A comparison operator appearing in a guard atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Lt => "<",
            Self::Le => "<=",
        };
        write!(f, "{}", s)
    }
}

/// A single atomic clock constraint `c_k <op> bound`, already resolved to a
/// clock index and a rational bound (parsed once, per spec §9, not
/// re-parsed per encoding step).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuardAtom {
    /// The clock this atom constrains.
    pub clock: ClockIndex,
    /// The comparison operator.
    pub op: ComparisonOp,
    /// The constant on the right-hand side.
    pub bound: Rational,
}

impl fmt::Display for GuardAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{} {} {}", self.clock + 1, self.op, self.bound)
    }
}

/// The event label of a transition.
///
/// `NOP` is only ever used as the event label of the synthetic stutter
/// transition; `NOP_INDEX`, the transition-array index used as the
/// stutter sentinel, is a distinct concept (spec §9, open question
/// resolution: keep the two distinct).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventLabel(i64);

impl EventLabel {
    /// The synthetic stutter event, used only on the NOP transition.
    pub const NOP: Self = EventLabel(0);
    /// The distinguished fault event.
    pub const FAULT: Self = EventLabel(1);
    /// The unobservable (silent) event; all silent events alias to this id.
    pub const NO_OBS: Self = EventLabel(2);

    /// Constructs an observable event label. Observable events are
    /// assigned consecutive ids starting at 3.
    pub fn observable(id: i64) -> Self {
        assert!(id >= 3, "observable event id must be >= 3, got {}", id);
        EventLabel(id)
    }

    /// Constructs an event label from a raw integer id, without
    /// validating it against the taxonomy. Used by the encoder to wrap
    /// values read back from the solver model.
    pub fn from_raw(id: i64) -> Self {
        EventLabel(id)
    }

    /// The raw integer value of this label, as used in the SMT encoding.
    pub fn value(self) -> i64 {
        self.0
    }

    /// Whether this is the fault event.
    pub fn is_fault(self) -> bool {
        self == Self::FAULT
    }

    /// Whether this event is observable, i.e. its id is greater than `NO_OBS`.
    pub fn is_observable(self) -> bool {
        self.0 > Self::NO_OBS.0
    }
}

impl fmt::Display for EventLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A state of the automaton: an id and an invariant.
///
/// The invariant is a conjunction of upper-bound guard atoms (the guard
/// language for invariants excludes lower bounds and equality, per spec §4.3).
#[derive(Debug, Clone)]
pub struct State {
    id: StateIndex,
    invariant: Vec<GuardAtom>,
}

impl State {
    /// Creates a state with the given id and invariant.
    pub fn new(id: StateIndex, invariant: Vec<GuardAtom>) -> Self {
        State { id, invariant }
    }

    /// The id of this state.
    pub fn id(&self) -> StateIndex {
        self.id
    }

    /// The invariant of this state (empty means trivially true).
    pub fn invariant(&self) -> &[GuardAtom] {
        &self.invariant
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.invariant.is_empty() {
            write!(f, "{}(true)", self.id)
        } else {
            write!(f, "{}(", self.id)?;
            for (i, atom) in self.invariant.iter().enumerate() {
                if i > 0 {
                    write!(f, " & ")?;
                }
                write!(f, "{}", atom)?;
            }
            write!(f, ")")
        }
    }
}

/// A transition of the automaton.
#[derive(Debug, Clone)]
pub struct Transition {
    id: TransitionIndex,
    source: StateIndex,
    target: StateIndex,
    event: EventLabel,
    guard: Vec<GuardAtom>,
    reset: Vec<ClockIndex>,
}

impl Transition {
    /// Creates a new transition. `id` must equal this transition's eventual
    /// index in [`Automaton::transitions`].
    pub fn new(
        id: TransitionIndex,
        source: StateIndex,
        target: StateIndex,
        event: EventLabel,
        guard: Vec<GuardAtom>,
        reset: Vec<ClockIndex>,
    ) -> Self {
        Transition {
            id,
            source,
            target,
            event,
            guard,
            reset,
        }
    }

    /// This transition's index.
    pub fn id(&self) -> TransitionIndex {
        self.id
    }

    /// The source state.
    pub fn source(&self) -> StateIndex {
        self.source
    }

    /// The target state.
    pub fn target(&self) -> StateIndex {
        self.target
    }

    /// The event label.
    pub fn event(&self) -> EventLabel {
        self.event
    }

    /// The guard, as a conjunction of atoms.
    pub fn guard(&self) -> &[GuardAtom] {
        &self.guard
    }

    /// The clocks reset by this transition.
    pub fn reset(&self) -> &[ClockIndex] {
        &self.reset
    }

    /// Whether this transition resets the given clock.
    pub fn resets(&self, clock: ClockIndex) -> bool {
        self.reset.contains(&clock)
    }
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} [event={}, guard={:?}, reset={:?}]",
            self.source, self.target, self.event, self.guard, self.reset
        )
    }
}

/// The in-memory timed automaton, with the NOP self-loop and follower
/// relation already precomputed (spec §4.1).
#[derive(Debug, Clone)]
pub struct Automaton {
    states: Vec<State>,
    transitions: Vec<Transition>,
    initial_state: StateIndex,
    clock_num: usize,
    num_unobservable: usize,
    num_observable: usize,
    next: Vec<Vec<TransitionIndex>>,
    nop_index: TransitionIndex,
    max_label: i64,
}

impl Automaton {
    /// Builds an automaton from parsed states and transitions, then runs
    /// the reachability precomputation (spec §4.1): appends a synthetic
    /// stutter state and NOP transition, and computes the transition
    /// follower relation `next`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ModelIntegrity`] if a transition references a
    /// state or clock index that does not exist.
    pub fn build(
        states: Vec<State>,
        transitions: Vec<Transition>,
        initial_state: StateIndex,
        clock_num: usize,
        num_unobservable: usize,
        num_observable: usize,
    ) -> Result<Self> {
        preprocess::build(
            states,
            transitions,
            initial_state,
            clock_num,
            num_unobservable,
            num_observable,
        )
    }

    /// The states of the automaton, including the synthetic stutter state.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// The state with the given index.
    pub fn state(&self, index: StateIndex) -> &State {
        &self.states[index]
    }

    /// The transitions of the automaton, including the synthetic NOP
    /// transition at index [`Automaton::nop_index`].
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// The transition at the given index.
    pub fn transition(&self, index: TransitionIndex) -> &Transition {
        &self.transitions[index]
    }

    /// The number of transitions, including the NOP transition.
    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// The index of the initial state.
    pub fn initial_state(&self) -> StateIndex {
        self.initial_state
    }

    /// The number of clocks.
    pub fn clock_num(&self) -> usize {
        self.clock_num
    }

    /// The number of unobservable (silent, non-fault) events in the source format.
    pub fn num_unobservable(&self) -> usize {
        self.num_unobservable
    }

    /// The number of observable events in the source format.
    pub fn num_observable(&self) -> usize {
        self.num_observable
    }

    /// The index of the synthetic NOP self-loop transition; the stutter sentinel.
    pub fn nop_index(&self) -> TransitionIndex {
        self.nop_index
    }

    /// The largest event label id appearing in the automaton.
    pub fn max_label(&self) -> i64 {
        self.max_label
    }

    /// The follower relation: `next(t)` is the set of transitions that may
    /// legally fire right after `t`, including the NOP sentinel.
    pub fn next(&self, t: TransitionIndex) -> &[TransitionIndex] {
        &self.next[t]
    }
}

impl fmt::Display for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Initial state = {}", self.state(self.initial_state))?;
        for t in &self.transitions {
            writeln!(f, "{}", t)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_simple() -> Automaton {
        // q0 -f-> q1, no observable, no clocks.
        let states = vec![State::new(0, vec![]), State::new(1, vec![])];
        let transitions = vec![Transition::new(
            0,
            0,
            1,
            EventLabel::FAULT,
            vec![],
            vec![],
        )];
        Automaton::build(states, transitions, 0, 0, 0, 0).unwrap()
    }

    #[test]
    fn appends_nop_transition_at_last_index() {
        let a = build_simple();
        assert_eq!(a.nop_index(), a.num_transitions() - 1);
        assert_eq!(a.transition(a.nop_index()).event(), EventLabel::NO_OBS);
    }

    #[test]
    fn nop_is_always_a_follower() {
        let a = build_simple();
        for t in 0..a.num_transitions() {
            assert!(a.next(t).contains(&a.nop_index()));
        }
    }

    #[test]
    fn nop_follower_reaches_initial_transitions() {
        let a = build_simple();
        let nop = a.nop_index();
        assert!(a.next(nop).contains(&0));
    }

    #[test]
    fn rejects_unknown_state_reference() {
        let states = vec![State::new(0, vec![])];
        let transitions = vec![Transition::new(0, 0, 1, EventLabel::FAULT, vec![], vec![])];
        let err = Automaton::build(states, transitions, 0, 0, 0, 0).unwrap_err();
        assert!(matches!(err, Error::ModelIntegrity { .. }));
    }
}
