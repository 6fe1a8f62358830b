//! Diagnoser classification (spec §2 component 7, §4.7): informational
//! graph reachability over the transition-follower relation, separating
//! transitions that may appear on faulty vs. normal runs. Consumed only
//! by reporting; none of this feeds the SMT encoding.

use std::fmt;

use fixedbitset::FixedBitSet;

use crate::automaton::{Automaton, TransitionIndex};

/// A growable set of transition indices, backed by a bitset.
#[derive(Debug, Clone)]
pub struct TransitionSet {
    data: FixedBitSet,
}

impl TransitionSet {
    fn with_capacity(n: usize) -> Self {
        TransitionSet {
            data: FixedBitSet::with_capacity(n),
        }
    }

    fn insert(&mut self, t: TransitionIndex) -> bool {
        let already = self.data[t];
        self.data.insert(t);
        !already
    }

    /// The transition indices contained in this set.
    pub fn members(&self) -> fixedbitset::Ones {
        self.data.ones()
    }

    /// Whether the given transition belongs to this set.
    pub fn contains(&self, t: TransitionIndex) -> bool {
        self.data[t]
    }
}

impl fmt::Display for TransitionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for t in self.data.ones() {
            write!(f, " {}", t)?;
        }
        write!(f, " }}")
    }
}

/// Computes the fault diagnoser `F`: the transitions that fault-tainted
/// runs may pass through, forward and backward from the fault transitions.
pub fn fault_diagnoser(automaton: &Automaton) -> TransitionSet {
    let n = automaton.num_transitions();
    let mut set = TransitionSet::with_capacity(n);

    let fault_transitions: Vec<TransitionIndex> = (0..n)
        .filter(|&t| automaton.transition(t).event().is_fault())
        .collect();
    if fault_transitions.is_empty() {
        return set;
    }
    for &t in &fault_transitions {
        set.insert(t);
    }

    // Forward closure along `next`.
    let mut frontier = fault_transitions.clone();
    while let Some(item) = frontier.pop() {
        for &follower in automaton.next(item) {
            if set.insert(follower) {
                frontier.push(follower);
            }
        }
    }

    // Backward closure: transitions with `item` as a follower.
    let mut frontier = fault_transitions;
    while let Some(item) = frontier.pop() {
        for predecessor in 0..n {
            if automaton.next(predecessor).contains(&item) && set.insert(predecessor) {
                frontier.push(predecessor);
            }
        }
    }

    set
}

/// Computes the normal diagnoser `N`: non-fault transitions reachable
/// from the initial state without ever passing through a fault transition.
pub fn normal_diagnoser(automaton: &Automaton) -> TransitionSet {
    let n = automaton.num_transitions();
    let mut set = TransitionSet::with_capacity(n);

    let mut frontier: Vec<TransitionIndex> = (0..n)
        .filter(|&t| {
            automaton.transition(t).source() == automaton.initial_state()
                && !automaton.transition(t).event().is_fault()
        })
        .collect();
    for &t in &frontier {
        set.insert(t);
    }

    while let Some(item) = frontier.pop() {
        for &follower in automaton.next(item) {
            if !automaton.transition(follower).event().is_fault() && set.insert(follower) {
                frontier.push(follower);
            }
        }
    }

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::{EventLabel, State, Transition};

    fn build() -> Automaton {
        // q0 -f-> q1 -a-> q2; q0 -b-> q2 (normal path)
        let states = vec![State::new(0, vec![]), State::new(1, vec![]), State::new(2, vec![])];
        let transitions = vec![
            Transition::new(0, 0, 1, EventLabel::FAULT, vec![], vec![]),
            Transition::new(1, 1, 2, EventLabel::observable(3), vec![], vec![]),
            Transition::new(2, 0, 2, EventLabel::observable(4), vec![], vec![]),
        ];
        Automaton::build(states, transitions, 0, 0, 0, 2).unwrap()
    }

    #[test]
    fn fault_diagnoser_includes_fault_and_its_followers() {
        let a = build();
        let fd = fault_diagnoser(&a);
        assert!(fd.contains(0));
        assert!(fd.contains(1));
    }

    #[test]
    fn normal_diagnoser_excludes_fault_transition() {
        let a = build();
        let nd = normal_diagnoser(&a);
        assert!(nd.contains(2));
        assert!(!nd.contains(0));
    }
}
