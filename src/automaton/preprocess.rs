//! Reachability precomputation (spec §2 component 2, §4.1): appends the
//! synthetic stutter state and NOP self-loop, then computes the
//! transition-follower relation.

use super::{Automaton, ClockIndex, EventLabel, GuardAtom, State, StateIndex, Transition};
use crate::error::{Error, Result};

pub(super) fn build(
    states: Vec<State>,
    mut transitions: Vec<Transition>,
    initial_state: StateIndex,
    clock_num: usize,
    num_unobservable: usize,
    num_observable: usize,
) -> Result<Automaton> {
    let mut states = states;
    validate_references(&states, &transitions, initial_state, clock_num)?;

    // Append the fresh stutter state, reachable from all transitions and
    // from the initial state, with a trivial invariant (spec §4.1).
    let stutter_state = states.len();
    states.push(State::new(stutter_state, vec![]));

    // NOP_TRANSITION: sStutter -> initial, event NO_OBS, guard c_i = 0 for
    // all clocks (expressed here as the conjunction 0 <= c_i <= 0, i.e. two
    // atoms per clock collapsed to a single reset instead: the guard
    // language has no equality, so the NOP transition's vacuous guard is
    // simply empty and its effect is expressed entirely through resetting
    // every clock), reset all clocks.
    let nop_index = transitions.len();
    let nop_guard: Vec<GuardAtom> = vec![];
    let nop_reset: Vec<ClockIndex> = (0..clock_num).collect();
    transitions.push(Transition::new(
        nop_index,
        stutter_state,
        initial_state,
        EventLabel::NO_OBS,
        nop_guard,
        nop_reset,
    ));

    let max_label = transitions
        .iter()
        .map(|t| t.event().value())
        .max()
        .unwrap_or(0);

    let next = compute_next(&transitions, nop_index);

    Ok(Automaton {
        states,
        transitions,
        initial_state,
        clock_num,
        num_unobservable,
        num_observable,
        next,
        nop_index,
        max_label,
    })
}

fn validate_references(
    states: &[State],
    transitions: &[Transition],
    initial_state: StateIndex,
    clock_num: usize,
) -> Result<()> {
    if initial_state >= states.len() {
        return Err(Error::ModelIntegrity {
            message: format!("initial state {} does not exist", initial_state),
        });
    }
    for t in transitions {
        if t.source() >= states.len() {
            return Err(Error::ModelIntegrity {
                message: format!(
                    "transition {} references missing source state {}",
                    t.id(),
                    t.source()
                ),
            });
        }
        if t.target() >= states.len() {
            return Err(Error::ModelIntegrity {
                message: format!(
                    "transition {} references missing target state {}",
                    t.id(),
                    t.target()
                ),
            });
        }
        for atom in t.guard() {
            if atom.clock >= clock_num {
                return Err(Error::ModelIntegrity {
                    message: format!(
                        "transition {} guard references missing clock {}",
                        t.id(),
                        atom.clock
                    ),
                });
            }
        }
        for &c in t.reset() {
            if c >= clock_num {
                return Err(Error::ModelIntegrity {
                    message: format!(
                        "transition {} resets missing clock {}",
                        t.id(),
                        c
                    ),
                });
            }
        }
    }
    for state in states {
        for atom in state.invariant() {
            if atom.clock >= clock_num {
                return Err(Error::ModelIntegrity {
                    message: format!(
                        "state {} invariant references missing clock {}",
                        state.id(),
                        atom.clock
                    ),
                });
            }
        }
    }
    Ok(())
}

/// `next[t] = { NOP_INDEX } ∪ { t' | source(t') = target(t) }` for every
/// transition `t`, including the NOP transition itself: since the NOP
/// transition's target is the initial state, this single uniform rule
/// also produces `next[NOP_INDEX]`'s required shape (NOP always a
/// follower of itself, plus every transition leaving the initial state).
fn compute_next(
    transitions: &[Transition],
    nop_index: super::TransitionIndex,
) -> Vec<Vec<super::TransitionIndex>> {
    transitions
        .iter()
        .map(|t| {
            let mut row = Vec::with_capacity(4);
            row.push(nop_index);
            for (j, t2) in transitions.iter().enumerate() {
                if t2.source() == t.target() {
                    row.push(j);
                }
            }
            row
        })
        .collect()
}
