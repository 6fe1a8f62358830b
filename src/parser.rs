//! The textual input-format parser (spec §6, external interface).
//!
//! Line-oriented: a header, a block of transition lines, then an
//! optional `invariant:`-delimited block of per-state invariants. Not
//! part of the core's hard contract (spec §1 lists it as an external
//! collaborator), but its output — an [`Automaton`] plus `BOUND` and
//! `DELTA` — is.

use std::collections::HashMap;

use crate::automaton::{Automaton, ClockIndex, ComparisonOp, EventLabel, GuardAtom, State, StateIndex, Transition};
use crate::error::{Error, Result};
use crate::rational::Rational;

/// A fully parsed problem instance: the automaton plus its search parameters.
pub struct ParsedInstance {
    pub automaton: Automaton,
    pub bound: i64,
    pub delta: Rational,
}

/// Parses a complete input file (spec §6).
pub fn parse(input: &str) -> Result<ParsedInstance> {
    let lines: Vec<&str> = input.lines().collect();
    if lines.is_empty() {
        return Err(parse_err(1, "empty input"));
    }

    let header = parse_header(lines[0], 1)?;

    let mut transition_lines_end = lines.len();
    for (i, line) in lines.iter().enumerate().skip(1) {
        if line.trim().is_empty() || line.trim() == "invariant:" {
            transition_lines_end = i;
            break;
        }
    }

    let mut raw_transitions = Vec::new();
    for (offset, line) in lines[1..transition_lines_end].iter().enumerate() {
        let line_no = offset + 2;
        raw_transitions.push(parse_transition_line(line, line_no, &header)?);
    }

    let max_state = raw_transitions
        .iter()
        .flat_map(|t| [t.source, t.target])
        .max()
        .unwrap_or(0);

    let mut invariants: HashMap<StateIndex, Vec<GuardAtom>> = HashMap::new();
    let mut in_invariant_section = false;
    for (offset, line) in lines.iter().enumerate() {
        let line_no = offset + 1;
        if line.trim() == "invariant:" {
            in_invariant_section = true;
            continue;
        }
        if !in_invariant_section || line.trim().is_empty() {
            continue;
        }
        let mut parts = line.trim().splitn(2, ' ');
        let state_tok = parts.next().unwrap_or("");
        let inv_tok = parts.next().unwrap_or("").trim();
        if state_tok.is_empty() || inv_tok.is_empty() {
            return Err(parse_err(line_no, "malformed invariant line"));
        }
        let state: StateIndex = state_tok
            .parse()
            .map_err(|_| parse_err(line_no, "invalid state id in invariant"))?;
        let atoms = if inv_tok == "1" {
            Vec::new()
        } else {
            parse_guard_field(inv_tok, &header.clocks, line_no)?
        };
        invariants.insert(state, atoms);
    }

    let mut states = Vec::with_capacity(max_state + 1);
    for id in 0..=max_state {
        let invariant = invariants.remove(&id).unwrap_or_default();
        states.push(State::new(id, invariant));
    }

    let transitions: Vec<Transition> = raw_transitions
        .into_iter()
        .enumerate()
        .map(|(id, t)| Transition::new(id, t.source, t.target, t.event, t.guard, t.reset))
        .collect();

    let automaton = Automaton::build(
        states,
        transitions,
        header.initial_state,
        header.clocks.len(),
        header.unobservable.len(),
        header.observable.len(),
    )?;

    Ok(ParsedInstance {
        automaton,
        bound: header.bound,
        delta: header.delta,
    })
}

struct Header {
    initial_state: StateIndex,
    bound: i64,
    delta: Rational,
    observable: Vec<String>,
    unobservable: Vec<String>,
    clocks: HashMap<String, ClockIndex>,
    event_ids: HashMap<String, i64>,
}

fn parse_header(line: &str, line_no: usize) -> Result<Header> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() < 10 {
        return Err(parse_err(line_no, "header has too few tokens"));
    }
    if tokens[0] != "Initial_state" || tokens[2] != "BOUND" || tokens[4] != "DELTA" || tokens[8] != "Clocks" {
        return Err(parse_err(
            line_no,
            "header must read 'Initial_state <id> BOUND <B> DELTA <D> {obs} {unobs} Clocks {c}'",
        ));
    }

    let initial_state: StateIndex = tokens[1]
        .parse()
        .map_err(|_| parse_err(line_no, "invalid initial state id"))?;
    let bound: i64 = tokens[3]
        .parse()
        .map_err(|_| parse_err(line_no, "invalid BOUND"))?;
    let delta: Rational = tokens[5]
        .parse()
        .map_err(|_| parse_err(line_no, "invalid DELTA"))?;

    let observable = parse_set(tokens[6], line_no)?;
    let unobservable = parse_set(tokens[7], line_no)?;
    let clock_names = parse_set(tokens[9], line_no)?;

    let mut clocks = HashMap::new();
    for (i, name) in clock_names.into_iter().enumerate() {
        clocks.insert(name, i);
    }

    // Spec §9 open-question resolution: all unobservable (silent) events
    // alias to NO_OBS; each observable event gets a unique id >= 3.
    let mut event_ids = HashMap::new();
    for name in &unobservable {
        event_ids.insert(name.clone(), EventLabel::NO_OBS.value());
    }
    for (i, name) in observable.iter().enumerate() {
        event_ids.insert(name.clone(), 3 + i as i64);
    }

    Ok(Header {
        initial_state,
        bound,
        delta,
        observable,
        unobservable,
        clocks,
        event_ids,
    })
}

fn parse_set(token: &str, line_no: usize) -> Result<Vec<String>> {
    let inner = token
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .ok_or_else(|| parse_err(line_no, "expected a '{...}' set"))?;
    if inner.is_empty() {
        return Ok(Vec::new());
    }
    Ok(inner.split(',').map(|s| s.to_string()).collect())
}

struct RawTransition {
    source: StateIndex,
    target: StateIndex,
    event: EventLabel,
    guard: Vec<GuardAtom>,
    reset: Vec<ClockIndex>,
}

fn parse_transition_line(line: &str, line_no: usize, header: &Header) -> Result<RawTransition> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    if tokens.len() != 5 {
        return Err(parse_err(
            line_no,
            "transition line must read '<src> <event> <tgt> <guard> <reset>'",
        ));
    }

    let source: StateIndex = tokens[0]
        .parse()
        .map_err(|_| parse_err(line_no, "invalid source state"))?;
    let target: StateIndex = tokens[2]
        .parse()
        .map_err(|_| parse_err(line_no, "invalid target state"))?;

    let event = if tokens[1] == "f" {
        EventLabel::FAULT
    } else {
        let id = *header
            .event_ids
            .get(tokens[1])
            .ok_or_else(|| parse_err(line_no, &format!("unknown event '{}'", tokens[1])))?;
        EventLabel::from_raw(id)
    };

    let guard = if tokens[3] == "0" {
        Vec::new()
    } else {
        parse_guard_field(tokens[3], &header.clocks, line_no)?
    };

    let reset = if tokens[4] == "0" {
        Vec::new()
    } else {
        tokens[4]
            .split(';')
            .map(|name| {
                header
                    .clocks
                    .get(name)
                    .copied()
                    .ok_or_else(|| parse_err(line_no, &format!("unknown clock '{}' in reset", name)))
            })
            .collect::<Result<Vec<_>>>()?
    };

    Ok(RawTransition {
        source,
        target,
        event,
        guard,
        reset,
    })
}

/// Parses a semicolon-separated field of atoms of the form `<clock><op><number>`.
fn parse_guard_field(
    field: &str,
    clocks: &HashMap<String, ClockIndex>,
    line_no: usize,
) -> Result<Vec<GuardAtom>> {
    field
        .split(';')
        .map(|atom| parse_guard_atom(atom, clocks, line_no))
        .collect()
}

fn parse_guard_atom(
    atom: &str,
    clocks: &HashMap<String, ClockIndex>,
    line_no: usize,
) -> Result<GuardAtom> {
    let (op, op_len) = if let Some(pos) = atom.find(">=") {
        (ComparisonOp::Ge, (pos, 2))
    } else if let Some(pos) = atom.find("<=") {
        (ComparisonOp::Le, (pos, 2))
    } else if let Some(pos) = atom.find('>') {
        (ComparisonOp::Gt, (pos, 1))
    } else if let Some(pos) = atom.find('<') {
        (ComparisonOp::Lt, (pos, 1))
    } else {
        return Err(parse_err(line_no, &format!("guard atom '{}' has no comparison operator", atom)));
    };
    let (op_pos, len) = op_len;
    let clock_name = &atom[..op_pos];
    let bound_str = &atom[op_pos + len..];

    let clock = clocks
        .get(clock_name)
        .copied()
        .ok_or_else(|| parse_err(line_no, &format!("unknown clock '{}' in guard", clock_name)))?;
    let bound: Rational = bound_str
        .parse()
        .map_err(|_| parse_err(line_no, &format!("invalid bound '{}' in guard", bound_str)))?;

    Ok(GuardAtom { clock, op, bound })
}

fn parse_err(line: usize, message: &str) -> Error {
    Error::Parse {
        line,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_state_fault_only() {
        let input = "Initial_state 0 BOUND 3 DELTA 0 {} {} Clocks {}\n0 f 1 0 0\n";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.bound, 3);
        assert_eq!(parsed.delta, Rational::zero());
        assert_eq!(parsed.automaton.num_transitions(), 2); // + NOP
    }

    #[test]
    fn parses_guard_and_reset() {
        let input = "Initial_state 0 BOUND 4 DELTA 0 {a} {} Clocks {c1}\n0 f 1 0 0\n1 a 2 c1>=2 c1\n";
        let parsed = parse(input).unwrap();
        let t = parsed.automaton.transition(1);
        assert_eq!(t.guard().len(), 1);
        assert_eq!(t.guard()[0].op, ComparisonOp::Ge);
        assert_eq!(t.reset(), &[0]);
    }

    #[test]
    fn parses_invariant_section() {
        let input =
            "Initial_state 0 BOUND 4 DELTA 0 {a} {} Clocks {c1}\n0 f 1 0 0\n1 a 2 0 0\n\ninvariant:\n1 c1<=3\n";
        let parsed = parse(input).unwrap();
        assert_eq!(parsed.automaton.state(1).invariant().len(), 1);
    }

    #[test]
    fn rejects_unknown_event() {
        let input = "Initial_state 0 BOUND 3 DELTA 0 {} {} Clocks {}\n0 z 1 0 0\n";
        let err = parse(input).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
