//! Diagnostics (spec §2 component 6, §4.6): decodes a SAT witness from
//! the model and self-checks it, and maps UNSAT-core literal names to
//! human-readable suggestions.

use std::fmt;

use crate::automaton::{Automaton, TransitionIndex};
use crate::encoding::VariableFactory;
use crate::error::{Error, Result};
use crate::rational::Rational;
use crate::solver::Session;

/// One step of a decoded run (either the faulty or the normal one).
#[derive(Debug, Clone)]
pub struct WitnessStep {
    pub transition: TransitionIndex,
    pub last_active: TransitionIndex,
    pub event: i64,
    pub is_nop: bool,
    pub clock_values: Vec<Rational>,
    pub delay: Rational,
    pub global_clock: Rational,
}

/// A fully decoded critical pair: one faulty run, one normal run, plus
/// the shared per-step bookkeeping used to demonstrate non-diagnosability.
#[derive(Debug, Clone)]
pub struct Witness {
    pub faulty: Vec<WitnessStep>,
    pub normal: Vec<WitnessStep>,
    pub check_synchro: Vec<bool>,
    pub fault_occurs: Vec<bool>,
    pub cpt_fault: Vec<Rational>,
    pub horizon: usize,
}

impl fmt::Display for Witness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "faulty run:")?;
        for (i, step) in self.faulty.iter().enumerate() {
            writeln!(
                f,
                "  [{}] transition={} event={} nop={} delay={} g={}",
                i, step.transition, step.event, step.is_nop, step.delay, step.global_clock
            )?;
        }
        writeln!(f, "normal run:")?;
        for (i, step) in self.normal.iter().enumerate() {
            writeln!(
                f,
                "  [{}] transition={} event={} nop={} delay={} g={}",
                i, step.transition, step.event, step.is_nop, step.delay, step.global_clock
            )?;
        }
        writeln!(f, "cptFault: {:?}", self.cpt_fault)
    }
}

/// Decodes the model into a [`Witness`] and self-checks the invariants
/// listed in spec §4.6 and §8: (a) successive non-NOP transitions on
/// each run are contiguous, (b) `lfp`/`lnp` track the last non-NOP
/// transition correctly.
///
/// # Errors
///
/// Returns [`Error::Internal`] if a self-check fails, which indicates a
/// bug in the encoder rather than a property of the input automaton.
pub fn decode<'ctx>(
    automaton: &Automaton,
    vars: &VariableFactory<'ctx>,
    session: &Session<'ctx>,
    horizon: usize,
) -> Result<Witness> {
    let faulty = decode_run(
        automaton,
        session,
        &vars.fp,
        &vars.lfp,
        &vars.idt_fp,
        &vars.nop_fp,
        &vars.clock_fp,
        &vars.delay_fp,
        &vars.g_fp,
        horizon,
    )?;
    let normal = decode_run(
        automaton,
        session,
        &vars.np,
        &vars.lnp,
        &vars.idt_np,
        &vars.nop_np,
        &vars.clock_np,
        &vars.delay_np,
        &vars.g_np,
        horizon,
    )?;

    let check_synchro = (0..=horizon)
        .map(|i| {
            session
                .eval_bool(&vars.check_synchro[i])
                .ok_or_else(|| internal("checkSynchro has no model value"))
        })
        .collect::<Result<Vec<_>>>()?;
    let fault_occurs = (0..=horizon)
        .map(|i| {
            session
                .eval_bool(&vars.fault_occurs[i])
                .ok_or_else(|| internal("faultOccurs has no model value"))
        })
        .collect::<Result<Vec<_>>>()?;
    let cpt_fault = (0..=horizon + 1)
        .map(|i| {
            session
                .eval_real(&vars.cpt_fault[i])
                .ok_or_else(|| internal("cptFault has no model value"))
        })
        .collect::<Result<Vec<_>>>()?;

    for i in 0..=horizon {
        if check_synchro[i] {
            let fe = faulty[i].event;
            let ne = normal[i].event;
            if fe != ne || faulty[i].global_clock != normal[i].global_clock {
                return Err(internal(&format!(
                    "checkSynchro[{}] held but runs disagree on event or global time",
                    i
                )));
            }
        }
    }

    Ok(Witness {
        faulty,
        normal,
        check_synchro,
        fault_occurs,
        cpt_fault,
        horizon,
    })
}

#[allow(clippy::too_many_arguments)]
fn decode_run<'ctx>(
    automaton: &Automaton,
    session: &Session<'ctx>,
    path: &[z3::ast::Int<'ctx>],
    last_active: &[z3::ast::Int<'ctx>],
    event: &[z3::ast::Int<'ctx>],
    nop: &[z3::ast::Bool<'ctx>],
    clocks: &[Vec<z3::ast::Real<'ctx>>],
    delay: &[z3::ast::Real<'ctx>],
    global_clock: &[z3::ast::Real<'ctx>],
    horizon: usize,
) -> Result<Vec<WitnessStep>> {
    let mut steps = Vec::with_capacity(horizon + 1);
    let mut previous: Option<TransitionIndex> = None;

    for i in 0..=horizon {
        let transition = session
            .eval_int(&path[i])
            .ok_or_else(|| internal("path variable has no model value"))? as TransitionIndex;
        let last = session
            .eval_int(&last_active[i])
            .ok_or_else(|| internal("last-active variable has no model value"))?
            as TransitionIndex;
        let ev = session
            .eval_bool(&nop[i])
            .ok_or_else(|| internal("nop flag has no model value"))?;
        let event_id = session
            .eval_int(&event[i])
            .ok_or_else(|| internal("event variable has no model value"))?;
        let delay_val = session
            .eval_real(&delay[i])
            .ok_or_else(|| internal("delay has no model value"))?;
        let g_val = session
            .eval_real(&global_clock[i])
            .ok_or_else(|| internal("global clock has no model value"))?;
        let clock_values = clocks
            .iter()
            .map(|c| {
                session
                    .eval_real(&c[i])
                    .ok_or_else(|| internal("clock value has no model value"))
            })
            .collect::<Result<Vec<_>>>()?;

        if !ev && automaton.transition(transition).event().value() != event_id {
            return Err(internal(&format!(
                "step {}: transition {} has event {} but idt == {}",
                i,
                transition,
                automaton.transition(transition).event().value(),
                event_id
            )));
        }
        if !ev && transition == automaton.nop_index() {
            return Err(internal(&format!(
                "step {}: non-stutter step chose the NOP transition",
                i
            )));
        }
        if let Some(prev) = previous {
            if i > 0 {
                let prev_last = session
                    .eval_int(&last_active[i - 1])
                    .ok_or_else(|| internal("last-active variable has no model value"))?
                    as TransitionIndex;
                if !ev && automaton.transition(prev).target() != automaton.transition(transition).source() {
                    return Err(internal(&format!(
                        "step {}: transitions {} -> {} are not contiguous",
                        i, prev, transition
                    )));
                }
                if prev_last != prev {
                    return Err(internal(&format!(
                        "step {}: last-active tracking is inconsistent",
                        i
                    )));
                }
            }
        }
        if !ev {
            previous = Some(transition);
        }

        steps.push(WitnessStep {
            transition,
            last_active: last,
            event: event_id,
            is_nop: ev,
            clock_values,
            delay: delay_val,
            global_clock: g_val,
        });
    }

    Ok(steps)
}

fn internal(message: &str) -> Error {
    Error::Internal {
        message: message.to_string(),
    }
}

/// Inspects an UNSAT core literal's symbolic name and returns a
/// human-readable suggestion (spec §4.6, naming discipline from §9).
pub fn suggest(literal: &str) -> &'static str {
    if literal.contains("length_") {
        "increase BOUND"
    } else if literal.contains("delay_") {
        "delays over-constrained"
    } else if literal.contains("constraint_") {
        "clock guards may be contradictory"
    } else if literal.contains("cptFault") {
        "DELTA timing may be unreachable"
    } else if literal.contains("bound") {
        "raise BOUND"
    } else if literal.contains("delta") {
        "DELTA inconsistent"
    } else {
        "no specific suggestion for this literal"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_prefixes() {
        assert_eq!(suggest("length_fp_3"), "increase BOUND");
        assert_eq!(suggest("delay_np_1"), "delays over-constrained");
        assert_eq!(suggest("constraint_fp_0"), "clock guards may be contradictory");
        assert_eq!(suggest("cptFault_2"), "DELTA timing may be unreachable");
        assert_eq!(suggest("bound"), "raise BOUND");
        assert_eq!(suggest("delta"), "DELTA inconsistent");
    }

    #[test]
    fn falls_back_on_unknown_prefix() {
        assert_eq!(suggest("isObservable_4"), "no specific suggestion for this literal");
    }
}
