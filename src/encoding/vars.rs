//! The symbolic variable factory (spec §2 component 3, §4.2).
//!
//! Allocates fresh, deterministically step-indexed SMT variables lazily
//! as the horizon grows. Nothing is ever deleted: the solver's internal
//! assertion stack is the only source of truth once a variable has been
//! asserted about (spec §3 lifecycle note).

use z3::ast::{Bool, Int, Real};

use crate::automaton::Automaton;
use crate::solver::SmtSolver;

/// All per-step and per-transition symbolic variables allocated so far
/// for the two jointly-unrolled runs.
pub struct VariableFactory<'ctx> {
    clock_num: usize,

    pub(crate) fp: Vec<Int<'ctx>>,
    pub(crate) np: Vec<Int<'ctx>>,
    pub(crate) lfp: Vec<Int<'ctx>>,
    pub(crate) lnp: Vec<Int<'ctx>>,
    pub(crate) idt_fp: Vec<Int<'ctx>>,
    pub(crate) idt_np: Vec<Int<'ctx>>,
    pub(crate) nop_fp: Vec<Bool<'ctx>>,
    pub(crate) nop_np: Vec<Bool<'ctx>>,
    pub(crate) fault_occurs: Vec<Bool<'ctx>>,
    pub(crate) check_synchro: Vec<Bool<'ctx>>,
    pub(crate) constraint_fp: Vec<Bool<'ctx>>,
    pub(crate) constraint_np: Vec<Bool<'ctx>>,
    pub(crate) length_fp: Vec<Int<'ctx>>,
    pub(crate) length_np: Vec<Int<'ctx>>,
    pub(crate) g_fp: Vec<Real<'ctx>>,
    pub(crate) g_np: Vec<Real<'ctx>>,

    /// One entry ahead of the current horizon (spec §3: `delay[i]` is
    /// consumed while encoding step `i - 1`, so it must exist already).
    pub(crate) delay_fp: Vec<Real<'ctx>>,
    pub(crate) delay_np: Vec<Real<'ctx>>,
    /// Also one entry ahead, for the same reason.
    pub(crate) cpt_fault: Vec<Real<'ctx>>,

    /// `[clock][step]`, one step ahead like `delay_*`.
    pub(crate) clock_fp: Vec<Vec<Real<'ctx>>>,
    pub(crate) clock_np: Vec<Vec<Real<'ctx>>>,
    /// `[clock][step]`.
    pub(crate) source_inv_fp: Vec<Vec<Bool<'ctx>>>,
    pub(crate) source_inv_np: Vec<Vec<Bool<'ctx>>>,
    pub(crate) final_inv_fp: Vec<Vec<Bool<'ctx>>>,
    pub(crate) final_inv_np: Vec<Vec<Bool<'ctx>>>,
    pub(crate) reset_fp: Vec<Vec<Bool<'ctx>>>,
    pub(crate) reset_np: Vec<Vec<Bool<'ctx>>>,

    /// One boolean per step, toggling whether that step's chosen
    /// transitions participate in the observable synchronization rule.
    /// Passed whole as assumption literals every round so a future
    /// diagnostic pass can retract one to probe observability (spec §4.4).
    pub(crate) is_observable: Vec<Bool<'ctx>>,
    /// One integer per transition, pinned to its true event id.
    pub(crate) label_transition: Vec<Int<'ctx>>,

    pub(crate) bound: Int<'ctx>,
    pub(crate) delta: Real<'ctx>,
}

impl<'ctx> VariableFactory<'ctx> {
    /// Allocates all variables for the initial step (i = 0) plus the
    /// per-transition variables (`isObservable`, `labelTransition`).
    pub fn new(smt: &'ctx SmtSolver, automaton: &Automaton) -> Self {
        let clock_num = automaton.clock_num();
        let n = automaton.num_transitions();

        let factory = VariableFactory {
            clock_num,
            fp: vec![smt.new_int("fp_0")],
            np: vec![smt.new_int("np_0")],
            lfp: vec![smt.new_int("lfp_0")],
            lnp: vec![smt.new_int("lnp_0")],
            idt_fp: vec![smt.new_int("idt_fp_0")],
            idt_np: vec![smt.new_int("idt_np_0")],
            nop_fp: vec![smt.new_bool("nop_fp_0")],
            nop_np: vec![smt.new_bool("nop_np_0")],
            fault_occurs: vec![smt.new_bool("faultOccurs_0")],
            check_synchro: vec![smt.new_bool("checkSynchro_0")],
            constraint_fp: vec![smt.new_bool("constraint_fp_0")],
            constraint_np: vec![smt.new_bool("constraint_np_0")],
            length_fp: vec![smt.new_int("length_fp_0")],
            length_np: vec![smt.new_int("length_np_0")],
            g_fp: vec![smt.new_real("g_fp_0")],
            g_np: vec![smt.new_real("g_np_0")],
            delay_fp: vec![smt.new_real("delay_fp_0"), smt.new_real("delay_fp_1")],
            delay_np: vec![smt.new_real("delay_np_0"), smt.new_real("delay_np_1")],
            cpt_fault: vec![smt.new_real("cptFault_0"), smt.new_real("cptFault_1")],
            clock_fp: (0..clock_num)
                .map(|k| vec![smt.new_real(&format!("clock{}_fp_0", k + 1)), smt.new_real(&format!("clock{}_fp_1", k + 1))])
                .collect(),
            clock_np: (0..clock_num)
                .map(|k| vec![smt.new_real(&format!("clock{}_np_0", k + 1)), smt.new_real(&format!("clock{}_np_1", k + 1))])
                .collect(),
            source_inv_fp: (0..clock_num)
                .map(|k| vec![smt.new_bool(&format!("sourceInv{}_fp_0", k + 1))])
                .collect(),
            source_inv_np: (0..clock_num)
                .map(|k| vec![smt.new_bool(&format!("sourceInv{}_np_0", k + 1))])
                .collect(),
            final_inv_fp: (0..clock_num)
                .map(|k| vec![smt.new_bool(&format!("finalInv{}_fp_0", k + 1))])
                .collect(),
            final_inv_np: (0..clock_num)
                .map(|k| vec![smt.new_bool(&format!("finalInv{}_np_0", k + 1))])
                .collect(),
            reset_fp: (0..clock_num)
                .map(|k| vec![smt.new_bool(&format!("reset{}_fp_0", k + 1))])
                .collect(),
            reset_np: (0..clock_num)
                .map(|k| vec![smt.new_bool(&format!("reset{}_np_0", k + 1))])
                .collect(),
            is_observable: vec![smt.new_bool("isObservable_0")],
            label_transition: (0..n)
                .map(|j| smt.new_int(&format!("statusTransition_{}", j)))
                .collect(),
            bound: smt.new_int("bound"),
            delta: smt.new_real("delta"),
        };
        factory
    }

    /// The current horizon: one more than the highest allocated step index.
    pub fn steps(&self) -> usize {
        self.fp.len()
    }

    /// The number of clocks.
    pub fn clock_num(&self) -> usize {
        self.clock_num
    }

    /// The `bound` integer variable.
    pub fn bound(&self) -> &Int<'ctx> {
        &self.bound
    }

    /// The `delta` real variable.
    pub fn delta(&self) -> &Real<'ctx> {
        &self.delta
    }

    /// All `isObservable` literals allocated so far, for use as a block
    /// of assumption literals each round (spec §4.4).
    pub fn observability_literals(&self) -> &[Bool<'ctx>] {
        &self.is_observable
    }

    /// Allocates all variables needed for the next step, including the
    /// look-ahead `delay`/clock/`cptFault` entries for the step after that.
    pub fn alloc_step(&mut self, smt: &'ctx SmtSolver) -> usize {
        let idx = self.fp.len();

        self.fp.push(smt.new_int(&format!("fp_{}", idx)));
        self.np.push(smt.new_int(&format!("np_{}", idx)));
        self.lfp.push(smt.new_int(&format!("lfp_{}", idx)));
        self.lnp.push(smt.new_int(&format!("lnp_{}", idx)));
        self.idt_fp.push(smt.new_int(&format!("idt_fp_{}", idx)));
        self.idt_np.push(smt.new_int(&format!("idt_np_{}", idx)));
        self.nop_fp.push(smt.new_bool(&format!("nop_fp_{}", idx)));
        self.nop_np.push(smt.new_bool(&format!("nop_np_{}", idx)));
        self.fault_occurs
            .push(smt.new_bool(&format!("faultOccurs_{}", idx)));
        self.check_synchro
            .push(smt.new_bool(&format!("checkSynchro_{}", idx)));
        self.constraint_fp
            .push(smt.new_bool(&format!("constraint_fp_{}", idx)));
        self.constraint_np
            .push(smt.new_bool(&format!("constraint_np_{}", idx)));
        self.length_fp
            .push(smt.new_int(&format!("length_fp_{}", idx)));
        self.length_np
            .push(smt.new_int(&format!("length_np_{}", idx)));
        self.g_fp.push(smt.new_real(&format!("g_fp_{}", idx)));
        self.g_np.push(smt.new_real(&format!("g_np_{}", idx)));
        self.is_observable
            .push(smt.new_bool(&format!("isObservable_{}", idx)));

        self.delay_fp
            .push(smt.new_real(&format!("delay_fp_{}", idx + 1)));
        self.delay_np
            .push(smt.new_real(&format!("delay_np_{}", idx + 1)));
        self.cpt_fault
            .push(smt.new_real(&format!("cptFault_{}", idx + 1)));

        for k in 0..self.clock_num {
            self.clock_fp[k].push(smt.new_real(&format!("clock{}_fp_{}", k + 1, idx + 1)));
            self.clock_np[k].push(smt.new_real(&format!("clock{}_np_{}", k + 1, idx + 1)));
            self.source_inv_fp[k].push(smt.new_bool(&format!("sourceInv{}_fp_{}", k + 1, idx)));
            self.source_inv_np[k].push(smt.new_bool(&format!("sourceInv{}_np_{}", k + 1, idx)));
            self.final_inv_fp[k].push(smt.new_bool(&format!("finalInv{}_fp_{}", k + 1, idx)));
            self.final_inv_np[k].push(smt.new_bool(&format!("finalInv{}_np_{}", k + 1, idx)));
            self.reset_fp[k].push(smt.new_bool(&format!("reset{}_fp_{}", k + 1, idx)));
            self.reset_np[k].push(smt.new_bool(&format!("reset{}_np_{}", k + 1, idx)));
        }

        idx
    }
}
