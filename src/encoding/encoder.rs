//! The constraint encoder (spec §2 component 4, §4.3): the heart of the
//! system. Emits, per step, the full conjunction of constraints binding
//! a chosen transition index to its event label, guard, reset,
//! invariant, clock updates, delays, fault counter, synchronization
//! with the other run, and stutter rules.

use z3::ast::{Ast, Bool, Int, Real};

use crate::automaton::{Automaton, ComparisonOp, EventLabel, GuardAtom, TransitionIndex};
use crate::rational::Rational;
use crate::solver::{Session, SmtSolver};

use super::vars::VariableFactory;

/// Builds and incrementally extends the joint SMT encoding of the two
/// unrolled runs over a fixed automaton.
pub struct Encoder<'ctx, 'a> {
    automaton: &'a Automaton,
    vars: VariableFactory<'ctx>,
    reset_matrix: Vec<Vec<bool>>,
}

impl<'ctx, 'a> Encoder<'ctx, 'a> {
    /// Builds the variable factory, pins transition labels, and asserts
    /// the initial-step (i = 0) constraints (spec §4.3 "Initial step").
    pub fn new(smt: &'ctx SmtSolver, session: &Session<'ctx>, automaton: &'a Automaton) -> Self {
        let vars = VariableFactory::new(smt, automaton);
        let reset_matrix = build_reset_matrix(automaton);
        let mut encoder = Encoder {
            automaton,
            vars,
            reset_matrix,
        };
        encoder.assert_label_pinning(smt, session);
        encoder.assert_initial_step(smt, session);
        encoder.assert_step_body(smt, session, 0);
        encoder
    }

    /// The variable factory, for the search driver and diagnostics to read back.
    pub fn vars(&self) -> &VariableFactory<'ctx> {
        &self.vars
    }

    /// Allocates and constrains the next step. Returns its index.
    pub fn extend(&mut self, smt: &'ctx SmtSolver, session: &Session<'ctx>) -> usize {
        let idx = self.vars.alloc_step(smt);
        self.assert_successor_step(smt, session, idx);
        self.assert_step_body(smt, session, idx);
        idx
    }

    fn assert_label_pinning(&self, smt: &'ctx SmtSolver, session: &Session<'ctx>) {
        for (j, t) in self.automaton.transitions().iter().enumerate() {
            session.assert(&self.vars.label_transition[j]._eq(&smt.int_const(t.event().value())));
        }
        let max_label = smt.int_const(self.automaton.max_label());
        for label in &self.vars.label_transition {
            let in_range = Bool::and(
                smt.context(),
                &[&label.ge(&smt.int_const(0)), &label.le(&max_label)],
            );
            session.assert(&in_range);
        }
    }

    /// Spec §4.3 "Initial step (i = 0)".
    fn assert_initial_step(&self, smt: &'ctx SmtSolver, session: &Session<'ctx>) {
        let v = &self.vars;
        let nop_index = smt.int_const(self.automaton.nop_index() as i64);

        session.assert(&v.fp[0]._eq(&nop_index));
        session.assert(&v.np[0]._eq(&nop_index));
        session.assert(&v.fp[0]._eq(&v.lfp[0]));
        session.assert(&v.np[0]._eq(&v.lnp[0]));

        for k in 0..v.clock_num() {
            session.assert(&v.clock_fp[k][0]._eq(&smt.rational_const(Rational::zero())));
            session.assert(&v.clock_np[k][0]._eq(&smt.rational_const(Rational::zero())));
        }

        session.assert(&v.g_fp[0]._eq(&smt.rational_const(Rational::zero())));
        session.assert(&v.g_np[0]._eq(&smt.rational_const(Rational::zero())));

        session.assert(&v.idt_np[0]._eq(&smt.int_const(EventLabel::FAULT.value())).not());
        session.assert(&v.nop_fp[0]._eq(&Bool::from_bool(smt.context(), false)));
        session.assert(&v.nop_np[0]._eq(&Bool::from_bool(smt.context(), false)));

        let fault_at_0 = v.idt_fp[0]._eq(&smt.int_const(EventLabel::FAULT.value()));
        session.assert(&v.fault_occurs[0]._eq(&fault_at_0));
        session.assert(&v.cpt_fault[0]._eq(&smt.rational_const(Rational::zero())));

        session.assert(&v.bound.ge(&smt.int_const(0)));
        session.assert(&v.delta.ge(&smt.rational_const(Rational::zero())));

        session.assert(&v.delay_fp[0]._eq(&smt.rational_const(Rational::zero())));
        session.assert(&v.delay_np[0]._eq(&smt.rational_const(Rational::zero())));

        session.assert(&v.length_fp[0]._eq(&smt.int_const(0)));
        session.assert(&v.length_np[0]._eq(&smt.int_const(0)));
    }

    /// Spec §4.3 "Legal successor" and "Last-active propagation", asserted
    /// when extending from step `i - 1` to step `i = idx`.
    fn assert_successor_step(&self, smt: &'ctx SmtSolver, session: &Session<'ctx>, idx: usize) {
        let v = &self.vars;
        let nop_index = smt.int_const(self.automaton.nop_index() as i64);

        session.assert(&v.fp[idx].le(&smt.int_const(self.automaton.num_transitions() as i64)));
        session.assert(&v.np[idx].le(&smt.int_const(self.automaton.num_transitions() as i64)));
        let max_label = smt.int_const(self.automaton.max_label());
        session.assert(&v.idt_fp[idx].le(&max_label));
        session.assert(&v.idt_np[idx].le(&max_label));

        session.assert(
            &v.fp[idx]
                ._eq(&nop_index)
                .implies(&v.lfp[idx]._eq(&v.lfp[idx - 1])),
        );
        session.assert(
            &v.fp[idx]
                ._eq(&nop_index)
                .not()
                .implies(&v.lfp[idx]._eq(&v.fp[idx])),
        );
        session.assert(
            &v.np[idx]
                ._eq(&nop_index)
                .implies(&v.lnp[idx]._eq(&v.lnp[idx - 1])),
        );
        session.assert(
            &v.np[idx]
                ._eq(&nop_index)
                .not()
                .implies(&v.lnp[idx]._eq(&v.np[idx])),
        );

        for (j, followers) in self.automaton_next_rows() {
            let fp_options: Vec<Bool> = followers
                .iter()
                .map(|&n| v.fp[idx]._eq(&smt.int_const(n as i64)))
                .collect();
            let fp_refs: Vec<&Bool> = fp_options.iter().collect();
            session.assert(
                &v.lfp[idx - 1]
                    ._eq(&smt.int_const(j as i64))
                    .implies(&Bool::or(smt.context(), &fp_refs)),
            );

            let np_options: Vec<Bool> = followers
                .iter()
                .map(|&n| v.np[idx]._eq(&smt.int_const(n as i64)))
                .collect();
            let np_refs: Vec<&Bool> = np_options.iter().collect();
            session.assert(
                &v.lnp[idx - 1]
                    ._eq(&smt.int_const(j as i64))
                    .implies(&Bool::or(smt.context(), &np_refs)),
            );
        }

        session.assert(&v.idt_np[idx]._eq(&smt.int_const(EventLabel::FAULT.value())).not());

        session.assert(&v.delay_fp[idx].ge(&smt.rational_const(Rational::zero())));
        session.assert(&v.delay_np[idx].ge(&smt.rational_const(Rational::zero())));

        session.assert(&v.nop_fp[idx]._eq(&v.fp[idx]._eq(&nop_index)));
        session.assert(&v.nop_np[idx]._eq(&v.np[idx]._eq(&nop_index)));

        session.assert(&Bool::or(
            smt.context(),
            &[&v.nop_fp[idx].not(), &v.nop_np[idx].not()],
        ));

        let no_obs = smt.int_const(EventLabel::NO_OBS.value());
        session.assert(&v.nop_fp[idx - 1].implies(&Bool::or(
            smt.context(),
            &[&v.nop_fp[idx], &v.idt_fp[idx].gt(&no_obs)],
        )));
        session.assert(&v.nop_np[idx - 1].implies(&Bool::or(
            smt.context(),
            &[&v.nop_np[idx], &v.idt_np[idx].gt(&no_obs)],
        )));

        let fault_label = smt.int_const(EventLabel::FAULT.value());
        let fault_now = v.idt_fp[idx]._eq(&fault_label);
        session.assert(
            &Bool::or(smt.context(), &[&v.fault_occurs[idx - 1], &fault_now])
                ._eq(&v.fault_occurs[idx]),
        );
        session.assert(
            &v.fault_occurs[idx - 1]
                .not()
                .implies(&v.cpt_fault[idx]._eq(&smt.rational_const(Rational::zero()))),
        );
        session.assert(
            &v.fault_occurs[idx]
                .not()
                .implies(&v.cpt_fault[idx + 1]._eq(&smt.rational_const(Rational::zero()))),
        );
        session.assert(&v.fault_occurs[idx].implies(
            &v.cpt_fault[idx + 1]._eq(&Real::add(smt.context(), &[&v.cpt_fault[idx], &v.delay_fp[idx + 1]])),
        ));
    }

    fn automaton_next_rows(&self) -> Vec<(TransitionIndex, &[TransitionIndex])> {
        (0..self.automaton.num_transitions())
            .map(|j| (j, self.automaton.next(j)))
            .collect()
    }

    /// The per-step body shared by the initial step and every extension
    /// step: the per-transition identity binding, guard/invariant
    /// discharge, clock update, global clock, NOP neutrality, length
    /// counter and observable synchronization rules (spec §4.3,
    /// `add_constraint_on_id_transition`).
    fn assert_step_body(&self, smt: &'ctx SmtSolver, session: &Session<'ctx>, i: usize) {
        let v = &self.vars;

        for (j, t) in self.automaton.transitions().iter().enumerate() {
            let j_const = smt.int_const(j as i64);
            let fp_is_j = v.fp[i]._eq(&j_const);
            let np_is_j = v.np[i]._eq(&j_const);

            session.assert(&fp_is_j.implies(&v.idt_fp[i]._eq(&v.label_transition[j])));
            session.assert(&np_is_j.implies(&v.idt_np[i]._eq(&v.label_transition[j])));

            let guard_fp = self.guard_bool(smt, t.guard(), &v.clock_fp, i);
            session.assert(&fp_is_j.implies(&v.constraint_fp[i]._eq(&guard_fp)));
            let guard_np = self.guard_bool(smt, t.guard(), &v.clock_np, i);
            session.assert(&np_is_j.implies(&v.constraint_np[i]._eq(&guard_np)));

            let source_inv = self.automaton.state(t.source()).invariant();
            let target_inv = self.automaton.state(t.target()).invariant();

            for k in 0..v.clock_num() {
                let reset_k_j = Bool::from_bool(smt.context(), self.reset_matrix[k][j]);
                session.assert(&fp_is_j.implies(&v.reset_fp[k][i]._eq(&reset_k_j)));
                session.assert(&np_is_j.implies(&v.reset_np[k][i]._eq(&reset_k_j)));

                let src_inv_k = self.invariant_bool(smt, source_inv, k, &v.clock_fp, i);
                session.assert(&fp_is_j.implies(&v.source_inv_fp[k][i]._eq(&src_inv_k)));
                let src_inv_k_np = self.invariant_bool(smt, source_inv, k, &v.clock_np, i);
                session.assert(&np_is_j.implies(&v.source_inv_np[k][i]._eq(&src_inv_k_np)));

                let dst_inv_k = self.invariant_bool(smt, target_inv, k, &v.clock_fp, i + 1);
                session.assert(&fp_is_j.implies(&v.final_inv_fp[k][i]._eq(&dst_inv_k)));
                let dst_inv_k_np = self.invariant_bool(smt, target_inv, k, &v.clock_np, i + 1);
                session.assert(&np_is_j.implies(&v.final_inv_np[k][i]._eq(&dst_inv_k_np)));
            }
        }

        let t_true = Bool::from_bool(smt.context(), true);
        session.assert(&v.constraint_fp[i]._eq(&t_true));
        session.assert(&v.constraint_np[i]._eq(&t_true));

        for k in 0..v.clock_num() {
            session.assert(&v.source_inv_fp[k][i]._eq(&t_true));
            session.assert(&v.final_inv_fp[k][i]._eq(&t_true));
            session.assert(&v.source_inv_np[k][i]._eq(&t_true));
            session.assert(&v.final_inv_np[k][i]._eq(&t_true));

            session.assert(&v.reset_fp[k][i].implies(
                &v.clock_fp[k][i + 1]._eq(&v.delay_fp[i + 1]),
            ));
            session.assert(&v.reset_fp[k][i].not().implies(
                &v.clock_fp[k][i + 1]._eq(&Real::add(
                    smt.context(),
                    &[&v.clock_fp[k][i], &v.delay_fp[i + 1]],
                )),
            ));
            session.assert(&v.reset_np[k][i].implies(
                &v.clock_np[k][i + 1]._eq(&v.delay_np[i + 1]),
            ));
            session.assert(&v.reset_np[k][i].not().implies(
                &v.clock_np[k][i + 1]._eq(&Real::add(
                    smt.context(),
                    &[&v.clock_np[k][i], &v.delay_np[i + 1]],
                )),
            ));
        }

        session.assert(&v.delay_fp[i].ge(&smt.rational_const(Rational::zero())));
        session.assert(&v.delay_np[i].ge(&smt.rational_const(Rational::zero())));
        session.assert(&v.delay_fp[i + 1].ge(&smt.rational_const(Rational::zero())));
        session.assert(&v.delay_np[i + 1].ge(&smt.rational_const(Rational::zero())));

        if i >= 1 {
            session.assert(&v.g_fp[i]._eq(&Real::add(smt.context(), &[&v.g_fp[i - 1], &v.delay_fp[i]])));
            session.assert(&v.g_np[i]._eq(&Real::add(smt.context(), &[&v.g_np[i - 1], &v.delay_np[i]])));
        }

        let nop_index = smt.int_const(self.automaton.nop_index() as i64);
        session.assert(&v.fp[i]._eq(&nop_index).implies(&v.delay_fp[i + 1]._eq(&smt.rational_const(Rational::zero()))));
        session.assert(&v.np[i]._eq(&nop_index).implies(&v.delay_np[i + 1]._eq(&smt.rational_const(Rational::zero()))));

        if i >= 1 {
            let one = smt.int_const(1);
            let fp_nop = v.fp[i]._eq(&nop_index);
            session.assert(&fp_nop.ite(
                &v.length_fp[i]._eq(&v.length_fp[i - 1]),
                &v.length_fp[i]._eq(&Int::add(smt.context(), &[&v.length_fp[i - 1], &one])),
            ));
            let np_nop = v.np[i]._eq(&nop_index);
            session.assert(&np_nop.ite(
                &v.length_np[i]._eq(&v.length_np[i - 1]),
                &v.length_np[i]._eq(&Int::add(smt.context(), &[&v.length_np[i - 1], &one])),
            ));
        }

        let no_obs = smt.int_const(EventLabel::NO_OBS.value());
        let either_observable = Bool::or(
            smt.context(),
            &[&v.idt_fp[i].gt(&no_obs), &v.idt_np[i].gt(&no_obs)],
        );
        let synchro_def = Bool::and(smt.context(), &[&either_observable, &v.is_observable[i]]);
        session.assert(&synchro_def._eq(&v.check_synchro[i]));

        let same_event_and_time = Bool::and(
            smt.context(),
            &[&v.idt_fp[i]._eq(&v.idt_np[i]), &v.g_fp[i]._eq(&v.g_np[i])],
        );
        session.assert(&Bool::or(
            smt.context(),
            &[&v.check_synchro[i].not(), &same_event_and_time],
        ));
    }

    fn guard_bool(
        &self,
        smt: &'ctx SmtSolver,
        guard: &[GuardAtom],
        clocks: &[Vec<Real<'ctx>>],
        step: usize,
    ) -> Bool<'ctx> {
        if guard.is_empty() {
            return Bool::from_bool(smt.context(), true);
        }
        let atoms: Vec<Bool> = guard
            .iter()
            .map(|atom| atom_bool(smt, &clocks[atom.clock][step], atom))
            .collect();
        let refs: Vec<&Bool> = atoms.iter().collect();
        Bool::and(smt.context(), &refs)
    }

    /// Spec §4.3: invariants use only upper bounds, one atom per clock at most.
    fn invariant_bool(
        &self,
        smt: &'ctx SmtSolver,
        invariant: &[GuardAtom],
        clock: usize,
        clocks: &[Vec<Real<'ctx>>],
        step: usize,
    ) -> Bool<'ctx> {
        match invariant.iter().find(|atom| atom.clock == clock) {
            Some(atom) => atom_bool(smt, &clocks[clock][step], atom),
            None => Bool::from_bool(smt.context(), true),
        }
    }
}

fn atom_bool<'ctx>(smt: &'ctx SmtSolver, clock_value: &Real<'ctx>, atom: &GuardAtom) -> Bool<'ctx> {
    let bound = smt.rational_const(atom.bound);
    match atom.op {
        ComparisonOp::Gt => clock_value.gt(&bound),
        ComparisonOp::Ge => clock_value.ge(&bound),
        ComparisonOp::Lt => clock_value.lt(&bound),
        ComparisonOp::Le => clock_value.le(&bound),
    }
}

fn build_reset_matrix(automaton: &Automaton) -> Vec<Vec<bool>> {
    let mut matrix = vec![vec![false; automaton.num_transitions()]; automaton.clock_num()];
    for (j, t) in automaton.transitions().iter().enumerate() {
        for &c in t.reset() {
            matrix[c][j] = true;
        }
    }
    matrix
}
