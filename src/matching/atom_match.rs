//! The top-level matcher dispatch (§4.1, §4.3, §4.4, §6): `match(pattern, subject, bindings)`.
//! Routes to the specialized sequence matchers for `AtomSeq`/`Apply`, handles absorber reduction,
//! slot-wise `AlgProp` matching (§4.4), and the base cases (literal equality, variable binding,
//! alpha-equivalent lambda bodies, structural recursion for `MapPair`/`SpecialForm`).

use crate::abstractions::IString;
use crate::alg_prop::AlgProp;
use crate::atom::{Atom, AtomKind};
use crate::bindings::Bindings;
use crate::matching::outcome::{compose, MatchOutcome};
use crate::matching::sequence::{match_sequences, Regroup};
use crate::timeout::TimeoutFlag;

/// §6 `match(pattern, subject, bindings) -> Outcome`. Cooperative cancellation (§4.2): the first
/// thing every call does is check the shared timeout flag.
pub fn match_atoms(pattern: &Atom, subject: &Atom, bindings: Bindings, timeout: &TimeoutFlag) -> MatchOutcome {
    if timeout.is_set() {
        return MatchOutcome::fail("rewrite timed out", pattern, subject);
    }

    // Absorber reduction (§4.3): an absorbing element anywhere in the subject's argument
    // sequence collapses the whole `Apply` to the absorber before matching proceeds, regardless
    // of what the pattern looks like.
    if let Atom::Apply(subject_data) = subject {
        if let Atom::AtomSeq(seq) = &subject_data.rhs {
            if let Some(absorber) = &seq.properties.absorber {
                if seq.elements.iter().any(|e| e == absorber) {
                    return match_atoms(pattern, absorber, bindings, timeout);
                }
            }
        }
    }

    match pattern {
        Atom::Variable(data) => {
            if !type_compatible(&data.var_type, subject) {
                return MatchOutcome::fail("variable type mismatch", pattern, subject);
            }
            match bindings.with_binding(data.name, subject.clone()) {
                Some(b) => MatchOutcome::Single(b),
                None => MatchOutcome::fail("inconsistent binding", pattern, subject),
            }
        }

        Atom::Literal(p) => match subject {
            Atom::Literal(s) if p == s => MatchOutcome::Single(bindings),
            _ => MatchOutcome::fail("literal mismatch", pattern, subject),
        },

        Atom::OperatorRef(p) => match subject {
            Atom::OperatorRef(s) if p == s => MatchOutcome::Single(bindings),
            _ => MatchOutcome::fail("operator reference mismatch", pattern, subject),
        },

        Atom::RulesetRef(p) => match subject {
            Atom::RulesetRef(s) if p == s => MatchOutcome::Single(bindings),
            _ => MatchOutcome::fail("ruleset reference mismatch", pattern, subject),
        },

        Atom::RootType(p) => match subject {
            Atom::RootType(s) if p == s => MatchOutcome::Single(bindings),
            _ => MatchOutcome::fail("root type mismatch", pattern, subject),
        },

        Atom::Lambda(pd) => {
            let Atom::Lambda(sd) = subject else {
                return MatchOutcome::fail("expected a lambda", pattern, subject);
            };
            let bound_name = crate::lambda::bound_name(pd);
            let Some(scoped) = bindings.without(&bound_name).with_binding(bound_name, sd.bound_var.clone()) else {
                return MatchOutcome::fail("lambda bound-variable alias conflict", pattern, subject);
            };
            let body_outcome = match_atoms(&pd.body, &sd.body, scoped, timeout);
            strip_binding(body_outcome, bound_name)
        }

        Atom::AtomSeq(pd) => {
            let Atom::AtomSeq(sd) = subject else {
                return MatchOutcome::fail("expected a sequence", pattern, subject);
            };
            match_sequences(
                &pd.properties,
                &Regroup::BareSequence,
                pattern,
                &pd.elements,
                subject,
                &sd.elements,
                bindings,
                timeout,
            )
        }

        Atom::Apply(pd) => {
            let Atom::Apply(sd) = subject else {
                return MatchOutcome::fail("expected an application", pattern, subject);
            };
            let lhs_outcome = match_atoms(&pd.lhs, &sd.lhs, bindings, timeout);
            let pattern_rhs = pd.rhs.clone();
            let subject_rhs = sd.rhs.clone();
            let lhs_for_regroup = pd.lhs.clone();
            let timeout_owned = timeout.clone();
            compose(lhs_outcome, timeout.clone(), move |b| {
                match (&pattern_rhs, &subject_rhs) {
                    (Atom::AtomSeq(prhs), Atom::AtomSeq(srhs)) => match_sequences(
                        &prhs.properties,
                        &Regroup::UnderOperator(lhs_for_regroup.clone()),
                        &pattern_rhs,
                        &prhs.elements,
                        &subject_rhs,
                        &srhs.elements,
                        b,
                        &timeout_owned,
                    ),
                    _ => match_atoms(&pattern_rhs, &subject_rhs, b, &timeout_owned),
                }
            })
        }

        Atom::MapPair(pd) => {
            let Atom::MapPair(sd) = subject else {
                return MatchOutcome::fail("expected a map pair", pattern, subject);
            };
            let pattern_outcome = match_atoms(&pd.pattern, &sd.pattern, bindings, timeout);
            let p_rewrite = pd.rewrite.clone();
            let s_rewrite = sd.rewrite.clone();
            let timeout_owned = timeout.clone();
            compose(pattern_outcome, timeout.clone(), move |b| {
                match_atoms(&p_rewrite, &s_rewrite, b, &timeout_owned)
            })
        }

        Atom::AlgProp(pd) => match subject {
            Atom::AlgProp(sd) => match_alg_prop(&pd.prop, &sd.prop, bindings, timeout),
            _ => MatchOutcome::fail("expected an algebraic-properties atom", pattern, subject),
        },

        Atom::SpecialForm(pd) => {
            let Atom::SpecialForm(sd) = subject else {
                return MatchOutcome::fail("expected a special form", pattern, subject);
            };
            let tag_outcome = match_atoms(&pd.tag, &sd.tag, bindings, timeout);
            let p_content = pd.content.clone();
            let s_content = sd.content.clone();
            let timeout_owned = timeout.clone();
            compose(tag_outcome, timeout.clone(), move |b| {
                match_atoms(&p_content, &s_content, b, &timeout_owned)
            })
        }
    }
}

/// Best-effort type compatibility for a variable binding: an `Any`-typed (or non-`RootType`)
/// declared type accepts anything; a concrete `RootType` requires the subject's own type to match
/// it exactly. Richer subtyping is out of scope (§1 Non-goals: no higher-order unification, no
/// elaborate type system).
fn type_compatible(declared: &Atom, subject: &Atom) -> bool {
    match declared {
        Atom::RootType(crate::root_type::RootType::Any) => true,
        Atom::RootType(_) => subject.atom_type() == *declared,
        _ => true,
    }
}

fn strip_binding(outcome: MatchOutcome, name: IString) -> MatchOutcome {
    match outcome {
        MatchOutcome::Fail { .. } => outcome,
        MatchOutcome::Single(b) => MatchOutcome::Single(b.without(&name)),
        MatchOutcome::Many(it) => MatchOutcome::Many(Box::new(it.map(move |b| b.without(&name)))),
    }
}

/// §4.4: `AlgProp` atoms match slot-wise. An absent pattern slot matches anything; a present slot
/// is matched by the ordinary atom matcher against the subject's corresponding slot (as an atom),
/// and the slots' binding results compose left to right.
fn match_alg_prop(pattern: &AlgProp, subject: &AlgProp, bindings: Bindings, timeout: &TimeoutFlag) -> MatchOutcome {
    let mut outcome = MatchOutcome::Single(bindings);

    macro_rules! match_bool_slot {
        ($slot:ident) => {
            if let Some(p) = &pattern.$slot {
                let Some(s) = &subject.$slot else {
                    return MatchOutcome::fail(concat!(stringify!($slot), " slot missing"), &prop_atom(pattern), &prop_atom(subject));
                };
                let p_atom = property_value_atom(p);
                let s_atom = property_value_atom(s);
                let timeout_owned = timeout.clone();
                outcome = compose(outcome, timeout.clone(), move |b| match_atoms(&p_atom, &s_atom, b, &timeout_owned));
                if outcome.is_fail() {
                    return outcome;
                }
            }
        };
    }

    match_bool_slot!(associative);
    match_bool_slot!(commutative);
    match_bool_slot!(idempotent);

    if let Some(p) = &pattern.absorber {
        let Some(s) = &subject.absorber else {
            return MatchOutcome::fail("absorber slot missing", &prop_atom(pattern), &prop_atom(subject));
        };
        let p = p.clone();
        let s = s.clone();
        let timeout_owned = timeout.clone();
        outcome = compose(outcome, timeout.clone(), move |b| match_atoms(&p, &s, b, &timeout_owned));
        if outcome.is_fail() {
            return outcome;
        }
    }

    if let Some(p) = &pattern.identity {
        let Some(s) = &subject.identity else {
            return MatchOutcome::fail("identity slot missing", &prop_atom(pattern), &prop_atom(subject));
        };
        let p = p.clone();
        let s = s.clone();
        let timeout_owned = timeout.clone();
        outcome = compose(outcome, timeout.clone(), move |b| match_atoms(&p, &s, b, &timeout_owned));
    }

    outcome
}

fn property_value_atom(value: &crate::alg_prop::PropertyValue) -> Atom {
    match value {
        crate::alg_prop::PropertyValue::Bool(b) => Atom::Literal(crate::literal::Literal::Boolean(*b)),
        crate::alg_prop::PropertyValue::Unknown(a) => a.clone(),
    }
}

fn prop_atom(prop: &AlgProp) -> Atom {
    Atom::from_alg_prop(prop.clone())
}

pub(crate) fn kind_label(kind: AtomKind) -> &'static str {
    match kind {
        AtomKind::Literal => "literal",
        AtomKind::Variable => "variable",
        AtomKind::Lambda => "lambda",
        AtomKind::AtomSeq => "atom-seq",
        AtomKind::Apply => "apply",
        AtomKind::MapPair => "map-pair",
        AtomKind::OperatorRef => "operator-ref",
        AtomKind::RulesetRef => "ruleset-ref",
        AtomKind::AlgProp => "alg-prop",
        AtomKind::SpecialForm => "special-form",
        AtomKind::RootType => "root-type",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::root_type::RootType;

    #[test]
    fn literal_matches_equal_literal() {
        let a = Atom::Literal(Literal::integer(3));
        let outcome = match_atoms(&a, &a, Bindings::new(), &TimeoutFlag::new());
        assert!(matches!(outcome, MatchOutcome::Single(_)));
    }

    #[test]
    fn variable_binds_to_subject() {
        let x = Atom::variable("x", Atom::RootType(RootType::Any));
        let subject = Atom::Literal(Literal::integer(7));
        let outcome = match_atoms(&x, &subject, Bindings::new(), &TimeoutFlag::new());
        match outcome {
            MatchOutcome::Single(b) => assert_eq!(b.get(&"x".into()), Some(&subject)),
            _ => panic!("expected a match"),
        }
    }

    #[test]
    fn repeated_variable_requires_consistent_binding() {
        let x = Atom::variable("x", Atom::RootType(RootType::Any));
        let pattern = Atom::apply_op("f", vec![x.clone(), x]);
        let one = Atom::Literal(Literal::integer(1));
        let two = Atom::Literal(Literal::integer(2));
        let consistent = Atom::apply_op("f", vec![one.clone(), one.clone()]);
        let inconsistent = Atom::apply_op("f", vec![one, two]);
        assert!(matches!(
            match_atoms(&pattern, &consistent, Bindings::new(), &TimeoutFlag::new()),
            MatchOutcome::Single(_)
        ));
        assert!(match_atoms(&pattern, &inconsistent, Bindings::new(), &TimeoutFlag::new()).is_fail());
    }

    #[test]
    fn absorber_collapses_the_whole_apply_before_matching() {
        let mut props = AlgProp::none();
        props.associative = Some(crate::alg_prop::PropertyValue::Bool(true));
        props.absorber = Some(Atom::Literal(Literal::integer(0)));
        let op = Atom::OperatorRef("times".into());
        let subject = Atom::apply(
            op,
            Atom::atom_seq(props, vec![Atom::Literal(Literal::integer(5)), Atom::Literal(Literal::integer(0))]),
        );
        let pattern = Atom::Literal(Literal::integer(0));
        assert!(matches!(
            match_atoms(&pattern, &subject, Bindings::new(), &TimeoutFlag::new()),
            MatchOutcome::Single(_)
        ));
    }
}
