//! Specialized matchers (C5, §4.3): sequence, commutative, associative, and AC matching over atom
//! sequences, dispatched from `AlgProp`. Shared helpers: constant elimination and a `Regroup`
//! closure describing how a contiguous or arbitrary subset of subject elements collapses into a
//! single atom when it is bound to a sequence-absorbing pattern variable.

use crate::alg_prop::AlgProp;
use crate::atom::Atom;
use crate::bindings::Bindings;
use crate::matching::atom_match::match_atoms;
use crate::matching::groups::{boundary_combinations, groups_from_boundaries};
use crate::matching::outcome::MatchOutcome;
use crate::matching::permute::PermutationGenerator32;
use crate::timeout::TimeoutFlag;

/// Builds the atom that a sequence-absorbing pattern variable binds to when it consumes more (or
/// fewer) than one subject element. Under `Apply(op, AtomSeq(...))` this re-wraps the group with
/// the same operator (§4.6.1's synthetic rules rely on exactly this shape); for a bare `AtomSeq`
/// it nests another `AtomSeq` with the same properties.
pub(crate) enum Regroup {
    UnderOperator(Atom),
    BareSequence,
}

impl Regroup {
    fn build(&self, props: &AlgProp, elems: Vec<Atom>) -> Atom {
        match elems.len() {
            1 => elems.into_iter().next().unwrap(),
            _ => match self {
                Regroup::UnderOperator(op) => Atom::apply(op.clone(), Atom::atom_seq(props.clone(), elems)),
                Regroup::BareSequence => Atom::atom_seq(props.clone(), elems),
            },
        }
    }
}

fn constant_map_of(atom: &Atom) -> Option<&std::collections::HashMap<Atom, usize>> {
    match atom {
        Atom::AtomSeq(data) => Some(&data.constant_map),
        _ => None,
    }
}

/// Shared constant-elimination pre-pass (§4.3): "for each pattern element in the pattern's
/// constant map, look up the same constant in the subject's constant map; if present, omit both
/// that pattern and subject; if absent, fail." Both `pattern_atom` and `subject_atom` are the
/// enclosing `AtomSeq` atoms, so their precomputed `constant_map`s (§3.1 invariant (e)) drive the
/// pattern-element classification and the subject presence check; a pattern element absent from
/// `pattern_atom`'s own map is treated as non-constant without touching the subject at all, and a
/// constant missing from `subject_atom`'s map fails the whole match without scanning `subject`.
/// The actual removal still walks the (possibly identity-filtered, §4.3) `subject` slice rather
/// than trusting the map's indices, since those index into the *original*, unfiltered elements and
/// a prior identity-removal pass may have already dropped the occurrence the map points at.
fn eliminate_constants(pattern_atom: &Atom, pattern: &[Atom], subject_atom: &Atom, subject: &[Atom]) -> Option<(Vec<Atom>, Vec<Atom>)> {
    let pattern_constants = constant_map_of(pattern_atom);
    let subject_constants = constant_map_of(subject_atom);

    let mut remaining_subject = subject.to_vec();
    let mut remaining_pattern = Vec::with_capacity(pattern.len());
    for p in pattern {
        let is_constant = pattern_constants.map_or_else(|| p.is_constant(), |map| map.contains_key(p));
        if !is_constant {
            remaining_pattern.push(p.clone());
            continue;
        }
        if let Some(map) = subject_constants {
            if !map.contains_key(p) {
                return None;
            }
        }
        match remaining_subject.iter().position(|s| s == p) {
            Some(pos) => {
                remaining_subject.remove(pos);
            }
            None => return None,
        }
    }
    Some((remaining_pattern, remaining_subject))
}

/// Top-level entry point: dispatches on `props` to one of the four specialized matchers (§4.3),
/// after identity-removal and constant-elimination pre-passes.
pub(crate) fn match_sequences(
    props: &AlgProp,
    regroup: &Regroup,
    pattern_atom: &Atom,
    pattern: &[Atom],
    subject_atom: &Atom,
    subject: &[Atom],
    bindings: Bindings,
    timeout: &TimeoutFlag,
) -> MatchOutcome {
    let subject: Vec<Atom> = match &props.identity {
        Some(identity) => subject.iter().filter(|s| *s != identity).cloned().collect(),
        None => subject.to_vec(),
    };

    // Constant elimination (§4.3) is a pruning step owned by the permutation/regrouping matchers
    // (commutative, associative, AC); the plain sequence matcher (neither A nor C) and the
    // equal-arity degenerate case below it already match left-to-right positionally, so running
    // the elimination there would let two constants anywhere in the sequences satisfy each other
    // regardless of position.
    match (props.is_associative(), props.is_commutative()) {
        (false, false) => sequence_matcher(pattern, &subject, pattern_atom, subject_atom, bindings, timeout),
        (false, true) => {
            if pattern.len() != subject.len() {
                return MatchOutcome::fail("commutative arity mismatch", pattern_atom, subject_atom);
            }
            let Some((pattern, subject)) = eliminate_constants(pattern_atom, pattern, subject_atom, &subject) else {
                return MatchOutcome::fail("constant elimination failed", pattern_atom, subject_atom);
            };
            commutative_matcher(&pattern, &subject, pattern_atom, subject_atom, bindings, timeout)
        }
        (true, false) => {
            if pattern.len() == subject.len() {
                sequence_matcher(pattern, &subject, pattern_atom, subject_atom, bindings, timeout)
            } else {
                let Some((pattern, subject)) = eliminate_constants(pattern_atom, pattern, subject_atom, &subject) else {
                    return MatchOutcome::fail("constant elimination failed", pattern_atom, subject_atom);
                };
                associative_matcher(props, regroup, &pattern, &subject, pattern_atom, subject_atom, bindings, timeout)
            }
        }
        (true, true) => {
            let Some((pattern, subject)) = eliminate_constants(pattern_atom, pattern, subject_atom, &subject) else {
                return MatchOutcome::fail("constant elimination failed", pattern_atom, subject_atom);
            };
            if pattern.len() == subject.len() && !pattern.iter().any(Atom::is_bare_variable) {
                commutative_matcher(&pattern, &subject, pattern_atom, subject_atom, bindings, timeout)
            } else {
                ac_matcher(props, regroup, &pattern, &subject, pattern_atom, subject_atom, bindings, timeout)
            }
        }
    }
}

/// Neither A nor C (§4.3): equal length required, matched left to right; any element failure
/// fails the whole match.
fn sequence_matcher(
    pattern: &[Atom],
    subject: &[Atom],
    pattern_atom: &Atom,
    subject_atom: &Atom,
    bindings: Bindings,
    timeout: &TimeoutFlag,
) -> MatchOutcome {
    if pattern.len() != subject.len() {
        return MatchOutcome::fail("sequence length mismatch", pattern_atom, subject_atom);
    }
    let mut outcome = MatchOutcome::Single(bindings);
    for (p, s) in pattern.iter().zip(subject.iter()) {
        if outcome.is_fail() {
            return outcome;
        }
        let p = p.clone();
        let s = s.clone();
        let inner_timeout = timeout.clone();
        outcome = crate::matching::outcome::compose(outcome, timeout.clone(), move |b| {
            match_atoms(&p, &s, b, &inner_timeout)
        });
    }
    outcome
}

/// C only, equal length (§4.3): enumerate permutations of the subject and run the sequence
/// matcher against each, collecting every permutation that succeeds. Permutations are enumerated
/// in a stable, deterministic order (§5 "Ordering guarantees").
fn commutative_matcher(
    pattern: &[Atom],
    subject: &[Atom],
    pattern_atom: &Atom,
    subject_atom: &Atom,
    bindings: Bindings,
    timeout: &TimeoutFlag,
) -> MatchOutcome {
    let n = pattern.len();
    if n == 0 {
        return MatchOutcome::Single(bindings);
    }
    if n > 32 {
        return MatchOutcome::fail("commutative arity exceeds supported permutation width", pattern_atom, subject_atom);
    }
    let mut results = Vec::new();
    for perm in PermutationGenerator32::new(n as u8) {
        if timeout.is_set() {
            break;
        }
        let order: Vec<usize> = perm.collect();
        let permuted: Vec<Atom> = order.iter().map(|&i| subject[i].clone()).collect();
        let outcome = sequence_matcher(pattern, &permuted, pattern_atom, subject_atom, bindings.clone(), timeout);
        results.extend(outcome.into_iter());
    }
    MatchOutcome::many(results, pattern_atom, subject_atom)
}

/// A only, unequal length (§4.3, testable property 6): non-bindable (non-`Variable`) pattern
/// elements must align with subject elements in a left-to-right, order-preserving pass; bindable
/// (`Variable`) pattern elements receive contiguous, non-empty slices of whatever subject
/// elements remain around them. When a pattern is entirely bindable variables this degenerates
/// exactly to "every way to cut the subject into `pattern.len()` contiguous groups".
fn associative_matcher(
    props: &AlgProp,
    regroup: &Regroup,
    pattern: &[Atom],
    subject: &[Atom],
    pattern_atom: &Atom,
    subject_atom: &Atom,
    bindings: Bindings,
    timeout: &TimeoutFlag,
) -> MatchOutcome {
    if pattern.iter().all(Atom::is_bare_variable) {
        let n = subject.len();
        let k = pattern.len();
        let mut results = Vec::new();
        for boundaries in boundary_combinations(n, k) {
            if timeout.is_set() {
                break;
            }
            let ranges = groups_from_boundaries(n, &boundaries);
            let mut b = bindings.clone();
            let mut ok = true;
            for (var, (start, end)) in pattern.iter().zip(ranges.iter()) {
                let slice_atom = regroup.build(props, subject[*start..*end].to_vec());
                match match_atoms(var, &slice_atom, b, timeout).first() {
                    Some(next) => b = next,
                    None => {
                        ok = false;
                        break;
                    }
                }
            }
            if ok {
                results.push(b);
            }
        }
        return MatchOutcome::many(results, pattern_atom, subject_atom);
    }

    let mut results = Vec::new();
    associative_rec(props, regroup, pattern, subject, 0, 0, bindings, timeout, &mut results);
    MatchOutcome::many(results, pattern_atom, subject_atom)
}

#[allow(clippy::too_many_arguments)]
fn associative_rec(
    props: &AlgProp,
    regroup: &Regroup,
    pattern: &[Atom],
    subject: &[Atom],
    pattern_idx: usize,
    subject_start: usize,
    bindings: Bindings,
    timeout: &TimeoutFlag,
    out: &mut Vec<Bindings>,
) {
    if timeout.is_set() {
        return;
    }
    if pattern_idx == pattern.len() {
        if subject_start == subject.len() {
            out.push(bindings);
        }
        return;
    }
    let elem = &pattern[pattern_idx];
    let minimal_rest = pattern.len() - pattern_idx - 1;
    if elem.is_bare_variable() {
        let available = subject.len().saturating_sub(subject_start);
        let max_k = available.saturating_sub(minimal_rest);
        for k in 1..=max_k {
            let end = subject_start + k;
            let slice_atom = regroup.build(props, subject[subject_start..end].to_vec());
            if let Some(next_bindings) = match_atoms(elem, &slice_atom, bindings.clone(), timeout).first() {
                associative_rec(props, regroup, pattern, subject, pattern_idx + 1, end, next_bindings, timeout, out);
            }
        }
    } else {
        if subject_start >= subject.len() {
            return;
        }
        let outcome = match_atoms(elem, &subject[subject_start], bindings, timeout);
        for next_bindings in outcome.into_iter() {
            associative_rec(props, regroup, pattern, subject, pattern_idx + 1, subject_start + 1, next_bindings, timeout, out);
        }
    }
}

/// A and C (§4.3): the union of the above with order freed entirely — non-bindable patterns
/// consume an arbitrary remaining subject index, bindable patterns receive an arbitrary
/// (non-empty) subset of what remains. Subsets are tried in ascending-bitmask order.
#[allow(clippy::too_many_arguments)]
fn ac_matcher(
    props: &AlgProp,
    regroup: &Regroup,
    pattern: &[Atom],
    subject: &[Atom],
    pattern_atom: &Atom,
    subject_atom: &Atom,
    bindings: Bindings,
    timeout: &TimeoutFlag,
) -> MatchOutcome {
    let remaining: Vec<usize> = (0..subject.len()).collect();
    let mut results = Vec::new();
    ac_rec(props, regroup, pattern, subject, 0, &remaining, bindings, timeout, &mut results);
    MatchOutcome::many(results, pattern_atom, subject_atom)
}

#[allow(clippy::too_many_arguments)]
fn ac_rec(
    props: &AlgProp,
    regroup: &Regroup,
    pattern: &[Atom],
    subject: &[Atom],
    pattern_idx: usize,
    remaining: &[usize],
    bindings: Bindings,
    timeout: &TimeoutFlag,
    out: &mut Vec<Bindings>,
) {
    if timeout.is_set() {
        return;
    }
    if pattern_idx == pattern.len() {
        if remaining.is_empty() {
            out.push(bindings);
        }
        return;
    }
    let elem = &pattern[pattern_idx];
    if elem.is_bare_variable() {
        for mask in 1u32..(1u32 << remaining.len()) {
            if timeout.is_set() {
                return;
            }
            let mut chosen = Vec::new();
            let mut rest = Vec::new();
            for (bit, &idx) in remaining.iter().enumerate() {
                if mask & (1 << bit) != 0 {
                    chosen.push(idx);
                } else {
                    rest.push(idx);
                }
            }
            let slice_elems: Vec<Atom> = chosen.iter().map(|&i| subject[i].clone()).collect();
            let slice_atom = regroup.build(props, slice_elems);
            if let Some(next_bindings) = match_atoms(elem, &slice_atom, bindings.clone(), timeout).first() {
                ac_rec(props, regroup, pattern, subject, pattern_idx + 1, &rest, next_bindings, timeout, out);
            }
        }
    } else {
        for (pos, &idx) in remaining.iter().enumerate() {
            if timeout.is_set() {
                return;
            }
            let outcome = match_atoms(elem, &subject[idx], bindings.clone(), timeout);
            if outcome.is_fail() {
                continue;
            }
            let mut rest = remaining.to_vec();
            rest.remove(pos);
            for next_bindings in outcome.into_iter() {
                ac_rec(props, regroup, pattern, subject, pattern_idx + 1, &rest, next_bindings, timeout, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;
    use crate::root_type::RootType;

    fn sym(n: &str) -> Atom {
        Atom::Literal(Literal::symbol(n))
    }

    fn var(n: &str) -> Atom {
        Atom::variable(n, Atom::RootType(RootType::Any))
    }

    fn ac_props() -> AlgProp {
        let mut p = AlgProp::none();
        p.associative = Some(crate::alg_prop::PropertyValue::Bool(true));
        p.commutative = Some(crate::alg_prop::PropertyValue::Bool(true));
        p
    }

    fn a_props() -> AlgProp {
        let mut p = AlgProp::none();
        p.associative = Some(crate::alg_prop::PropertyValue::Bool(true));
        p
    }

    #[test]
    fn associative_two_way_split_yields_three_bindings_in_order() {
        let props = a_props();
        let op = Atom::OperatorRef("f".into());
        let regroup = Regroup::UnderOperator(op.clone());
        let pattern_atom = Atom::apply(op.clone(), Atom::atom_seq(props.clone(), vec![var("x"), var("y")]));
        let subject_elems = vec![sym("a"), sym("b"), sym("c"), sym("d")];
        let subject_atom = Atom::apply(op, Atom::atom_seq(props.clone(), subject_elems.clone()));
        let outcome = associative_matcher(
            &props,
            &regroup,
            &[var("x"), var("y")],
            &subject_elems,
            &pattern_atom,
            &subject_atom,
            Bindings::new(),
            &TimeoutFlag::new(),
        );
        let results: Vec<_> = outcome.into_iter().collect();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].get(&"x".into()), Some(&sym("a")));
    }

    #[test]
    fn commutative_matcher_finds_the_unique_permutation() {
        let pattern = vec![sym("a"), var("x")];
        let subject = vec![sym("b"), sym("a")];
        let pattern_atom = Atom::Literal(Literal::symbol("f"));
        let outcome = commutative_matcher(&pattern, &subject, &pattern_atom, &pattern_atom, Bindings::new(), &TimeoutFlag::new());
        let results: Vec<_> = outcome.into_iter().collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].get(&"x".into()), Some(&sym("b")));
    }

    #[test]
    fn ac_matcher_groups_residual_elements_under_one_variable() {
        let props = ac_props();
        let op = Atom::OperatorRef("plus".into());
        let regroup = Regroup::UnderOperator(op.clone());
        let pattern = vec![sym("a"), var("rest")];
        let subject_elems = vec![sym("b"), sym("a"), sym("c")];
        let pattern_atom = Atom::apply(op.clone(), Atom::atom_seq(props.clone(), pattern.clone()));
        let subject_atom = Atom::apply(op, Atom::atom_seq(props.clone(), subject_elems.clone()));
        let outcome = ac_matcher(
            &props,
            &regroup,
            &pattern,
            &subject_elems,
            &pattern_atom,
            &subject_atom,
            Bindings::new(),
            &TimeoutFlag::new(),
        );
        assert!(outcome.into_iter().next().is_some());
    }

    fn props_for(associative: bool, commutative: bool) -> AlgProp {
        let mut p = AlgProp::none();
        if associative {
            p.associative = Some(crate::alg_prop::PropertyValue::Bool(true));
        }
        if commutative {
            p.commutative = Some(crate::alg_prop::PropertyValue::Bool(true));
        }
        p
    }

    use test_case::test_case;

    /// Names starting with `$` build a bindable pattern variable instead of a symbol constant.
    fn pattern_elem(name: &str) -> Atom {
        match name.strip_prefix('$') {
            Some(var_name) => var(var_name),
            None => sym(name),
        }
    }

    #[test_case(false, false, vec!["a", "b"], vec!["a", "b"], true ; "plain sequence matches in order")]
    #[test_case(false, false, vec!["a", "b"], vec!["b", "a"], false ; "plain sequence rejects reordering")]
    #[test_case(false, true, vec!["a", "b"], vec!["b", "a"], true ; "commutative matcher tolerates reordering")]
    #[test_case(true, false, vec!["a", "$rest"], vec!["a", "b", "c"], true ; "associative matcher regroups unequal lengths")]
    #[test_case(true, true, vec!["a", "$rest"], vec!["c", "b", "a"], true ; "ac matcher regroups and reorders")]
    fn match_sequences_dispatches_on_properties(
        associative: bool,
        commutative: bool,
        pattern_names: Vec<&str>,
        subject_names: Vec<&str>,
        should_match: bool,
    ) {
        let props = props_for(associative, commutative);
        let op = Atom::OperatorRef("f".into());
        let regroup = Regroup::UnderOperator(op.clone());
        let pattern: Vec<Atom> = pattern_names.iter().map(|n| pattern_elem(n)).collect();
        let subject: Vec<Atom> = subject_names.iter().map(|n| sym(n)).collect();
        let pattern_atom = Atom::apply(op.clone(), Atom::atom_seq(props.clone(), pattern.clone()));
        let subject_atom = Atom::apply(op, Atom::atom_seq(props.clone(), subject.clone()));

        let outcome = match_sequences(
            &props,
            &regroup,
            &pattern_atom,
            &pattern,
            &subject_atom,
            &subject,
            Bindings::new(),
            &TimeoutFlag::new(),
        );
        assert_eq!(!outcome.is_fail() && outcome.into_iter().next().is_some(), should_match);
    }
}
