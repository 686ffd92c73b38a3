//! The `Apply` atom (§3.1): `lhs.rhs`, where `lhs` is commonly an `OperatorRef` and `rhs` an
//! `AtomSeq` of arguments.

use std::sync::Arc;

use crate::atom::{Atom, AtomMeta, hash_pair, max_depth, max_debruijn, union_free_vars};
use crate::bitset::CleanRulesets;

pub struct ApplyData {
    pub lhs: Atom,
    pub rhs: Atom,
    pub(crate) meta: AtomMeta,
}

impl PartialEq for ApplyData {
    fn eq(&self, other: &Self) -> bool {
        self.lhs == other.lhs && self.rhs == other.rhs
    }
}

pub fn make_apply(lhs: Atom, rhs: Atom) -> Atom {
    let depth = max_depth([&lhs, &rhs]);
    let free_vars = union_free_vars([&lhs, &rhs]);
    let debruijn_index = max_debruijn([&lhs, &rhs]);
    let (hash, hash2) = hash_pair(&(&lhs, &rhs));
    let meta = AtomMeta {
        depth,
        debruijn_index,
        is_term: true,
        free_vars,
        hash,
        hash2,
        clean_rulesets: CleanRulesets::new(),
    };
    Atom::Apply(Arc::new(ApplyData { lhs, rhs, meta }))
}

impl Atom {
    pub fn apply(lhs: Atom, rhs: Atom) -> Atom {
        make_apply(lhs, rhs)
    }

    /// Convenience constructor for `operator(args...)` with no declared algebraic properties on
    /// the argument sequence. Callers that need AC/associative dispatch (§4.3) should build the
    /// `AtomSeq` themselves with the operator's actual `AlgProp` (see `Context::get_operator`).
    pub fn apply_op(operator: impl Into<crate::abstractions::IString>, args: Vec<Atom>) -> Atom {
        make_apply(
            Atom::OperatorRef(operator.into()),
            crate::atom_seq::make_atom_seq(crate::alg_prop::AlgProp::none(), args),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn apply_depth_is_one_plus_max_child_depth() {
        let a = Atom::Literal(Literal::integer(1));
        let lhs = Atom::OperatorRef("f".into());
        let rhs = Atom::atom_seq(crate::alg_prop::AlgProp::none(), vec![a]);
        let applied = Atom::apply(lhs, rhs);
        assert_eq!(applied.depth(), 2);
    }
}
