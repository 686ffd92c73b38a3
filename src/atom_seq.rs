//! The `AtomSeq` atom (§3.1): an algebraic-properties object plus an ordered sequence of atoms,
//! with a precomputed constant map used by the matcher's constant-elimination pre-pass (§4.3).

use std::collections::HashMap;
use std::sync::Arc;

use crate::alg_prop::AlgProp;
use crate::atom::{Atom, AtomMeta, hash_pair, max_depth, union_free_vars};
use crate::bitset::CleanRulesets;

pub struct AtomSeqData {
    pub properties: AlgProp,
    pub elements: Vec<Atom>,
    /// Maps each constant element to its (first-occurring) index; invariant (e): contains exactly
    /// the indices of `elements` that are constant.
    pub constant_map: HashMap<Atom, usize>,
    pub(crate) meta: AtomMeta,
}

impl PartialEq for AtomSeqData {
    fn eq(&self, other: &Self) -> bool {
        self.properties == other.properties && self.elements == other.elements
    }
}

fn build_constant_map(elements: &[Atom]) -> HashMap<Atom, usize> {
    let mut map = HashMap::new();
    for (index, element) in elements.iter().enumerate() {
        if element.is_constant() {
            map.entry(element.clone()).or_insert(index);
        }
    }
    map
}

pub fn make_atom_seq(properties: AlgProp, elements: Vec<Atom>) -> Atom {
    let constant_map = build_constant_map(&elements);
    let depth = max_depth(elements.iter());
    let free_vars = union_free_vars(elements.iter());
    let (hash, hash2) = hash_pair(&(&properties, &elements));
    let meta = AtomMeta {
        depth,
        debruijn_index: crate::atom::max_debruijn(elements.iter()),
        is_term: true,
        free_vars,
        hash,
        hash2,
        clean_rulesets: CleanRulesets::new(),
    };
    Atom::AtomSeq(Arc::new(AtomSeqData {
        properties,
        elements,
        constant_map,
        meta,
    }))
}

impl Atom {
    pub fn atom_seq(properties: AlgProp, elements: Vec<Atom>) -> Atom {
        make_atom_seq(properties, elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn constant_map_indexes_constant_elements_only() {
        let x = Atom::variable("x", Atom::RootType(crate::root_type::RootType::Any));
        let seq = Atom::atom_seq(
            AlgProp::none(),
            vec![Atom::Literal(Literal::integer(1)), x, Atom::Literal(Literal::integer(2))],
        );
        if let Atom::AtomSeq(data) = &seq {
            assert_eq!(data.constant_map.len(), 2);
            assert_eq!(data.constant_map.get(&Atom::Literal(Literal::integer(1))), Some(&0));
        } else {
            panic!("expected AtomSeq");
        }
    }
}
