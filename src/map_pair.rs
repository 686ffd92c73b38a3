//! The `MapPair` atom (§3.1): an ordered `(pattern, rewrite)` pair usable as a minimal one-shot
//! rule without going through the full `RewriteRule`/ruleset machinery.

use std::sync::Arc;

use crate::atom::{Atom, AtomMeta, hash_pair, max_depth, max_debruijn, union_free_vars};
use crate::bitset::CleanRulesets;

pub struct MapPairData {
    pub pattern: Atom,
    pub rewrite: Atom,
    pub(crate) meta: AtomMeta,
}

impl PartialEq for MapPairData {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.rewrite == other.rewrite
    }
}

pub fn make_map_pair(pattern: Atom, rewrite: Atom) -> Atom {
    let depth = max_depth([&pattern, &rewrite]);
    let free_vars = union_free_vars([&pattern, &rewrite]);
    let debruijn_index = max_debruijn([&pattern, &rewrite]);
    let (hash, hash2) = hash_pair(&(&pattern, &rewrite));
    let meta = AtomMeta {
        depth,
        debruijn_index,
        is_term: true,
        free_vars,
        hash,
        hash2,
        clean_rulesets: CleanRulesets::new(),
    };
    Atom::MapPair(Arc::new(MapPairData { pattern, rewrite, meta }))
}

impl Atom {
    pub fn map_pair(pattern: Atom, rewrite: Atom) -> Atom {
        make_map_pair(pattern, rewrite)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn map_pair_preserves_both_sides() {
        let mp = Atom::map_pair(Atom::Literal(Literal::integer(1)), Atom::Literal(Literal::integer(2)));
        if let Atom::MapPair(data) = &mp {
            assert_eq!(data.pattern, Atom::Literal(Literal::integer(1)));
            assert_eq!(data.rewrite, Atom::Literal(Literal::integer(2)));
        } else {
            panic!("expected MapPair");
        }
    }
}
