//! The `SpecialForm` atom (§3.1): a generic `{tag, content}` atom reserved for extensibility
//! (dialect providers can layer syntax-specific forms on top of the core without a new variant).

use std::sync::Arc;

use crate::atom::{Atom, AtomMeta, hash_pair, max_depth, max_debruijn, union_free_vars};
use crate::bitset::CleanRulesets;

pub struct SpecialFormData {
    pub tag: Atom,
    pub content: Atom,
    pub(crate) meta: AtomMeta,
}

impl PartialEq for SpecialFormData {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && self.content == other.content
    }
}

pub fn make_special_form(tag: Atom, content: Atom) -> Atom {
    let depth = max_depth([&tag, &content]);
    let free_vars = union_free_vars([&tag, &content]);
    let debruijn_index = max_debruijn([&tag, &content]);
    let (hash, hash2) = hash_pair(&(&tag, &content));
    let meta = AtomMeta {
        depth,
        debruijn_index,
        is_term: false,
        free_vars,
        hash,
        hash2,
        clean_rulesets: CleanRulesets::new(),
    };
    Atom::SpecialForm(Arc::new(SpecialFormData { tag, content, meta }))
}

impl Atom {
    pub fn special_form(tag: Atom, content: Atom) -> Atom {
        make_special_form(tag, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn special_form_round_trips_tag_and_content() {
        let sf = Atom::special_form(Atom::Literal(Literal::symbol("note")), Atom::Literal(Literal::integer(1)));
        if let Atom::SpecialForm(data) = &sf {
            assert_eq!(data.content, Atom::Literal(Literal::integer(1)));
        } else {
            panic!("expected SpecialForm");
        }
    }
}
