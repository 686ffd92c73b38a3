//! The `Variable` atom (§3.1): a named placeholder with a declared type, an optional guard, and
//! the metavariable/ordinary distinction used by rule completion (§4.6.1) and the matcher (§4.3).

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::abstractions::IString;
use crate::atom::{Atom, AtomMeta, hash_pair, max_depth};
use crate::bitset::CleanRulesets;

/// Ordinary variables (`$x`) are bound by ordinary pattern matching; metavariables (`$$x`) stand
/// for a piece of the rule/ruleset machinery itself (used by rule completion's synthesized `$L`/
/// `$R` sequence variables, §4.6.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VariablePrefix {
    Ordinary,
    Meta,
}

pub struct VariableData {
    pub name: IString,
    pub var_type: Atom,
    pub guard: Option<Atom>,
    pub labels: Vec<IString>,
    pub by_name: bool,
    pub prefix: VariablePrefix,
    pub(crate) meta: AtomMeta,
}

impl PartialEq for VariableData {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.var_type == other.var_type
            && self.guard == other.guard
            && self.labels == other.labels
            && self.by_name == other.by_name
            && self.prefix == other.prefix
    }
}

pub fn make_variable(
    name: IString,
    var_type: Atom,
    guard: Option<Atom>,
    labels: Vec<IString>,
    by_name: bool,
    prefix: VariablePrefix,
) -> Atom {
    let mut free = BTreeSet::new();
    free.insert(name);
    let mut children = vec![&var_type];
    if let Some(g) = &guard {
        children.push(g);
    }
    let free_vars = {
        let mut set = free;
        for child in &children {
            set.extend(child.free_vars().iter().cloned());
        }
        Arc::new(set)
    };
    let depth = max_depth(children.iter().copied());
    let hash_key = (name, &var_type, &guard, &labels, by_name, prefix);
    let (hash, hash2) = hash_pair(&hash_key);
    let meta = AtomMeta {
        depth,
        debruijn_index: 0,
        is_term: true,
        free_vars,
        hash,
        hash2,
        clean_rulesets: CleanRulesets::new(),
    };
    Atom::Variable(Arc::new(VariableData {
        name,
        var_type,
        guard,
        labels,
        by_name,
        prefix,
        meta,
    }))
}

impl Atom {
    pub fn variable(name: impl Into<IString>, var_type: Atom) -> Atom {
        make_variable(name.into(), var_type, None, Vec::new(), true, VariablePrefix::Ordinary)
    }

    pub fn meta_variable(name: impl Into<IString>, var_type: Atom) -> Atom {
        make_variable(name.into(), var_type, None, Vec::new(), true, VariablePrefix::Meta)
    }

    pub fn variable_with_guard(name: impl Into<IString>, var_type: Atom, guard: Atom) -> Atom {
        make_variable(name.into(), var_type, Some(guard), Vec::new(), true, VariablePrefix::Ordinary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root_type::RootType;

    #[test]
    fn variable_is_not_constant() {
        let v = Atom::variable("x", Atom::RootType(RootType::Any));
        assert!(!v.is_constant());
        assert!(v.free_vars().contains(&IString::from("x")));
    }

    #[test]
    fn equal_variables_are_equal() {
        let a = Atom::variable("x", Atom::RootType(RootType::Any));
        let b = Atom::variable("x", Atom::RootType(RootType::Any));
        assert_eq!(a, b);
    }
}
