//! The `Lambda` atom (§3.1): a bound variable plus a body, introducing a De Bruijn scope.

use std::sync::Arc;

use crate::abstractions::IString;
use crate::atom::{Atom, AtomKind, AtomMeta, hash_pair, max_depth};
use crate::bitset::CleanRulesets;

pub struct LambdaData {
    pub bound_var: Atom,
    pub body: Atom,
    pub(crate) meta: AtomMeta,
}

impl PartialEq for LambdaData {
    fn eq(&self, other: &Self) -> bool {
        self.bound_var == other.bound_var && self.body == other.body
    }
}

pub(crate) fn bound_name(data: &LambdaData) -> IString {
    match &data.bound_var {
        Atom::Variable(v) => v.name,
        _ => unreachable!("Lambda::bound_var is always constructed from an Atom::Variable"),
    }
}

pub fn make_lambda(bound_var: Atom, body: Atom) -> Atom {
    assert!(
        matches!(bound_var.kind(), AtomKind::Variable),
        "Lambda's bound_var must be a Variable atom"
    );
    let name = match &bound_var {
        Atom::Variable(v) => v.name,
        _ => unreachable!(),
    };
    let mut free_vars = (*bound_var.free_vars()).clone();
    free_vars.extend(body.free_vars().iter().cloned());
    free_vars.remove(&name);

    let depth = max_depth([&bound_var, &body]);
    let debruijn_index = 1 + body.debruijn_index();
    let (hash, hash2) = hash_pair(&(&bound_var, &body));
    let meta = AtomMeta {
        depth,
        debruijn_index,
        is_term: true,
        free_vars: Arc::new(free_vars),
        hash,
        hash2,
        clean_rulesets: CleanRulesets::new(),
    };
    Atom::Lambda(Arc::new(LambdaData { bound_var, body, meta }))
}

impl Atom {
    pub fn lambda(bound_var: Atom, body: Atom) -> Atom {
        make_lambda(bound_var, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::root_type::RootType;

    #[test]
    fn lambda_binds_its_own_variable() {
        let x = Atom::variable("x", Atom::RootType(RootType::Any));
        let lam = Atom::lambda(x.clone(), x);
        assert!(lam.is_constant());
    }

    #[test]
    fn lambda_leaves_other_free_variables_free() {
        let x = Atom::variable("x", Atom::RootType(RootType::Any));
        let y = Atom::variable("y", Atom::RootType(RootType::Any));
        let lam = Atom::lambda(x, y);
        assert!(!lam.is_constant());
    }
}
