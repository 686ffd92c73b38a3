//! `Bindings` (§3.4): a finite map from variable name to atom, with failure-on-conflict merge.

use std::collections::BTreeMap;
use std::fmt;

use crate::abstractions::IString;
use crate::atom::Atom;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: BTreeMap<IString, Atom>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &IString) -> Option<&Atom> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IString, &Atom)> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Extends this binding set with `name -> value`. Fails only if `name` is already bound to a
    /// structurally different atom; re-binding to the same atom is a no-op success.
    pub fn bind(&mut self, name: IString, value: Atom) -> bool {
        match self.entries.get(&name) {
            Some(existing) if *existing != value => false,
            Some(_) => true,
            None => {
                self.entries.insert(name, value);
                true
            }
        }
    }

    pub fn with_binding(mut self, name: IString, value: Atom) -> Option<Self> {
        if self.bind(name, value) { Some(self) } else { None }
    }

    /// Drops any binding for `name`. Used when descending into a `Lambda` body, which shadows
    /// whatever the enclosing bindings say about its own bound variable's name.
    pub fn without(mut self, name: &IString) -> Self {
        self.entries.remove(name);
        self
    }

    /// Unions two binding sets. Fails (returns `None`) if any shared name maps to structurally
    /// different atoms in the two maps.
    pub fn merge(&self, other: &Bindings) -> Option<Bindings> {
        let mut result = self.clone();
        for (name, value) in other.entries.iter() {
            if !result.bind(name.clone(), value.clone()) {
                return None;
            }
        }
        Some(result)
    }
}

impl fmt::Display for Bindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name} -> {value}")?;
        }
        write!(f, "}}")
    }
}

impl FromIterator<(IString, Atom)> for Bindings {
    fn from_iter<T: IntoIterator<Item = (IString, Atom)>>(iter: T) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn merge_succeeds_on_disjoint_names() {
        let mut a = Bindings::new();
        a.bind(IString::from("x"), Atom::Literal(Literal::integer(1)));
        let mut b = Bindings::new();
        b.bind(IString::from("y"), Atom::Literal(Literal::integer(2)));
        let merged = a.merge(&b).unwrap();
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn merge_fails_on_conflicting_names() {
        let mut a = Bindings::new();
        a.bind(IString::from("x"), Atom::Literal(Literal::integer(1)));
        let mut b = Bindings::new();
        b.bind(IString::from("x"), Atom::Literal(Literal::integer(2)));
        assert!(a.merge(&b).is_none());
    }

    #[test]
    fn rebinding_same_value_is_consistent() {
        let mut a = Bindings::new();
        a.bind(IString::from("x"), Atom::Literal(Literal::integer(1)));
        assert!(a.bind(IString::from("x"), Atom::Literal(Literal::integer(1))));
    }
}
