//! The atom algebra (C1, §3.1, §4.1): an immutable, structurally-shared term representation.
//!
//! Every compound variant wraps an `Arc<XxxData>` holding both the variant's semantic fields and
//! an `AtomMeta` of precomputed, structure-derived bookkeeping (depth, De Bruijn index, free
//! variables, dual hashes, the clean-rulesets bitset). Structural equality and hashing only ever
//! look at the semantic fields; `AtomMeta` is a cache, not part of an atom's identity. This mirrors
//! the hash-prefixing and `Arc`-backed sharing of the ancestor project's own `Atom`/`Expr` types,
//! generalized from a four-variant value algebra to the full tagged union of §3.1.

use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::abstractions::IString;
use crate::alg_prop::AlgProp;
use crate::apply::ApplyData;
use crate::atom_seq::AtomSeqData;
use crate::bindings::Bindings;
use crate::bitset::{CleanRulesets, RulesetBitSet};
use crate::lambda::LambdaData;
use crate::literal::Literal;
use crate::map_pair::MapPairData;
use crate::root_type::RootType;
use crate::special_form::SpecialFormData;
use crate::variable::VariableData;

#[derive(Clone)]
pub enum Atom {
    Literal(Literal),
    Variable(Arc<VariableData>),
    Lambda(Arc<LambdaData>),
    AtomSeq(Arc<AtomSeqData>),
    Apply(Arc<ApplyData>),
    MapPair(Arc<MapPairData>),
    OperatorRef(IString),
    RulesetRef(IString),
    AlgProp(Arc<AlgPropData>),
    SpecialForm(Arc<SpecialFormData>),
    RootType(RootType),
}

/// `AlgProp` used as a first-class atom (§3.1): the plain `AlgProp` record plus the metadata every
/// atom carries.
pub struct AlgPropData {
    pub prop: AlgProp,
    pub(crate) meta: AtomMeta,
}

/// Structure-derived bookkeeping cached on every compound atom. Never participates in equality;
/// `Atom::hash_primary`/`hash_secondary` expose it deliberately as cache keys, distinct from the
/// `std::hash::Hash` impl used by `HashMap`/`HashSet`.
pub(crate) struct AtomMeta {
    pub depth: u32,
    pub debruijn_index: u32,
    pub is_term: bool,
    pub free_vars: Arc<BTreeSet<IString>>,
    pub hash: u64,
    pub hash2: u64,
    pub clean_rulesets: CleanRulesets,
}

impl Clone for AtomMeta {
    fn clone(&self) -> Self {
        Self {
            depth: self.depth,
            debruijn_index: self.debruijn_index,
            is_term: self.is_term,
            free_vars: self.free_vars.clone(),
            hash: self.hash,
            hash2: self.hash2,
            clean_rulesets: self.clean_rulesets.clone(),
        }
    }
}

/// The discriminator `RuleLibrary::kind_to_rules` (§3.5) dispatches on when a pattern's root is
/// not an `Apply` over a named operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AtomKind {
    Literal,
    Variable,
    Lambda,
    AtomSeq,
    Apply,
    MapPair,
    OperatorRef,
    RulesetRef,
    AlgProp,
    SpecialForm,
    RootType,
}

static EMPTY_FREE_VARS: Lazy<BTreeSet<IString>> = Lazy::new(BTreeSet::new);

pub(crate) fn union_free_vars<'a>(children: impl IntoIterator<Item = &'a Atom>) -> Arc<BTreeSet<IString>> {
    let mut set = BTreeSet::new();
    for child in children {
        set.extend(child.free_vars().iter().cloned());
    }
    Arc::new(set)
}

pub(crate) fn max_depth<'a>(children: impl IntoIterator<Item = &'a Atom>) -> u32 {
    children.into_iter().map(Atom::depth).max().map_or(0, |d| d + 1)
}

pub(crate) fn max_debruijn<'a>(children: impl IntoIterator<Item = &'a Atom>) -> u32 {
    children.into_iter().map(Atom::debruijn_index).max().unwrap_or(0)
}

/// Two independent hashes of a semantic (meta-excluding) value: a primary hash and a secondary
/// hash derived by re-hashing the primary with a fixed salt. The secondary hash is what the memo
/// cache (§4.5) keys on.
pub(crate) fn hash_pair(value: &impl Hash) -> (u64, u64) {
    use std::collections::hash_map::DefaultHasher;
    let mut h1 = DefaultHasher::new();
    value.hash(&mut h1);
    let primary = h1.finish();
    let mut h2 = DefaultHasher::new();
    primary.hash(&mut h2);
    0x9E3779B97F4A7C15u64.hash(&mut h2);
    (primary, h2.finish())
}

impl Atom {
    pub fn depth(&self) -> u32 {
        match self {
            Atom::Literal(_) | Atom::OperatorRef(_) | Atom::RulesetRef(_) | Atom::RootType(_) => 0,
            Atom::Variable(d) => d.meta.depth,
            Atom::Lambda(d) => d.meta.depth,
            Atom::AtomSeq(d) => d.meta.depth,
            Atom::Apply(d) => d.meta.depth,
            Atom::MapPair(d) => d.meta.depth,
            Atom::AlgProp(d) => d.meta.depth,
            Atom::SpecialForm(d) => d.meta.depth,
        }
    }

    pub fn debruijn_index(&self) -> u32 {
        match self {
            Atom::Literal(_) | Atom::OperatorRef(_) | Atom::RulesetRef(_) | Atom::RootType(_) => 0,
            Atom::Variable(d) => d.meta.debruijn_index,
            Atom::Lambda(d) => d.meta.debruijn_index,
            Atom::AtomSeq(d) => d.meta.debruijn_index,
            Atom::Apply(d) => d.meta.debruijn_index,
            Atom::MapPair(d) => d.meta.debruijn_index,
            Atom::AlgProp(d) => d.meta.debruijn_index,
            Atom::SpecialForm(d) => d.meta.debruijn_index,
        }
    }

    pub fn is_term(&self) -> bool {
        match self {
            Atom::Literal(_) => true,
            Atom::OperatorRef(_) | Atom::RulesetRef(_) | Atom::RootType(_) => false,
            Atom::Variable(d) => d.meta.is_term,
            Atom::Lambda(d) => d.meta.is_term,
            Atom::AtomSeq(d) => d.meta.is_term,
            Atom::Apply(d) => d.meta.is_term,
            Atom::MapPair(d) => d.meta.is_term,
            Atom::AlgProp(d) => d.meta.is_term,
            Atom::SpecialForm(d) => d.meta.is_term,
        }
    }

    pub fn free_vars(&self) -> &BTreeSet<IString> {
        match self {
            Atom::Literal(_) | Atom::OperatorRef(_) | Atom::RulesetRef(_) | Atom::RootType(_) => &EMPTY_FREE_VARS,
            Atom::Variable(d) => &d.meta.free_vars,
            Atom::Lambda(d) => &d.meta.free_vars,
            Atom::AtomSeq(d) => &d.meta.free_vars,
            Atom::Apply(d) => &d.meta.free_vars,
            Atom::MapPair(d) => &d.meta.free_vars,
            Atom::AlgProp(d) => &d.meta.free_vars,
            Atom::SpecialForm(d) => &d.meta.free_vars,
        }
    }

    /// `is_constant(a)` iff `a` contains no free variable (§3.1 invariant (b)).
    pub fn is_constant(&self) -> bool {
        self.free_vars().is_empty()
    }

    /// Primary structural hash (§3.1): a pure function of the atom's structure.
    pub fn hash_primary(&self) -> u64 {
        match self {
            Atom::Literal(l) => hash_pair(l).0,
            Atom::OperatorRef(n) | Atom::RulesetRef(n) => hash_pair(n).0,
            Atom::RootType(r) => hash_pair(r).0,
            Atom::Variable(d) => d.meta.hash,
            Atom::Lambda(d) => d.meta.hash,
            Atom::AtomSeq(d) => d.meta.hash,
            Atom::Apply(d) => d.meta.hash,
            Atom::MapPair(d) => d.meta.hash,
            Atom::AlgProp(d) => d.meta.hash,
            Atom::SpecialForm(d) => d.meta.hash,
        }
    }

    /// Secondary structural hash, used as the memo cache key (§4.5).
    pub fn hash_secondary(&self) -> u64 {
        match self {
            Atom::Literal(l) => hash_pair(l).1,
            Atom::OperatorRef(n) | Atom::RulesetRef(n) => hash_pair(n).1,
            Atom::RootType(r) => hash_pair(r).1,
            Atom::Variable(d) => d.meta.hash2,
            Atom::Lambda(d) => d.meta.hash2,
            Atom::AtomSeq(d) => d.meta.hash2,
            Atom::Apply(d) => d.meta.hash2,
            Atom::MapPair(d) => d.meta.hash2,
            Atom::AlgProp(d) => d.meta.hash2,
            Atom::SpecialForm(d) => d.meta.hash2,
        }
    }

    pub fn clean_rulesets(&self) -> RulesetBitSet {
        match self {
            Atom::Literal(_) | Atom::OperatorRef(_) | Atom::RulesetRef(_) | Atom::RootType(_) => RulesetBitSet::EMPTY,
            Atom::Variable(d) => d.meta.clean_rulesets.get(),
            Atom::Lambda(d) => d.meta.clean_rulesets.get(),
            Atom::AtomSeq(d) => d.meta.clean_rulesets.get(),
            Atom::Apply(d) => d.meta.clean_rulesets.get(),
            Atom::MapPair(d) => d.meta.clean_rulesets.get(),
            Atom::AlgProp(d) => d.meta.clean_rulesets.get(),
            Atom::SpecialForm(d) => d.meta.clean_rulesets.get(),
        }
    }

    /// Marks `self` as already normalized under `rulesets` (§4.7 step 6). A no-op for leaves:
    /// literals and bare variables are short-circuited before the driver ever consults this.
    pub fn mark_clean(&self, rulesets: RulesetBitSet) {
        match self {
            Atom::Literal(_) | Atom::OperatorRef(_) | Atom::RulesetRef(_) | Atom::RootType(_) => {}
            Atom::Variable(d) => d.meta.clean_rulesets.mark_clean(rulesets),
            Atom::Lambda(d) => d.meta.clean_rulesets.mark_clean(rulesets),
            Atom::AtomSeq(d) => d.meta.clean_rulesets.mark_clean(rulesets),
            Atom::Apply(d) => d.meta.clean_rulesets.mark_clean(rulesets),
            Atom::MapPair(d) => d.meta.clean_rulesets.mark_clean(rulesets),
            Atom::AlgProp(d) => d.meta.clean_rulesets.mark_clean(rulesets),
            Atom::SpecialForm(d) => d.meta.clean_rulesets.mark_clean(rulesets),
        }
    }

    pub fn kind(&self) -> AtomKind {
        match self {
            Atom::Literal(_) => AtomKind::Literal,
            Atom::Variable(_) => AtomKind::Variable,
            Atom::Lambda(_) => AtomKind::Lambda,
            Atom::AtomSeq(_) => AtomKind::AtomSeq,
            Atom::Apply(_) => AtomKind::Apply,
            Atom::MapPair(_) => AtomKind::MapPair,
            Atom::OperatorRef(_) => AtomKind::OperatorRef,
            Atom::RulesetRef(_) => AtomKind::RulesetRef,
            Atom::AlgProp(_) => AtomKind::AlgProp,
            Atom::SpecialForm(_) => AtomKind::SpecialForm,
            Atom::RootType(_) => AtomKind::RootType,
        }
    }

    /// The atom's type, itself an atom (§3.1). Function-like, sequence, and reference atoms are
    /// typed `Any` pending a richer type system (out of scope per §1 Non-goals).
    pub fn atom_type(&self) -> Atom {
        match self {
            Atom::Literal(l) => Atom::RootType(l.root_type()),
            Atom::Variable(d) => d.var_type.clone(),
            Atom::MapPair(_) => Atom::RootType(RootType::RuleType),
            Atom::OperatorRef(_) => Atom::RootType(RootType::OpRef),
            Atom::RulesetRef(_) => Atom::RootType(RootType::RsRef),
            Atom::RootType(r) => r.type_of(),
            Atom::Lambda(_) | Atom::AtomSeq(_) | Atom::Apply(_) | Atom::AlgProp(_) | Atom::SpecialForm(_) => {
                Atom::RootType(RootType::Any)
            }
        }
    }

    /// If `self` is `Apply(OperatorRef(name), _)`, the operator name the rule library dispatches
    /// on (§4.6 lookup); `None` routes lookup through `kind()` instead.
    pub fn apply_operator_name(&self) -> Option<IString> {
        match self {
            Atom::Apply(d) => match &d.lhs {
                Atom::OperatorRef(name) => Some(*name),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn is_bare_variable(&self) -> bool {
        matches!(self, Atom::Variable(_))
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Atom::Literal(_))
    }

    /// Replaces every free occurrence of a bound variable with its binding. A `Lambda` body
    /// shadows any incoming binding for its own bound variable's name.
    pub fn substitute(&self, bindings: &Bindings) -> Atom {
        match self {
            Atom::Literal(_) | Atom::OperatorRef(_) | Atom::RulesetRef(_) | Atom::RootType(_) => self.clone(),
            Atom::Variable(d) => match bindings.get(&d.name) {
                Some(value) => value.clone(),
                None => {
                    let var_type = d.var_type.substitute(bindings);
                    let guard = d.guard.as_ref().map(|g| g.substitute(bindings));
                    crate::variable::make_variable(d.name, var_type, guard, d.labels.clone(), d.by_name, d.prefix)
                }
            },
            Atom::Lambda(d) => {
                let bound_name = crate::lambda::bound_name(d);
                let inner = bindings.clone().without(&bound_name);
                let bound_var = d.bound_var.substitute(&inner);
                let body = d.body.substitute(&inner);
                crate::lambda::make_lambda(bound_var, body)
            }
            Atom::AtomSeq(d) => {
                let elements = d.elements.iter().map(|e| e.substitute(bindings)).collect();
                let properties = d.properties.substitute(bindings);
                crate::atom_seq::make_atom_seq(properties, elements)
            }
            Atom::Apply(d) => {
                let lhs = d.lhs.substitute(bindings);
                let rhs = d.rhs.substitute(bindings);
                crate::apply::make_apply(lhs, rhs)
            }
            Atom::MapPair(d) => {
                let pattern = d.pattern.substitute(bindings);
                let rewrite = d.rewrite.substitute(bindings);
                crate::map_pair::make_map_pair(pattern, rewrite)
            }
            Atom::AlgProp(d) => {
                let prop = d.prop.substitute(bindings);
                Atom::from_alg_prop(prop)
            }
            Atom::SpecialForm(d) => {
                let tag = d.tag.substitute(bindings);
                let content = d.content.substitute(bindings);
                crate::special_form::make_special_form(tag, content)
            }
        }
    }

    pub fn from_alg_prop(prop: AlgProp) -> Atom {
        let (hash, hash2) = hash_pair(&prop);
        let meta = AtomMeta {
            depth: 0,
            debruijn_index: 0,
            is_term: false,
            free_vars: Arc::new(BTreeSet::new()),
            hash,
            hash2,
            clean_rulesets: CleanRulesets::new(),
        };
        Atom::AlgProp(Arc::new(AlgPropData { prop, meta }))
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Atom::Literal(a), Atom::Literal(b)) => a == b,
            (Atom::OperatorRef(a), Atom::OperatorRef(b)) => a == b,
            (Atom::RulesetRef(a), Atom::RulesetRef(b)) => a == b,
            (Atom::RootType(a), Atom::RootType(b)) => a == b,
            (Atom::Variable(a), Atom::Variable(b)) => Arc::ptr_eq(a, b) || **a == **b,
            (Atom::Lambda(a), Atom::Lambda(b)) => Arc::ptr_eq(a, b) || **a == **b,
            (Atom::AtomSeq(a), Atom::AtomSeq(b)) => Arc::ptr_eq(a, b) || **a == **b,
            (Atom::Apply(a), Atom::Apply(b)) => Arc::ptr_eq(a, b) || **a == **b,
            (Atom::MapPair(a), Atom::MapPair(b)) => Arc::ptr_eq(a, b) || **a == **b,
            (Atom::AlgProp(a), Atom::AlgProp(b)) => Arc::ptr_eq(a, b) || a.prop == b.prop,
            (Atom::SpecialForm(a), Atom::SpecialForm(b)) => Arc::ptr_eq(a, b) || **a == **b,
            _ => false,
        }
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Atom::Literal(l) => l.hash(state),
            Atom::OperatorRef(n) | Atom::RulesetRef(n) => n.hash(state),
            Atom::RootType(r) => r.hash(state),
            _ => self.hash_primary().hash(state),
        }
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Atom::Literal(l) => write!(f, "{l}"),
            Atom::OperatorRef(n) => write!(f, "{n}"),
            Atom::RulesetRef(n) => write!(f, "#{n}"),
            Atom::RootType(r) => write!(f, "{r}"),
            Atom::Variable(d) => write!(f, "{}", d.name),
            Atom::Lambda(d) => write!(f, "\\{} -> {}", d.bound_var, d.body),
            Atom::AtomSeq(d) => {
                write!(f, "[")?;
                for (i, e) in d.elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, "]")
            }
            Atom::Apply(d) => write!(f, "{}({})", d.lhs, d.rhs),
            Atom::MapPair(d) => write!(f, "{} -> {}", d.pattern, d.rewrite),
            Atom::AlgProp(d) => write!(f, "{:?}", d.prop),
            Atom::SpecialForm(d) => write!(f, "{{{}: {}}}", d.tag, d.content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn equal_literals_hash_equal() {
        let a = Atom::Literal(Literal::integer(3));
        let b = Atom::Literal(Literal::integer(3));
        assert_eq!(a, b);
        assert_eq!(a.hash_primary(), b.hash_primary());
    }

    #[test]
    fn literal_is_constant_and_zero_depth() {
        let a = Atom::Literal(Literal::integer(3));
        assert!(a.is_constant());
        assert_eq!(a.depth(), 0);
    }
}
