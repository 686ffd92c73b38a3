//! `RewriteRule` and the rule library (C7, §3.2, §3.5, §4.6): rule validation, ruleset bit
//! allocation, associative-operator completion (§4.6.1), and rule lookup (§4.6 "Lookup").

use std::collections::HashMap;
use std::sync::Arc;

use crate::abstractions::IString;
use crate::alg_prop::AlgProp;
use crate::atom::{Atom, AtomKind};
use crate::bitset::RulesetBitSet;
use crate::error::RewriteError;

#[derive(Clone, Debug, Default)]
pub struct SourceLoc {
    pub file: Option<IString>,
    pub line: u32,
    pub column: u32,
}

#[derive(Clone)]
pub struct RewriteRule {
    pub loc: SourceLoc,
    pub pattern: Atom,
    pub rewrite: Atom,
    pub guards: Vec<Atom>,
    pub rulesets: RulesetBitSet,
    pub name: Option<IString>,
    pub synthetic: bool,
}

impl RewriteRule {
    pub fn new(pattern: Atom, rewrite: Atom) -> Self {
        Self {
            loc: SourceLoc::default(),
            pattern,
            rewrite,
            guards: Vec::new(),
            rulesets: RulesetBitSet::EMPTY,
            name: None,
            synthetic: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<IString>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_guards(mut self, guards: Vec<Atom>) -> Self {
        self.guards = guards;
        self
    }

    pub fn with_rulesets(mut self, rulesets: RulesetBitSet) -> Self {
        self.rulesets = rulesets;
        self
    }
}

/// §4.6.1: generates the synthetic rules that let a rule whose root is an associative operator
/// also match larger argument lists.
fn complete(rule: &RewriteRule, operator_name: IString, operator_props: &AlgProp) -> Vec<RewriteRule> {
    if !operator_props.is_associative() {
        return Vec::new();
    }
    let Atom::Apply(apply_data) = &rule.pattern else {
        return Vec::new();
    };
    let Atom::AtomSeq(seq_data) = &apply_data.rhs else {
        return Vec::new();
    };
    // The rewrite side is completed regardless of its own shape (§8 S1's `plus($x, 0) -> $x`
    // and testable property 11's `f(x, g(x)) -> e` both have a bare-variable/literal rewrite,
    // not an `Apply`); only an `Apply(_, AtomSeq(_))` rewrite contributes its own properties to
    // the synthetic's rebuilt argument sequence, everything else falls back to `AlgProp::none()`.
    let rewrite_props = match &rule.rewrite {
        Atom::Apply(rewrite_apply) => match &rewrite_apply.rhs {
            Atom::AtomSeq(d) => d.properties.clone(),
            _ => AlgProp::none(),
        },
        _ => AlgProp::none(),
    };

    let elem_type = Atom::RootType(crate::root_type::RootType::Any);
    let left = Atom::variable("$L", elem_type.clone());
    let right = Atom::variable("$R", elem_type);

    let extend = |prefix: Option<&Atom>, suffix: Option<&Atom>| -> RewriteRule {
        let mut pattern_elems: Vec<Atom> = Vec::new();
        if let Some(p) = prefix {
            pattern_elems.push(p.clone());
        }
        pattern_elems.extend(seq_data.elements.iter().cloned());
        if let Some(s) = suffix {
            pattern_elems.push(s.clone());
        }
        let new_pattern = Atom::apply(
            Atom::OperatorRef(operator_name),
            Atom::atom_seq(seq_data.properties.clone(), pattern_elems),
        );

        let mut rewrite_elems: Vec<Atom> = Vec::new();
        if let Some(p) = prefix {
            rewrite_elems.push(p.clone());
        }
        rewrite_elems.push(rule.rewrite.clone());
        if let Some(s) = suffix {
            rewrite_elems.push(s.clone());
        }
        let new_rewrite = Atom::apply(
            Atom::OperatorRef(operator_name),
            Atom::atom_seq(rewrite_props.clone(), rewrite_elems),
        );

        RewriteRule {
            loc: rule.loc.clone(),
            pattern: new_pattern,
            rewrite: new_rewrite,
            guards: rule.guards.clone(),
            rulesets: rule.rulesets,
            name: rule.name,
            synthetic: true,
        }
    };

    if operator_props.is_commutative() {
        vec![extend(None, Some(&right))]
    } else {
        vec![extend(None, Some(&right)), extend(Some(&left), None), extend(Some(&left), Some(&right))]
    }
}

#[derive(Default, Clone)]
pub struct RuleLibrary {
    kind_to_rules: HashMap<AtomKind, Vec<Arc<RewriteRule>>>,
    op_to_rules: HashMap<IString, Vec<Arc<RewriteRule>>>,
    name_to_rules: HashMap<IString, Vec<Arc<RewriteRule>>>,
    ruleset_bits: HashMap<IString, u32>,
    next_bit: u32,
    active: RulesetBitSet,
    pub allow_undeclared_rulesets: bool,
    pub allow_literal_rules: bool,
    pub descend: bool,
    pub normalize_children: bool,
    /// Negative is unbounded.
    pub limit: i64,
}

const DEFAULT_RULESET: &str = "DEFAULT";

impl RuleLibrary {
    pub fn new() -> Self {
        let mut lib = Self {
            allow_undeclared_rulesets: true,
            allow_literal_rules: false,
            descend: true,
            normalize_children: true,
            limit: -1,
            ..Default::default()
        };
        lib.declare_ruleset(DEFAULT_RULESET).expect("DEFAULT ruleset always declarable");
        lib.active = lib.active.with(0);
        lib
    }

    pub fn declare_ruleset(&mut self, name: impl Into<IString>) -> Result<u32, RewriteError> {
        let name = name.into();
        if let Some(bit) = self.ruleset_bits.get(&name) {
            return Ok(*bit);
        }
        if self.next_bit >= crate::bitset::MAX_RULESETS {
            return Err(RewriteError::NoSuchRuleset(format!(
                "ruleset capacity ({}) exhausted",
                crate::bitset::MAX_RULESETS
            )));
        }
        let bit = self.next_bit;
        self.next_bit += 1;
        self.ruleset_bits.insert(name, bit);
        Ok(bit)
    }

    pub fn get_bit(&mut self, name: impl Into<IString>) -> Result<u32, RewriteError> {
        let name = name.into();
        if let Some(bit) = self.ruleset_bits.get(&name) {
            return Ok(*bit);
        }
        if self.allow_undeclared_rulesets {
            self.declare_ruleset(name)
        } else {
            Err(RewriteError::NoSuchRuleset(name.to_string()))
        }
    }

    pub fn enable_ruleset(&mut self, name: impl Into<IString>) -> Result<(), RewriteError> {
        let bit = self.get_bit(name)?;
        self.active = self.active.with(bit);
        Ok(())
    }

    pub fn disable_ruleset(&mut self, name: impl Into<IString>) -> Result<(), RewriteError> {
        let bit = self.get_bit(name)?;
        self.active = self.active.without(bit);
        Ok(())
    }

    pub fn active(&self) -> RulesetBitSet {
        self.active
    }

    fn names_to_bitset(&mut self, names: &[IString]) -> Result<RulesetBitSet, RewriteError> {
        let mut bits = RulesetBitSet::EMPTY;
        for name in names {
            bits = bits.with(self.get_bit(*name)?);
        }
        Ok(bits)
    }

    /// Adds a rule, completing it (§4.6.1) if its pattern's root is an associative operator
    /// application. `operator_props` is the properties of the operator named by the pattern's
    /// root, if any (supplied by `Context`, which owns the operator library).
    pub fn add_rule(
        &mut self,
        pattern: Atom,
        rewrite: Atom,
        guards: Vec<Atom>,
        ruleset_names: &[IString],
        name: Option<IString>,
        operator_props: Option<&AlgProp>,
    ) -> Result<(), RewriteError> {
        if pattern.is_bare_variable() {
            return Err(RewriteError::BindablePattern);
        }
        if pattern.is_literal() && !self.allow_literal_rules {
            return Err(RewriteError::LiteralPattern);
        }
        if pattern == rewrite {
            return Err(RewriteError::IdentityRule);
        }

        let rulesets = self.names_to_bitset(ruleset_names)?;
        let mut rule = RewriteRule {
            loc: SourceLoc::default(),
            pattern: pattern.clone(),
            rewrite,
            guards,
            rulesets,
            name,
            synthetic: false,
        };
        rule.name = name;

        let synthetics = match (pattern.apply_operator_name(), operator_props) {
            (Some(op_name), Some(props)) => complete(&rule, op_name, props),
            _ => Vec::new(),
        };

        if let Some(rule_name) = name {
            self.remove_by_name(&rule_name);
        }

        self.insert_rule(rule.clone());
        for synthetic in synthetics {
            self.insert_rule(synthetic);
        }
        Ok(())
    }

    fn insert_rule(&mut self, rule: RewriteRule) {
        let arc = Arc::new(rule);
        if let Some(op_name) = arc.pattern.apply_operator_name() {
            self.op_to_rules.entry(op_name).or_default().push(arc.clone());
        } else {
            self.kind_to_rules.entry(arc.pattern.kind()).or_default().push(arc.clone());
        }
        if let Some(name) = arc.name {
            self.name_to_rules.entry(name).or_default().push(arc);
        }
    }

    /// Removes every rule (including synthetics) previously recorded under `name`.
    pub fn remove_by_name(&mut self, name: &IString) {
        if self.name_to_rules.remove(name).is_none() {
            return;
        }
        for bucket in self.op_to_rules.values_mut() {
            bucket.retain(|rule| rule.name.as_ref() != Some(name));
        }
        for bucket in self.kind_to_rules.values_mut() {
            bucket.retain(|rule| rule.name.as_ref() != Some(name));
        }
    }

    /// §4.6 Lookup: the bucket for `atom`'s operator name if it is an `Apply(op, ...)`, else the
    /// bucket for its `kind()`; filtered by intersection with `requested` (or `active` if empty).
    pub fn lookup(&self, atom: &Atom, requested: RulesetBitSet) -> Vec<Arc<RewriteRule>> {
        let effective = if requested.is_empty() { self.active } else { requested };
        let bucket = match atom.apply_operator_name() {
            Some(op_name) => self.op_to_rules.get(&op_name),
            None => self.kind_to_rules.get(&atom.kind()),
        };
        bucket
            .map(|rules| {
                rules
                    .iter()
                    .filter(|rule| rule.rulesets.intersects(effective))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn rules_named(&self, name: &IString) -> &[Arc<RewriteRule>] {
        self.name_to_rules.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn all_rules(&self) -> impl Iterator<Item = &Arc<RewriteRule>> {
        self.op_to_rules.values().chain(self.kind_to_rules.values()).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    fn plus_pattern(elements: Vec<Atom>, props: AlgProp) -> Atom {
        Atom::apply(Atom::OperatorRef("plus".into()), Atom::atom_seq(props, elements))
    }

    #[test]
    fn default_ruleset_is_bit_zero_and_active() {
        let lib = RuleLibrary::new();
        assert!(lib.active().contains(0));
    }

    #[test]
    fn bare_variable_pattern_is_rejected() {
        let mut lib = RuleLibrary::new();
        let x = Atom::variable("x", Atom::RootType(crate::root_type::RootType::Any));
        let err = lib.add_rule(x.clone(), Atom::Literal(Literal::integer(1)), Vec::new(), &[], None, None);
        assert!(matches!(err, Err(RewriteError::BindablePattern)));
    }

    #[test]
    fn identity_rule_is_rejected() {
        let mut lib = RuleLibrary::new();
        let pattern = plus_pattern(vec![Atom::Literal(Literal::integer(1))], AlgProp::none());
        let err = lib.add_rule(pattern.clone(), pattern, Vec::new(), &[], None, None);
        assert!(matches!(err, Err(RewriteError::IdentityRule)));
    }

    #[test]
    fn associative_commutative_completion_adds_one_synthetic() {
        let mut lib = RuleLibrary::new();
        let mut props = AlgProp::none();
        props.associative = Some(crate::alg_prop::PropertyValue::Bool(true));
        props.commutative = Some(crate::alg_prop::PropertyValue::Bool(true));

        let x = Atom::variable("x", Atom::RootType(crate::root_type::RootType::Any));
        let zero = Atom::Literal(Literal::integer(0));
        let pattern = plus_pattern(vec![x.clone(), zero], props.clone());
        let rewrite = x;

        lib.add_rule(pattern, rewrite, Vec::new(), &[], Some("plus-zero".into()), Some(&props))
            .unwrap();

        let rules = lib.rules_named(&"plus-zero".into());
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().any(|r| r.synthetic));
        assert!(rules.iter().any(|r| !r.synthetic));
    }

    #[test]
    fn associative_noncommutative_completion_adds_three_synthetics() {
        let mut lib = RuleLibrary::new();
        let mut props = AlgProp::none();
        props.associative = Some(crate::alg_prop::PropertyValue::Bool(true));

        let a = Atom::Literal(Literal::symbol("a"));
        let b = Atom::Literal(Literal::symbol("b"));
        let pattern = plus_pattern(vec![a], props.clone());
        let rewrite = b;

        lib.add_rule(pattern, rewrite, Vec::new(), &[], Some("r".into()), Some(&props))
            .unwrap();

        assert_eq!(lib.rules_named(&"r".into()).len(), 4);
    }
}
