//! `Context` (§4.7–§4.9, §6): the rewrite driver plus everything it needs — the operator library,
//! the rule library, the memoization cache, a table of global bindings, and the cooperative
//! timeout flag. One `Context` is the unit of sharing: a single rewrite runs at a time per context
//! by convention (§5), though the memo cache is internally safe under concurrent reads/writes.

use std::collections::HashMap;

use crate::abstractions::IString;
use crate::atom::Atom;
use crate::bindings::Bindings;
use crate::bitset::RulesetBitSet;
use crate::error::{RewriteError, RewriteResult};
use crate::literal::Literal;
use crate::matching::{match_atoms, MatchOutcome};
use crate::memo::{MemoCache, MemoStats};
use crate::operator::{Operator, OperatorLibrary};
use crate::rule::RuleLibrary;
use crate::timeout::TimeoutFlag;

pub struct Context {
    operators: OperatorLibrary,
    rules: RuleLibrary,
    memo: MemoCache,
    globals: HashMap<IString, Atom>,
    timeout: TimeoutFlag,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    pub fn new() -> Self {
        Self {
            operators: OperatorLibrary::new(),
            rules: RuleLibrary::new(),
            memo: MemoCache::default(),
            globals: HashMap::new(),
            timeout: TimeoutFlag::new(),
        }
    }

    /// A fresh session over the same operators, rules, and global bindings. The memo cache and
    /// timeout flag are NOT shared: a fork starts with a cold cache and an unset flag, since a
    /// memo entry is only ever advisory for the library state it was produced under, and two
    /// forks may go on to diverge (§5, §6 "clone").
    pub fn fork(&self) -> Self {
        Self {
            operators: self.operators.clone(),
            rules: self.rules.clone(),
            memo: MemoCache::default(),
            globals: self.globals.clone(),
            timeout: TimeoutFlag::new(),
        }
    }

    /// A session pre-populated with the bootstrap operator library (§2.1): `plus`, `times`, `if`,
    /// `and`, `or`. `Context::new` stays empty; this is the opt-in, illustrative session used by
    /// the crate's own tests and by callers who just want a usable kernel to poke at.
    pub fn with_bootstrap_operators() -> Self {
        let mut context = Self::new();
        crate::builtins::register_bootstrap(&mut context);
        context
    }

    // -- ruleset lifecycle ------------------------------------------------

    pub fn declare_ruleset(&mut self, name: impl Into<IString>) -> RewriteResult<u32> {
        self.rules.declare_ruleset(name)
    }

    pub fn enable_ruleset(&mut self, name: impl Into<IString>) -> RewriteResult<()> {
        self.rules.enable_ruleset(name)
    }

    pub fn disable_ruleset(&mut self, name: impl Into<IString>) -> RewriteResult<()> {
        self.rules.disable_ruleset(name)
    }

    pub fn active_rulesets(&self) -> RulesetBitSet {
        self.rules.active()
    }

    // -- operators ------------------------------------------------

    pub fn add_operator(&mut self, operator: Operator) -> std::sync::Arc<Operator> {
        self.operators.register(operator)
    }

    pub fn get_operator(&self, name: &IString) -> Option<std::sync::Arc<Operator>> {
        self.operators.get(name)
    }

    pub fn operators(&self) -> &OperatorLibrary {
        &self.operators
    }

    // -- rules ------------------------------------------------

    pub fn add_rule(
        &mut self,
        pattern: Atom,
        rewrite: Atom,
        guards: Vec<Atom>,
        ruleset_names: &[IString],
        name: Option<IString>,
    ) -> RewriteResult<()> {
        let operator_props = pattern
            .apply_operator_name()
            .and_then(|op| self.operators.get(&op))
            .map(|op| op.properties.clone());
        self.rules.add_rule(pattern, rewrite, guards, ruleset_names, name, operator_props.as_ref())
    }

    pub fn remove_rule(&mut self, name: &IString) {
        self.rules.remove_by_name(name)
    }

    pub fn rules(&self) -> &RuleLibrary {
        &self.rules
    }

    pub fn set_limit(&mut self, limit: i64) {
        self.rules.limit = limit;
    }

    pub fn set_descend(&mut self, descend: bool) {
        self.rules.descend = descend;
    }

    pub fn set_normalize_children(&mut self, normalize_children: bool) {
        self.rules.normalize_children = normalize_children;
    }

    // -- global bindings ------------------------------------------------

    pub fn bind_global(&mut self, name: impl Into<IString>, value: Atom) {
        self.globals.insert(name.into(), value);
    }

    pub fn unbind_global(&mut self, name: &IString) {
        self.globals.remove(name);
    }

    pub fn get_global(&self, name: &IString) -> Option<&Atom> {
        self.globals.get(name)
    }

    // -- cooperative cancellation -----------------------------------------

    pub fn timeout_flag(&self) -> TimeoutFlag {
        self.timeout.clone()
    }

    pub fn request_timeout(&self) {
        self.timeout.set();
    }

    pub fn reset_timeout(&self) {
        self.timeout.reset();
    }

    // -- memoization ------------------------------------------------

    pub fn memo_stats(&self) -> MemoStats {
        self.memo.stats()
    }

    pub fn clear_memo(&self) {
        self.memo.clear();
    }

    // -- matching ------------------------------------------------

    /// §6: `match(pattern, subject, bindings) -> Outcome`.
    pub fn match_atoms(&self, pattern: &Atom, subject: &Atom, bindings: Bindings) -> MatchOutcome {
        match_atoms(pattern, subject, bindings, &self.timeout)
    }

    // -- the rewrite driver (C8, §4.7–§4.8) -------------------------------

    /// Resolves the "empty requested bitset means active rulesets" convention used throughout
    /// §4.7.
    fn resolve(&self, requested: RulesetBitSet) -> RulesetBitSet {
        if requested.is_empty() {
            self.rules.active()
        } else {
            requested
        }
    }

    /// §4.7 "Top-level step": one rule attempt at the root, no descent, no fixpoint.
    fn top_level_step(&self, atom: &Atom, effective: RulesetBitSet) -> RewriteResult<(Atom, bool)> {
        if self.timeout.is_set() {
            return Err(RewriteError::TimedOut);
        }
        if atom.is_literal() && !self.rules.allow_literal_rules {
            return Ok((atom.clone(), false));
        }
        if let Atom::Variable(data) = atom {
            if data.by_name {
                if let Some(value) = self.globals.get(&data.name) {
                    return Ok((value.clone(), true));
                }
            }
            return Ok((atom.clone(), false));
        }
        if atom.clean_rulesets().is_superset_of(effective) {
            return Ok((atom.clone(), false));
        }
        if let Some(cached) = self.memo.get(atom, effective) {
            return Ok(cached);
        }

        for rule in self.rules.lookup(atom, effective) {
            let (result, applied) = self.do_rewrite(&rule, atom, effective)?;
            if applied {
                atom.mark_clean(effective);
                self.memo.put(atom.clone(), effective, result.clone(), true, atom.depth() as u64);
                return Ok((result, true));
            }
        }
        if let Some(result) = self.try_native_handler(atom) {
            atom.mark_clean(effective);
            self.memo.put(atom.clone(), effective, result.clone(), true, atom.depth() as u64);
            return Ok((result, true));
        }
        atom.mark_clean(effective);
        self.memo.put(atom.clone(), effective, atom.clone(), false, atom.depth() as u64);
        Ok((atom.clone(), false))
    }

    /// Falls through to an operator's native handler (§4.9) once no ordinary rule applies, so a
    /// bootstrap operator like `plus` can reduce ground arguments without a hand-written rule for
    /// every literal combination (§8 scenario S1). A handler that returns the atom unchanged counts
    /// as "did not apply", same as an ordinary rule that fails to match.
    fn try_native_handler(&self, atom: &Atom) -> Option<Atom> {
        let Atom::Apply(data) = atom else { return None };
        let Atom::OperatorRef(op_name) = &data.lhs else { return None };
        let operator = self.operators.get(op_name)?;
        let result = operator.invoke(&data.rhs, &Bindings::new(), self)?;
        (result != *atom).then_some(result)
    }

    /// §4.8 `doRewrite`: match `rule.pattern` against `subject`, and among the candidate bindings
    /// (in enumeration order) take the first whose guards all reduce to `Boolean(true)`.
    fn do_rewrite(&self, rule: &crate::rule::RewriteRule, subject: &Atom, effective: RulesetBitSet) -> RewriteResult<(Atom, bool)> {
        let outcome = self.match_atoms(&rule.pattern, subject, Bindings::new());
        for binding in outcome.into_iter() {
            if self.timeout.is_set() {
                return Err(RewriteError::TimedOut);
            }
            let mut satisfied = true;
            for guard in &rule.guards {
                let (reduced, _) = self.rewrite(&guard.substitute(&binding), effective)?;
                if !matches!(reduced, Atom::Literal(Literal::Boolean(true))) {
                    satisfied = false;
                    break;
                }
            }
            if satisfied {
                return Ok((rule.rewrite.substitute(&binding), true));
            }
        }
        Ok((subject.clone(), false))
    }

    /// §4.7 "Child descent": walk one level of `atom` and rewrite each structurally significant
    /// child, rebuilding the parent. `AtomSeq`'s `properties` is rewritten too, by round-tripping
    /// it through its first-class `AlgProp` atom form (§3.1). `MapPair` has no descent per §4.7 —
    /// its pattern/rewrite sides are only ever touched by substitution, never by the driver.
    fn descend_children(&self, atom: &Atom, effective: RulesetBitSet) -> RewriteResult<(Atom, bool)> {
        let child_step = |child: &Atom| -> RewriteResult<(Atom, bool)> {
            if self.rules.normalize_children {
                self.rewrite(child, effective)
            } else {
                self.rewrite_once(child, effective)
            }
        };

        match atom {
            Atom::AtomSeq(data) => {
                let props_atom = Atom::from_alg_prop(data.properties.clone());
                let (props_result, props_changed) = child_step(&props_atom)?;
                let new_properties = match &props_result {
                    Atom::AlgProp(d) => d.prop.clone(),
                    _ => data.properties.clone(),
                };
                let mut changed = props_changed;
                let mut new_elements = Vec::with_capacity(data.elements.len());
                for element in &data.elements {
                    let (result, element_changed) = child_step(element)?;
                    changed |= element_changed;
                    new_elements.push(result);
                }
                Ok((Atom::atom_seq(new_properties, new_elements), changed))
            }
            Atom::Apply(data) => {
                let (lhs, cl) = child_step(&data.lhs)?;
                let (rhs, cr) = child_step(&data.rhs)?;
                Ok((Atom::apply(lhs, rhs), cl || cr))
            }
            Atom::Lambda(data) => {
                let (bound_var, cb) = child_step(&data.bound_var)?;
                let (body, cbody) = child_step(&data.body)?;
                Ok((Atom::lambda(bound_var, body), cb || cbody))
            }
            Atom::SpecialForm(data) => {
                let (tag, ct) = child_step(&data.tag)?;
                let (content, cc) = child_step(&data.content)?;
                Ok((Atom::special_form(tag, content), ct || cc))
            }
            _ => Ok((atom.clone(), false)),
        }
    }

    /// §4.7: "one top-level attempt plus (if descend) one recursive child pass. No memoization
    /// [of the combined result]. No fixpoint."
    pub fn rewrite_once(&self, atom: &Atom, rulesets: RulesetBitSet) -> RewriteResult<(Atom, bool)> {
        if self.timeout.is_set() {
            return Err(RewriteError::TimedOut);
        }
        let effective = self.resolve(rulesets);
        let (interim, applied_top) = self.top_level_step(atom, effective)?;
        if !self.rules.descend {
            return Ok((interim, applied_top));
        }
        let (descended, applied_children) = self.descend_children(&interim, effective)?;
        Ok((descended, applied_top || applied_children))
    }

    /// §4.7 "Fixpoint loop": iterate `rewrite_once` until no further change, a stable point is
    /// reached, a cycle is detected, or `limit` is exhausted.
    pub fn rewrite(&self, atom: &Atom, rulesets: RulesetBitSet) -> RewriteResult<(Atom, bool)> {
        let effective = self.resolve(rulesets);
        let mut current = atom.clone();
        let mut any_change = false;
        let mut history: Vec<Atom> = Vec::new();
        let mut remaining = self.rules.limit;

        loop {
            if remaining == 0 {
                return Ok((current, any_change));
            }
            let (next, changed) = self.rewrite_once(&current, effective)?;
            if !changed {
                return Ok((next, any_change));
            }
            any_change = true;
            if next == current {
                return Ok((next, true));
            }
            if history.iter().any(|prior| *prior == next) {
                tracing::warn!("rewrite cycle detected; stopping at current atom");
                return Ok((next, true));
            }
            history.push(current);
            current = next;
            if remaining > 0 {
                remaining -= 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alg_prop::{AlgProp, PropertyValue};
    use crate::literal::Literal;
    use crate::root_type::RootType;

    fn any_type() -> Atom {
        Atom::RootType(RootType::Any)
    }

    #[test]
    fn literal_rewrites_to_itself_with_no_rules() {
        let ctx = Context::new();
        let atom = Atom::Literal(Literal::integer(3));
        let (result, applied) = ctx.rewrite(&atom, RulesetBitSet::EMPTY).unwrap();
        assert_eq!(result, atom);
        assert!(!applied);
    }

    #[test]
    fn a_simple_rule_fires_once() {
        let mut ctx = Context::new();
        let x = Atom::variable("x", any_type());
        let pattern = Atom::apply_op("double", vec![x.clone()]);
        let rewrite = Atom::apply_op("plus", vec![x.clone(), x]);
        ctx.add_rule(pattern, rewrite, Vec::new(), &[], Some("double-def".into())).unwrap();

        let subject = Atom::apply_op("double", vec![Atom::Literal(Literal::integer(5))]);
        let (result, applied) = ctx.rewrite_once(&subject, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(
            result,
            Atom::apply_op("plus", vec![Atom::Literal(Literal::integer(5)), Atom::Literal(Literal::integer(5))])
        );
    }

    #[test]
    fn rewrite_to_fixpoint_chains_through_several_rules() {
        let mut ctx = Context::new();
        let a = Atom::Literal(Literal::symbol("a"));
        let b = Atom::Literal(Literal::symbol("b"));
        let c = Atom::Literal(Literal::symbol("c"));
        ctx.rules.allow_literal_rules = true;
        ctx.add_rule(a.clone(), b.clone(), Vec::new(), &[], Some("a-to-b".into())).unwrap();
        ctx.add_rule(b, c.clone(), Vec::new(), &[], Some("b-to-c".into())).unwrap();

        let (result, applied) = ctx.rewrite(&a, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, c);
    }

    #[test]
    fn a_guard_that_never_holds_blocks_the_rule() {
        let mut ctx = Context::new();
        let x = Atom::variable("x", any_type());
        let pattern = Atom::apply_op("id", vec![x.clone()]);
        let rewrite = x;
        let always_false = Atom::Literal(Literal::Boolean(false));
        ctx.add_rule(pattern, rewrite, vec![always_false], &[], Some("guarded".into())).unwrap();

        let subject = Atom::apply_op("id", vec![Atom::Literal(Literal::integer(1))]);
        let (result, applied) = ctx.rewrite_once(&subject, RulesetBitSet::EMPTY).unwrap();
        assert!(!applied);
        assert_eq!(result, subject);
    }

    #[test]
    fn a_global_binding_resolves_a_free_by_name_variable() {
        let mut ctx = Context::new();
        let x = Atom::variable("x", any_type());
        ctx.bind_global("x", Atom::Literal(Literal::integer(5)));
        let (result, applied) = ctx.rewrite_once(&x, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, Atom::Literal(Literal::integer(5)));
    }

    #[test]
    fn an_unbound_by_name_variable_is_left_untouched() {
        let ctx = Context::new();
        let x = Atom::variable("x", any_type());
        let (result, applied) = ctx.rewrite_once(&x, RulesetBitSet::EMPTY).unwrap();
        assert!(!applied);
        assert_eq!(result, x);
    }

    #[test]
    fn clean_rulesets_short_circuits_repeat_attempts() {
        let ctx = Context::new();
        let atom = Atom::Literal(Literal::symbol("s"));
        atom.mark_clean(RulesetBitSet::default_ruleset());
        let (result, applied) = ctx.rewrite_once(&atom, RulesetBitSet::default_ruleset()).unwrap();
        assert!(!applied);
        assert_eq!(result, atom);
    }

    #[test]
    fn descend_normalizes_a_child_without_a_top_level_rule() {
        let mut ctx = Context::new();
        ctx.rules.allow_literal_rules = true;
        let a = Atom::Literal(Literal::symbol("a"));
        let b = Atom::Literal(Literal::symbol("b"));
        ctx.add_rule(a.clone(), b.clone(), Vec::new(), &[], Some("a-to-b".into())).unwrap();

        let parent = Atom::apply_op("wrap", vec![a]);
        let (result, applied) = ctx.rewrite(&parent, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, Atom::apply_op("wrap", vec![b]));
    }

    #[test]
    fn fork_starts_with_a_cold_memo_cache_but_keeps_rules() {
        let mut ctx = Context::new();
        ctx.rules.allow_literal_rules = true;
        let a = Atom::Literal(Literal::symbol("a"));
        let b = Atom::Literal(Literal::symbol("b"));
        ctx.add_rule(a.clone(), b.clone(), Vec::new(), &[], Some("a-to-b".into())).unwrap();
        let _ = ctx.rewrite(&a, RulesetBitSet::EMPTY).unwrap();
        assert!(ctx.memo_stats().entries > 0);

        let forked = ctx.fork();
        assert_eq!(forked.memo_stats().entries, 0);
        let (result, applied) = forked.rewrite(&a, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, b);
    }

    #[test]
    fn operator_properties_drive_associative_completion_through_add_rule() {
        let mut ctx = Context::new();
        let mut props = AlgProp::none();
        props.associative = Some(PropertyValue::Bool(true));
        props.commutative = Some(PropertyValue::Bool(true));
        ctx.add_operator(Operator::new("plus", props.clone()));

        let x = Atom::variable("x", any_type());
        let zero = Atom::Literal(Literal::integer(0));
        let pattern = Atom::apply(Atom::OperatorRef("plus".into()), Atom::atom_seq(props, vec![x.clone(), zero]));
        ctx.add_rule(pattern, x, Vec::new(), &[], Some("plus-zero".into())).unwrap();

        assert_eq!(ctx.rules().rules_named(&"plus-zero".into()).len(), 2);
    }
}
