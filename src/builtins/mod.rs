//! The bootstrap operator library (§2.1): a small set of native-handler operators that exercise
//! completion, absorbers, and identities end to end, grounded in the ancestor project's own
//! `Plus`/`Times`/`Subtract` builtins but expressed as `Operator` native handlers over `Atom`
//! rather than `Expr`-pattern-matched symbol definitions. Entirely optional: `Context::new` yields
//! an operator-free context; only `Context::with_bootstrap_operators` registers these.

use std::ops::{AddAssign, MulAssign};

use crate::abstractions::{BigFloat, BigInteger};
use crate::alg_prop::{AlgProp, PropertyValue};
use crate::atom::Atom;
use crate::context::Context;
use crate::literal::Literal;
use crate::operator::Operator;
use crate::root_type::RootType;

/// Precision (in bits) used when a bootstrap handler needs to fold `Literal::Float` values
/// through `rug::Float`. Not a spec constant — purely an implementation convenience for the
/// illustrative operators, unrelated to the precision a dialect's own float literals might carry.
const FOLD_PRECISION: u32 = 128;

fn any_type() -> Atom {
    Atom::RootType(RootType::Any)
}

fn seq_elements(argument: &Atom) -> &[Atom] {
    match argument {
        Atom::AtomSeq(data) => &data.elements,
        _ => &[],
    }
}

fn seq_properties(argument: &Atom) -> AlgProp {
    match argument {
        Atom::AtomSeq(data) => data.properties.clone(),
        _ => AlgProp::none(),
    }
}

fn rebuild(name: &str, properties: AlgProp, elements: Vec<Atom>, identity: Atom) -> Atom {
    match elements.len() {
        0 => identity,
        1 => elements.into_iter().next().unwrap(),
        _ => Atom::apply(Atom::OperatorRef(name.into()), Atom::atom_seq(properties, elements)),
    }
}

/// `plus`: associative, commutative, identity `0`. Folds every `Integer`/`Float` literal argument
/// into a single accumulator and leaves every other argument untouched, mirroring the ancestor's
/// `Plus` builtin (which folded `Integer`/`Real` the same way while leaving symbolic terms alone).
fn register_plus(context: &mut Context) {
    let mut props = AlgProp::none();
    props.associative = Some(PropertyValue::Bool(true));
    props.commutative = Some(PropertyValue::Bool(true));
    props.identity = Some(Atom::Literal(Literal::integer(0)));

    context.add_operator(Operator::new("plus", props).with_native_handler(std::sync::Arc::new(
        |_operator, argument, _bindings, _context| {
            let mut int_acc = BigInteger::new();
            let mut float_acc: Option<rug::Float> = None;
            let mut rest = Vec::new();

            for element in seq_elements(argument) {
                match element {
                    Atom::Literal(Literal::Integer(n)) => int_acc.add_assign(n),
                    Atom::Literal(Literal::Float(f)) => {
                        let value = f.to_rug_float(FOLD_PRECISION);
                        float_acc = Some(match float_acc.take() {
                            Some(acc) => acc + value,
                            None => value,
                        });
                    }
                    other => rest.push(other.clone()),
                }
            }

            if let Some(mut total) = float_acc {
                total += &int_acc;
                rest.push(Atom::Literal(Literal::Float(BigFloat::from_rug_float(&total))));
            } else if int_acc != 0 {
                rest.push(Atom::Literal(Literal::integer(int_acc)));
            }

            rebuild("plus", seq_properties(argument), rest, Atom::Literal(Literal::integer(0)))
        },
    )));
}

/// `times`: associative, commutative, identity `1`, absorber `0`. Analogous to `plus`.
fn register_times(context: &mut Context) {
    let mut props = AlgProp::none();
    props.associative = Some(PropertyValue::Bool(true));
    props.commutative = Some(PropertyValue::Bool(true));
    props.identity = Some(Atom::Literal(Literal::integer(1)));
    props.absorber = Some(Atom::Literal(Literal::integer(0)));

    context.add_operator(Operator::new("times", props).with_native_handler(std::sync::Arc::new(
        |_operator, argument, _bindings, _context| {
            let mut int_acc = BigInteger::from(1);
            let mut float_acc: Option<rug::Float> = None;
            let mut rest = Vec::new();

            for element in seq_elements(argument) {
                match element {
                    Atom::Literal(Literal::Integer(n)) => int_acc.mul_assign(n),
                    Atom::Literal(Literal::Float(f)) => {
                        let value = f.to_rug_float(FOLD_PRECISION);
                        float_acc = Some(match float_acc.take() {
                            Some(acc) => acc * value,
                            None => value,
                        });
                    }
                    other => rest.push(other.clone()),
                }
                if float_acc.is_none() && int_acc == 0 {
                    // A zero factor absorbs the whole product regardless of what else is present.
                    return Atom::Literal(Literal::integer(0));
                }
            }

            if let Some(mut total) = float_acc {
                total *= &int_acc;
                rest.push(Atom::Literal(Literal::Float(BigFloat::from_rug_float(&total))));
            } else if int_acc != 1 {
                rest.push(Atom::Literal(Literal::integer(int_acc)));
            }

            rebuild("times", seq_properties(argument), rest, Atom::Literal(Literal::integer(1)))
        },
    )));
}

/// `if`: non-AC, three-ary, native-free. Driven entirely by two bootstrap rules (§8 scenario S2).
fn register_if(context: &mut Context) {
    context.add_operator(Operator::new("if", AlgProp::none()));

    let t = Atom::variable("t", any_type());
    let e = Atom::variable("e", any_type());

    let when_true = Atom::apply_op("if", vec![Atom::Literal(Literal::Boolean(true)), t.clone(), e.clone()]);
    context.add_rule(when_true, t, Vec::new(), &[], Some("if-true".into())).expect("bootstrap rule is well-formed");

    let t = Atom::variable("t", any_type());
    let e = Atom::variable("e", any_type());
    let when_false = Atom::apply_op("if", vec![Atom::Literal(Literal::Boolean(false)), t.clone(), e.clone()]);
    context.add_rule(when_false, e, Vec::new(), &[], Some("if-false".into())).expect("bootstrap rule is well-formed");
}

/// `and`/`or`: associative, commutative, idempotent Boolean folds with complementary
/// identity/absorber pairs, demonstrating idempotent-AC matching end to end (§2.1).
fn register_and(context: &mut Context) {
    let mut props = AlgProp::none();
    props.associative = Some(PropertyValue::Bool(true));
    props.commutative = Some(PropertyValue::Bool(true));
    props.idempotent = Some(PropertyValue::Bool(true));
    props.identity = Some(Atom::Literal(Literal::Boolean(true)));
    props.absorber = Some(Atom::Literal(Literal::Boolean(false)));

    context.add_operator(Operator::new("and", props).with_native_handler(std::sync::Arc::new(
        |_operator, argument, _bindings, _context| {
            let mut rest = Vec::new();
            for element in seq_elements(argument) {
                match element {
                    Atom::Literal(Literal::Boolean(false)) => return Atom::Literal(Literal::Boolean(false)),
                    Atom::Literal(Literal::Boolean(true)) => {}
                    other => rest.push(other.clone()),
                }
            }
            rebuild("and", seq_properties(argument), dedup_idempotent(rest), Atom::Literal(Literal::Boolean(true)))
        },
    )));
}

/// Collapses repeated arguments under an idempotent operator (§2.1 `and`/`or`), keeping the first
/// occurrence of each distinct atom.
fn dedup_idempotent(elements: Vec<Atom>) -> Vec<Atom> {
    let mut kept: Vec<Atom> = Vec::with_capacity(elements.len());
    for element in elements {
        if !kept.contains(&element) {
            kept.push(element);
        }
    }
    kept
}

fn register_or(context: &mut Context) {
    let mut props = AlgProp::none();
    props.associative = Some(PropertyValue::Bool(true));
    props.commutative = Some(PropertyValue::Bool(true));
    props.idempotent = Some(PropertyValue::Bool(true));
    props.identity = Some(Atom::Literal(Literal::Boolean(false)));
    props.absorber = Some(Atom::Literal(Literal::Boolean(true)));

    context.add_operator(Operator::new("or", props).with_native_handler(std::sync::Arc::new(
        |_operator, argument, _bindings, _context| {
            let mut rest = Vec::new();
            for element in seq_elements(argument) {
                match element {
                    Atom::Literal(Literal::Boolean(true)) => return Atom::Literal(Literal::Boolean(true)),
                    Atom::Literal(Literal::Boolean(false)) => {}
                    other => rest.push(other.clone()),
                }
            }
            rebuild("or", seq_properties(argument), dedup_idempotent(rest), Atom::Literal(Literal::Boolean(false)))
        },
    )));
}

/// Registers the full bootstrap set (§2.1). `Context::with_bootstrap_operators` is the only
/// caller; nothing here runs for a plain `Context::new`.
pub(crate) fn register_bootstrap(context: &mut Context) {
    register_plus(context);
    register_times(context);
    register_if(context);
    register_and(context);
    register_or(context);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitset::RulesetBitSet;

    #[test]
    fn plus_folds_integer_literals() {
        let ctx = Context::with_bootstrap_operators();
        let subject = Atom::apply_op("plus", vec![Atom::Literal(Literal::integer(2)), Atom::Literal(Literal::integer(3))]);
        let (result, applied) = ctx.rewrite(&subject, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, Atom::Literal(Literal::integer(5)));
    }

    #[test]
    fn plus_leaves_symbolic_terms_in_place() {
        let ctx = Context::with_bootstrap_operators();
        let x = Atom::Literal(Literal::symbol("x"));
        let subject = Atom::apply_op("plus", vec![x.clone(), Atom::Literal(Literal::integer(0))]);
        let (result, _) = ctx.rewrite(&subject, RulesetBitSet::EMPTY).unwrap();
        assert_eq!(result, x);
    }

    #[test]
    fn times_absorber_collapses_to_zero() {
        let ctx = Context::with_bootstrap_operators();
        let x = Atom::Literal(Literal::symbol("x"));
        let subject = Atom::apply_op("times", vec![x, Atom::Literal(Literal::integer(0))]);
        let (result, applied) = ctx.rewrite(&subject, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, Atom::Literal(Literal::integer(0)));
    }

    #[test]
    fn if_true_takes_the_then_branch() {
        let ctx = Context::with_bootstrap_operators();
        let subject = Atom::apply_op(
            "if",
            vec![Atom::Literal(Literal::Boolean(true)), Atom::Literal(Literal::integer(1)), Atom::Literal(Literal::integer(2))],
        );
        let (result, applied) = ctx.rewrite(&subject, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, Atom::Literal(Literal::integer(1)));
    }

    #[test]
    fn if_false_takes_the_else_branch() {
        let ctx = Context::with_bootstrap_operators();
        let subject = Atom::apply_op(
            "if",
            vec![Atom::Literal(Literal::Boolean(false)), Atom::Literal(Literal::integer(1)), Atom::Literal(Literal::integer(2))],
        );
        let (result, applied) = ctx.rewrite(&subject, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, Atom::Literal(Literal::integer(2)));
    }

    #[test]
    fn and_short_circuits_on_a_false_argument() {
        let ctx = Context::with_bootstrap_operators();
        let x = Atom::Literal(Literal::symbol("x"));
        let subject = Atom::apply_op("and", vec![x, Atom::Literal(Literal::Boolean(false))]);
        let (result, applied) = ctx.rewrite(&subject, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, Atom::Literal(Literal::Boolean(false)));
    }

    #[test]
    fn or_drops_redundant_identity_arguments() {
        let ctx = Context::with_bootstrap_operators();
        let x = Atom::Literal(Literal::symbol("x"));
        let subject = Atom::apply_op("or", vec![x.clone(), Atom::Literal(Literal::Boolean(false))]);
        let (result, applied) = ctx.rewrite(&subject, RulesetBitSet::EMPTY).unwrap();
        assert!(applied);
        assert_eq!(result, x);
    }
}
