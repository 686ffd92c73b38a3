//! A term-rewriting kernel: an atom algebra with AC/associative matching, a rule library with
//! ruleset bitsets and synthetic-rule completion, a memoizing normalization driver, and an
//! algebraic-properties object shared by all three (§1–§9).

mod abstractions;
mod alg_prop;
mod apply;
mod atom;
mod atom_seq;
mod bindings;
mod bitset;
mod builtins;
mod context;
mod error;
mod lambda;
mod literal;
mod map_pair;
mod matching;
mod memo;
mod operator;
mod root_type;
mod rule;
mod special_form;
mod timeout;
mod variable;

pub use abstractions::{BigFloat, BigInteger, BitStringValue, IString};
pub use alg_prop::{AlgProp, PropertyValue};
pub use atom::{Atom, AtomKind};
pub use bindings::Bindings;
pub use bitset::RulesetBitSet;
pub use context::Context;
pub use error::{RewriteError, RewriteResult};
pub use literal::Literal;
pub use matching::MatchOutcome;
pub use memo::MemoStats;
pub use operator::{NativeHandler, Operator, OperatorLibrary};
pub use root_type::RootType;
pub use rule::{RewriteRule, RuleLibrary};
pub use timeout::TimeoutFlag;
pub use variable::VariablePrefix;
