//! The `Literal` variant of `Atom`: the six ground value kinds the kernel knows about natively.

use std::fmt;

use crate::abstractions::{BigFloat, BigInteger, BitStringValue, IString};
use crate::root_type::RootType;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Literal {
    Integer(BigInteger),
    String(IString),
    Boolean(bool),
    Float(BigFloat),
    Symbol(IString),
    BitString(BitStringValue),
}

impl Literal {
    /// The named root type this literal belongs to (§3.1).
    pub fn root_type(&self) -> RootType {
        match self {
            Literal::Integer(_) => RootType::Integer,
            Literal::String(_) => RootType::StringT,
            Literal::Boolean(_) => RootType::Boolean,
            Literal::Float(_) => RootType::Float,
            Literal::Symbol(_) => RootType::SymbolT,
            Literal::BitString(_) => RootType::BitString,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Literal::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn integer(value: impl Into<BigInteger>) -> Self {
        Literal::Integer(value.into())
    }

    pub fn symbol(name: impl Into<IString>) -> Self {
        Literal::Symbol(name.into())
    }

    pub fn string(value: impl Into<IString>) -> Self {
        Literal::String(value.into())
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(i) => write!(f, "{i}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::Boolean(b) => write!(f, "{b}"),
            Literal::Float(fl) => write!(f, "{fl}"),
            Literal::Symbol(s) => write!(f, "{s}"),
            Literal::BitString(bs) => write!(f, "{bs}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_type_matches_variant() {
        assert_eq!(Literal::integer(3).root_type(), RootType::Integer);
        assert_eq!(Literal::Boolean(true).root_type(), RootType::Boolean);
    }
}
