//! The algebraic-properties record (§3.3): the five-slot object that drives matcher dispatch
//! (§4.3) and rule completion (§4.6.1).

use crate::atom::Atom;
use crate::bindings::Bindings;
use crate::error::RewriteError;

/// The value of one of the three Boolean-ish slots (`associative`, `commutative`, `idempotent`):
/// either a definite Boolean or an atom standing in for "unknown, resolve later".
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Bool(bool),
    Unknown(Atom),
}

impl PropertyValue {
    /// `true` only for a definite `Bool(true)`; unknown atoms never count as "has the property"
    /// for matcher-dispatch purposes (§4.1: "only properties that resolve to a Boolean `true`
    /// enable the corresponding matching mode").
    pub fn is_true(&self) -> bool {
        matches!(self, PropertyValue::Bool(true))
    }

    fn negate(&self) -> Self {
        match self {
            PropertyValue::Bool(b) => PropertyValue::Bool(!b),
            PropertyValue::Unknown(a) => PropertyValue::Unknown(a.clone()),
        }
    }

    fn substitute(&self, bindings: &Bindings) -> Self {
        match self {
            PropertyValue::Bool(b) => PropertyValue::Bool(*b),
            PropertyValue::Unknown(a) => PropertyValue::Unknown(a.substitute(bindings)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct AlgProp {
    pub associative: Option<PropertyValue>,
    pub commutative: Option<PropertyValue>,
    pub idempotent: Option<PropertyValue>,
    pub absorber: Option<Atom>,
    pub identity: Option<Atom>,
}

impl AlgProp {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_associative(&self) -> bool {
        self.associative.as_ref().is_some_and(PropertyValue::is_true)
    }

    pub fn is_commutative(&self) -> bool {
        self.commutative.as_ref().is_some_and(PropertyValue::is_true)
    }

    pub fn is_idempotent(&self) -> bool {
        self.idempotent.as_ref().is_some_and(PropertyValue::is_true)
    }

    /// Idempotency, an absorber, or an identity all require associativity (§3.3 constraint).
    pub fn validate(&self) -> Result<(), RewriteError> {
        let needs_assoc = self.idempotent.is_some() || self.absorber.is_some() || self.identity.is_some();
        if needs_assoc && !self.is_associative() {
            return Err(RewriteError::IllegalProperties(
                "idempotent/absorber/identity require associative = true".to_string(),
            ));
        }
        Ok(())
    }

    /// `join(p, q)`: every slot of `q` that is present overrides the corresponding slot of `p`.
    pub fn join(&self, other: &AlgProp) -> AlgProp {
        AlgProp {
            associative: other.associative.clone().or_else(|| self.associative.clone()),
            commutative: other.commutative.clone().or_else(|| self.commutative.clone()),
            idempotent: other.idempotent.clone().or_else(|| self.idempotent.clone()),
            absorber: other.absorber.clone().or_else(|| self.absorber.clone()),
            identity: other.identity.clone().or_else(|| self.identity.clone()),
        }
    }

    /// `negate(p)`: Boolean-literal slots are logically inverted; `None`, unknown, absorber, and
    /// identity slots pass through unchanged. Used by the matcher's absorber/identity-elimination
    /// preprocessing to ask "does NOT have property X" without rebuilding a whole record.
    pub fn negate(&self) -> AlgProp {
        AlgProp {
            associative: self.associative.as_ref().map(PropertyValue::negate),
            commutative: self.commutative.as_ref().map(PropertyValue::negate),
            idempotent: self.idempotent.as_ref().map(PropertyValue::negate),
            absorber: self.absorber.clone(),
            identity: self.identity.clone(),
        }
    }

    pub fn substitute(&self, bindings: &Bindings) -> AlgProp {
        AlgProp {
            associative: self.associative.as_ref().map(|v| v.substitute(bindings)),
            commutative: self.commutative.as_ref().map(|v| v.substitute(bindings)),
            idempotent: self.idempotent.as_ref().map(|v| v.substitute(bindings)),
            absorber: self.absorber.as_ref().map(|a| a.substitute(bindings)),
            identity: self.identity.as_ref().map(|a| a.substitute(bindings)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_overrides_present_slots_only() {
        let p = AlgProp {
            associative: Some(PropertyValue::Bool(true)),
            commutative: Some(PropertyValue::Bool(false)),
            ..AlgProp::none()
        };
        let q = AlgProp {
            commutative: Some(PropertyValue::Bool(true)),
            ..AlgProp::none()
        };
        let joined = p.join(&q);
        assert!(joined.is_associative());
        assert!(joined.is_commutative());
    }

    #[test]
    fn negate_flips_only_boolean_slots() {
        let p = AlgProp {
            associative: Some(PropertyValue::Bool(true)),
            ..AlgProp::none()
        };
        let negated = p.negate();
        assert!(!negated.is_associative());
    }

    #[test]
    fn idempotent_without_associative_is_illegal() {
        let p = AlgProp {
            idempotent: Some(PropertyValue::Bool(true)),
            ..AlgProp::none()
        };
        assert!(p.validate().is_err());
    }
}
