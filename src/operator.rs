//! The operator library (C9, §4.9): a registry of operators with algebraic properties and
//! optional native handlers, referenced from atoms only by name (`Atom::OperatorRef`).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::abstractions::IString;
use crate::alg_prop::AlgProp;
use crate::atom::Atom;
use crate::bindings::Bindings;
use crate::context::Context;

/// `(operator, argument atom, bindings, context) -> atom`, per §4.9/§9: a compile-time Rust
/// closure, never dynamically compiled or interpreted source (§ REDESIGN FLAGS).
pub type NativeHandler = Arc<dyn Fn(&Operator, &Atom, &Bindings, &Context) -> Atom + Send + Sync>;

#[derive(Clone)]
pub struct Operator {
    pub name: IString,
    pub parameters: Vec<Atom>,
    pub result_type: Atom,
    pub properties: AlgProp,
    pub native_handler: Option<NativeHandler>,
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("result_type", &self.result_type)
            .field("properties", &self.properties)
            .field("has_native_handler", &self.native_handler.is_some())
            .finish()
    }
}

impl Operator {
    pub fn new(name: impl Into<IString>, properties: AlgProp) -> Self {
        Self {
            name: name.into(),
            parameters: Vec::new(),
            result_type: Atom::RootType(crate::root_type::RootType::Any),
            properties,
            native_handler: None,
        }
    }

    pub fn with_native_handler(mut self, handler: NativeHandler) -> Self {
        self.native_handler = Some(handler);
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<Atom>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_result_type(mut self, result_type: Atom) -> Self {
        self.result_type = result_type;
        self
    }

    pub fn invoke(&self, argument: &Atom, bindings: &Bindings, context: &Context) -> Option<Atom> {
        self.native_handler.as_ref().map(|handler| handler(self, argument, bindings, context))
    }
}

/// Append-only within a context (§4.9): redefining an operator produces a fresh registration
/// rather than mutating the old one in place.
#[derive(Clone, Default)]
pub struct OperatorLibrary {
    operators: HashMap<IString, Arc<Operator>>,
}

impl OperatorLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operator: Operator) -> Arc<Operator> {
        let name = operator.name;
        let entry = Arc::new(operator);
        self.operators.insert(name, entry.clone());
        entry
    }

    pub fn get(&self, name: &IString) -> Option<Arc<Operator>> {
        self.operators.get(name).cloned()
    }

    pub fn properties_of(&self, name: &IString) -> AlgProp {
        self.get(name).map(|op| op.properties.clone()).unwrap_or_default()
    }

    pub fn list_all(&self) -> impl Iterator<Item = &Arc<Operator>> {
        self.operators.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_lookup_round_trips() {
        let mut lib = OperatorLibrary::new();
        lib.register(Operator::new("plus", AlgProp::none()));
        assert!(lib.get(&IString::from("plus")).is_some());
        assert!(lib.get(&IString::from("times")).is_none());
    }

    #[test]
    fn redefinition_replaces_the_registration() {
        let mut lib = OperatorLibrary::new();
        lib.register(Operator::new("f", AlgProp::none()));
        let mut commutative = AlgProp::none();
        commutative.commutative = Some(crate::alg_prop::PropertyValue::Bool(true));
        lib.register(Operator::new("f", commutative));
        assert!(lib.get(&IString::from("f")).unwrap().properties.is_commutative());
    }
}
