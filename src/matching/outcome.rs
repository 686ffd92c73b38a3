//! The match iterator framework (C4, §4.2): a match attempt produces one of `Fail`, `Single`, or
//! `Many`, where `Many` wraps a pull-based, finite iterator of bindings rather than a collected
//! `Vec` — a caller that only needs the first success (the driver does, via `doRewrite`, §4.8)
//! never pays for enumerating a whole commutative permutation space.

use crate::atom::Atom;
use crate::bindings::Bindings;
use crate::timeout::TimeoutFlag;

pub type BoxedBindingsIter = Box<dyn Iterator<Item = Bindings>>;

pub enum MatchOutcome {
    Fail {
        reason: String,
        pattern: Box<Atom>,
        subject: Box<Atom>,
        cause: Option<Box<MatchOutcome>>,
    },
    Single(Bindings),
    Many(BoxedBindingsIter),
}

impl MatchOutcome {
    pub fn fail(reason: impl Into<String>, pattern: &Atom, subject: &Atom) -> Self {
        MatchOutcome::Fail {
            reason: reason.into(),
            pattern: Box::new(pattern.clone()),
            subject: Box::new(subject.clone()),
            cause: None,
        }
    }

    pub fn fail_because(reason: impl Into<String>, pattern: &Atom, subject: &Atom, cause: MatchOutcome) -> Self {
        MatchOutcome::Fail {
            reason: reason.into(),
            pattern: Box::new(pattern.clone()),
            subject: Box::new(subject.clone()),
            cause: Some(Box::new(cause)),
        }
    }

    pub fn is_fail(&self) -> bool {
        matches!(self, MatchOutcome::Fail { .. })
    }

    pub fn many(bindings: Vec<Bindings>, pattern: &Atom, subject: &Atom) -> Self {
        if bindings.is_empty() {
            MatchOutcome::fail("no candidate bindings", pattern, subject)
        } else {
            MatchOutcome::Many(Box::new(bindings.into_iter()))
        }
    }

    /// Collapses any outcome into an iterator: `Fail` becomes empty, `Single` a one-shot iterator.
    pub fn into_iter(self) -> BoxedBindingsIter {
        match self {
            MatchOutcome::Fail { .. } => Box::new(std::iter::empty()),
            MatchOutcome::Single(b) => Box::new(std::iter::once(b)),
            MatchOutcome::Many(it) => it,
        }
    }

    /// The first binding this outcome would yield, if any (§4.8 `doRewrite` only ever needs the
    /// first binding that also satisfies the rule's guards).
    pub fn first(self) -> Option<Bindings> {
        match self {
            MatchOutcome::Fail { .. } => None,
            MatchOutcome::Single(b) => Some(b),
            MatchOutcome::Many(mut it) => it.next(),
        }
    }
}

/// `Many(iter) ~> f`: flat-maps each binding through `f`, preserving laziness and checking the
/// shared timeout flag between source items. Once the flag trips the composed iterator stops
/// yielding, which is how cancellation surfaces to every specialized matcher without each of them
/// re-implementing the check (§4.2 "every matcher MUST check a cooperative flag between
/// iterations").
pub fn compose(outcome: MatchOutcome, timeout: TimeoutFlag, f: impl Fn(Bindings) -> MatchOutcome + 'static) -> MatchOutcome {
    match outcome {
        MatchOutcome::Fail { .. } => outcome,
        MatchOutcome::Single(b) => {
            if timeout.is_set() {
                return MatchOutcome::Many(Box::new(std::iter::empty()));
            }
            f(b)
        }
        MatchOutcome::Many(iter) => {
            let flat = iter.take_while(move |_| !timeout.is_set()).flat_map(move |b| f(b).into_iter());
            MatchOutcome::Many(Box::new(flat))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    fn atom(n: i64) -> Atom {
        Atom::Literal(Literal::integer(n))
    }

    #[test]
    fn compose_flattens_many_over_single() {
        let a = atom(1);
        let bindings = vec![Bindings::new(), Bindings::new()];
        let outcome = MatchOutcome::many(bindings, &a, &a);
        let composed = compose(outcome, TimeoutFlag::new(), |b| MatchOutcome::Single(b));
        assert_eq!(composed.into_iter().count(), 2);
    }

    #[test]
    fn compose_stops_once_timeout_trips() {
        let a = atom(1);
        let outcome = MatchOutcome::many(vec![Bindings::new(), Bindings::new(), Bindings::new()], &a, &a);
        let timeout = TimeoutFlag::new();
        timeout.set();
        let composed = compose(outcome, timeout, |b| MatchOutcome::Single(b));
        assert_eq!(composed.into_iter().count(), 0);
    }
}
