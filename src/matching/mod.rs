//! Matching (C4 match iterator framework + C5 specialized matchers, §4.2–§4.4).

mod atom_match;
mod groups;
pub mod outcome;
mod permute;
mod sequence;

pub use atom_match::match_atoms;
pub use outcome::{compose, BoxedBindingsIter, MatchOutcome};
