//! Ruleset bitsets.
//!
//! Bit 0 is reserved for the `DEFAULT` ruleset, which is enabled in every freshly-created
//! `Context`. The set is capped at 64 rulesets (see SPEC_FULL.md §3.5) so that it can be a `Copy`
//! `u64` newtype and, in particular, so that `Atom`'s `clean_rulesets` metadata (§3.1) can be
//! updated lock-free via `AtomicU64::fetch_or`.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

pub const DEFAULT_BIT: u32 = 0;
pub const MAX_RULESETS: u32 = 64;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RulesetBitSet(u64);

impl RulesetBitSet {
    pub const EMPTY: Self = Self(0);

    pub fn single(bit: u32) -> Self {
        assert!(bit < MAX_RULESETS, "ruleset bit {bit} out of range");
        Self(1u64 << bit)
    }

    pub fn from_raw(bits: u64) -> Self {
        Self(bits)
    }

    pub fn raw(self) -> u64 {
        self.0
    }

    pub fn default_ruleset() -> Self {
        Self::single(DEFAULT_BIT)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, bit: u32) -> bool {
        bit < MAX_RULESETS && (self.0 >> bit) & 1 == 1
    }

    pub fn with(self, bit: u32) -> Self {
        Self(self.0 | (1u64 << bit))
    }

    pub fn without(self, bit: u32) -> Self {
        Self(self.0 & !(1u64 << bit))
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if `self` is a superset of `other` (every bit in `other` is also set in `self`).
    pub fn is_superset_of(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl fmt::Debug for RulesetBitSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RulesetBitSet({:#066b})", self.0)
    }
}

/// Lock-free, monotonically-growing mirror of a `RulesetBitSet`, used for `Atom::clean_rulesets`.
/// Only ORing in bits is ever needed (§3.1), so a relaxed `fetch_or` is race-free: concurrent
/// writers can only add information, never lose it.
#[derive(Debug, Default)]
pub struct CleanRulesets(AtomicU64);

impl CleanRulesets {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn get(&self) -> RulesetBitSet {
        RulesetBitSet::from_raw(self.0.load(Ordering::Relaxed))
    }

    pub fn mark_clean(&self, rulesets: RulesetBitSet) {
        self.0.fetch_or(rulesets.raw(), Ordering::Relaxed);
    }
}

impl Clone for CleanRulesets {
    fn clone(&self) -> Self {
        Self(AtomicU64::new(self.0.load(Ordering::Relaxed)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bit_is_zero() {
        let bits = RulesetBitSet::default_ruleset();
        assert!(bits.contains(0));
        assert!(!bits.contains(1));
    }

    #[test]
    fn union_and_superset() {
        let a = RulesetBitSet::single(1).union(RulesetBitSet::single(3));
        let b = RulesetBitSet::single(1);
        assert!(a.is_superset_of(b));
        assert!(!b.is_superset_of(a));
    }

    #[test]
    fn clean_rulesets_only_grows() {
        let clean = CleanRulesets::new();
        clean.mark_clean(RulesetBitSet::single(0));
        clean.mark_clean(RulesetBitSet::single(2));
        assert!(clean.get().contains(0));
        assert!(clean.get().contains(2));
        assert!(!clean.get().contains(1));
    }
}
