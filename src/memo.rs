//! The memoization cache (C6, §4.5): maps `(atom, ruleset-bitset)` to `(result atom, applied
//! flag)`. Advisory: a correct entry must equal the fixpoint of the driver on that key under those
//! rulesets, but writes may be silently dropped under contention (§5: a write that would block past
//! a `try_lock` is simply dropped) and the cache may evict entries at any time — callers must never
//! treat a miss as meaningful.
//!
//! Keyed on `Atom::hash_secondary` combined with the ruleset bitset (§4.5), rechecked against full
//! structural equality on collision since distinct atoms can share a hash. Capacity-bounded
//! (default 4096 entries), evicting the oldest entry once full — a FIFO ring rather than LRU,
//! chosen because the memo is advisory and a miss is always safe, so tracking recency isn't worth
//! the bookkeeping.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::atom::Atom;
use crate::bitset::RulesetBitSet;

type Key = (u64, RulesetBitSet);

struct Entry {
    key_atom: Atom,
    result: Atom,
    applied: bool,
    cost: u64,
}

struct Inner {
    entries: HashMap<Key, Entry>,
    order: VecDeque<Key>,
}

pub struct MemoCache {
    inner: Mutex<Inner>,
    capacity: usize,
    hits: std::sync::atomic::AtomicU64,
    misses: std::sync::atomic::AtomicU64,
}

#[derive(Default, Clone, Copy, Debug)]
pub struct MemoStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl MemoCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: capacity.max(1),
            hits: std::sync::atomic::AtomicU64::new(0),
            misses: std::sync::atomic::AtomicU64::new(0),
        }
    }

    pub fn get(&self, atom: &Atom, rulesets: RulesetBitSet) -> Option<(Atom, bool)> {
        let key = (atom.hash_secondary(), rulesets);
        let Ok(inner) = self.inner.try_lock() else {
            return None;
        };
        let found = inner
            .entries
            .get(&key)
            .filter(|entry| entry.key_atom == *atom)
            .map(|entry| (entry.result.clone(), entry.applied));
        use std::sync::atomic::Ordering;
        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Writes never fail the caller (§7: "memoization never stores an entry produced by a
    /// cancelled computation" is the caller's job — this just best-effort records what it's
    /// given). A write that can't acquire the lock immediately is dropped.
    pub fn put(&self, atom: Atom, rulesets: RulesetBitSet, result: Atom, applied: bool, cost: u64) {
        let Ok(mut inner) = self.inner.try_lock() else {
            return;
        };
        let key = (atom.hash_secondary(), rulesets);
        if !inner.entries.contains_key(&key) {
            if inner.entries.len() >= self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.entries.remove(&oldest);
                }
            }
            inner.order.push_back(key);
        }
        inner.entries.insert(
            key,
            Entry {
                key_atom: atom,
                result,
                applied,
                cost,
            },
        );
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.entries.clear();
        inner.order.clear();
    }

    pub fn stats(&self) -> MemoStats {
        use std::sync::atomic::Ordering;
        let inner = self.inner.lock().unwrap();
        MemoStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: inner.entries.len(),
        }
    }
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new(4096)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn put_then_get_round_trips() {
        let cache = MemoCache::new(16);
        let key = Atom::Literal(Literal::integer(1));
        let result = Atom::Literal(Literal::integer(2));
        cache.put(key.clone(), RulesetBitSet::default_ruleset(), result.clone(), true, 1);
        assert_eq!(cache.get(&key, RulesetBitSet::default_ruleset()), Some((result, true)));
    }

    #[test]
    fn miss_on_different_ruleset_bitset() {
        let cache = MemoCache::new(16);
        let key = Atom::Literal(Literal::integer(1));
        cache.put(key.clone(), RulesetBitSet::default_ruleset(), key.clone(), false, 1);
        assert_eq!(cache.get(&key, RulesetBitSet::single(2)), None);
    }

    #[test]
    fn capacity_overflow_evicts_the_oldest_entry() {
        let cache = MemoCache::new(1);
        let a = Atom::Literal(Literal::integer(1));
        let b = Atom::Literal(Literal::integer(2));
        cache.put(a.clone(), RulesetBitSet::default_ruleset(), a.clone(), false, 1);
        cache.put(b.clone(), RulesetBitSet::default_ruleset(), b.clone(), false, 1);
        assert_eq!(cache.stats().entries, 1);
        assert_eq!(cache.get(&a, RulesetBitSet::default_ruleset()), None);
        assert!(cache.get(&b, RulesetBitSet::default_ruleset()).is_some());
    }
}
