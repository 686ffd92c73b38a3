//! Cooperative cancellation (§4.2, §5, §7): a single shared flag, checked by the driver and by
//! every matcher iterator between iterations. Tripping the flag does not unwind anything by
//! itself; the next suspension point notices it and the driver turns that into a `TimedOut`
//! error. In-flight atom construction always completes — there is nothing to roll back.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Clone, Default)]
pub struct TimeoutFlag(Arc<AtomicBool>);

impl TimeoutFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_flag_is_unset() {
        assert!(!TimeoutFlag::new().is_set());
    }

    #[test]
    fn set_is_visible_through_clones() {
        let flag = TimeoutFlag::new();
        let clone = flag.clone();
        clone.set();
        assert!(flag.is_set());
    }
}
