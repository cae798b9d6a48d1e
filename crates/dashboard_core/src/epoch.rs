use std::sync::atomic::{AtomicU64, Ordering};

/// Tag of one issued fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Epoch(u64);

impl Epoch {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Monotonic counter deciding which in-flight response may still be applied.
#[derive(Debug, Default)]
pub struct EpochGuard {
    current: AtomicU64,
}

impl EpochGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tags a new request, superseding every earlier one.
    pub fn issue(&self) -> Epoch {
        Epoch(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Supersedes outstanding requests without tagging a new one.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> Epoch {
        Epoch(self.current.load(Ordering::SeqCst))
    }

    pub fn is_current(&self, epoch: Epoch) -> bool {
        self.current() == epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_epoch_is_current() {
        let guard = EpochGuard::new();
        let first = guard.issue();
        let second = guard.issue();
        assert_eq!(first.value(), 1);
        assert_eq!(second.value(), 2);
        assert!(!guard.is_current(first));
        assert!(guard.is_current(second));

        guard.invalidate();
        assert!(!guard.is_current(second));
    }
}
