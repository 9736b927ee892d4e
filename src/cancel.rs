//! Cooperative cancellation shared between a caller and an extraction worker.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cloneable cancellation flag.
///
/// Any clone may request cancellation; the extraction loop polls it once per
/// bucket and clears it when it acts on it.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    /// Observe and clear a pending request
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_clears_flag() {
        let token = CancellationToken::new();
        assert!(!token.take());

        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
        assert!(token.take());
        assert!(!token.is_cancelled());
        assert!(!token.take());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let remote = token.clone();

        std::thread::spawn(move || remote.cancel()).join().unwrap();
        assert!(token.is_cancelled());
    }
}
