//! Cooperative cancellation for oracle scans.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

/// Flag polled by a scan between units of work. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct ScanCancel(Arc<AtomicBool>);

impl ScanCancel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `Err` once cancelled.
    pub fn check(&self) -> Result<(), ScanCancelled> {
        if self.is_cancelled() {
            Err(ScanCancelled)
        } else {
            Ok(())
        }
    }
}

/// A scan stopped early because its flag was set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Oracle scan cancelled")]
pub struct ScanCancelled;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_flag() {
        let cancel = ScanCancel::new();
        let seen_by_scan = cancel.clone();
        assert_eq!(seen_by_scan.check(), Ok(()));

        cancel.cancel();
        assert!(seen_by_scan.is_cancelled());
        assert_eq!(seen_by_scan.check(), Err(ScanCancelled));
    }
}
