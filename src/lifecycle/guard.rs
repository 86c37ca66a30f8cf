//! In-flight guard rejecting overlapping build/send calls.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, TxError};

/// Busy flag for one lifecycle instance.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the flag or fail with `TxError::Busy`.
    pub fn try_acquire(&self) -> Result<InFlightGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| TxError::Busy)?;
        Ok(InFlightGuard { flag: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }
}

/// Releases the flag on drop, including when the future is abandoned.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
