//! Navigation epochs.
//!
//! Every navigation begins a new epoch. Work started under an older epoch
//! checks its [`NavigationToken`] when it resumes and drops its results if
//! the visitor has moved on.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counter of navigations for one page lifetime.
#[derive(Debug, Clone, Default)]
pub struct NavigationEpoch {
    current: Arc<AtomicU64>,
}

impl NavigationEpoch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new navigation, superseding every earlier token.
    #[must_use]
    pub fn begin(&self) -> NavigationToken {
        let epoch = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        NavigationToken {
            epoch,
            current: Arc::clone(&self.current),
        }
    }

    #[must_use]
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

/// Proof that work belongs to a particular navigation.
#[derive(Debug, Clone)]
pub struct NavigationToken {
    epoch: u64,
    current: Arc<AtomicU64>,
}

impl NavigationToken {
    #[must_use]
    pub const fn epoch(&self) -> u64 {
        self.epoch
    }

    /// False once a later navigation has begun.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.epoch
    }
}
