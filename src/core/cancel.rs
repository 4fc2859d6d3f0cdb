use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Process-wide, set-once stop flag shared by the coordinator, workers and
/// reloaders.
///
/// Clones share the same flag. Once [`cancel`](Self::cancel) has been called
/// every clone observes it on the next [`is_cancelled`](Self::is_cancelled),
/// and the flag is never cleared.
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    flag: Arc<AtomicBool>,
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the flag. Returns `true` only for the call that actually set it.
    pub fn cancel(&self) -> bool {
        !self.flag.swap(true, Ordering::AcqRel)
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}
