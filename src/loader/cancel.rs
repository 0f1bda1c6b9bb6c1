use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One-shot request to suppress a pending load completion.
///
/// Consumed by [`cancel`](Self::cancel). Dropping a handle without calling it
/// leaves the load running.
pub struct CancelHandle {
    action: Box<dyn FnOnce()>,
}

impl CancelHandle {
    pub fn new<F>(action: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            action: Box::new(action),
        }
    }

    /// A handle whose cancellation does nothing.
    pub fn noop() -> Self {
        Self::new(|| {})
    }

    pub fn cancel(self) {
        (self.action)();
    }
}

impl fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CancelHandle")
    }
}

/// Shared flag for loaders that poll for cancellation across threads.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// A [`CancelHandle`] that raises this flag.
    pub fn handle(&self) -> CancelHandle {
        let flag = self.clone();
        CancelHandle::new(move || flag.cancel())
    }
}
