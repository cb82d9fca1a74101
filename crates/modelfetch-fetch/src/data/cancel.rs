use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    flag:   AtomicBool,
    notify: Notify,
}

/// Shared cancellation switch.
///
/// Can be polled with [`CancelFlag::is_cancelled`] or awaited with
/// [`CancelFlag::cancelled`], so a fetch parked on a silent connection or a
/// backoff sleep still wakes up when it is set.
#[derive(Clone, Default)]
pub struct CancelFlag {
    inner: Arc<Inner>,
}

impl fmt::Debug for CancelFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelFlag")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancelFlag {
    pub fn new() -> Self { Self::default() }

    /// Set the flag and wake every task waiting in [`CancelFlag::cancelled`].
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool { self.inner.flag.load(Ordering::SeqCst) }

    /// Resolves once the flag is set; immediately if it already is.
    pub async fn cancelled(&self) {
        loop {
            // Register before checking so a concurrent `cancel` is not missed.
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
