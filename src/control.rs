//! A one-shot, broadcast-style shutdown signal shared by the accept loop,
//! the sampler loop, and `main`'s `ctrl_c` handler.
//!
//! An `AtomicBool` plus a `Notify` pair — the simpler one-way latch a
//! supervisor shutdown needs, since nothing here ever un-sets it.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct ShutdownFlag {
    flagged: AtomicBool,
    notify: Notify,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            flagged: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    /// Sets the flag and wakes every waiter. Idempotent.
    pub fn set(&self) {
        self.flagged.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_set(&self) -> bool {
        self.flagged.load(Ordering::SeqCst)
    }

    /// Resolves once [`Self::set`] has been called. Safe to call before or
    /// after `set`: already-set flags resolve immediately next poll.
    pub async fn wait_until_set(&self) {
        if self.is_set() {
            return;
        }
        let notified = self.notify.notified();
        if self.is_set() {
            return;
        }
        notified.await;
    }
}
