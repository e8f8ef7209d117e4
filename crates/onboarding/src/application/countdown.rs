//! Welcome Countdown
//!
//! Cancellable one-second countdown that auto-advances the flow out of
//! the welcome screen. Owned and disposed by whatever owns the
//! `success` state; it must be cancelled before its session is torn
//! down so the callback cannot fire against a discarded session.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Cancellable auto-advance timer
pub struct WelcomeCountdown {
    remaining: watch::Receiver<u32>,
    handle: JoinHandle<()>,
    fired: Arc<AtomicBool>,
}

impl WelcomeCountdown {
    /// Start counting down from `ceil(delay / 1s)` whole seconds.
    ///
    /// `on_expire` runs at most once, when the countdown reaches zero
    /// without being cancelled.
    pub fn start(delay: Duration, on_expire: impl FnOnce() + Send + 'static) -> Self {
        let seconds = delay.as_millis().div_ceil(1000) as u32;
        let (tx, rx) = watch::channel(seconds);
        let fired = Arc::new(AtomicBool::new(false));

        let fired_in_task = fired.clone();
        let handle = tokio::spawn(async move {
            let mut left = seconds;
            let mut ticks = tokio::time::interval(Duration::from_secs(1));
            // The first interval tick completes immediately.
            ticks.tick().await;
            while left > 0 {
                ticks.tick().await;
                left -= 1;
                let _ = tx.send(left);
            }
            // The swap also guards against a cancel racing the final tick.
            if !fired_in_task.swap(true, Ordering::SeqCst) {
                tracing::debug!("Welcome countdown expired");
                on_expire();
            }
        });

        Self {
            remaining: rx,
            handle,
            fired,
        }
    }

    /// Seconds left on the countdown
    pub fn remaining(&self) -> u32 {
        *self.remaining.borrow()
    }

    /// Stop the countdown without invoking the callback.
    ///
    /// Safe to call at any tick, and after expiry (a no-op then).
    pub fn cancel(&self) {
        self.fired.store(true, Ordering::SeqCst);
        self.handle.abort();
    }
}

impl Drop for WelcomeCountdown {
    fn drop(&mut self) {
        self.cancel();
    }
}
