//! Cancellable timed wait for the settle phase.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use droplet_traits::Clock;

/// Shared flag asking an in-progress settle wait to end early.
///
/// Cheap to clone; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Clear the flag so the next wait runs in full.
    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Elapsed,
    Cancelled,
}

pub struct SettleTimer {
    clock: Arc<dyn Clock + Send + Sync>,
    poll: Duration,
    cancel: CancelToken,
}

impl SettleTimer {
    pub fn new(clock: Arc<dyn Clock + Send + Sync>, poll: Duration, cancel: CancelToken) -> Self {
        Self {
            clock,
            poll: poll.max(Duration::from_millis(1)),
            cancel,
        }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Sleep `total` in slices of at most `poll`, checking for cancellation
    /// before each slice.
    pub fn wait(&self, total: Duration) -> WaitOutcome {
        let start = self.clock.now();
        loop {
            if self.cancel.is_cancelled() {
                return WaitOutcome::Cancelled;
            }
            let elapsed = self.clock.now().saturating_duration_since(start);
            if elapsed >= total {
                return WaitOutcome::Elapsed;
            }
            self.clock.sleep((total - elapsed).min(self.poll));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use droplet_traits::ManualClock;

    #[test]
    fn waits_exact_total_on_manual_clock() {
        let clock = ManualClock::new();
        let t = SettleTimer::new(
            Arc::new(clock.clone()),
            Duration::from_millis(30),
            CancelToken::new(),
        );
        assert_eq!(t.wait(Duration::from_millis(3200)), WaitOutcome::Elapsed);
        assert_eq!(clock.elapsed(), Duration::from_millis(3200));
    }

    #[test]
    fn pre_cancelled_token_returns_immediately() {
        let clock = ManualClock::new();
        let token = CancelToken::new();
        token.cancel();
        let t = SettleTimer::new(Arc::new(clock.clone()), Duration::from_millis(10), token);
        assert_eq!(t.wait(Duration::from_secs(5)), WaitOutcome::Cancelled);
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[test]
    fn zero_wait_elapses() {
        let clock = ManualClock::new();
        let t = SettleTimer::new(Arc::new(clock), Duration::from_millis(10), CancelToken::new());
        assert_eq!(t.wait(Duration::ZERO), WaitOutcome::Elapsed);
    }
}
