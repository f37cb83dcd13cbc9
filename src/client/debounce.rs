//! Resettable quiet-period timer for URL synchronisation

use tokio::time::{Duration, Instant};

/// Whether a URL update is waiting for the quiet period to end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    PendingUrlSync { deadline: Instant },
}

/// Explicit debounce state machine
///
/// `Idle → arm → PendingUrlSync → fire_if_due → Idle`. Arming while pending
/// pushes the deadline out again, so only the last of a burst of changes is
/// acted on.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    state: SyncState,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: SyncState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, SyncState::PendingUrlSync { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            SyncState::Idle => None,
            SyncState::PendingUrlSync { deadline } => Some(deadline),
        }
    }

    /// Start (or restart) the quiet period
    pub fn arm(&mut self) -> Instant {
        let deadline = Instant::now() + self.delay;
        self.state = SyncState::PendingUrlSync { deadline };
        deadline
    }

    pub fn cancel(&mut self) {
        self.state = SyncState::Idle;
    }

    /// Go back to idle if the deadline has passed; `true` means "act now"
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.state {
            SyncState::PendingUrlSync { deadline } if now >= deadline => {
                self.state = SyncState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Sleep until the current deadline, returning immediately when idle
    pub async fn wait(&self) {
        if let Some(deadline) = self.deadline() {
            tokio::time::sleep_until(deadline).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_quiet_period() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.arm();
        assert!(debouncer.is_pending());

        tokio::time::advance(Duration::from_millis(299)).await;
        assert!(!debouncer.fire_if_due(Instant::now()));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(debouncer.fire_if_due(Instant::now()));
        assert_eq!(debouncer.state(), SyncState::Idle);
        assert!(!debouncer.fire_if_due(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearming_restarts_the_window() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.arm();
        tokio::time::advance(Duration::from_millis(200)).await;
        debouncer.arm();
        tokio::time::advance(Duration::from_millis(200)).await;
        assert!(!debouncer.fire_if_due(Instant::now()));

        debouncer.wait().await;
        assert!(debouncer.fire_if_due(Instant::now()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_returns_to_idle() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.arm();
        debouncer.cancel();
        assert_eq!(debouncer.deadline(), None);
        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!debouncer.fire_if_due(Instant::now()));
    }
}
