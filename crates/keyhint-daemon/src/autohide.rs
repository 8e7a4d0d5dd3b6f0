//! Single-shot hide timer for peek mode
//!
//! Only one deadline exists at a time. Arming again replaces it, so the
//! last request wins; cancelling drops it.

use tokio::time::{sleep_until, Instant};

#[derive(Debug, Default)]
pub struct AutoHide {
    deadline: Option<Instant>,
}

impl AutoHide {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Resolves at the deadline. Never resolves while disarmed.
    pub async fn expired(&self) {
        match self.deadline {
            Some(deadline) => sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_fires_at_deadline() {
        let start = Instant::now();
        let mut timer = AutoHide::new();
        timer.arm(start + Duration::from_millis(500));

        timer.expired().await;
        assert!(Instant::now() >= start + Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_replaces_deadline() {
        let start = Instant::now();
        let mut timer = AutoHide::new();
        timer.arm(start + Duration::from_millis(500));
        timer.arm(start + Duration::from_millis(2000));

        timer.expired().await;
        assert!(Instant::now() >= start + Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarmed_never_fires() {
        let mut timer = AutoHide::new();
        timer.arm(Instant::now() + Duration::from_millis(10));
        timer.cancel();
        assert!(!timer.is_armed());

        let fired = tokio::time::timeout(Duration::from_secs(60), timer.expired()).await;
        assert!(fired.is_err());
    }
}
