use serde::Serialize;
use tokio::sync::watch;

/// Point-in-time view of a [`ProgressTracker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub completed: u32,
    pub total: u32,
}

impl Progress {
    /// Whole percent, rounded down. An empty job reports 0 but is done.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (u64::from(self.completed) * 100 / u64::from(self.total)) as u8
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.total
    }
}

/// Completed/total counter written by one worker and read from anywhere.
///
/// Backed by a `watch` channel: reads never block the writer and
/// subscribers are woken on every change.
#[derive(Debug)]
pub struct ProgressTracker {
    tx: watch::Sender<Progress>,
}

impl ProgressTracker {
    pub fn new(total: u32) -> Self {
        let (tx, _rx) = watch::channel(Progress {
            completed: 0,
            total,
        });
        Self { tx }
    }

    /// Count one more unit of work. Never exceeds the total.
    pub fn advance(&self) -> Progress {
        self.tx.send_if_modified(|p| {
            if p.completed < p.total {
                p.completed += 1;
                true
            } else {
                false
            }
        });
        self.snapshot()
    }

    pub fn snapshot(&self) -> Progress {
        *self.tx.borrow()
    }

    pub fn percentage(&self) -> u8 {
        self.snapshot().percentage()
    }

    pub fn is_done(&self) -> bool {
        self.snapshot().is_done()
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_rounds_down() {
        let tracker = ProgressTracker::new(3);
        assert_eq!(tracker.percentage(), 0);
        tracker.advance();
        assert_eq!(tracker.percentage(), 33);
        tracker.advance();
        assert_eq!(tracker.percentage(), 66);
        assert!(!tracker.is_done());
        tracker.advance();
        assert_eq!(tracker.percentage(), 100);
        assert!(tracker.is_done());
    }

    #[test]
    fn test_advance_saturates() {
        let tracker = ProgressTracker::new(1);
        tracker.advance();
        let p = tracker.advance();
        assert_eq!(p.completed, 1);
        assert_eq!(p.percentage(), 100);
    }

    #[test]
    fn test_empty_total_is_done() {
        let tracker = ProgressTracker::new(0);
        assert!(tracker.is_done());
        assert_eq!(tracker.percentage(), 0);
        assert_eq!(tracker.advance().percentage(), 0);
    }

    #[test]
    fn test_percentage_is_monotonic() {
        let tracker = ProgressTracker::new(7);
        let mut last = tracker.percentage();
        for _ in 0..10 {
            let now = tracker.advance().percentage();
            assert!(now >= last);
            assert!(now <= 100);
            last = now;
        }
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let tracker = ProgressTracker::new(2);
        let mut rx = tracker.subscribe();
        tracker.advance();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().completed, 1);
    }
}
