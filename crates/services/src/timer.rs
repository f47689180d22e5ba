use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Render elapsed seconds as MM:SS.
#[must_use]
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// Cancellable elapsed-time ticker tied to a session's lifetime.
///
/// Publishes whole seconds since start on a watch channel once per period.
/// The task must not outlive the session context: `stop` is called on every
/// terminal transition, and dropping the timer aborts the task as a
/// backstop.
pub struct SessionTimer {
    handle: JoinHandle<()>,
    elapsed: watch::Receiver<u64>,
}

impl SessionTimer {
    /// Start ticking once per second.
    #[must_use]
    pub fn start() -> Self {
        Self::start_with_period(Duration::from_secs(1))
    }

    /// Start with a custom tick period (shorter in tests).
    #[must_use]
    pub fn start_with_period(period: Duration) -> Self {
        let (tx, rx) = watch::channel(0_u64);
        let started = tokio::time::Instant::now();
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick fires immediately; skip it so tick 1 lands a
            // full period after start.
            interval.tick().await;
            loop {
                interval.tick().await;
                let seconds = started.elapsed().as_secs();
                if tx.send(seconds).is_err() {
                    break;
                }
            }
        });
        Self {
            handle,
            elapsed: rx,
        }
    }

    /// Seconds elapsed at the latest tick.
    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        *self.elapsed.borrow()
    }

    /// Receiver for UIs that want to redraw on every tick.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.elapsed.clone()
    }

    /// Cancel the ticking task.
    pub fn stop(&self) {
        self.handle.abort();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(9), "00:09");
        assert_eq!(format_elapsed(65), "01:05");
        assert_eq!(format_elapsed(600), "10:00");
        assert_eq!(format_elapsed(6001), "100:01");
    }

    #[tokio::test]
    async fn ticks_then_stops() {
        let timer = SessionTimer::start_with_period(Duration::from_millis(10));
        let mut rx = timer.subscribe();

        rx.changed().await.unwrap();
        assert!(!timer.is_stopped());

        timer.stop();
        // The channel closes once the task is gone; no further ticks arrive.
        while rx.changed().await.is_ok() {}
        assert!(timer.is_stopped());
    }

    #[tokio::test]
    async fn drop_cancels_the_task() {
        let timer = SessionTimer::start_with_period(Duration::from_millis(10));
        let mut rx = timer.subscribe();
        drop(timer);
        while rx.changed().await.is_ok() {}
        // Reaching here means the sender side was dropped with the task.
    }
}
