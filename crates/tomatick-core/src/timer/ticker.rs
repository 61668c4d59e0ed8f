//! Clock source for the countdown.
//!
//! Emits one tick per wall-clock second from a dedicated tokio task, so the
//! countdown keeps moving even when the consumer is busy. The channel is
//! bounded at one tick: a stalled or re-armed consumer never receives a
//! backlog of missed seconds. Session-duration accounting does not depend
//! on tick delivery at all (the engine logs configured minutes and keeps a
//! wall-clock start stamp); ticks only drive the visible countdown.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// One-second tick emitter. Single subscriber per arm.
pub struct Ticker {
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn new() -> Self {
        Self { handle: None }
    }

    /// Begin emitting. Replaces any previous subscription; the old task is
    /// aborted first so no tick from it can be observed afterwards.
    pub fn arm(&mut self) -> mpsc::Receiver<()> {
        self.disarm();
        let (tx, rx) = mpsc::channel(1);
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first interval tick fires immediately; swallow it so the
            // first delivery lands a full second after arming.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tx.try_send(()).is_err() && tx.is_closed() {
                    break;
                }
            }
        }));
        rx
    }

    /// Stop emitting. Takes effect before any further tick is observable.
    pub fn disarm(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }
}

impl Default for Ticker {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn delivers_one_tick_per_second() {
        let mut ticker = Ticker::new();
        let mut rx = ticker.arm();
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_consumer_gets_no_backlog() {
        let mut ticker = Ticker::new();
        let mut rx = ticker.arm();

        // Five seconds pass without the consumer draining.
        for _ in 0..5 {
            tokio::time::advance(Duration::from_secs(1)).await;
            tokio::task::yield_now().await;
        }
        // At most the single buffered tick is waiting.
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_stops_delivery() {
        let mut ticker = Ticker::new();
        let mut rx = ticker.arm();
        assert!(ticker.is_armed());

        ticker.disarm();
        assert!(!ticker.is_armed());
        tokio::task::yield_now().await;

        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;
        // Channel is closed with nothing buffered.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn rearm_resumes_clean() {
        let mut ticker = Ticker::new();
        let mut first = ticker.arm();
        tokio::time::advance(Duration::from_secs(3)).await;
        tokio::task::yield_now().await;

        let mut second = ticker.arm();
        tokio::task::yield_now().await;
        // No tick from before the re-arm point leaks into the new
        // subscription.
        assert!(second.try_recv().is_err());

        tokio::time::advance(Duration::from_secs(1)).await;
        tokio::task::yield_now().await;
        assert!(second.try_recv().is_ok());
        drop(first);
    }
}
