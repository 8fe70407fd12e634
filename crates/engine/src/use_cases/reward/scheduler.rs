//! Cancellable one-shot timers.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns a set of delayed callbacks. Dropping it cancels whatever has not fired.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    cancel_token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` after `delay` unless cancelled first. Must be called inside a tokio runtime.
    pub fn schedule<F>(&mut self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let cancel_token = self.cancel_token.clone();
        self.handles.retain(|h| !h.is_finished());
        self.handles.push(tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = cancel_token.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    if !cancel_token.is_cancelled() {
                        f();
                    }
                }
            }
        }));
    }

    /// Timers that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.handles.iter().filter(|h| !h.is_finished()).count()
    }

    /// Cancel everything scheduled so far. The scheduler stays usable.
    pub fn cancel_all(&mut self) {
        self.cancel_token.cancel();
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        self.cancel_token = CancellationToken::new();
    }
}

impl Drop for TimerScheduler {
    fn drop(&mut self) {
        self.cancel_token.cancel();
        for handle in &self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counter() -> (Arc<AtomicU32>, impl Fn() -> Box<dyn FnOnce() + Send>) {
        let count = Arc::new(AtomicU32::new(0));
        let c = count.clone();
        let make = move || -> Box<dyn FnOnce() + Send> {
            let c = c.clone();
            Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, make)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (count, make) = counter();
        let mut scheduler = TimerScheduler::new();
        scheduler.schedule(Duration::from_millis(100), make());

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timers_never_fire() {
        let (count, make) = counter();
        let mut scheduler = TimerScheduler::new();
        scheduler.schedule(Duration::from_millis(50), make());
        scheduler.schedule(Duration::from_millis(500), make());

        tokio::time::sleep(Duration::from_millis(60)).await;
        scheduler.cancel_all();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let (count, make) = counter();
        {
            let mut scheduler = TimerScheduler::new();
            scheduler.schedule(Duration::from_millis(10), make());
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
