//! Interval re-fetch with cancellation

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Background task calling `tick` every period until cancelled, dropped or
/// the tick returns `ControlFlow::Break`.
///
/// The first tick fires one period after spawning. A tick that runs longer
/// than the period delays the next one instead of queueing extra ticks.
#[derive(Debug)]
pub struct Poller {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn spawn<F, Fut>(period: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => {
                        debug!("Poller cancelled");
                        break;
                    }
                    _ = ticker.tick() => {}
                }
                // An in-flight tick runs to completion so its operation settles
                if tick().await.is_break() {
                    debug!("Poller finished");
                    break;
                }
            }
        });

        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop after the current tick, if any
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel and wait for the task to end
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn counting(count: &Arc<AtomicU32>, stop_at: u32) -> impl FnMut() -> std::future::Ready<ControlFlow<()>> {
        let count = count.clone();
        move || {
            let n = count.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n == stop_at {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_tick_waits_one_period() {
        let count = Arc::new(AtomicU32::new(0));
        let poller = Poller::spawn(Duration::from_secs(10), counting(&count, u32::MAX));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        poller.shutdown().await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_break_ends_polling() {
        let count = Arc::new(AtomicU32::new(0));
        let poller = Poller::spawn(Duration::from_secs(3), counting(&count, 3));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(poller.is_finished());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels() {
        let count = Arc::new(AtomicU32::new(0));
        drop(Poller::spawn(Duration::from_secs(1), counting(&count, u32::MAX)));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
