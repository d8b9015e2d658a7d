use std::future::Future;
use std::time::Duration;

use tokio::time;

/// Result of racing an operation against its deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled<T> {
    Completed(T),
    TimedOut,
}

/// Race `fut` against a timer of length `limit`; whichever settles first wins.
///
/// The timer is owned by the returned future. Once either side settles the
/// other is dropped, so a finished operation cancels its timer and an expired
/// timer drops the operation (closing anything it owned). Nothing fires late.
pub async fn within<F>(limit: Duration, fut: F) -> Settled<F::Output>
where
    F: Future,
{
    match time::timeout(limit, fut).await {
        Ok(v) => Settled::Completed(v),
        Err(_) => Settled::TimedOut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fast_operation_wins() {
        let out = within(Duration::from_secs(2), async { 7 }).await;
        assert_eq!(out, Settled::Completed(7));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_operation_times_out_and_is_dropped() {
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(dropped.clone());
        let started = time::Instant::now();
        let out = within(Duration::from_millis(500), async move {
            let _flag = flag;
            std::future::pending::<()>().await
        })
        .await;
        assert_eq!(out, Settled::TimedOut);
        assert!(dropped.load(Ordering::SeqCst));
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[tokio::test(start_paused = true)]
    async fn result_is_not_overridden_after_deadline() {
        let out = within(Duration::from_millis(100), async {
            time::sleep(Duration::from_millis(50)).await;
            "done"
        })
        .await;
        // Let the first deadline pass; the settled value stays put.
        time::sleep(Duration::from_millis(200)).await;
        assert_eq!(out, Settled::Completed("done"));
    }
}
