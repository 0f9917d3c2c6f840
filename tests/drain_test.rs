//! Integration tests for drain accounting: cancelled versus in-flight work,
//! ledger reporting, and flag resets.

use std::time::Duration;

use anyhow::anyhow;
use taskgate::builders::SchedulerBuilder;
use taskgate::core::{Scheduler, TaskError};
use taskgate::runtime::TokioSpawner;

fn build<T: Clone + Send + 'static>(builder: SchedulerBuilder) -> Scheduler<T, TokioSpawner> {
    builder.build(TokioSpawner::current()).unwrap()
}

#[tokio::test]
async fn test_drain_without_waiting() {
    // Default config: max_concurrent = 3.
    let scheduler: Scheduler<u32, _> = build(SchedulerBuilder::new());

    // Three quick tasks settle and land in the ledger.
    for i in 1..=3u32 {
        scheduler
            .submit(move || async move { Ok(i) })
            .await
            .unwrap();
    }

    // Four slow tasks: three start running, the fourth stays queued.
    let slow: Vec<_> = (4..=7u32)
        .map(|i| {
            scheduler.submit(move || async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(i)
            })
        })
        .collect();
    assert_eq!(scheduler.running_count(), 3);
    assert_eq!(scheduler.queued_count(), 1);

    let mut report = scheduler.drain(false).await;
    report.completed.sort_unstable();
    assert_eq!(report.completed, vec![1, 2, 3]);
    assert_eq!(report.cancelled, 1);
    assert_eq!(report.in_progress, 3);
    assert!(!scheduler.has_error());
    assert!(!scheduler.is_paused());

    // The cancelled task rejects; the in-flight ones still settle normally
    // and feed the ledger in the background.
    let mut slow = slow;
    let cancelled = slow.pop().unwrap();
    assert!(matches!(cancelled.await, Err(TaskError::Cancelled)));
    for handle in slow {
        handle.await.unwrap();
    }

    let mut later = scheduler.drain(false).await;
    later.completed.sort_unstable();
    assert_eq!(later.completed, vec![4, 5, 6]);
    assert_eq!(later.cancelled, 0);
    assert_eq!(later.in_progress, 0);
}

#[tokio::test]
async fn test_drain_with_waiting() {
    let scheduler: Scheduler<u32, _> = build(SchedulerBuilder::new());

    for i in 1..=3u32 {
        scheduler
            .submit(move || async move { Ok(i) })
            .await
            .unwrap();
    }

    // Three in-flight tasks: two succeed, one fails terminally.
    let h4 = scheduler.submit(|| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(4)
    });
    let h5 = scheduler.submit(|| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(5)
    });
    let h6 = scheduler.submit(|| async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Err(anyhow!("slow task failed"))
    });
    assert_eq!(scheduler.running_count(), 3);

    let mut report = scheduler.drain(true).await;
    report.completed.sort_unstable();
    // Previously settled results plus the fresh successes from the wait; the
    // failure is excluded but still settles its own handle.
    assert_eq!(report.completed, vec![1, 2, 3, 4, 5]);
    assert_eq!(report.cancelled, 0);
    assert_eq!(report.in_progress, 0);

    assert_eq!(h4.await.unwrap(), 4);
    assert_eq!(h5.await.unwrap(), 5);
    assert!(matches!(h6.await, Err(TaskError::Failed(_))));

    // Everything reported was also cleared from the ledger.
    let empty = scheduler.drain(false).await;
    assert!(empty.completed.is_empty());
}

#[tokio::test]
async fn test_drain_waits_through_retries() {
    let scheduler: Scheduler<u32, _> =
        build(SchedulerBuilder::new().with_max_concurrent(1).with_retry_times(1));

    let ha = {
        let attempts = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));
        scheduler.submit(move || {
            let n = attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst) + 1;
            async move {
                tokio::time::sleep(Duration::from_millis(30)).await;
                if n == 1 {
                    Err(anyhow!("first attempt fails"))
                } else {
                    Ok(42)
                }
            }
        })
    };
    let hb = scheduler.submit(|| async { Ok(9) });

    // Give the first attempt time to start before draining.
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(scheduler.running_count(), 1);
    assert_eq!(scheduler.queued_count(), 1);

    // The in-flight task fails mid-drain and retries; the drain keeps
    // waiting for its terminal settlement.
    let report = scheduler.drain(true).await;
    assert_eq!(report.completed, vec![42]);
    assert_eq!(report.cancelled, 1);
    assert_eq!(report.in_progress, 0);

    assert_eq!(ha.await.unwrap(), 42);
    assert!(matches!(hb.await, Err(TaskError::Cancelled)));
}

#[tokio::test]
async fn test_drain_resets_error_and_pause_flags() {
    let scheduler: Scheduler<u32, _> =
        build(SchedulerBuilder::new().with_max_concurrent(1).with_stop_on_error(true));

    let failing = scheduler.submit(|| async { Err(anyhow!("boom")) });
    assert!(failing.await.is_err());
    scheduler.pause();
    assert!(scheduler.has_error());
    assert!(scheduler.is_paused());

    let report = scheduler.drain(false).await;
    assert_eq!(report.cancelled, 0);
    assert_eq!(report.in_progress, 0);
    assert!(!scheduler.has_error());
    assert!(!scheduler.is_paused());

    let handle = scheduler.submit(|| async { Ok(1) });
    assert_eq!(handle.await.unwrap(), 1);
}

#[tokio::test]
async fn test_drained_scheduler_accepts_further_submissions() {
    let scheduler: Scheduler<u32, _> = build(SchedulerBuilder::new());

    scheduler.submit(|| async { Ok(1) }).await.unwrap();
    scheduler.drain(true).await;

    let handle = scheduler.submit(|| async { Ok(2) });
    assert_eq!(handle.await.unwrap(), 2);
    let report = scheduler.drain(false).await;
    assert_eq!(report.completed, vec![2]);
}
