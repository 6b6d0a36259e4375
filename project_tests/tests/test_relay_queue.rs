use lib_common::configs::RelayConfig;
use lib_common::core::RelayQueue;
use lib_common::model::ServerEvent;
use project_tests::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

fn named(i: usize) -> ServerEvent {
    ServerEvent {
        name: Some(format!("server-{i}")),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_entries_expire_after_ttl() {
    let queue = RelayQueue::new(10, Duration::from_secs(10));
    queue.push(named(0));
    tokio::time::advance(Duration::from_secs(6)).await;
    queue.push(named(1));

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(queue.sweep(), 1);
    assert_eq!(queue.len(), 1);

    let rows = queue.snapshot();
    assert_eq!(rows[0].event.name.as_deref(), Some("server-1"));
    assert_eq!(rows[0].time_remaining, Duration::from_secs(5));

    tokio::time::advance(Duration::from_secs(6)).await;
    assert!(queue.pop_oldest().is_none());
}

#[test]
fn test_overflow_is_counted_in_stats() {
    let mut config = RelayConfig::default();
    config.queue.capacity = 2;
    let pipeline = pipeline(config);

    for i in 0..5 {
        pipeline.relay(&named(i));
    }
    let queue = pipeline.queue();
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.overflow_drops(), 3);
    assert_eq!(pipeline.stats().snapshot(queue.overflow_drops()).queue_overflow_drops, 3);

    let first = queue.pop_oldest().unwrap();
    assert_eq!(first.event.name.as_deref(), Some("server-3"));
}

#[tokio::test]
async fn test_concurrent_producers_and_consumers_lose_nothing() {
    let queue = Arc::new(RelayQueue::new(1000, Duration::from_secs(600)));

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                for i in 0..100 {
                    queue.push(named(p * 100 + i));
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for handle in producers {
        handle.await.unwrap();
    }

    let consumers: Vec<_> = (0..4)
        .map(|_| {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let mut seen = Vec::new();
                while let Some(entry) = queue.pop_oldest() {
                    seen.push(entry.event.name.unwrap_or_default());
                    tokio::task::yield_now().await;
                }
                seen
            })
        })
        .collect();

    let mut all = HashSet::new();
    for handle in consumers {
        for name in handle.await.unwrap() {
            assert!(all.insert(name), "an entry was handed out twice");
        }
    }
    assert_eq!(all.len(), 400);
    assert!(queue.is_empty());
}
