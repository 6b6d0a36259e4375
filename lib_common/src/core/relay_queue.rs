//! # Relay Queue
//!
//! A bounded, insertion-ordered buffer between event producers (the message
//! pipeline, the HTTP push endpoint) and consumers (HTTP pullers and the expiry
//! sweep). Every operation takes the one lock for its whole duration, so no
//! caller ever observes a half-applied push or pop and an entry is handed to at
//! most one consumer.
//!
//! Entries are only ever appended at the back, so queue order is age order and
//! the sweep can stop at the first entry that is still within its TTL.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::model::ServerEvent;

/// An accepted event together with the moment it was queued.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    pub event: ServerEvent,
    pub enqueued_at: Instant,
    /// Wall-clock twin of `enqueued_at`, for display.
    pub enqueued_wall: DateTime<Utc>,
}

impl QueueEntry {
    pub fn age_at(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.enqueued_at)
    }
}

/// One row of [`RelayQueue::snapshot`].
#[derive(Debug, Clone)]
pub struct QueuedEvent {
    pub event: ServerEvent,
    pub enqueued_wall: DateTime<Utc>,
    pub age: Duration,
    /// Time left before the sweep may remove the entry, never negative.
    pub time_remaining: Duration,
}

/// Result of a push.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushReceipt {
    /// Queue length after the push.
    pub queue_size: usize,
    /// True when the oldest entry was dropped to make room.
    pub evicted_oldest: bool,
}

#[derive(Debug)]
pub struct RelayQueue {
    entries: Mutex<VecDeque<QueueEntry>>,
    capacity: usize,
    ttl: Duration,
    overflow_drops: AtomicU64,
}

impl RelayQueue {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            ttl,
            overflow_drops: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<QueueEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Total entries dropped because the queue was full.
    pub fn overflow_drops(&self) -> u64 {
        self.overflow_drops.load(Ordering::Relaxed)
    }

    /// Appends an event; at capacity the oldest entry is dropped. Never blocks
    /// beyond the critical section.
    pub fn push(&self, event: ServerEvent) -> PushReceipt {
        self.push_at(event, Instant::now())
    }

    pub fn push_at(&self, event: ServerEvent, now: Instant) -> PushReceipt {
        let mut entries = self.lock();

        let evicted_oldest = entries.len() >= self.capacity;
        if evicted_oldest {
            entries.pop_front();
            self.overflow_drops.fetch_add(1, Ordering::Relaxed);
        }

        entries.push_back(QueueEntry {
            event,
            enqueued_at: now,
            enqueued_wall: Utc::now(),
        });

        PushReceipt {
            queue_size: entries.len(),
            evicted_oldest,
        }
    }

    /// Removes and returns the oldest entry still within its TTL. Expired entries
    /// met on the way are discarded.
    pub fn pop_oldest(&self) -> Option<QueueEntry> {
        self.pop_oldest_at(Instant::now())
    }

    pub fn pop_oldest_at(&self, now: Instant) -> Option<QueueEntry> {
        let mut entries = self.lock();
        while let Some(entry) = entries.pop_front() {
            if entry.age_at(now) <= self.ttl {
                return Some(entry);
            }
        }
        None
    }

    /// Copies every current entry, oldest first, without removing anything.
    pub fn snapshot(&self) -> Vec<QueuedEvent> {
        self.snapshot_at(Instant::now())
    }

    pub fn snapshot_at(&self, now: Instant) -> Vec<QueuedEvent> {
        self.lock()
            .iter()
            .map(|entry| {
                let age = entry.age_at(now);
                QueuedEvent {
                    event: entry.event.clone(),
                    enqueued_wall: entry.enqueued_wall,
                    age,
                    time_remaining: self.ttl.saturating_sub(age),
                }
            })
            .collect()
    }

    /// Drops expired entries from the front; returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut entries = self.lock();
        let mut removed = 0;
        while entries.front().is_some_and(|e| e.age_at(now) > self.ttl) {
            entries.pop_front();
            removed += 1;
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn named(i: usize) -> ServerEvent {
        ServerEvent {
            name: Some(format!("server-{i}")),
            ..Default::default()
        }
    }

    fn name_of(entry: &QueueEntry) -> &str {
        entry.event.name.as_deref().unwrap_or_default()
    }

    #[test]
    fn test_overflow_keeps_most_recent() {
        let queue = RelayQueue::new(5, Duration::from_secs(60));
        let now = Instant::now();
        for i in 0..10 {
            queue.push_at(named(i), now);
        }
        assert_eq!(queue.len(), 5);
        assert_eq!(queue.overflow_drops(), 5);

        let order: Vec<String> = std::iter::from_fn(|| queue.pop_oldest_at(now))
            .map(|e| name_of(&e).to_string())
            .collect();
        assert_eq!(order, vec!["server-5", "server-6", "server-7", "server-8", "server-9"]);
        assert!(queue.pop_oldest_at(now).is_none());
    }

    #[test]
    fn test_push_receipt() {
        let queue = RelayQueue::new(1, Duration::from_secs(1));
        let first = queue.push(named(0));
        assert_eq!(first, PushReceipt { queue_size: 1, evicted_oldest: false });
        let second = queue.push(named(1));
        assert_eq!(second, PushReceipt { queue_size: 1, evicted_oldest: true });
    }

    #[test]
    fn test_pop_skips_expired() {
        let queue = RelayQueue::new(10, Duration::from_secs(10));
        let start = Instant::now();
        queue.push_at(named(0), start);
        queue.push_at(named(1), start + Duration::from_secs(8));

        let later = start + Duration::from_secs(12);
        let entry = queue.pop_oldest_at(later).unwrap();
        assert_eq!(name_of(&entry), "server-1");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_sweep_stops_at_first_fresh_entry() {
        let queue = RelayQueue::new(10, Duration::from_secs(10));
        let start = Instant::now();
        queue.push_at(named(0), start);
        queue.push_at(named(1), start + Duration::from_secs(1));
        queue.push_at(named(2), start + Duration::from_secs(9));

        assert_eq!(queue.sweep_at(start + Duration::from_secs(5)), 0);
        assert_eq!(queue.sweep_at(start + Duration::from_secs(15)), 2);
        let rest = queue.snapshot_at(start + Duration::from_secs(15));
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].event.name.as_deref(), Some("server-2"));
    }

    #[test]
    fn test_snapshot_ages_and_clamps_remaining() {
        let queue = RelayQueue::new(10, Duration::from_secs(10));
        let start = Instant::now();
        queue.push_at(named(0), start);
        queue.push_at(named(1), start + Duration::from_secs(6));

        let rows = queue.snapshot_at(start + Duration::from_secs(12));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].age, Duration::from_secs(12));
        assert_eq!(rows[0].time_remaining, Duration::ZERO);
        assert_eq!(rows[1].age, Duration::from_secs(6));
        assert_eq!(rows[1].time_remaining, Duration::from_secs(4));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let queue = RelayQueue::new(0, Duration::from_secs(1));
        assert_eq!(queue.capacity(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_consumers_never_share_an_entry() {
        let queue = Arc::new(RelayQueue::new(1000, Duration::from_secs(60)));
        for i in 0..500 {
            queue.push(named(i));
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let q = Arc::clone(&queue);
            handles.push(tokio::spawn(async move {
                let mut got = Vec::new();
                while let Some(entry) = q.pop_oldest() {
                    got.push(entry.event.name.unwrap_or_default());
                }
                got
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 500);
    }
}
