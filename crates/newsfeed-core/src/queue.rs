//! In-process event work queue.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};

use crate::error::CoreError;
use crate::event::{Event, EventFqid};

/// A unit of fan-out work, queued by the dispatcher and consumed by the
/// processor pool.
#[derive(Debug, Clone)]
pub enum WorkItem {
    Post(Event),
    Delete(EventFqid),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventQueueConfig {
    pub max_size: usize,
}

impl Default for EventQueueConfig {
    fn default() -> Self {
        Self { max_size: 10_000 }
    }
}

/// Bounded FIFO queue backing the fan-out pipeline.
///
/// `tokio::sync::mpsc` has no non-blocking `len()`/`is_empty()` that reads
/// true queue depth, so a counter tracks it alongside the channel purely for
/// the test-only [`EventQueue::is_empty`] probe.
pub struct EventQueue {
    config: EventQueueConfig,
    sender: mpsc::Sender<WorkItem>,
    receiver: Mutex<mpsc::Receiver<WorkItem>>,
    len: AtomicUsize,
}

impl EventQueue {
    pub fn new(config: EventQueueConfig) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(config.max_size);
        Arc::new(Self {
            config,
            sender,
            receiver: Mutex::new(receiver),
            len: AtomicUsize::new(0),
        })
    }

    /// Enqueues a work item without blocking, failing with
    /// [`CoreError::QueueFull`] rather than waiting for room.
    pub fn put(&self, item: WorkItem) -> Result<(), CoreError> {
        self.sender.try_send(item).map_err(|err| match err {
            TrySendError::Full(_) => CoreError::QueueFull {
                max_size: self.config.max_size,
            },
            TrySendError::Closed(_) => CoreError::QueueFull {
                max_size: self.config.max_size,
            },
        })?;
        self.len.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    /// Waits for the next work item. Multiple processor tasks share the
    /// receiver behind a mutex, so each item is delivered to exactly one of
    /// them.
    pub async fn get(&self) -> Option<WorkItem> {
        let mut receiver = self.receiver.lock().await;
        let item = receiver.recv().await;
        if item.is_some() {
            self.len.fetch_sub(1, Ordering::SeqCst);
        }
        item
    }

    pub fn is_empty(&self) -> bool {
        self.len.load(Ordering::SeqCst) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> Event {
        crate::event::EventFactory.create_new("123", Default::default(), None)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let queue = EventQueue::new(EventQueueConfig { max_size: 4 });
        assert!(queue.is_empty());

        let event = sample_event();
        queue.put(WorkItem::Post(event.clone())).unwrap();
        assert!(!queue.is_empty());

        match queue.get().await.unwrap() {
            WorkItem::Post(received) => assert_eq!(received.id, event.id),
            WorkItem::Delete(_) => panic!("expected a Post work item"),
        }
        assert!(queue.is_empty());
    }

    #[tokio::test]
    async fn put_fails_when_queue_is_full() {
        let queue = EventQueue::new(EventQueueConfig { max_size: 1 });
        queue.put(WorkItem::Post(sample_event())).unwrap();

        let err = queue.put(WorkItem::Post(sample_event())).unwrap_err();
        assert!(matches!(err, CoreError::QueueFull { .. }));
    }

    #[tokio::test]
    async fn delete_work_items_round_trip() {
        let queue = EventQueue::new(EventQueueConfig::default());
        let fqid = EventFqid::new("123", uuid::Uuid::new_v4());
        queue.put(WorkItem::Delete(fqid.clone())).unwrap();

        match queue.get().await.unwrap() {
            WorkItem::Delete(received) => assert_eq!(received, fqid),
            WorkItem::Post(_) => panic!("expected a Delete work item"),
        }
    }
}
