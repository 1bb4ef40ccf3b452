//! Event processor and worker pool.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::event::{EventFactory, EventFqid, EventRepository};
use crate::queue::{EventQueue, WorkItem};
use crate::subscription::SubscriptionRepository;

/// Fans an incoming event out to every subscriber feed and persists the
/// result.
pub struct EventProcessorService {
    queue: Arc<EventQueue>,
    factory: EventFactory,
    event_repository: Arc<EventRepository>,
    subscription_repository: Arc<SubscriptionRepository>,
}

impl EventProcessorService {
    pub fn new(
        queue: Arc<EventQueue>,
        factory: EventFactory,
        event_repository: Arc<EventRepository>,
        subscription_repository: Arc<SubscriptionRepository>,
    ) -> Self {
        Self {
            queue,
            factory,
            event_repository,
            subscription_repository,
        }
    }

    /// Pulls and processes a single work item, swallowing any error into a
    /// log line — fan-out is best-effort and has no caller to answer to.
    pub async fn process_one(&self) -> bool {
        let Some(item) = self.queue.get().await else {
            return false;
        };

        let result = match item {
            WorkItem::Post(event) => self.process_post(event).await,
            WorkItem::Delete(fqid) => self.process_delete(fqid).await,
        };

        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to process queued work item");
        }

        true
    }

    async fn process_post(&self, mut event: crate::event::Event) -> Result<(), crate::error::CoreError> {
        let subscribers = self
            .subscription_repository
            .get_by_to_newsfeed_id(&event.newsfeed_id)
            .await;

        let mut subscriber_events = Vec::with_capacity(subscribers.len());
        for subscription in &subscribers {
            subscriber_events.push(self.factory.create_new(
                subscription.newsfeed_id.clone(),
                event.data.clone(),
                Some(event.fqid()),
            ));
        }

        event.track_child_fqids(subscriber_events.iter().map(|e| e.fqid()).collect());

        event.track_publishing_time();
        self.event_repository.add(event).await?;

        for mut subscriber_event in subscriber_events {
            subscriber_event.track_publishing_time();
            self.event_repository.add(subscriber_event).await?;
        }

        Ok(())
    }

    async fn process_delete(&self, fqid: EventFqid) -> Result<(), crate::error::CoreError> {
        let event = self.event_repository.get_by_fqid(&fqid).await?;

        for child_fqid in &event.child_fqids {
            self.event_repository.delete_by_fqid(child_fqid).await;
        }

        self.event_repository.delete_by_fqid(&fqid).await;
        Ok(())
    }
}

/// Runs N processors as background tasks pulling from a single shared queue.
pub struct ProcessorPool {
    handles: Vec<JoinHandle<()>>,
}

impl ProcessorPool {
    pub fn start(processor: Arc<EventProcessorService>, concurrency: usize) -> Self {
        let handles = (0..concurrency)
            .map(|_| {
                let processor = processor.clone();
                tokio::spawn(async move {
                    loop {
                        if !processor.process_one().await {
                            break;
                        }
                    }
                })
            })
            .collect();

        Self { handles }
    }

    /// Aborts every worker task. Queued-but-unprocessed work is dropped.
    pub fn stop(self) {
        for handle in self.handles {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::{EventStorageConfig, InMemoryEventStorage};
    use crate::queue::EventQueueConfig;
    use crate::subscription::{SubscriptionFactory, SubscriptionRepository};
    use crate::subscription_store::{InMemorySubscriptionStorage, SubscriptionStorageConfig};
    use std::time::Duration;

    fn setup() -> (
        Arc<EventQueue>,
        Arc<EventRepository>,
        Arc<SubscriptionRepository>,
        Arc<EventProcessorService>,
    ) {
        let queue = EventQueue::new(EventQueueConfig::default());
        let event_repository = Arc::new(EventRepository::new(Arc::new(InMemoryEventStorage::new(
            EventStorageConfig::default(),
        ))));
        let subscription_repository = Arc::new(SubscriptionRepository::new(Arc::new(
            InMemorySubscriptionStorage::new(SubscriptionStorageConfig::default()),
        )));
        let processor = Arc::new(EventProcessorService::new(
            queue.clone(),
            EventFactory,
            event_repository.clone(),
            subscription_repository.clone(),
        ));
        (queue, event_repository, subscription_repository, processor)
    }

    #[tokio::test]
    async fn posting_fans_out_to_subscribers() {
        let (queue, event_repository, subscription_repository, processor) = setup();

        subscription_repository
            .add(SubscriptionFactory.create_new("subscriber", "origin"))
            .await
            .unwrap();

        let event = EventFactory.create_new("origin", Default::default(), None);
        queue.put(WorkItem::Post(event.clone())).unwrap();
        assert!(processor.process_one().await);

        let origin_feed = event_repository.get_by_newsfeed_id("origin").await;
        assert_eq!(origin_feed.len(), 1);
        assert!(origin_feed[0].published_at.is_some());
        assert_eq!(origin_feed[0].child_fqids.len(), 1);

        let subscriber_feed = event_repository.get_by_newsfeed_id("subscriber").await;
        assert_eq!(subscriber_feed.len(), 1);
        assert_eq!(
            subscriber_feed[0].parent_fqid.as_ref().unwrap().newsfeed_id,
            "origin"
        );
    }

    #[tokio::test]
    async fn deleting_cascades_to_subscriber_copies() {
        let (queue, event_repository, subscription_repository, processor) = setup();

        subscription_repository
            .add(SubscriptionFactory.create_new("subscriber", "origin"))
            .await
            .unwrap();

        let event = EventFactory.create_new("origin", Default::default(), None);
        let fqid = event.fqid();
        queue.put(WorkItem::Post(event)).unwrap();
        assert!(processor.process_one().await);

        queue.put(WorkItem::Delete(fqid.clone())).unwrap();
        assert!(processor.process_one().await);

        assert!(event_repository.get_by_newsfeed_id("origin").await.is_empty());
        assert!(event_repository
            .get_by_newsfeed_id("subscriber")
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn pool_runs_workers_until_stopped() {
        let (queue, event_repository, _subscription_repository, processor) = setup();
        let pool = ProcessorPool::start(processor, 2);

        let event = EventFactory.create_new("origin", Default::default(), None);
        queue.put(WorkItem::Post(event)).unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(event_repository.get_by_newsfeed_id("origin").await.len(), 1);

        pool.stop();
    }
}
