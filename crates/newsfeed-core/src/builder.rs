//! Wires the domain services together behind a plain constructor function.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::dispatcher::EventDispatcherService;
use crate::event::{EventFactory, EventRepository, EventSpecification};
use crate::event_store::{EventStorageConfig, InMemoryEventStorage};
use crate::newsfeed_id::NewsfeedIdSpecification;
use crate::processor::{EventProcessorService, ProcessorPool};
use crate::queue::{EventQueue, EventQueueConfig};
use crate::subscription::{SubscriptionFactory, SubscriptionRepository, SubscriptionService, SubscriptionSpecification};
use crate::subscription_store::{InMemorySubscriptionStorage, SubscriptionStorage, SubscriptionStorageConfig};

/// Domain-level configuration: newsfeed id length plus the stores', queue's,
/// and processor pool's own tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsfeedConfig {
    pub newsfeed_id_length: usize,
    pub processor_concurrency: usize,
    pub event_queue: EventQueueConfig,
    pub event_storage: EventStorageConfig,
    pub subscription_storage: SubscriptionStorageConfig,
}

impl Default for NewsfeedConfig {
    fn default() -> Self {
        Self {
            newsfeed_id_length: 16,
            processor_concurrency: 4,
            event_queue: EventQueueConfig::default(),
            event_storage: EventStorageConfig::default(),
            subscription_storage: SubscriptionStorageConfig::default(),
        }
    }
}

/// Assembled set of domain services, handed to the HTTP layer and owning the
/// background processor pool's lifetime.
pub struct Newsfeed {
    pub dispatcher: EventDispatcherService,
    pub event_repository: Arc<EventRepository>,
    pub subscription_service: SubscriptionService,
    pub newsfeed_id_specification: NewsfeedIdSpecification,
    pool: Option<ProcessorPool>,
}

impl Newsfeed {
    /// Builds every service and starts the processor pool, which runs
    /// alongside the web server in the same process.
    pub fn start(config: NewsfeedConfig) -> Self {
        let newsfeed_id_specification = NewsfeedIdSpecification::new(config.newsfeed_id_length);

        let queue = EventQueue::new(config.event_queue);
        let event_storage = Arc::new(InMemoryEventStorage::new(config.event_storage));
        let event_repository = Arc::new(EventRepository::new(event_storage));
        let subscription_storage: Arc<dyn SubscriptionStorage> =
            Arc::new(InMemorySubscriptionStorage::new(config.subscription_storage));
        let subscription_repository_for_processor =
            Arc::new(SubscriptionRepository::new(subscription_storage.clone()));

        let dispatcher = EventDispatcherService::new(
            EventFactory,
            EventSpecification::new(newsfeed_id_specification.clone()),
            queue.clone(),
        );

        let subscription_service = SubscriptionService::new(
            SubscriptionFactory,
            SubscriptionSpecification::new(newsfeed_id_specification.clone()),
            SubscriptionRepository::new(subscription_storage),
        );

        let processor = Arc::new(EventProcessorService::new(
            queue,
            EventFactory,
            event_repository.clone(),
            subscription_repository_for_processor,
        ));
        let pool = ProcessorPool::start(processor, config.processor_concurrency.max(1));

        Self {
            dispatcher,
            event_repository,
            subscription_service,
            newsfeed_id_specification,
            pool: Some(pool),
        }
    }

    /// Aborts the processor pool's worker tasks.
    pub fn shutdown(&mut self) {
        if let Some(pool) = self.pool.take() {
            pool.stop();
        }
    }
}

impl Drop for Newsfeed {
    fn drop(&mut self) {
        self.shutdown();
    }
}
