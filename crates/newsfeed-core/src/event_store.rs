//! Event storage.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::event::Event;

/// Per-store configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EventStorageConfig {
    pub max_newsfeeds: usize,
    pub max_events_per_newsfeed: usize,
}

impl Default for EventStorageConfig {
    fn default() -> Self {
        Self {
            max_newsfeeds: 10_000,
            max_events_per_newsfeed: 100,
        }
    }
}

/// Storage backend for events, defined as potentially suspending to
/// accommodate a remote backend even though the only implementation here
/// never actually awaits anything.
#[async_trait]
pub trait EventStorage: Send + Sync {
    async fn get_by_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Event>;

    async fn get_by_fqid(&self, newsfeed_id: &str, event_id: Uuid) -> Result<Event, CoreError>;

    async fn add(&self, event: Event) -> Result<(), CoreError>;

    async fn delete_by_fqid(&self, newsfeed_id: &str, event_id: Uuid);
}

/// Bounded per-newsfeed LIFO event store.
///
/// Each feed's deque is kept with the most recent event at the front, so
/// `get_by_newsfeed_id` returns entries in place with no re-sort and
/// eviction always pops the back.
pub struct InMemoryEventStorage {
    config: EventStorageConfig,
    feeds: Mutex<HashMap<String, VecDeque<Event>>>,
}

impl InMemoryEventStorage {
    pub fn new(config: EventStorageConfig) -> Self {
        Self {
            config,
            feeds: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl EventStorage for InMemoryEventStorage {
    async fn get_by_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Event> {
        let feeds = self.feeds.lock().unwrap();
        feeds
            .get(newsfeed_id)
            .map(|feed| feed.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn get_by_fqid(&self, newsfeed_id: &str, event_id: Uuid) -> Result<Event, CoreError> {
        let feeds = self.feeds.lock().unwrap();
        feeds
            .get(newsfeed_id)
            .and_then(|feed| feed.iter().find(|event| event.id == event_id))
            .cloned()
            .ok_or_else(|| CoreError::EventNotFound {
                newsfeed_id: newsfeed_id.to_string(),
                event_id,
            })
    }

    async fn add(&self, event: Event) -> Result<(), CoreError> {
        let mut feeds = self.feeds.lock().unwrap();

        if !feeds.contains_key(&event.newsfeed_id) && feeds.len() >= self.config.max_newsfeeds {
            return Err(CoreError::NewsfeedLimitExceeded {
                newsfeed_id: event.newsfeed_id,
                max_newsfeeds: self.config.max_newsfeeds,
            });
        }

        let feed = feeds.entry(event.newsfeed_id.clone()).or_default();
        if feed.len() >= self.config.max_events_per_newsfeed {
            feed.pop_back();
        }
        feed.push_front(event);
        Ok(())
    }

    async fn delete_by_fqid(&self, newsfeed_id: &str, event_id: Uuid) {
        let mut feeds = self.feeds.lock().unwrap();
        if let Some(feed) = feeds.get_mut(newsfeed_id) {
            feed.retain(|event| event.id != event_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventFactory;

    fn new_event(factory: &EventFactory, newsfeed_id: &str) -> Event {
        factory.create_new(newsfeed_id, Default::default(), None)
    }

    #[tokio::test]
    async fn get_by_newsfeed_id_returns_most_recent_first() {
        let storage = InMemoryEventStorage::new(EventStorageConfig {
            max_newsfeeds: 10,
            max_events_per_newsfeed: 10,
        });
        let factory = EventFactory;

        let first = new_event(&factory, "123");
        let second = new_event(&factory, "123");
        storage.add(first.clone()).await.unwrap();
        storage.add(second.clone()).await.unwrap();

        let feed = storage.get_by_newsfeed_id("123").await;
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, second.id);
        assert_eq!(feed[1].id, first.id);
    }

    #[tokio::test]
    async fn add_evicts_oldest_when_feed_is_full() {
        let storage = InMemoryEventStorage::new(EventStorageConfig {
            max_newsfeeds: 10,
            max_events_per_newsfeed: 2,
        });
        let factory = EventFactory;

        let first = new_event(&factory, "123");
        let second = new_event(&factory, "123");
        let third = new_event(&factory, "123");
        storage.add(first.clone()).await.unwrap();
        storage.add(second.clone()).await.unwrap();
        storage.add(third.clone()).await.unwrap();

        let feed = storage.get_by_newsfeed_id("123").await;
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].id, third.id);
        assert_eq!(feed[1].id, second.id);
    }

    #[tokio::test]
    async fn add_fails_when_newsfeed_limit_exceeded() {
        let storage = InMemoryEventStorage::new(EventStorageConfig {
            max_newsfeeds: 1,
            max_events_per_newsfeed: 10,
        });
        let factory = EventFactory;

        storage.add(new_event(&factory, "123")).await.unwrap();
        let err = storage.add(new_event(&factory, "124")).await.unwrap_err();
        assert!(matches!(err, CoreError::NewsfeedLimitExceeded { .. }));

        // existing feed can keep growing past the newsfeed-count cap
        storage.add(new_event(&factory, "123")).await.unwrap();
    }

    #[tokio::test]
    async fn get_by_fqid_fails_when_absent() {
        let storage = InMemoryEventStorage::new(EventStorageConfig::default());
        let err = storage
            .get_by_fqid("123", Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::EventNotFound { .. }));
    }

    #[tokio::test]
    async fn delete_by_fqid_is_idempotent() {
        let storage = InMemoryEventStorage::new(EventStorageConfig::default());
        let factory = EventFactory;
        let event = new_event(&factory, "123");
        storage.add(event.clone()).await.unwrap();

        storage.delete_by_fqid("123", event.id).await;
        assert!(storage.get_by_newsfeed_id("123").await.is_empty());

        // deleting again is a silent no-op
        storage.delete_by_fqid("123", event.id).await;
    }
}
