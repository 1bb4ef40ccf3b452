//! Subscription storage.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::subscription::Subscription;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SubscriptionStorageConfig {
    pub max_newsfeeds: usize,
    pub max_subscriptions_per_newsfeed: usize,
}

impl Default for SubscriptionStorageConfig {
    fn default() -> Self {
        Self {
            max_newsfeeds: 10_000,
            max_subscriptions_per_newsfeed: 1_000,
        }
    }
}

#[async_trait]
pub trait SubscriptionStorage: Send + Sync {
    async fn get_by_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Arc<Subscription>>;

    async fn get_by_to_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Arc<Subscription>>;

    async fn get_by_fqid(
        &self,
        newsfeed_id: &str,
        subscription_id: Uuid,
    ) -> Result<Arc<Subscription>, CoreError>;

    async fn get_between(
        &self,
        newsfeed_id: &str,
        to_newsfeed_id: &str,
    ) -> Result<Arc<Subscription>, CoreError>;

    async fn add(&self, subscription: Subscription) -> Result<(), CoreError>;

    async fn delete_by_fqid(&self, newsfeed_id: &str, subscription_id: Uuid) -> Result<(), CoreError>;
}

/// Dual-indexed subscription store.
///
/// Both indexes share the same `Arc<Subscription>` per record, so deleting a
/// subscription removes the identical `Arc` from both maps — the integrity
/// invariant ("the two indexes contain exactly the same multiset of
/// records") holds by construction rather than by keeping the two sides in
/// sync by hand.
pub struct InMemorySubscriptionStorage {
    config: SubscriptionStorageConfig,
    subscriptions: Mutex<HashMap<String, VecDeque<Arc<Subscription>>>>,
    subscribers: Mutex<HashMap<String, VecDeque<Arc<Subscription>>>>,
}

impl InMemorySubscriptionStorage {
    pub fn new(config: SubscriptionStorageConfig) -> Self {
        Self {
            config,
            subscriptions: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SubscriptionStorage for InMemorySubscriptionStorage {
    async fn get_by_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Arc<Subscription>> {
        let subscriptions = self.subscriptions.lock().unwrap();
        subscriptions
            .get(newsfeed_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn get_by_to_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Arc<Subscription>> {
        let subscribers = self.subscribers.lock().unwrap();
        subscribers
            .get(newsfeed_id)
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    async fn get_by_fqid(
        &self,
        newsfeed_id: &str,
        subscription_id: Uuid,
    ) -> Result<Arc<Subscription>, CoreError> {
        let subscriptions = self.subscriptions.lock().unwrap();
        subscriptions
            .get(newsfeed_id)
            .and_then(|entries| entries.iter().find(|sub| sub.id == subscription_id))
            .cloned()
            .ok_or_else(|| CoreError::SubscriptionNotFound {
                newsfeed_id: newsfeed_id.to_string(),
                subscription_id,
            })
    }

    async fn get_between(
        &self,
        newsfeed_id: &str,
        to_newsfeed_id: &str,
    ) -> Result<Arc<Subscription>, CoreError> {
        let subscriptions = self.subscriptions.lock().unwrap();
        subscriptions
            .get(newsfeed_id)
            .and_then(|entries| entries.iter().find(|sub| sub.to_newsfeed_id == to_newsfeed_id))
            .cloned()
            .ok_or_else(|| CoreError::SubscriptionBetweenNotFound {
                newsfeed_id: newsfeed_id.to_string(),
                to_newsfeed_id: to_newsfeed_id.to_string(),
            })
    }

    async fn add(&self, subscription: Subscription) -> Result<(), CoreError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();

        if !subscriptions.contains_key(&subscription.newsfeed_id)
            && subscriptions.len() >= self.config.max_newsfeeds
        {
            return Err(CoreError::NewsfeedLimitExceeded {
                newsfeed_id: subscription.newsfeed_id,
                max_newsfeeds: self.config.max_newsfeeds,
            });
        }

        let outgoing = subscriptions
            .entry(subscription.newsfeed_id.clone())
            .or_default();
        if outgoing.len() >= self.config.max_subscriptions_per_newsfeed {
            return Err(CoreError::SubscriptionLimitExceeded {
                newsfeed_id: subscription.newsfeed_id,
                max_subscriptions: self.config.max_subscriptions_per_newsfeed,
            });
        }

        let record = Arc::new(subscription);
        outgoing.push_front(record.clone());

        let mut subscribers = self.subscribers.lock().unwrap();
        subscribers
            .entry(record.to_newsfeed_id.clone())
            .or_default()
            .push_front(record);

        Ok(())
    }

    async fn delete_by_fqid(&self, newsfeed_id: &str, subscription_id: Uuid) -> Result<(), CoreError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        let outgoing = subscriptions
            .get_mut(newsfeed_id)
            .ok_or_else(|| CoreError::SubscriptionNotFound {
                newsfeed_id: newsfeed_id.to_string(),
                subscription_id,
            })?;

        let index = outgoing
            .iter()
            .position(|sub| sub.id == subscription_id)
            .ok_or_else(|| CoreError::SubscriptionNotFound {
                newsfeed_id: newsfeed_id.to_string(),
                subscription_id,
            })?;
        let record = outgoing.remove(index).unwrap();

        let mut subscribers = self.subscribers.lock().unwrap();
        if let Some(incoming) = subscribers.get_mut(&record.to_newsfeed_id) {
            incoming.retain(|sub| sub.id != subscription_id);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::SubscriptionFactory;

    fn storage() -> InMemorySubscriptionStorage {
        InMemorySubscriptionStorage::new(SubscriptionStorageConfig {
            max_newsfeeds: 10,
            max_subscriptions_per_newsfeed: 10,
        })
    }

    #[tokio::test]
    async fn add_populates_both_indexes() {
        let store = storage();
        let factory = SubscriptionFactory;
        let sub = factory.create_new("124", "123");
        store.add(sub.clone()).await.unwrap();

        assert_eq!(store.get_by_newsfeed_id("124").await.len(), 1);
        assert_eq!(store.get_by_to_newsfeed_id("123").await.len(), 1);
        assert!(store.get_between("124", "123").await.is_ok());
    }

    #[tokio::test]
    async fn delete_removes_from_both_indexes() {
        let store = storage();
        let factory = SubscriptionFactory;
        let sub = factory.create_new("124", "123");
        store.add(sub.clone()).await.unwrap();

        store.delete_by_fqid("124", sub.id).await.unwrap();

        assert!(store.get_by_newsfeed_id("124").await.is_empty());
        assert!(store.get_by_to_newsfeed_id("123").await.is_empty());
    }

    #[tokio::test]
    async fn delete_missing_subscription_fails() {
        let store = storage();
        let err = store.delete_by_fqid("124", Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, CoreError::SubscriptionNotFound { .. }));
    }

    #[tokio::test]
    async fn subscription_limit_is_enforced_without_eviction() {
        let store = InMemorySubscriptionStorage::new(SubscriptionStorageConfig {
            max_newsfeeds: 10,
            max_subscriptions_per_newsfeed: 1,
        });
        let factory = SubscriptionFactory;
        store.add(factory.create_new("124", "123")).await.unwrap();
        let err = store
            .add(factory.create_new("124", "125"))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::SubscriptionLimitExceeded { .. }));
        assert_eq!(store.get_by_newsfeed_id("124").await.len(), 1);
    }

    #[tokio::test]
    async fn most_recent_subscription_is_returned_first() {
        let store = storage();
        let factory = SubscriptionFactory;
        let first = factory.create_new("125", "123");
        let second = factory.create_new("126", "123");
        store.add(first).await.unwrap();
        store.add(second.clone()).await.unwrap();

        let incoming = store.get_by_to_newsfeed_id("123").await;
        assert_eq!(incoming[0].id, second.id);
    }
}
