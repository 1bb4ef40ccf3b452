//! Subscription entity and service.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::CoreError;
use crate::newsfeed_id::NewsfeedIdSpecification;
use crate::subscription_store::SubscriptionStorage;

fn serialize_timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(at.timestamp())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let secs = i64::deserialize(deserializer)?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| D::Error::custom("timestamp out of range"))
}

/// A one-way follow: `newsfeed_id` follows `to_newsfeed_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub newsfeed_id: String,
    pub to_newsfeed_id: String,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub subscribed_at: DateTime<Utc>,
}

#[derive(Debug, Default, Clone)]
pub struct SubscriptionFactory;

impl SubscriptionFactory {
    pub fn create_new(&self, newsfeed_id: impl Into<String>, to_newsfeed_id: impl Into<String>) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            newsfeed_id: newsfeed_id.into(),
            to_newsfeed_id: to_newsfeed_id.into(),
            subscribed_at: Utc::now(),
        }
    }
}

/// Validates both ends of a subscription before it is stored: each id must
/// satisfy the newsfeed id length check, and a newsfeed may not subscribe to
/// itself.
#[derive(Debug, Clone)]
pub struct SubscriptionSpecification {
    newsfeed_id_specification: NewsfeedIdSpecification,
}

impl SubscriptionSpecification {
    pub fn new(newsfeed_id_specification: NewsfeedIdSpecification) -> Self {
        Self {
            newsfeed_id_specification,
        }
    }

    pub fn is_satisfied_by(&self, subscription: &Subscription) -> Result<(), CoreError> {
        self.newsfeed_id_specification
            .is_satisfied_by(&subscription.newsfeed_id)?;
        self.newsfeed_id_specification
            .is_satisfied_by(&subscription.to_newsfeed_id)?;

        if subscription.newsfeed_id == subscription.to_newsfeed_id {
            return Err(CoreError::SelfSubscription {
                newsfeed_id: subscription.newsfeed_id.clone(),
            });
        }
        Ok(())
    }
}

/// Typed front for [`SubscriptionStorage`].
pub struct SubscriptionRepository {
    storage: Arc<dyn SubscriptionStorage>,
}

impl SubscriptionRepository {
    pub fn new(storage: Arc<dyn SubscriptionStorage>) -> Self {
        Self { storage }
    }

    pub async fn get_by_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Arc<Subscription>> {
        self.storage.get_by_newsfeed_id(newsfeed_id).await
    }

    pub async fn get_by_to_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Arc<Subscription>> {
        self.storage.get_by_to_newsfeed_id(newsfeed_id).await
    }

    pub async fn get_by_fqid(
        &self,
        newsfeed_id: &str,
        subscription_id: Uuid,
    ) -> Result<Arc<Subscription>, CoreError> {
        self.storage.get_by_fqid(newsfeed_id, subscription_id).await
    }

    pub async fn get_between(
        &self,
        newsfeed_id: &str,
        to_newsfeed_id: &str,
    ) -> Result<Arc<Subscription>, CoreError> {
        self.storage.get_between(newsfeed_id, to_newsfeed_id).await
    }

    pub async fn add(&self, subscription: Subscription) -> Result<(), CoreError> {
        self.storage.add(subscription).await
    }

    pub async fn delete_by_fqid(&self, newsfeed_id: &str, subscription_id: Uuid) -> Result<(), CoreError> {
        self.storage.delete_by_fqid(newsfeed_id, subscription_id).await
    }
}

/// Subscription service: the only way subscriptions are created or deleted.
pub struct SubscriptionService {
    factory: SubscriptionFactory,
    specification: SubscriptionSpecification,
    repository: SubscriptionRepository,
}

impl SubscriptionService {
    pub fn new(
        factory: SubscriptionFactory,
        specification: SubscriptionSpecification,
        repository: SubscriptionRepository,
    ) -> Self {
        Self {
            factory,
            specification,
            repository,
        }
    }

    pub async fn list_outgoing(&self, newsfeed_id: &str) -> Vec<Arc<Subscription>> {
        self.repository.get_by_newsfeed_id(newsfeed_id).await
    }

    pub async fn list_incoming(&self, newsfeed_id: &str) -> Vec<Arc<Subscription>> {
        self.repository.get_by_to_newsfeed_id(newsfeed_id).await
    }

    pub async fn create(
        &self,
        newsfeed_id: &str,
        to_newsfeed_id: &str,
    ) -> Result<Subscription, CoreError> {
        let subscription = self.factory.create_new(newsfeed_id, to_newsfeed_id);
        self.specification.is_satisfied_by(&subscription)?;

        if self
            .repository
            .get_between(newsfeed_id, to_newsfeed_id)
            .await
            .is_ok()
        {
            return Err(CoreError::SubscriptionAlreadyExists {
                newsfeed_id: newsfeed_id.to_string(),
                to_newsfeed_id: to_newsfeed_id.to_string(),
            });
        }

        self.repository.add(subscription.clone()).await?;

        Ok(subscription)
    }

    pub async fn delete(&self, newsfeed_id: &str, subscription_id: Uuid) -> Result<(), CoreError> {
        self.repository
            .get_by_fqid(newsfeed_id, subscription_id)
            .await?;
        self.repository
            .delete_by_fqid(newsfeed_id, subscription_id)
            .await
    }
}
