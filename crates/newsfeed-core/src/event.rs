//! Event entity.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::error::CoreError;
use crate::event_store::EventStorage;
use crate::newsfeed_id::NewsfeedIdSpecification;

/// Arbitrary key→value event payload, opaque to the domain.
pub type EventData = serde_json::Map<String, serde_json::Value>;

/// Fully-qualified event id: `(newsfeed_id, event_id)`.
///
/// Serializes as a bare 2-element JSON array, not an object — `parent_fqid`
/// and `child_fqids` entries are `[newsfeed_id, event_id]` tuples on the
/// wire — so `Serialize`/`Deserialize` are written by hand instead of
/// derived.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventFqid {
    pub newsfeed_id: String,
    pub event_id: Uuid,
}

impl EventFqid {
    pub fn new(newsfeed_id: impl Into<String>, event_id: Uuid) -> Self {
        Self {
            newsfeed_id: newsfeed_id.into(),
            event_id,
        }
    }
}

impl Serialize for EventFqid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.newsfeed_id, &self.event_id).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EventFqid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (newsfeed_id, event_id) = <(String, Uuid)>::deserialize(deserializer)?;
        Ok(Self {
            newsfeed_id,
            event_id,
        })
    }
}

fn serialize_timestamp<S: Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_i64(at.timestamp())
}

fn deserialize_timestamp<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
    let secs = i64::deserialize(deserializer)?;
    DateTime::from_timestamp(secs, 0).ok_or_else(|| D::Error::custom("timestamp out of range"))
}

fn serialize_opt_timestamp<S: Serializer>(
    at: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match at {
        Some(at) => serializer.serialize_i64(at.timestamp()),
        None => serializer.serialize_none(),
    }
}

fn deserialize_opt_timestamp<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let secs = Option::<i64>::deserialize(deserializer)?;
    secs.map(|secs| {
        DateTime::from_timestamp(secs, 0).ok_or_else(|| D::Error::custom("timestamp out of range"))
    })
    .transpose()
}

/// A single posted or fanned-out event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub newsfeed_id: String,
    pub data: EventData,
    pub parent_fqid: Option<EventFqid>,
    pub child_fqids: Vec<EventFqid>,
    #[serde(
        serialize_with = "serialize_timestamp",
        deserialize_with = "deserialize_timestamp"
    )]
    pub first_seen_at: DateTime<Utc>,
    #[serde(
        serialize_with = "serialize_opt_timestamp",
        deserialize_with = "deserialize_opt_timestamp"
    )]
    pub published_at: Option<DateTime<Utc>>,
}

impl Event {
    pub fn fqid(&self) -> EventFqid {
        EventFqid::new(self.newsfeed_id.clone(), self.id)
    }

    /// Records the processor's write time.
    pub fn track_publishing_time(&mut self) {
        self.published_at = Some(Utc::now());
    }

    /// Accumulates subscriber-side child FQIDs on the originator.
    pub fn track_child_fqids(&mut self, child_fqids: Vec<EventFqid>) {
        self.child_fqids.extend(child_fqids);
    }
}

/// Builds [`Event`]s.
#[derive(Debug, Default, Clone)]
pub struct EventFactory;

impl EventFactory {
    pub fn create_new(
        &self,
        newsfeed_id: impl Into<String>,
        data: EventData,
        parent_fqid: Option<EventFqid>,
    ) -> Event {
        Event {
            id: Uuid::new_v4(),
            newsfeed_id: newsfeed_id.into(),
            data,
            parent_fqid,
            child_fqids: Vec::new(),
            first_seen_at: Utc::now(),
            published_at: None,
        }
    }
}

/// Validates an event before it is dispatched.
#[derive(Debug, Clone)]
pub struct EventSpecification {
    newsfeed_id_specification: NewsfeedIdSpecification,
}

impl EventSpecification {
    pub fn new(newsfeed_id_specification: NewsfeedIdSpecification) -> Self {
        Self {
            newsfeed_id_specification,
        }
    }

    pub fn is_satisfied_by(&self, event: &Event) -> Result<(), CoreError> {
        self.newsfeed_id_specification
            .is_satisfied_by(&event.newsfeed_id)
    }
}

/// Typed front for [`EventStorage`].
pub struct EventRepository {
    storage: Arc<dyn EventStorage>,
}

impl EventRepository {
    pub fn new(storage: Arc<dyn EventStorage>) -> Self {
        Self { storage }
    }

    pub async fn get_by_newsfeed_id(&self, newsfeed_id: &str) -> Vec<Event> {
        self.storage.get_by_newsfeed_id(newsfeed_id).await
    }

    pub async fn get_by_fqid(&self, fqid: &EventFqid) -> Result<Event, CoreError> {
        self.storage
            .get_by_fqid(&fqid.newsfeed_id, fqid.event_id)
            .await
    }

    pub async fn add(&self, event: Event) -> Result<(), CoreError> {
        self.storage.add(event).await
    }

    pub async fn delete_by_fqid(&self, fqid: &EventFqid) {
        self.storage
            .delete_by_fqid(&fqid.newsfeed_id, fqid.event_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_data() -> EventData {
        let mut data = EventData::new();
        data.insert("payload".into(), serde_json::json!("e1"));
        data
    }

    #[test]
    fn fqid_round_trips_as_two_element_array() {
        let fqid = EventFqid::new("123", Uuid::new_v4());
        let json = serde_json::to_value(&fqid).unwrap();
        assert!(json.is_array());
        assert_eq!(json.as_array().unwrap().len(), 2);
        let back: EventFqid = serde_json::from_value(json).unwrap();
        assert_eq!(back, fqid);
    }

    #[test]
    fn event_round_trips_with_second_precision_timestamps() {
        let factory = EventFactory;
        let mut event = factory.create_new("123", sample_data(), None);
        event.track_publishing_time();
        event.track_child_fqids(vec![EventFqid::new("124", Uuid::new_v4())]);

        let json = serde_json::to_value(&event).unwrap();
        let back: Event = serde_json::from_value(json).unwrap();

        assert_eq!(back.id, event.id);
        assert_eq!(back.newsfeed_id, event.newsfeed_id);
        assert_eq!(back.data, event.data);
        assert_eq!(back.child_fqids, event.child_fqids);
        assert_eq!(
            back.first_seen_at.timestamp(),
            event.first_seen_at.timestamp()
        );
        assert_eq!(
            back.published_at.unwrap().timestamp(),
            event.published_at.unwrap().timestamp()
        );
    }

    #[test]
    fn new_event_has_no_published_at_and_empty_children() {
        let factory = EventFactory;
        let event = factory.create_new("123", sample_data(), None);
        assert!(event.published_at.is_none());
        assert!(event.child_fqids.is_empty());
        assert!(event.parent_fqid.is_none());
    }
}
