//! Event dispatcher.

use std::sync::Arc;

use uuid::Uuid;

use crate::error::CoreError;
use crate::event::{Event, EventData, EventFactory, EventFqid, EventSpecification};
use crate::queue::{EventQueue, WorkItem};

/// Validates and enqueues fan-out work. Holds no storage handle: posting and
/// deleting an event never touch a store directly, only the queue.
pub struct EventDispatcherService {
    factory: EventFactory,
    specification: EventSpecification,
    queue: Arc<EventQueue>,
}

impl EventDispatcherService {
    pub fn new(factory: EventFactory, specification: EventSpecification, queue: Arc<EventQueue>) -> Self {
        Self {
            factory,
            specification,
            queue,
        }
    }

    /// Validates a new event and enqueues it for fan-out, returning
    /// immediately with the originator's own (not-yet-published) record.
    pub fn dispatch_new_event(&self, newsfeed_id: &str, data: EventData) -> Result<Event, CoreError> {
        let event = self.factory.create_new(newsfeed_id, data, None);
        self.specification.is_satisfied_by(&event)?;
        self.queue.put(WorkItem::Post(event.clone()))?;
        Ok(event)
    }

    /// Enqueues deletion of an existing event by its fully-qualified id.
    pub fn dispatch_event_deletion(&self, newsfeed_id: &str, event_id: Uuid) -> Result<(), CoreError> {
        let fqid = EventFqid::new(newsfeed_id, event_id);
        self.queue.put(WorkItem::Delete(fqid))
    }
}
