//! In-process broker
//!
//! Fans every publish out to all handlers subscribed to the topic, including
//! the publisher's own handler, the way broadcast topics on Redis or a
//! RabbitMQ fanout exchange behave. `deliveries` controls how many times
//! each handler receives each publish; values above one reproduce the
//! redelivery an at-least-once broker is allowed to do.
//!
//! Handlers are called on the publishing thread after the topic lock is
//! released, so a handler may itself publish.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::broker::topic::{SubscriberId, Topic};
use crate::broker::{BrokerHandler, MessageBroker};
use crate::utils::error::BrokerError;

#[derive(Debug)]
pub struct MemoryBroker {
    topics: RwLock<HashMap<String, Topic>>,
    deliveries: usize,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self::with_deliveries(1)
    }

    /// Broker handing each publish to each subscriber `deliveries` times.
    pub fn with_deliveries(deliveries: usize) -> Self {
        Self {
            topics: RwLock::new(HashMap::new()),
            deliveries: deliveries.max(1),
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .read()
            .get(topic)
            .map_or(0, |t| t.subscribers.len())
    }

    pub fn unsubscribe(&self, topic: &str, subscriber: &SubscriberId) {
        if let Some(t) = self.topics.write().get_mut(topic) {
            t.unsubscribe(subscriber);
        }
    }
}

impl MessageBroker for MemoryBroker {
    fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let handlers = match self.topics.read().get(topic) {
            Some(t) => t.handlers(),
            None => {
                debug!("Topic '{}' has no subscribers", topic);
                return Ok(());
            }
        };

        for handler in &handlers {
            for _ in 0..self.deliveries {
                handler(&payload);
            }
        }
        Ok(())
    }

    fn subscribe(&self, topic: &str, handler: BrokerHandler) -> Result<String, BrokerError> {
        let id = Uuid::new_v4().to_string();
        self.topics
            .write()
            .entry(topic.to_string())
            .or_insert_with(|| Topic::new(topic))
            .subscribe(id.clone(), handler);
        debug!("Subscriber {} registered on {}", id, topic);
        Ok(id)
    }
}
