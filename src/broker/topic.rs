//! Topic management
//!
//! A `Topic` holds the handlers subscribed to one topic name. Duplicate
//! subscription ids replace the earlier handler.
//!
//! Concurrency note: callers must synchronize access to `Topic` (the memory
//! broker keeps every topic behind its lock).

use crate::broker::BrokerHandler;

pub type SubscriberId = String;

#[derive(Default)]
pub struct Topic {
    pub name: String,
    pub subscribers: Vec<(SubscriberId, BrokerHandler)>,
}

impl Topic {
    /// Create a new topic with the given name.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            subscribers: Vec::new(),
        }
    }

    /// Add a subscriber to the topic.
    pub fn subscribe(&mut self, id: SubscriberId, handler: BrokerHandler) {
        self.unsubscribe(&id);
        self.subscribers.push((id, handler));
    }

    /// Remove a subscriber from the topic.
    pub fn unsubscribe(&mut self, id: &SubscriberId) {
        self.subscribers.retain(|(existing, _)| existing != id);
    }

    pub fn handlers(&self) -> Vec<BrokerHandler> {
        self.subscribers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect()
    }
}

impl std::fmt::Debug for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&SubscriberId> = self.subscribers.iter().map(|(id, _)| id).collect();
        f.debug_struct("Topic")
            .field("name", &self.name)
            .field("subscribers", &ids)
            .finish()
    }
}
