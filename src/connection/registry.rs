//! Connection registry
//!
//! Concurrent map of the connections accepted by this process, keyed by
//! connection id. Insert and remove are atomic; removing an absent id is a
//! no-op. Callers that need to do blocking work over many connections take
//! a `snapshot` first so no shard lock is held during I/O.

use std::sync::Arc;

use dashmap::DashMap;

use crate::connection::connection::Connection;

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<String, Arc<Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Registers a connection, returning any previous entry with the same id.
    pub fn insert(&self, connection: Arc<Connection>) -> Option<Arc<Connection>> {
        self.connections
            .insert(connection.id().to_string(), connection)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.remove(id).map(|(_, connection)| connection)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn ids(&self) -> Vec<String> {
        self.connections
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }
}
