use axum::response::sse::Event;
use dashmap::DashMap;
use log::*;
use std::collections::HashSet;
use std::convert::Infallible;
use tokio::sync::mpsc::UnboundedSender;

pub type EventSender = UnboundedSender<Result<Event, Infallible>>;

/// Unique identifier for an open SSE stream (server-generated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub namespace: String,
    pub sender: EventSender,
}

/// Registry of open SSE streams, indexed both by connection and by namespace
pub struct ConnectionRegistry {
    /// Primary storage: lookup by connection_id for registration/cleanup
    connections: DashMap<ConnectionId, ConnectionInfo>,

    /// Secondary index: namespace -> connections subscribed to it, for delivery
    namespace_index: DashMap<String, HashSet<ConnectionId>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            namespace_index: DashMap::new(),
        }
    }

    pub fn register(&self, namespace: String, sender: EventSender) -> ConnectionId {
        let connection_id = ConnectionId::new();

        self.connections.insert(
            connection_id.clone(),
            ConnectionInfo {
                namespace: namespace.clone(),
                sender,
            },
        );

        self.namespace_index
            .entry(namespace)
            .or_default()
            .insert(connection_id.clone());

        connection_id
    }

    pub fn unregister(&self, connection_id: &ConnectionId) {
        if let Some((_, info)) = self.connections.remove(connection_id) {
            let namespace = info.namespace;

            if let Some(mut entry) = self.namespace_index.get_mut(&namespace) {
                entry.remove(connection_id);

                if entry.is_empty() {
                    drop(entry); // Release lock before removal
                    self.namespace_index.remove(&namespace);
                }
            }
        }
    }

    /// Send an event to every stream open on `namespace`, returning how many accepted it.
    pub fn send_to_namespace(&self, namespace: &str, event: Event) -> usize {
        let mut delivered = 0;

        if let Some(connection_ids) = self.namespace_index.get(namespace) {
            for conn_id in connection_ids.iter() {
                if let Some(info) = self.connections.get(conn_id) {
                    match info.sender.send(Ok(event.clone())) {
                        Ok(()) => delivered += 1,
                        Err(e) => warn!(
                            "Failed to send event to connection {}: {}. Connection will be cleaned up.",
                            conn_id.as_str(),
                            e
                        ),
                    }
                }
            }
        }

        delivered
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    #[cfg(test)]
    pub(crate) fn has_namespace(&self, namespace: &str) -> bool {
        self.namespace_index.contains_key(namespace)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
