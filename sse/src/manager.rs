use crate::connection::{ConnectionId, ConnectionRegistry, EventSender};
use crate::message::{Message, StreamSink};
use axum::response::sse::Event;
use log::*;
use std::sync::Arc;

pub struct Manager {
    registry: Arc<ConnectionRegistry>,
}

impl Manager {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }

    /// Register a new stream on `namespace` and return its unique ID
    pub fn register_connection(&self, namespace: String, sender: EventSender) -> ConnectionId {
        let connection_id = self.registry.register(namespace, sender);
        debug!("Registered new SSE connection {}", connection_id.as_str());
        connection_id
    }

    pub fn unregister_connection(&self, connection_id: &ConnectionId) {
        debug!("Unregistering SSE connection {}", connection_id.as_str());
        self.registry.unregister(connection_id);
    }

    pub fn send_message(&self, message: Message) {
        let Some(event) = Self::event_for(&message) else {
            return;
        };

        let delivered = self.registry.send_to_namespace(&message.namespace, event);
        if delivered == 0 {
            debug!("No open SSE stream for namespace {}", message.namespace);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.registry.connection_count()
    }

    /// SSE fields cannot carry a bare `\r`, so every line ending is sent as `\n`
    /// and the payload goes out as one `data:` line per input line.
    fn event_for(message: &Message) -> Option<Event> {
        let data = match std::str::from_utf8(&message.data) {
            Ok(data) => data,
            Err(e) => {
                warn!(
                    "Dropping non UTF-8 payload for namespace {}: {e}",
                    message.namespace
                );
                return None;
            }
        };

        let data = if data.contains('\r') {
            data.replace("\r\n", "\n").replace('\r', "\n")
        } else {
            data.to_string()
        };

        Some(Event::default().data(data))
    }
}

impl Default for Manager {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamSink for Manager {
    fn send(&self, message: Message) {
        self.send_message(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn send_message_delivers_to_the_registered_namespace() {
        let manager = Manager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = manager.register_connection("topicA/user1/nonceX".to_string(), tx);

        manager.send(Message {
            data: br#"{"type":"foundcontract"}"#.to_vec(),
            namespace: "topicA/user1/nonceX".to_string(),
        });
        assert!(rx.try_recv().is_ok());

        manager.unregister_connection(&id);
        assert_eq!(manager.connection_count(), 0);
    }

    #[test]
    fn carriage_returns_in_the_payload_are_delivered() {
        let manager = Manager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection("topicA/user1/nonceX".to_string(), tx);

        manager.send(Message {
            data: b"{\"type\":\"foundcontract\",\r\n\"userid\":\"user1\",\r\"finished\":true}"
                .to_vec(),
            namespace: "topicA/user1/nonceX".to_string(),
        });

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn non_utf8_payload_is_dropped() {
        let manager = Manager::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection("topicA/user1/nonceX".to_string(), tx);

        manager.send(Message {
            data: vec![b'{', 0xff, 0xfe, b'}'],
            namespace: "topicA/user1/nonceX".to_string(),
        });

        assert!(rx.try_recv().is_err());
    }
}
