use crate::message::{Message, StreamSink};
use crate::session::SessionRegistry;
use std::sync::Arc;

/// Routes a payload to the one live session registered for a user.
pub struct Broadcaster {
    sink: Arc<dyn StreamSink>,
    sessions: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(sink: Arc<dyn StreamSink>, sessions: Arc<SessionRegistry>) -> Self {
        Self { sink, sessions }
    }

    /// Fire-and-forget: an empty id or an offline user is silently ignored.
    pub fn broadcast(&self, user_id: &str, data: &[u8]) {
        if user_id.is_empty() {
            return;
        }

        let Some(identity) = self.sessions.find(user_id) else {
            return;
        };

        self.sink.send(Message {
            data: data.to_vec(),
            namespace: identity.namespace(),
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::session::Identity;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingSink {
        pub(crate) sent: Mutex<Vec<Message>>,
    }

    impl StreamSink for RecordingSink {
        fn send(&self, message: Message) {
            self.sent.lock().unwrap().push(message);
        }
    }

    fn setup() -> (Arc<RecordingSink>, Arc<SessionRegistry>, Broadcaster) {
        let sink = Arc::new(RecordingSink::default());
        let sessions = Arc::new(SessionRegistry::new());
        let broadcaster = Broadcaster::new(sink.clone(), sessions.clone());
        (sink, sessions, broadcaster)
    }

    #[test]
    fn empty_user_id_is_a_noop() {
        let (sink, sessions, broadcaster) = setup();
        sessions.insert(Identity::new("topicA", "", "nonceX"));

        broadcaster.broadcast("", b"payload");

        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn offline_user_is_a_noop() {
        let (sink, sessions, broadcaster) = setup();
        sessions.insert(Identity::new("topicA", "user1", "nonceX"));

        broadcaster.broadcast("user2", b"payload");

        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn connected_user_gets_exactly_one_send_on_its_namespace() {
        let (sink, sessions, broadcaster) = setup();
        sessions.insert(Identity::new("topicA", "user1", "nonceX"));

        broadcaster.broadcast("user1", b"payload");

        assert_eq!(
            *sink.sent.lock().unwrap(),
            vec![Message {
                data: b"payload".to_vec(),
                namespace: "topicA/user1/nonceX".to_string(),
            }]
        );
    }

    #[test]
    fn reconnect_routes_to_the_latest_nonce() {
        let (sink, sessions, broadcaster) = setup();
        sessions.insert(Identity::new("topicA", "user1", "n1"));
        sessions.insert(Identity::new("topicA", "user1", "n2"));

        broadcaster.broadcast("user1", b"payload");

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].namespace, "topicA/user1/n2");
    }
}
