use crate::broadcaster::Broadcaster;
use async_trait::async_trait;
use events::message::FoundContract;
use events::MessageHandler;
use log::*;
use std::sync::Arc;

/// Relays `foundcontract` messages to the user they were found for.
///
/// The raw queued body is forwarded unchanged so the frontend receives the
/// same JSON the producer published.
pub struct FoundContractHandler {
    broadcaster: Arc<Broadcaster>,
}

impl FoundContractHandler {
    pub fn new(broadcaster: Arc<Broadcaster>) -> Self {
        Self { broadcaster }
    }
}

#[async_trait]
impl MessageHandler for FoundContractHandler {
    fn message_type(&self) -> &'static str {
        FoundContract::MESSAGE_TYPE
    }

    async fn handle(&self, body: &[u8]) {
        let found_contract: FoundContract = match serde_json::from_slice(body) {
            Ok(found_contract) => found_contract,
            Err(e) => {
                warn!("unable to decode json for 'foundcontract' message, error: {e}");
                return;
            }
        };

        // Offline users simply miss the event.
        debug!(
            "broadcasting 'foundcontract' message to user: {}",
            found_contract.user_id
        );
        self.broadcaster.broadcast(&found_contract.user_id, body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcaster::tests::RecordingSink;
    use crate::session::{Identity, SessionRegistry};

    fn setup() -> (Arc<RecordingSink>, Arc<SessionRegistry>, FoundContractHandler) {
        let sink = Arc::new(RecordingSink::default());
        let sessions = Arc::new(SessionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(sink.clone(), sessions.clone()));
        (sink, sessions, FoundContractHandler::new(broadcaster))
    }

    #[tokio::test]
    async fn forwards_the_raw_body_to_the_connected_user() {
        let (sink, sessions, handler) = setup();
        sessions.insert(Identity::new("topicA", "user1", "nonceX"));
        let body = br#"{"type":"foundcontract","userid":"user1","filename":"a.sol","filepath":"/c/a.sol","finished":false}"#;

        handler.handle(body).await;

        let sent = sink.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].namespace, "topicA/user1/nonceX");
        assert_eq!(sent[0].data, body.to_vec());
    }

    #[tokio::test]
    async fn undecodable_body_is_dropped() {
        let (sink, sessions, handler) = setup();
        sessions.insert(Identity::new("topicA", "user1", "nonceX"));

        handler
            .handle(br#"{"type":"foundcontract","userid":"user1"}"#)
            .await;

        assert!(sink.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn crlf_formatted_body_reaches_the_open_stream() {
        use crate::manager::Manager;
        use tokio::sync::mpsc;

        let manager = Arc::new(Manager::new());
        let sessions = Arc::new(SessionRegistry::new());
        let handler =
            FoundContractHandler::new(Arc::new(Broadcaster::new(manager.clone(), sessions.clone())));
        let identity = Identity::new("topicA", "user1", "nonceX");
        let (tx, mut rx) = mpsc::unbounded_channel();
        manager.register_connection(identity.namespace(), tx);
        sessions.insert(identity);

        handler
            .handle(b"{\"type\":\"foundcontract\",\r\n\"userid\":\"user1\",\r\n\"filename\":\"a.sol\",\r\n\"filepath\":\"/c/a.sol\",\r\n\"finished\":true}")
            .await;

        assert!(rx.try_recv().is_ok());
    }

    #[test]
    fn registers_under_foundcontract() {
        let (_, _, handler) = setup();
        assert_eq!(handler.message_type(), "foundcontract");
    }
}
