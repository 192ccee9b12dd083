/// A payload addressed to one SSE namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub data: Vec<u8>,
    pub namespace: String,
}

/// Anything that can push a namespaced message to open streams.
///
/// Delivery is best-effort: implementations decide how to buffer, and a
/// namespace with no open stream simply drops the message.
pub trait StreamSink: Send + Sync {
    fn send(&self, message: Message);
}
