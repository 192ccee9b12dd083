use crate::error::Error;
use async_trait::async_trait;

/// A single message pulled off the queue.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub body: Vec<u8>,
}

/// Opens broker channels. One call is one connection plus one channel.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn QueueChannel>, Error>;
}

/// An open channel on the broker.
///
/// Deliveries are auto-acknowledged; callers never ack or nack.
#[async_trait]
pub trait QueueChannel: Send {
    async fn declare_queue(&mut self, name: &str, durable: bool) -> Result<(), Error>;

    /// Limit unacknowledged deliveries held by this channel.
    async fn set_prefetch(&mut self, count: u16) -> Result<(), Error>;

    async fn consume(&mut self, queue: &str, consumer_tag: &str) -> Result<(), Error>;

    /// Wait for the next delivery. `None` means the broker closed the consumer.
    async fn next_delivery(&mut self) -> Option<Result<Delivery, Error>>;

    async fn close(&mut self);
}
