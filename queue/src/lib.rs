//! RabbitMQ consumption for the broadcast gateway.
//!
//! A `Supervisor` fills a fixed number of consumer slots at startup. Each slot
//! runs its own `Disconnected -> Connecting -> Consuming` loop: it opens a
//! channel, declares the durable queue, sets a prefetch of one and hands every
//! delivery to the `events::Dispatcher`. A lost channel is re-opened after a
//! fixed delay. The pool size bounds broker connections, it does not shed load.
//!
//! The broker itself sits behind the `Transport` trait; `AmqpTransport` is the
//! `lapin` implementation used in production.

pub mod amqp;
pub mod error;
pub mod supervisor;
pub mod transport;

pub use amqp::AmqpTransport;
pub use error::{Error, TransportErrorKind};
pub use supervisor::{ConsumerConfig, Supervisor, PREFETCH_COUNT};
pub use transport::{Delivery, QueueChannel, Transport};
