//! RabbitMQ transport backed by `lapin`.

use crate::error::{Error, TransportErrorKind};
use crate::transport::{Delivery, QueueChannel, Transport};
use async_trait::async_trait;
use futures::StreamExt;
use lapin::options::{BasicConsumeOptions, BasicQosOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties, Consumer};
use log::*;

const REPLY_SUCCESS: u16 = 200;

pub struct AmqpTransport {
    uri: String,
}

impl AmqpTransport {
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }
}

#[async_trait]
impl Transport for AmqpTransport {
    async fn connect(&self) -> Result<Box<dyn QueueChannel>, Error> {
        let connection = Connection::connect(&self.uri, ConnectionProperties::default())
            .await
            .map_err(Error::with_source(TransportErrorKind::Connection))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(Error::with_source(TransportErrorKind::Connection))?;

        Ok(Box::new(AmqpChannel {
            connection,
            channel,
            consumer: None,
        }))
    }
}

/// Keeps the connection alive for as long as its single channel is in use.
struct AmqpChannel {
    connection: Connection,
    channel: Channel,
    consumer: Option<Consumer>,
}

#[async_trait]
impl QueueChannel for AmqpChannel {
    async fn declare_queue(&mut self, name: &str, durable: bool) -> Result<(), Error> {
        self.channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(Error::with_source(TransportErrorKind::Setup))?;

        Ok(())
    }

    async fn set_prefetch(&mut self, count: u16) -> Result<(), Error> {
        self.channel
            .basic_qos(count, BasicQosOptions::default())
            .await
            .map_err(Error::with_source(TransportErrorKind::Setup))
    }

    async fn consume(&mut self, queue: &str, consumer_tag: &str) -> Result<(), Error> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                consumer_tag,
                BasicConsumeOptions {
                    no_ack: true,
                    ..BasicConsumeOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(Error::with_source(TransportErrorKind::Setup))?;

        self.consumer = Some(consumer);
        Ok(())
    }

    async fn next_delivery(&mut self) -> Option<Result<Delivery, Error>> {
        let Some(consumer) = self.consumer.as_mut() else {
            return Some(Err(Error::new(TransportErrorKind::NotConsuming)));
        };

        consumer.next().await.map(|delivery| {
            delivery
                .map(|delivery| Delivery {
                    body: delivery.data,
                })
                .map_err(Error::with_source(TransportErrorKind::Receive))
        })
    }

    async fn close(&mut self) {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "OK").await {
            debug!("Error closing RabbitMQ channel: {e}");
        }
        if let Err(e) = self.connection.close(REPLY_SUCCESS, "OK").await {
            debug!("Error closing RabbitMQ connection: {e}");
        }
    }
}
