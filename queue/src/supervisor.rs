use crate::error::Error;
use crate::transport::{QueueChannel, Transport};
use events::Dispatcher;
use futures::FutureExt;
use log::*;
use service::config::Config;
use service::retry::StartupRetry;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Never pull ahead: each consumer holds at most one unacknowledged message.
pub const PREFETCH_COUNT: u16 = 1;

#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    pub queue_name: String,
    pub slots: usize,
    pub reconnect_delay: Duration,
}

impl From<&Config> for ConsumerConfig {
    fn from(config: &Config) -> Self {
        Self {
            queue_name: config.rabbitmq_queue_name.clone(),
            slots: config.rabbitmq_consumers,
            reconnect_delay: config.rabbitmq_reconnect_delay(),
        }
    }
}

/// Owns a fixed pool of consumer slots, each running its own reconnect loop forever.
pub struct Supervisor {
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    config: Arc<ConsumerConfig>,
}

impl Supervisor {
    pub fn new(transport: Arc<dyn Transport>, dispatcher: Dispatcher, config: ConsumerConfig) -> Self {
        Self {
            transport,
            dispatcher,
            config: Arc::new(config),
        }
    }

    /// Check the broker is reachable before serving traffic.
    pub async fn check_connectivity(&self, retry: &StartupRetry) -> Result<(), Error> {
        let mut channel = retry.run("rabbitmq", || self.transport.connect()).await?;
        channel.close().await;
        Ok(())
    }

    /// Fill every slot once. Slots only stop when `shutdown` is cancelled.
    pub fn spawn(self, shutdown: CancellationToken) -> Vec<JoinHandle<()>> {
        if self.config.slots == 0 {
            warn!("No RabbitMQ consumer slots configured, queued messages will not be consumed");
        }
        if self.dispatcher.is_empty() {
            warn!("No message handlers registered, every queued message will be dropped");
        }
        info!(
            "Starting {} RabbitMQ consumers on queue '{}' with {} message handlers",
            self.config.slots,
            self.config.queue_name,
            self.dispatcher.len()
        );

        (0..self.config.slots)
            .map(|id| {
                let slot = Slot {
                    id,
                    transport: Arc::clone(&self.transport),
                    dispatcher: self.dispatcher.clone(),
                    config: Arc::clone(&self.config),
                };
                tokio::spawn(slot.run(shutdown.clone()))
            })
            .collect()
    }
}

enum SlotState {
    Disconnected,
    Connecting,
    Consuming(Box<dyn QueueChannel>),
}

struct Slot {
    id: usize,
    transport: Arc<dyn Transport>,
    dispatcher: Dispatcher,
    config: Arc<ConsumerConfig>,
}

impl Slot {
    async fn run(self, shutdown: CancellationToken) {
        let mut state = SlotState::Disconnected;

        while !shutdown.is_cancelled() {
            state = match state {
                SlotState::Disconnected => SlotState::Connecting,
                SlotState::Connecting => {
                    let opened = tokio::select! {
                        _ = shutdown.cancelled() => break,
                        opened = self.open() => opened,
                    };

                    match opened {
                        Ok(channel) => {
                            debug!("Consumer {} connected to RabbitMQ", self.id);
                            SlotState::Consuming(channel)
                        }
                        Err(e) => {
                            error!("Consumer {} unable to connect to RabbitMQ, error: {e}", self.id);
                            if !self.back_off(&shutdown).await {
                                break;
                            }
                            SlotState::Disconnected
                        }
                    }
                }
                SlotState::Consuming(mut channel) => {
                    let delivery = tokio::select! {
                        _ = shutdown.cancelled() => None,
                        delivery = channel.next_delivery() => Some(delivery),
                    };

                    match delivery {
                        None => {
                            channel.close().await;
                            break;
                        }
                        Some(Some(Ok(delivery))) => {
                            self.process(&delivery.body).await;
                            SlotState::Consuming(channel)
                        }
                        Some(Some(Err(e))) => {
                            error!("Consumer {} error consuming from RabbitMQ: {e}", self.id);
                            channel.close().await;
                            if !self.back_off(&shutdown).await {
                                break;
                            }
                            SlotState::Disconnected
                        }
                        Some(None) => {
                            error!("Consumer {} lost its RabbitMQ channel", self.id);
                            channel.close().await;
                            if !self.back_off(&shutdown).await {
                                break;
                            }
                            SlotState::Disconnected
                        }
                    }
                }
            };
        }

        debug!("Consumer {} stopped", self.id);
    }

    /// Waits out the reconnect delay. Returns false if shutdown arrived first.
    async fn back_off(&self, shutdown: &CancellationToken) -> bool {
        tokio::select! {
            _ = shutdown.cancelled() => false,
            _ = tokio::time::sleep(self.config.reconnect_delay) => true,
        }
    }

    async fn open(&self) -> Result<Box<dyn QueueChannel>, Error> {
        let mut channel = self.transport.connect().await?;
        channel.declare_queue(&self.config.queue_name, true).await?;
        channel.set_prefetch(PREFETCH_COUNT).await?;
        channel
            .consume(&self.config.queue_name, &self.consumer_tag())
            .await?;
        Ok(channel)
    }

    /// Handles one message to completion before the slot pulls the next.
    async fn process(&self, body: &[u8]) {
        match self.dispatcher.dispatch(body) {
            Ok(handler) => {
                debug!("message received for: {}", handler.message_type());
                let handled = AssertUnwindSafe(handler.handle(body)).catch_unwind().await;
                if handled.is_err() {
                    error!(
                        "Consumer {} handler for '{}' panicked, message dropped",
                        self.id,
                        handler.message_type()
                    );
                }
            }
            Err(e) => {
                warn!(
                    "could not find handler for message: {} ({e})",
                    String::from_utf8_lossy(body)
                );
            }
        }
    }

    fn consumer_tag(&self) -> String {
        format!("broadcast-gateway-{}", self.id)
    }
}
