use entity_api::user::Backend;
use events::Dispatcher;
use log::*;
use queue::{AmqpTransport, ConsumerConfig, Supervisor};
use service::{config::Config, logging::Logger, retry::StartupRetry};
use sse::{Broadcaster, FoundContractHandler, Manager, SessionRegistry};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting broadcast gateway in {} mode", config.runtime_env());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let session_registry = Arc::new(SessionRegistry::new());
    let sse_manager = Arc::new(Manager::new());
    let broadcaster = Arc::new(Broadcaster::new(
        sse_manager.clone(),
        session_registry.clone(),
    ));

    let dispatcher =
        Dispatcher::new().with_handler(Arc::new(FoundContractHandler::new(broadcaster)));

    let supervisor = Supervisor::new(
        Arc::new(AmqpTransport::new(config.rabbitmq_url())),
        dispatcher,
        ConsumerConfig::from(&config),
    );

    let broker_retry = StartupRetry::new(
        config.rabbitmq_connect_attempts,
        Duration::from_secs(config.rabbitmq_connect_retry_secs),
    );
    if let Err(e) = supervisor.check_connectivity(&broker_retry).await {
        error!("Failed to establish RabbitMQ connection: {e}");
        std::process::exit(1);
    }

    let shutdown = CancellationToken::new();
    let consumers = supervisor.spawn(shutdown.clone());

    let app_state = web::AppState::new(
        Arc::new(Backend::new(&db)),
        &session_registry,
        &sse_manager,
    );

    tokio::select! {
        result = web::init_server(&config, app_state) => {
            if let Err(e) = result {
                error!("HTTP server stopped: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    shutdown.cancel();
    for consumer in consumers {
        if let Err(e) = consumer.await {
            warn!("Consumer task ended abnormally: {e}");
        }
    }

    info!("Broadcast gateway stopped");
}
