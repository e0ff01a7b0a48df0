//! AMQP consumer plumbing shared by the broker-facing tools.
//!
//! A consumer declares its queue, binds it to each exchange under each key and
//! then pulls deliveries one at a time. Handlers run to completion before the
//! next delivery is taken, so messages are processed in broker order.

use std::collections::BTreeMap;
use std::future::Future;

use futures::StreamExt;
use lapin::options::{
    BasicConsumeOptions, BasicQosOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::error::{BusError, BusResult};

/// Binding key matching every switch event routing key.
pub const ALL_EVENTS: &str = "*.*.*.*.*";

/// Exchange name to the binding keys used on it.
pub type RoutingMap = BTreeMap<String, Vec<String>>;

/// Queue layout of one consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueSpec {
    pub queue: String,
    pub durable: bool,
    pub routing: RoutingMap,
}

impl QueueSpec {
    /// A queue bound to a single exchange with the given keys.
    pub fn new(queue: impl Into<String>, durable: bool, exchange: &str, keys: &[&str]) -> Self {
        let mut routing = RoutingMap::new();
        routing.insert(
            exchange.to_string(),
            keys.iter().map(|k| k.to_string()).collect(),
        );
        Self {
            queue: queue.into(),
            durable,
            routing,
        }
    }
}

/// Queue name for a tool on this host, e.g. `pbx1_cli_event_queue`.
pub fn host_queue_name(suffix: &str) -> String {
    let host = hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "localhost".to_string());
    format!("{}_{}", host, suffix)
}

/// One delivery as seen by a handler.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub exchange: String,
    pub routing_key: String,
    pub properties: BasicProperties,
    pub body: Vec<u8>,
}

/// Per-delivery callback.
///
/// Errors are logged by the consume loop and never stop it.
#[async_trait::async_trait]
pub trait DeliveryHandler: Send + Sync {
    async fn handle(&self, message: InboundMessage) -> BusResult<()>;
}

/// Broker connection with one channel.
pub struct AmqpConnection {
    connection: Connection,
    channel: Channel,
}

impl AmqpConnection {
    /// Connects and opens a channel.
    pub async fn connect(config: &BrokerConfig) -> BusResult<Self> {
        let connection =
            Connection::connect(&config.amqp_uri(), ConnectionProperties::default()).await?;
        let channel = connection.create_channel().await?;
        // Prefetch one delivery at a time.
        channel.basic_qos(1, BasicQosOptions::default()).await?;
        info!(broker = %config.redacted_uri(), "Connected to broker");
        Ok(Self {
            connection,
            channel,
        })
    }

    /// Declares a topic exchange.
    ///
    /// Redeclaring with the same durability is a no-op; the broker rejects a
    /// mismatch with PRECONDITION_FAILED.
    pub async fn setup_exchange(&self, name: &str, durable: bool) -> BusResult<()> {
        self.channel
            .exchange_declare(
                name,
                ExchangeKind::Topic,
                exchange_options(durable),
                FieldTable::default(),
            )
            .await?;
        debug!(exchange = name, durable, "Exchange declared");
        Ok(())
    }

    /// Declares the queue and binds it under every key of every exchange.
    pub async fn setup_queues(&self, spec: &QueueSpec) -> BusResult<()> {
        self.channel
            .queue_declare(
                &spec.queue,
                QueueDeclareOptions {
                    durable: spec.durable,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        for (exchange, keys) in &spec.routing {
            for key in keys {
                self.channel
                    .queue_bind(
                        &spec.queue,
                        exchange,
                        key,
                        QueueBindOptions::default(),
                        FieldTable::default(),
                    )
                    .await?;
                debug!(queue = %spec.queue, exchange = %exchange, key = %key, "Queue bound");
            }
        }
        Ok(())
    }

    /// Consumes `queue` until `shutdown` resolves or the broker goes away.
    ///
    /// Deliveries are auto-acknowledged.
    pub async fn consume<H, F>(&self, queue: &str, handler: &H, shutdown: F) -> BusResult<()>
    where
        H: DeliveryHandler + ?Sized,
        F: Future<Output = ()>,
    {
        let mut consumer = self
            .channel
            .basic_consume(
                queue,
                "",
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        info!(queue, "Waiting for messages");

        tokio::pin!(shutdown);
        loop {
            let delivery = tokio::select! {
                _ = &mut shutdown => {
                    info!(queue, "Shutdown requested");
                    return Ok(());
                }
                next = consumer.next() => next,
            };

            let delivery = match delivery {
                Some(Ok(delivery)) => delivery,
                Some(Err(e)) => return Err(BusError::from(e)),
                None => {
                    return Err(BusError::Transport(
                        "Broker closed the consumer".to_string(),
                    ))
                }
            };

            let message = InboundMessage {
                exchange: delivery.exchange.as_str().to_string(),
                routing_key: delivery.routing_key.as_str().to_string(),
                properties: delivery.properties,
                body: delivery.data,
            };
            let routing_key = message.routing_key.clone();
            if let Err(e) = handler.handle(message).await {
                warn!(routing_key = %routing_key, error = %e, "Delivery handling failed");
            }
        }
    }

    /// Closes the channel and the connection.
    pub async fn close(self) -> BusResult<()> {
        self.channel.close(200, "Bye").await?;
        self.connection.close(200, "Bye").await?;
        debug!("Broker connection closed");
        Ok(())
    }
}

fn exchange_options(durable: bool) -> ExchangeDeclareOptions {
    ExchangeDeclareOptions {
        durable,
        ..Default::default()
    }
}

/// Resolves on SIGINT or, on unix, SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
