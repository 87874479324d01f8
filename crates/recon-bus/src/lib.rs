//! Event Bus (C7): a topic-exchange event bus over AMQP, grounded on
//! `event_bus.py`'s `EventBus` / `QueueConfig`.
//!
//! - Topic exchange `scan.events`, durable.
//! - Four durable priority queues (`x-max-priority: 10`), one per pipeline
//!   stage, each bound to `"{queue}.#"`.
//! - Routing key `"{queue}.{event}"`; priority derived from `confidence`.

pub mod event;
pub mod queue_config;

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use lapin::options::{
    BasicAckOptions, BasicConsumeOptions, BasicPublishOptions, ExchangeDeclareOptions,
    QueueBindOptions, QueueDeclareOptions,
};
use lapin::types::{AMQPValue, FieldTable};
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use thiserror::Error;
use tokio::sync::Mutex;

pub use event::Event;

#[derive(Debug, Error)]
pub enum BusError {
    #[error("amqp error: {0}")]
    Amqp(#[from] lapin::Error),

    #[error("event missing 'event' field")]
    MissingEventName,

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// An async EventBus over a single AMQP channel.
pub struct EventBus {
    channel: Channel,
    declared_queues: Mutex<HashSet<String>>,
}

impl EventBus {
    /// Connect, open a channel, and declare the topic exchange.
    pub async fn connect(amqp_url: &str) -> Result<Self, BusError> {
        let connection = Connection::connect(
            amqp_url,
            ConnectionProperties::default()
                .with_executor(tokio_executor_trait::Tokio::current())
                .with_reactor(tokio_reactor_trait::Tokio),
        )
        .await?;
        let channel = connection.create_channel().await?;

        channel
            .exchange_declare(
                queue_config::EXCHANGE_NAME,
                ExchangeKind::Topic,
                ExchangeDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        tracing::info!(exchange = queue_config::EXCHANGE_NAME, "declared topic exchange");

        Ok(Self {
            channel,
            declared_queues: Mutex::new(HashSet::new()),
        })
    }

    async fn ensure_queue(&self, queue_name: &str, binding_pattern: &str) -> Result<(), BusError> {
        let mut declared = self.declared_queues.lock().await;
        if declared.contains(queue_name) {
            return Ok(());
        }

        let mut args = FieldTable::default();
        args.insert("x-max-priority".into(), AMQPValue::ShortShortUInt(10));

        self.channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                args,
            )
            .await?;

        self.channel
            .queue_bind(
                queue_name,
                queue_config::EXCHANGE_NAME,
                binding_pattern,
                QueueBindOptions::default(),
                FieldTable::default(),
            )
            .await?;

        declared.insert(queue_name.to_string());
        tracing::info!(queue = queue_name, binding = binding_pattern, "declared queue");
        Ok(())
    }

    /// Publish `event` to the topic exchange with a priority derived from
    /// its confidence.
    pub async fn publish(&self, event: &Event) -> Result<(), BusError> {
        if event.event.is_empty() {
            return Err(BusError::MissingEventName);
        }

        let routing_key = queue_config::routing_key(&event.event);
        let priority = queue_config::confidence_to_priority(event.confidence);
        let body = serde_json::to_vec(event)?;

        self.channel
            .basic_publish(
                queue_config::EXCHANGE_NAME,
                &routing_key,
                BasicPublishOptions::default(),
                &body,
                BasicProperties::default()
                    .with_delivery_mode(2)
                    .with_priority(priority),
            )
            .await?
            .await?;

        tracing::debug!(event = %event.event, %routing_key, priority, "published event");
        Ok(())
    }

    /// Subscribe to `queue_name`, invoking `handler` for each delivery and
    /// acking only after it returns successfully.
    pub async fn subscribe<F, Fut>(&self, queue_name: &str, handler: F) -> Result<(), BusError>
    where
        F: Fn(Event) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<(), BusError>> + Send,
    {
        let binding_pattern = queue_config::queue_binding(queue_name);
        self.ensure_queue(queue_name, &binding_pattern).await?;

        let handler = Arc::new(handler);
        let mut consumer = self
            .channel
            .basic_consume(
                queue_name,
                "recon-orchestrator",
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await?;

        tracing::info!(queue = queue_name, "subscribed");

        while let Some(delivery) = consumer.next().await {
            let delivery = delivery?;
            let event: Event = serde_json::from_slice(&delivery.data)?;
            let handler = handler.clone();
            if let Err(err) = handler(event).await {
                tracing::error!(queue = queue_name, error = %err, "handler failed, message left unacked");
                continue;
            }
            delivery.ack(BasicAckOptions::default()).await?;
        }

        Ok(())
    }
}
