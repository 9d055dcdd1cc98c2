use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use serde::Serialize;
use thiserror::Error;

use crate::config::Config;
use crate::config::NotificationsConfig;
use crate::domain::auth::errors::NotificationError;
use crate::domain::auth::events::NotificationRequestedEvent;
use crate::domain::auth::ports::NotificationPublisher;
use crate::outbound::events::messages::NotificationMessage;

#[derive(Debug, Error)]
pub enum KafkaProducerError {
    #[error("Failed to send message to Kafka: {0}")]
    SendError(String),

    #[error("Failed to serialize message: {0}")]
    SerializationError(String),
}

impl From<KafkaProducerError> for NotificationError {
    fn from(err: KafkaProducerError) -> Self {
        match err {
            KafkaProducerError::SerializationError(msg) => {
                NotificationError::SerializationFailed(msg)
            }
            KafkaProducerError::SendError(msg) => NotificationError::PublishFailed(msg),
        }
    }
}

pub struct KafkaNotificationProducer {
    producer: FutureProducer,
    topic: String,
    links: NotificationsConfig,
    timeout: Duration,
}

impl KafkaNotificationProducer {
    /// Create a new Kafka notification producer with "at least once" delivery semantics
    ///
    /// # Arguments
    /// * `config` - Application configuration
    ///
    /// # Notes:
    /// - `acks=all`: Wait for all in-sync replicas to acknowledge
    /// - `enable.idempotence=true`: Prevents duplicate messages during retries
    /// - `max.in.flight.requests.per.connection=5`: Allows pipelining with ordering guarantees
    /// - `retry.backoff.ms=100`: Backoff between retry attempts
    pub fn new(config: &Config) -> Result<Self, anyhow::Error> {
        tracing::info!(
            "Initializing Kafka producer for notifications: brokers={}, topic={}",
            &config.kafka.brokers,
            &config.kafka.notification_topic
        );

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.kafka.brokers)
            .set("message.timeout.ms", "30000")
            .set("queue.buffering.max.messages", "10000")
            .set("compression.type", "gzip")
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("retries", "10")
            .set("max.in.flight.requests.per.connection", "5")
            .set("retry.backoff.ms", "100")
            .create()?;

        tracing::info!("Kafka producer initialized successfully");

        Ok(Self {
            producer,
            topic: config.kafka.notification_topic.to_string(),
            links: config.notifications.clone(),
            timeout: Duration::from_secs(30),
        })
    }

    /// Publish a message keyed by recipient, so that all mail for one
    /// address lands on the same partition in order.
    async fn publish<T: Serialize>(
        &self,
        recipient: &str,
        message: &T,
    ) -> Result<(), KafkaProducerError> {
        let payload = serde_json::to_string(message)
            .map_err(|e| KafkaProducerError::SerializationError(e.to_string()))?;

        let record = FutureRecord::to(&self.topic)
            .key(recipient)
            .payload(&payload);

        self.producer
            .send(record, Timeout::After(self.timeout))
            .await
            .map(|_| {
                tracing::debug!("Notification published to topic '{}'", self.topic);
            })
            .map_err(|(err, _)| KafkaProducerError::SendError(err.to_string()))
    }
}

#[async_trait]
impl NotificationPublisher for KafkaNotificationProducer {
    async fn publish_notification(
        &self,
        event: &NotificationRequestedEvent,
    ) -> Result<(), NotificationError> {
        let message = NotificationMessage::from_event(event, &self.links);

        self.publish(&event.recipient, &message).await.map_err(|e| {
            tracing::error!(
                "Failed to publish {} notification {}: {}",
                event.template,
                event.event_id,
                e
            );
            e.into()
        })
    }
}
