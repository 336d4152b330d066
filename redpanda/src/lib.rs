//! Kafka-compatible event log for the review service, built on rdkafka.
//!
//! Works against Redpanda, Apache Kafka or any other Kafka-protocol broker.
//!
//! # Write side
//!
//! [`RedpandaEventLog`] appends JSON-encoded [`ChangeEvent`]s to a single
//! topic. Every record is keyed with the decimal review id, so all events
//! for one review land on one partition and replay in order. Delivery is
//! at-least-once; the send itself is bounded by a producer timeout because
//! the repository treats publication as best-effort and must never hang a
//! committed write on a slow broker.
//!
//! # Read side
//!
//! [`RedpandaEventConsumer`] joins a consumer group on the same topic and
//! decodes messages back into [`ChangeEvent`]s. Offsets auto-commit, which
//! matches the projector's skip-on-bad-message policy: an event that cannot
//! be decoded or indexed is logged and left behind, not retried forever.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;
use review_core::{ChangeEvent, EventLog, EventLogError};
use std::time::Duration;

/// Producer half: appends change events onto the configured topic.
pub struct RedpandaEventLog {
    producer: FutureProducer,
    topic: String,
    timeout: Duration,
}

impl RedpandaEventLog {
    /// Create a producer with default settings (leader acks, 5 s send
    /// timeout).
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::Transport`] if the producer cannot be
    /// created from the broker list.
    pub fn new(brokers: &str, topic: impl Into<String>) -> Result<Self, EventLogError> {
        Self::builder().brokers(brokers).topic(topic).build()
    }

    /// Start building a producer with custom settings.
    #[must_use]
    pub fn builder() -> RedpandaEventLogBuilder {
        RedpandaEventLogBuilder::default()
    }
}

/// Builder for [`RedpandaEventLog`].
#[derive(Default)]
pub struct RedpandaEventLogBuilder {
    brokers: Option<String>,
    topic: Option<String>,
    acks: Option<String>,
    timeout: Option<Duration>,
}

impl RedpandaEventLogBuilder {
    /// Comma-separated broker addresses.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Topic the change events are appended to.
    #[must_use]
    pub fn topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    /// Producer acknowledgment mode: `"0"`, `"1"` or `"all"`. Default `"1"`.
    #[must_use]
    pub fn acks(mut self, acks: impl Into<String>) -> Self {
        self.acks = Some(acks.into());
        self
    }

    /// Upper bound on a single send. Default 5 seconds.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the producer.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::Transport`] when brokers are missing or the
    /// underlying client rejects the configuration.
    pub fn build(self) -> Result<RedpandaEventLog, EventLogError> {
        let brokers = self
            .brokers
            .ok_or_else(|| EventLogError::Transport("brokers not configured".to_string()))?;
        let topic = self
            .topic
            .ok_or_else(|| EventLogError::Transport("topic not configured".to_string()))?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", "5000")
            .set("acks", self.acks.as_deref().unwrap_or("1"))
            .create()
            .map_err(|e| EventLogError::Transport(format!("failed to create producer: {e}")))?;

        tracing::info!(brokers = %brokers, topic = %topic, "event log producer created");

        Ok(RedpandaEventLog {
            producer,
            topic,
            timeout: self.timeout.unwrap_or(Duration::from_secs(5)),
        })
    }
}

#[async_trait::async_trait]
impl EventLog for RedpandaEventLog {
    async fn publish(&self, event: &ChangeEvent) -> Result<(), EventLogError> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| EventLogError::Publish(format!("encode event: {e}")))?;
        let key = event.key();

        let record = FutureRecord::to(&self.topic).payload(&payload).key(&key);

        match self
            .producer
            .send(record, Timeout::After(self.timeout))
            .await
        {
            Ok((partition, offset)) => {
                tracing::debug!(
                    topic = %self.topic,
                    partition,
                    offset,
                    op = %event.op,
                    review_id = event.payload.id,
                    "change event published"
                );
                Ok(())
            }
            Err((kafka_error, _)) => Err(EventLogError::Publish(kafka_error.to_string())),
        }
    }
}

/// Consumer half: a group member decoding change events off the topic.
pub struct RedpandaEventConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl RedpandaEventConsumer {
    /// Join `group_id` on `topic`.
    ///
    /// Offsets auto-commit and a fresh group starts from the earliest
    /// record, so a new projector backfills the whole index.
    ///
    /// # Errors
    ///
    /// Returns [`EventLogError::Transport`] if the consumer cannot be
    /// created or the subscription is rejected.
    pub fn new(brokers: &str, group_id: &str, topic: &str) -> Result<Self, EventLogError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", brokers)
            .set("group.id", group_id)
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest")
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(|e| EventLogError::Transport(format!("failed to create consumer: {e}")))?;

        consumer
            .subscribe(&[topic])
            .map_err(|e| EventLogError::Transport(format!("failed to subscribe: {e}")))?;

        tracing::info!(topic = %topic, group = %group_id, "event log consumer subscribed");

        Ok(Self {
            consumer,
            topic: topic.to_string(),
        })
    }

    /// Wait for the next change event.
    ///
    /// # Errors
    ///
    /// [`EventLogError::Decode`] for a message that is not a change event
    /// (skip it and read on); [`EventLogError::Transport`] for broker
    /// failures (back off and retry).
    pub async fn recv(&self) -> Result<ChangeEvent, EventLogError> {
        let message = self
            .consumer
            .recv()
            .await
            .map_err(|e| EventLogError::Transport(e.to_string()))?;

        let payload = message
            .payload()
            .ok_or_else(|| EventLogError::Decode("message has no payload".to_string()))?;

        serde_json::from_slice(payload).map_err(|e| EventLogError::Decode(e.to_string()))
    }

    /// The topic this consumer reads.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
