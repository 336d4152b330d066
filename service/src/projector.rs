//! The projector: consumes change events and materializes reviews into the
//! search index.
//!
//! One long-running loop per process, serial within its partition
//! assignment. The loop trades completeness for liveness exactly as the
//! write path does in reverse: a message that cannot be decoded or indexed
//! is logged and left behind (the topic is partitioned by review id, so the
//! next successful write for that review repairs the document), while a
//! broker failure backs off one second and retries forever.

use review_core::{ChangeEvent, ChangeOp, EventLogError, ReviewDocument, SearchError, SearchIndex};
use review_redpanda::RedpandaEventConsumer;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Backoff after a broker read failure.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Apply one change event to a search index.
///
/// `create` and `update` both index the payload (writes are last-write-wins
/// by document id, which is what makes replays safe); `delete` removes the
/// document and tolerates its absence.
///
/// # Errors
///
/// Propagates the index error; the caller decides whether to skip or fail.
pub async fn apply_event(
    index: &dyn SearchIndex,
    event: &ChangeEvent,
) -> Result<(), SearchError> {
    match event.op {
        ChangeOp::Create | ChangeOp::Update => {
            index
                .index(&ReviewDocument {
                    review: event.payload.clone(),
                    ts: event.ts,
                })
                .await
        }
        ChangeOp::Delete => index.delete(event.payload.id).await,
    }
}

/// The consumer loop binding a topic subscription to a search index.
pub struct Projector {
    consumer: RedpandaEventConsumer,
    index: Arc<dyn SearchIndex>,
}

impl Projector {
    /// Pair a consumer with the index it maintains.
    #[must_use]
    pub fn new(consumer: RedpandaEventConsumer, index: Arc<dyn SearchIndex>) -> Self {
        Self { consumer, index }
    }

    /// Run until the shutdown channel fires.
    ///
    /// The in-flight message completes (or is skipped) before the loop
    /// exits; dropping the consumer leaves its group cleanly.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(topic = self.consumer.topic(), "projector started");

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("projector shutting down");
                    break;
                }
                received = self.consumer.recv() => match received {
                    Ok(event) => {
                        if let Err(error) = apply_event(self.index.as_ref(), &event).await {
                            // Accept index drift in exchange for liveness;
                            // reconciliation is an offline concern.
                            tracing::warn!(
                                review_id = event.payload.id,
                                op = %event.op,
                                %error,
                                "failed to apply event, skipping"
                            );
                        } else {
                            tracing::debug!(
                                review_id = event.payload.id,
                                op = %event.op,
                                "event applied"
                            );
                        }
                    }
                    Err(EventLogError::Decode(error)) => {
                        // The message is unreclaimable; the offset advances
                        // past it.
                        tracing::warn!(%error, "undecodable event, skipping");
                    }
                    Err(error) => {
                        tracing::warn!(%error, "event log read failed, retrying");
                        tokio::time::sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
    }
}
