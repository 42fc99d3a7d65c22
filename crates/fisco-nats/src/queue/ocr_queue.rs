//! OCR work queue built on a JetStream work-queue stream.

use std::time::Duration;

use async_nats::jetstream::{self, AckKind, stream};
use futures::StreamExt;
use tracing::{debug, instrument, warn};

use super::job_message::JobMessage;
use crate::{Error, Result, TRACING_TARGET_QUEUE};

/// Stream name for OCR jobs.
pub const STREAM_NAME: &str = "FISCO_OCR";

/// Subject OCR job messages are published to.
pub const SUBJECT: &str = "fisco.ocr.jobs";

/// Durable consumer name shared by all OCR workers.
pub const CONSUMER_NAME: &str = "ocr-worker";

// Unacknowledged messages are redelivered after this window. Must exceed
// the longest expected extraction run.
const DEFAULT_ACK_WAIT: Duration = Duration::from_secs(300);

// Redelivery cap before JetStream stops offering the message.
const DEFAULT_MAX_DELIVER: i64 = 5;

// Messages expire after 7 days even if never consumed.
const MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Work queue for OCR jobs.
///
/// Work-queue retention with a shared durable pull consumer gives each
/// message to exactly one worker at a time, with at-least-once delivery
/// across worker crashes.
#[derive(Debug, Clone)]
pub struct OcrQueue {
    jetstream: jetstream::Context,
    ack_wait: Duration,
    max_deliver: i64,
}

impl OcrQueue {
    /// Creates the queue, ensuring the underlying stream exists.
    #[instrument(skip(jetstream), target = TRACING_TARGET_QUEUE)]
    pub async fn new(jetstream: &jetstream::Context) -> Result<Self> {
        let stream_config = stream::Config {
            name: STREAM_NAME.to_string(),
            description: Some("OCR job queue for submitted fiscal documents".to_string()),
            subjects: vec![SUBJECT.to_string()],
            retention: stream::RetentionPolicy::WorkQueue,
            max_age: MAX_AGE,
            ..Default::default()
        };

        // Try to get existing stream first
        match jetstream.get_stream(STREAM_NAME).await {
            Ok(_) => {
                debug!(
                    target: TRACING_TARGET_QUEUE,
                    stream = %STREAM_NAME,
                    "Using existing job stream"
                );
            }
            Err(_) => {
                // Stream doesn't exist, create it
                debug!(
                    target: TRACING_TARGET_QUEUE,
                    stream = %STREAM_NAME,
                    subject = %SUBJECT,
                    "Creating new job stream"
                );
                jetstream
                    .create_stream(stream_config)
                    .await
                    .map_err(|e| Error::operation("stream_create", e.to_string()))?;
            }
        }

        Ok(Self {
            jetstream: jetstream.clone(),
            ack_wait: DEFAULT_ACK_WAIT,
            max_deliver: DEFAULT_MAX_DELIVER,
        })
    }

    /// Sets the acknowledgement window for consumers.
    #[must_use]
    pub fn with_ack_wait(mut self, ack_wait: Duration) -> Self {
        self.ack_wait = ack_wait;
        self
    }

    /// Sets the redelivery cap for consumers.
    #[must_use]
    pub fn with_max_deliver(mut self, max_deliver: i64) -> Self {
        self.max_deliver = max_deliver;
        self
    }

    /// Returns the acknowledgement window.
    #[inline]
    pub fn ack_wait(&self) -> Duration {
        self.ack_wait
    }

    /// Returns the redelivery cap.
    #[inline]
    pub fn max_deliver(&self) -> i64 {
        self.max_deliver
    }

    /// Publishes a job message to the queue.
    ///
    /// Waits for the JetStream acknowledgement, so a returned `Ok` means
    /// the message is persisted in the stream.
    #[instrument(skip(self, message), target = TRACING_TARGET_QUEUE)]
    pub async fn publish(&self, message: &JobMessage) -> Result<()> {
        let payload = serde_json::to_vec(message)?;

        self.jetstream
            .publish(SUBJECT, payload.into())
            .await
            .map_err(|e| Error::delivery_failed(SUBJECT, e.to_string()))?
            .await
            .map_err(|e| Error::operation("job_publish", e.to_string()))?;

        debug!(
            target: TRACING_TARGET_QUEUE,
            job_id = %message.job_id,
            subject = %SUBJECT,
            "Published job message"
        );
        Ok(())
    }

    /// Creates the durable consumer and returns a message stream.
    ///
    /// All workers share the same durable consumer, so the queue load
    /// balances across them.
    #[instrument(skip(self), target = TRACING_TARGET_QUEUE)]
    pub async fn subscribe(&self) -> Result<JobStream> {
        let consumer_config = jetstream::consumer::pull::Config {
            name: Some(CONSUMER_NAME.to_string()),
            durable_name: Some(CONSUMER_NAME.to_string()),
            description: Some("OCR worker job consumer".to_string()),
            ack_wait: self.ack_wait,
            max_deliver: self.max_deliver,
            ..Default::default()
        };

        let stream = self
            .jetstream
            .get_stream(STREAM_NAME)
            .await
            .map_err(|e| Error::stream_error(STREAM_NAME, e.to_string()))?;

        let consumer = stream
            .create_consumer(consumer_config)
            .await
            .map_err(|e| Error::consumer_error(CONSUMER_NAME, e.to_string()))?;

        let messages = consumer
            .messages()
            .await
            .map_err(|e| Error::consumer_error(CONSUMER_NAME, e.to_string()))?;

        debug!(
            target: TRACING_TARGET_QUEUE,
            consumer = %CONSUMER_NAME,
            stream = %STREAM_NAME,
            ack_wait = ?self.ack_wait,
            max_deliver = self.max_deliver,
            "Created durable consumer"
        );

        Ok(JobStream { messages })
    }
}

/// Stream of delivered job messages.
pub struct JobStream {
    messages: jetstream::consumer::pull::Stream,
}

impl JobStream {
    /// Waits for the next job message.
    ///
    /// Returns `None` when the underlying consumer stream ends. Messages
    /// that cannot be decoded are terminated (never redelivered) and
    /// surfaced as errors.
    pub async fn next(&mut self) -> Option<Result<DeliveredJob>> {
        let message = match self.messages.next().await? {
            Ok(message) => message,
            Err(e) => return Some(Err(Error::consumer_error(CONSUMER_NAME, e.to_string()))),
        };

        match serde_json::from_slice::<JobMessage>(&message.payload) {
            Ok(job) => Some(Ok(DeliveredJob {
                message: job,
                inner: message,
            })),
            Err(e) => {
                // Poison message, terminate instead of letting it redeliver
                warn!(
                    target: TRACING_TARGET_QUEUE,
                    error = %e,
                    "Failed to decode job message, terminating delivery"
                );
                if let Err(ack_err) = message.ack_with(AckKind::Term).await {
                    warn!(
                        target: TRACING_TARGET_QUEUE,
                        error = %ack_err,
                        "Failed to terminate poison message"
                    );
                }
                Some(Err(Error::Serialization(e)))
            }
        }
    }
}

impl std::fmt::Debug for JobStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobStream").finish_non_exhaustive()
    }
}

/// A job message delivered to a worker, pending acknowledgement.
///
/// Dropping without acknowledging leaves the message in flight; JetStream
/// redelivers it after the acknowledgement window.
pub struct DeliveredJob {
    message: JobMessage,
    inner: jetstream::Message,
}

impl DeliveredJob {
    /// Returns the decoded message.
    #[inline]
    pub fn message(&self) -> &JobMessage {
        &self.message
    }

    /// Returns which delivery attempt this is (1 for the first).
    pub fn delivery_attempt(&self) -> Result<i64> {
        let info = self
            .inner
            .info()
            .map_err(|e| Error::operation("message_info", e.to_string()))?;
        Ok(info.delivered)
    }

    /// Acknowledges the message, removing it from the queue.
    pub async fn ack(self) -> Result<()> {
        self.inner
            .ack()
            .await
            .map_err(|e| Error::ack(e.to_string()))
    }

    /// Negatively acknowledges the message, requesting redelivery.
    ///
    /// With `delay`, redelivery waits at least that long; otherwise the
    /// message is eligible immediately.
    pub async fn nak(self, delay: Option<Duration>) -> Result<()> {
        self.inner
            .ack_with(AckKind::Nak(delay))
            .await
            .map_err(|e| Error::ack(e.to_string()))
    }

    /// Terminates the message, preventing any further redelivery.
    pub async fn term(self) -> Result<()> {
        self.inner
            .ack_with(AckKind::Term)
            .await
            .map_err(|e| Error::ack(e.to_string()))
    }
}

impl std::fmt::Debug for DeliveredJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveredJob")
            .field("job_id", &self.message.job_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_constants() {
        assert_eq!(STREAM_NAME, "FISCO_OCR");
        assert_eq!(SUBJECT, "fisco.ocr.jobs");
        assert_eq!(CONSUMER_NAME, "ocr-worker");
    }

    #[test]
    fn ack_wait_exceeds_default_extraction_budget() {
        // Redelivery before a slow extraction finishes would double-process.
        assert!(DEFAULT_ACK_WAIT >= Duration::from_secs(120));
        assert!(DEFAULT_MAX_DELIVER > 1);
    }
}
