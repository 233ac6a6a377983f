//! Consumes one chunked reply into the transcript.

use crate::config::StreamConfig;
use crate::stream::decoder::Utf8StreamDecoder;
use crate::stream::errors::{StreamError, TimeoutPhase};
use crate::stream::session::SessionContext;
use crate::stream::transport::{QueryRequest, QueryTransport};
use crate::transcript::{MessageId, StreamId, Transcript};
use futures::StreamExt;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_util::sync::CancellationToken;

/// Timeouts and failure text for a stream
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Budget for the response headers plus the first chunk
    pub first_chunk_timeout: Duration,
    /// Maximum silence between two chunks
    pub chunk_timeout: Duration,
    /// Assistant message appended when the stream fails
    pub failure_message: String,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from(&StreamConfig::default())
    }
}

impl From<&StreamConfig> for StreamSettings {
    fn from(config: &StreamConfig) -> Self {
        Self {
            first_chunk_timeout: config.first_chunk_timeout(),
            chunk_timeout: config.chunk_timeout(),
            failure_message: config.failure_message.clone(),
        }
    }
}

/// Per-stream counters, logged when the stream ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetrics {
    pub chunks: usize,
    pub bytes: usize,
    pub first_chunk_latency: Option<Duration>,
    pub total_duration: Duration,
}

impl StreamMetrics {
    fn record_chunk(&mut self, len: usize, elapsed: Duration) {
        if self.chunks == 0 {
            self.first_chunk_latency = Some(elapsed);
        }
        self.chunks += 1;
        self.bytes += len;
    }
}

/// How a stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed {
        message_id: MessageId,
        metrics: StreamMetrics,
    },
    /// Superseded or cancelled; the transcript was left untouched.
    Cancelled,
    Failed {
        error: StreamError,
        metrics: StreamMetrics,
    },
}

enum Stop {
    Cancelled,
    Failed(StreamError),
}

impl From<StreamError> for Stop {
    fn from(error: StreamError) -> Self {
        Stop::Failed(error)
    }
}

/// One stream: request, read loop and transcript updates.
pub(crate) struct StreamTask {
    pub(crate) stream: StreamId,
    pub(crate) transport: Arc<dyn QueryTransport>,
    pub(crate) transcript: Arc<RwLock<Transcript>>,
    pub(crate) session: SessionContext,
    pub(crate) settings: StreamSettings,
    pub(crate) cancel: CancellationToken,
}

impl StreamTask {
    pub(crate) async fn run(self, query: String) -> StreamOutcome {
        let started = Instant::now();
        let mut metrics = StreamMetrics::default();
        let result = self.consume(query, started, &mut metrics).await;
        metrics.total_duration = started.elapsed();

        match result {
            Ok(()) => self.complete(metrics),
            Err(Stop::Cancelled) => {
                tracing::debug!(stream = %self.stream, chunks = metrics.chunks, "stream cancelled");
                StreamOutcome::Cancelled
            }
            Err(Stop::Failed(error)) => self.fail(error, metrics),
        }
    }

    async fn consume(
        &self,
        query: String,
        started: Instant,
        metrics: &mut StreamMetrics,
    ) -> Result<(), Stop> {
        let request = QueryRequest {
            query,
            session_token: self.session.token(),
        };
        let first_deadline = started + self.settings.first_chunk_timeout;

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
            opened = timeout_at(first_deadline, self.transport.open(request)) => {
                opened.map_err(|_| self.timeout_error(TimeoutPhase::FirstChunk))??
            }
        };

        if let Some(token) = response.session_token {
            if self.session.update(token) {
                tracing::debug!(stream = %self.stream, "session token updated");
            }
        }

        let mut body = response.body;
        let mut decoder = Utf8StreamDecoder::new();
        let mut accumulated = String::new();

        loop {
            let (phase, next) = if metrics.chunks == 0 {
                (
                    TimeoutPhase::FirstChunk,
                    timeout_at(first_deadline, body.next()),
                )
            } else {
                (
                    TimeoutPhase::Chunk,
                    timeout(self.settings.chunk_timeout, body.next()),
                )
            };

            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
                next = next => next,
            };

            let chunk = match next {
                Err(_) => return Err(self.timeout_error(phase).into()),
                Ok(None) => break,
                Ok(Some(chunk)) => chunk?,
            };

            metrics.record_chunk(chunk.len(), started.elapsed());
            let text = decoder.decode(&chunk);
            if text.is_empty() {
                continue;
            }
            accumulated.push_str(&text);
            self.publish(&accumulated)?;
        }

        let tail = decoder.finish();
        if !tail.is_empty() {
            accumulated.push_str(&tail);
            self.publish(&accumulated)?;
        }

        if metrics.bytes == 0 {
            return Err(StreamError::MissingBody.into());
        }
        Ok(())
    }

    fn timeout_error(&self, phase: TimeoutPhase) -> StreamError {
        let duration = match phase {
            TimeoutPhase::Chunk => self.settings.chunk_timeout,
            _ => self.settings.first_chunk_timeout,
        };
        StreamError::Timeout { phase, duration }
    }

    /// Replace the in-flight content. The cancellation check happens under
    /// the transcript lock so a superseded stream can never write.
    fn publish(&self, content: &str) -> Result<MessageId, Stop> {
        let mut transcript = self.transcript.write();
        if self.cancel.is_cancelled() {
            return Err(Stop::Cancelled);
        }
        transcript
            .upsert_in_flight(self.stream, content)
            .map_err(|err| {
                tracing::warn!(stream = %self.stream, error = %err, "rejected transcript write");
                Stop::Cancelled
            })
    }

    fn complete(&self, metrics: StreamMetrics) -> StreamOutcome {
        let mut transcript = self.transcript.write();
        if self.cancel.is_cancelled() {
            return StreamOutcome::Cancelled;
        }
        match transcript.complete_in_flight(self.stream) {
            Ok(Some(message_id)) => {
                tracing::debug!(
                    stream = %self.stream,
                    chunks = metrics.chunks,
                    bytes = metrics.bytes,
                    first_chunk_ms = metrics.first_chunk_latency.map(|d| d.as_millis() as u64),
                    total_ms = metrics.total_duration.as_millis() as u64,
                    "stream completed"
                );
                StreamOutcome::Completed {
                    message_id,
                    metrics,
                }
            }
            Ok(None) => {
                drop(transcript);
                self.fail(StreamError::MissingBody, metrics)
            }
            Err(err) => {
                tracing::warn!(stream = %self.stream, error = %err, "could not complete reply");
                StreamOutcome::Cancelled
            }
        }
    }

    /// Keep any partial reply as a completed message and append the failure
    /// notice, unless the stream was cancelled meanwhile.
    fn fail(&self, error: StreamError, metrics: StreamMetrics) -> StreamOutcome {
        let mut transcript = self.transcript.write();
        if self.cancel.is_cancelled() {
            return StreamOutcome::Cancelled;
        }
        if transcript.in_flight_stream() == Some(self.stream) {
            if let Err(err) = transcript.complete_in_flight(self.stream) {
                tracing::warn!(
                    stream = %self.stream,
                    error = %err,
                    "could not keep partial reply"
                );
            }
        }
        transcript.push_assistant(self.settings.failure_message.clone());
        tracing::warn!(
            stream = %self.stream,
            error = %error,
            chunks = metrics.chunks,
            "stream failed"
        );
        StreamOutcome::Failed { error, metrics }
    }
}
