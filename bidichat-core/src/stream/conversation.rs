use crate::config::BidiChatConfig;
use crate::stream::consumer::{StreamOutcome, StreamSettings, StreamTask};
use crate::stream::errors::{SendError, StreamError};
use crate::stream::session::SessionContext;
use crate::stream::transport::{HttpTransport, QueryTransport};
use crate::transcript::{Message, StreamId, Transcript, TranscriptEvent};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct ActiveStream {
    id: StreamId,
    cancel: CancellationToken,
}

/// A chat session: transcript, session token and at most one live stream.
pub struct Conversation {
    transport: Arc<dyn QueryTransport>,
    transcript: Arc<RwLock<Transcript>>,
    session: SessionContext,
    settings: StreamSettings,
    active: Arc<Mutex<Option<ActiveStream>>>,
    responding: Arc<watch::Sender<bool>>,
    next_stream: AtomicU64,
}

impl Conversation {
    pub fn new(transport: Arc<dyn QueryTransport>, settings: StreamSettings) -> Self {
        let (responding, _) = watch::channel(false);
        Self {
            transport,
            transcript: Arc::new(RwLock::new(Transcript::new())),
            session: SessionContext::new(),
            settings,
            active: Arc::new(Mutex::new(None)),
            responding: Arc::new(responding),
            next_stream: AtomicU64::new(0),
        }
    }

    /// HTTP-backed conversation using the `[stream]` settings.
    pub fn from_config(config: &BidiChatConfig) -> Result<Self, StreamError> {
        let transport = HttpTransport::new(&config.stream)?;
        Ok(Self::new(
            Arc::new(transport),
            StreamSettings::from(&config.stream),
        ))
    }

    pub fn with_session(mut self, session: SessionContext) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn transcript(&self) -> Arc<RwLock<Transcript>> {
        Arc::clone(&self.transcript)
    }

    pub fn messages(&self) -> Vec<Message> {
        self.transcript.read().messages().to_vec()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.transcript.read().subscribe()
    }

    pub fn is_responding(&self) -> bool {
        *self.responding.borrow()
    }

    pub fn responding(&self) -> watch::Receiver<bool> {
        self.responding.subscribe()
    }

    /// Send `query` and start streaming the reply.
    ///
    /// Any running stream is cancelled first and its partial reply removed
    /// before the new user message is appended.
    pub fn send(&self, query: &str) -> Result<StreamHandle, SendError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SendError::EmptyQuery);
        }

        let id = StreamId(self.next_stream.fetch_add(1, Ordering::Relaxed) + 1);
        let cancel = CancellationToken::new();
        {
            let mut active = self.active.lock();
            if let Some(previous) = active.replace(ActiveStream {
                id,
                cancel: cancel.clone(),
            }) {
                previous.cancel.cancel();
                tracing::debug!(
                    superseded = %previous.id,
                    stream = %id,
                    "superseding active stream"
                );
            }

            let mut transcript = self.transcript.write();
            if let Some(discarded) = transcript.discard_in_flight() {
                tracing::debug!(message = %discarded.id, "discarded partial reply");
            }
            transcript.push_user(query);
        }
        self.responding.send_replace(true);

        let task = StreamTask {
            stream: id,
            transport: Arc::clone(&self.transport),
            transcript: Arc::clone(&self.transcript),
            session: self.session.clone(),
            settings: self.settings.clone(),
            cancel: cancel.clone(),
        };
        let active = Arc::clone(&self.active);
        let responding = Arc::clone(&self.responding);
        let transcript = Arc::clone(&self.transcript);
        let query = query.to_string();

        tracing::debug!(stream = %id, "starting stream");
        let task = tokio::spawn(async move {
            let outcome = task.run(query).await;
            let mut active = active.lock();
            if active.as_ref().is_some_and(|current| current.id == id) {
                *active = None;
                if outcome == StreamOutcome::Cancelled {
                    let mut transcript = transcript.write();
                    if transcript.in_flight_stream() == Some(id) {
                        transcript.discard_in_flight();
                    }
                }
                responding.send_replace(false);
            }
            outcome
        });

        Ok(StreamHandle { id, cancel, task })
    }

    /// Stop the live stream, if any, and drop its partial reply.
    pub fn cancel(&self) {
        let mut active = self.active.lock();
        let Some(current) = active.take() else {
            return;
        };
        current.cancel.cancel();
        self.transcript.write().discard_in_flight();
        self.responding.send_replace(false);
        tracing::debug!(stream = %current.id, "stream cancelled by caller");
    }
}

/// Handle to a spawned stream.
#[derive(Debug)]
pub struct StreamHandle {
    id: StreamId,
    cancel: CancellationToken,
    task: JoinHandle<StreamOutcome>,
}

impl StreamHandle {
    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal cancellation. The partial reply is removed once the task
    /// stops, unless a newer stream has taken over by then.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub async fn outcome(self) -> StreamOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(stream = %self.id, error = %err, "stream task aborted");
                StreamOutcome::Cancelled
            }
        }
    }
}
