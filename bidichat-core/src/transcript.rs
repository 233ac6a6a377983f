//! Ordered chat transcript with a single in-flight assistant message.
//!
//! Messages are only ever appended. The one exception is the in-flight
//! message of a superseded stream, which is discarded so that no partial
//! reply survives its cancellation. Every mutation is published as a
//! [`TranscriptEvent`] for renderers and viewport logic.

use crate::config::constants::defaults::DEFAULT_EVENT_CAPACITY;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identifies one streamed reply. Allocated by the conversation, increasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StreamId(pub u64);

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stream-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Streaming,
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub status: MessageStatus,
}

impl Message {
    fn new(role: Role, content: String, status: MessageStatus) -> Self {
        Self {
            id: MessageId::new(),
            role,
            content,
            created_at: Utc::now(),
            status,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == MessageStatus::Complete
    }
}

/// Published after every transcript mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    Added { id: MessageId, role: Role },
    Updated { id: MessageId, len: usize },
    Completed { id: MessageId },
    Discarded { id: MessageId },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("{stream} cannot write: the in-flight message belongs to {owner}")]
    NotOwner { stream: StreamId, owner: StreamId },
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    stream: StreamId,
    index: usize,
}

#[derive(Debug)]
pub struct Transcript {
    messages: Vec<Message>,
    in_flight: Option<InFlight>,
    events: broadcast::Sender<TranscriptEvent>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self::with_event_capacity(DEFAULT_EVENT_CAPACITY)
    }

    pub fn with_event_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            messages: Vec::new(),
            in_flight: None,
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEvent> {
        self.events.subscribe()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn in_flight(&self) -> Option<&Message> {
        self.in_flight
            .and_then(|in_flight| self.messages.get(in_flight.index))
    }

    pub fn in_flight_stream(&self) -> Option<StreamId> {
        self.in_flight.map(|in_flight| in_flight.stream)
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        self.push(Message::new(Role::User, content.into(), MessageStatus::Complete))
    }

    /// Append a finished assistant message, e.g. a failure notice.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> MessageId {
        self.push(Message::new(
            Role::Assistant,
            content.into(),
            MessageStatus::Complete,
        ))
    }

    fn push(&mut self, message: Message) -> MessageId {
        let id = message.id;
        let role = message.role;
        self.messages.push(message);
        self.publish(TranscriptEvent::Added { id, role });
        id
    }

    /// Create the in-flight message for `stream` or replace its content.
    pub fn upsert_in_flight(
        &mut self,
        stream: StreamId,
        content: &str,
    ) -> Result<MessageId, TranscriptError> {
        match self.in_flight {
            Some(in_flight) if in_flight.stream != stream => Err(TranscriptError::NotOwner {
                stream,
                owner: in_flight.stream,
            }),
            Some(in_flight) => {
                let message = &mut self.messages[in_flight.index];
                message.content.clear();
                message.content.push_str(content);
                let event = TranscriptEvent::Updated {
                    id: message.id,
                    len: content.len(),
                };
                let id = message.id;
                self.publish(event);
                Ok(id)
            }
            None => {
                let message = Message::new(
                    Role::Assistant,
                    content.to_string(),
                    MessageStatus::Streaming,
                );
                let id = self.push(message);
                self.in_flight = Some(InFlight {
                    stream,
                    index: self.messages.len() - 1,
                });
                Ok(id)
            }
        }
    }

    /// Mark the in-flight message of `stream` complete. `Ok(None)` when the
    /// stream never produced a message.
    pub fn complete_in_flight(
        &mut self,
        stream: StreamId,
    ) -> Result<Option<MessageId>, TranscriptError> {
        let Some(in_flight) = self.in_flight else {
            return Ok(None);
        };
        if in_flight.stream != stream {
            return Err(TranscriptError::NotOwner {
                stream,
                owner: in_flight.stream,
            });
        }
        self.in_flight = None;
        let message = &mut self.messages[in_flight.index];
        message.status = MessageStatus::Complete;
        let id = message.id;
        self.publish(TranscriptEvent::Completed { id });
        Ok(Some(id))
    }

    /// Remove the in-flight message, whichever stream owns it.
    pub fn discard_in_flight(&mut self) -> Option<Message> {
        let in_flight = self.in_flight.take()?;
        let message = self.messages.remove(in_flight.index);
        self.publish(TranscriptEvent::Discarded { id: message.id });
        Some(message)
    }

    fn publish(&self, event: TranscriptEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}
