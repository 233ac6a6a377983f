//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use bidichat_core::stream::{
    QueryRequest, QueryResponse, QueryTransport, StreamError, StreamSettings,
};
use bidichat_core::{Conversation, Message};
use bytes::Bytes;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

pub type ChunkSender = mpsc::UnboundedSender<Result<Bytes, StreamError>>;

enum Scripted {
    Stream {
        session_token: Option<String>,
        chunks: mpsc::UnboundedReceiver<Result<Bytes, StreamError>>,
    },
    Fail(StreamError),
}

/// In-memory transport. Each `open` consumes the next scripted response; the
/// test feeds chunks through the returned sender and ends the body by
/// dropping it.
#[derive(Default)]
pub struct ChannelTransport {
    scripted: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<QueryRequest>>,
}

impl ChannelTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn script_stream(&self, session_token: Option<&str>) -> ChunkSender {
        let (tx, rx) = mpsc::unbounded_channel();
        self.scripted.lock().push_back(Scripted::Stream {
            session_token: session_token.map(str::to_string),
            chunks: rx,
        });
        tx
    }

    pub fn script_failure(&self, error: StreamError) {
        self.scripted.lock().push_back(Scripted::Fail(error));
    }

    pub fn requests(&self) -> Vec<QueryRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl QueryTransport for ChannelTransport {
    async fn open(&self, request: QueryRequest) -> Result<QueryResponse, StreamError> {
        self.requests.lock().push(request);
        match self.scripted.lock().pop_front() {
            Some(Scripted::Stream {
                session_token,
                chunks,
            }) => Ok(QueryResponse {
                session_token,
                body: UnboundedReceiverStream::new(chunks).boxed(),
            }),
            Some(Scripted::Fail(error)) => Err(error),
            None => Err(StreamError::network("no scripted response")),
        }
    }
}

pub fn settings() -> StreamSettings {
    StreamSettings {
        first_chunk_timeout: Duration::from_secs(10),
        chunk_timeout: Duration::from_secs(5),
        failure_message: "failed".to_string(),
    }
}

pub fn conversation(transport: Arc<ChannelTransport>) -> Conversation {
    Conversation::new(transport, settings())
}

pub fn chunk(text: &str) -> Result<Bytes, StreamError> {
    Ok(Bytes::copy_from_slice(text.as_bytes()))
}

/// Poll the transcript until `predicate` holds.
pub async fn wait_for(conversation: &Conversation, predicate: impl Fn(&[Message]) -> bool) {
    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            if predicate(&conversation.messages()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "transcript never reached the expected state");
}

/// Content of the last message, if it is an in-flight reply.
pub fn in_flight_content(messages: &[Message]) -> Option<&str> {
    messages
        .last()
        .filter(|message| !message.is_complete())
        .map(|message| message.content.as_str())
}
