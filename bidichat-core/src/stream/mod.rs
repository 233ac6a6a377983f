//! Streaming query client.
//!
//! A [`Conversation`] owns the transcript and at most one live stream. Each
//! stream posts the query through a [`QueryTransport`], decodes the chunked
//! reply incrementally and republishes the accumulated text after every
//! chunk. Sending a new query cancels the previous stream and drops its
//! partial reply.

pub mod consumer;
pub mod conversation;
pub mod decoder;
pub mod errors;
pub mod session;
pub mod transport;

pub use consumer::{StreamMetrics, StreamOutcome, StreamSettings};
pub use conversation::{Conversation, StreamHandle};
pub use decoder::Utf8StreamDecoder;
pub use errors::{SendError, StreamError, TimeoutPhase};
pub use session::SessionContext;
pub use transport::{ByteStream, HttpTransport, QueryRequest, QueryResponse, QueryTransport};
