use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Which wait ran out of time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    Connect,
    FirstChunk,
    Chunk,
}

impl fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimeoutPhase::Connect => "connect",
            TimeoutPhase::FirstChunk => "first chunk",
            TimeoutPhase::Chunk => "next chunk",
        })
    }
}

/// Terminal failure of one streamed reply. Never retried automatically.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StreamError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("upstream returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("upstream response has no body")]
    MissingBody,

    #[error("timed out waiting for {phase} after {duration:?}")]
    Timeout {
        phase: TimeoutPhase,
        duration: Duration,
    },
}

impl StreamError {
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for StreamError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return Self::HttpStatus {
                status: status.as_u16(),
            };
        }
        // Without the configured budget a timeout is reported as a plain
        // network error; the transport maps connect timeouts itself.
        if err.is_timeout() {
            return Self::network(format!("request timed out: {err}"));
        }
        Self::network(err.to_string())
    }
}

/// Rejected before any request is made.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("query is empty")]
    EmptyQuery,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_names_phase_and_budget() {
        let err = StreamError::Timeout {
            phase: TimeoutPhase::Connect,
            duration: Duration::from_secs(10),
        };
        assert_eq!(err.to_string(), "timed out waiting for connect after 10s");
    }
}
