use crate::config::StreamConfig;
use crate::stream::errors::{StreamError, TimeoutPhase};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::StatusCode;
use reqwest::header::HeaderName;
use serde::Serialize;
use std::time::Duration;

/// Body of a query request: `{"query": "...", "sessionToken": "..."}`.
/// The token is omitted until the upstream has issued one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
}

pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// An accepted query: the chunked body plus any token the upstream issued.
pub struct QueryResponse {
    pub session_token: Option<String>,
    pub body: ByteStream,
}

impl std::fmt::Debug for QueryResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryResponse")
            .field("session_token", &self.session_token)
            .finish_non_exhaustive()
    }
}

/// Opens a streamed reply for a query.
#[async_trait]
pub trait QueryTransport: Send + Sync {
    async fn open(&self, request: QueryRequest) -> Result<QueryResponse, StreamError>;
}

/// `POST`s the query as JSON and streams the response body.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    session_header: HeaderName,
    connect_timeout: Option<Duration>,
}

impl HttpTransport {
    pub fn new(config: &StreamConfig) -> Result<Self, StreamError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|err| StreamError::network(format!("failed to build HTTP client: {err}")))?;
        Ok(Self::with_client(client, &config.endpoint, &config.session_header)?
            .with_connect_timeout(config.connect_timeout()))
    }

    pub fn with_client(
        client: reqwest::Client,
        endpoint: impl Into<String>,
        session_header: &str,
    ) -> Result<Self, StreamError> {
        let session_header = HeaderName::from_bytes(session_header.as_bytes()).map_err(|err| {
            StreamError::network(format!("invalid session header '{session_header}': {err}"))
        })?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            session_header,
            connect_timeout: None,
        })
    }

    /// Connect timeout the client was built with, reported on connect failures.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn send_error(&self, err: reqwest::Error) -> StreamError {
        match self.connect_timeout {
            Some(duration) if err.is_connect() && err.is_timeout() => StreamError::Timeout {
                phase: TimeoutPhase::Connect,
                duration,
            },
            _ => StreamError::from(err),
        }
    }
}

#[async_trait]
impl QueryTransport for HttpTransport {
    async fn open(&self, request: QueryRequest) -> Result<QueryResponse, StreamError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            has_token = request.session_token.is_some(),
            "opening query stream"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| self.send_error(err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::HttpStatus {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NO_CONTENT || response.content_length() == Some(0) {
            return Err(StreamError::MissingBody);
        }

        let session_token = response
            .headers()
            .get(&self.session_header)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(StreamError::from))
            .boxed();

        Ok(QueryResponse {
            session_token,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_omits_unknown_token() {
        let request = QueryRequest {
            query: "سلام".into(),
            session_token: None,
        };
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"query":"سلام"}"#
        );
    }

    #[test]
    fn request_uses_camel_case_token_field() {
        let request = QueryRequest {
            query: "hi".into(),
            session_token: Some("abc".into()),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"query": "hi", "sessionToken": "abc"})
        );
    }

    #[test]
    fn invalid_session_header_is_rejected() {
        let client = reqwest::Client::new();
        assert!(HttpTransport::with_client(client, "http://x", "bad header").is_err());
    }
}
