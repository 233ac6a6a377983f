mod common;

use bidichat_core::stream::{SendError, StreamError, StreamOutcome, TimeoutPhase};
use bidichat_core::{MessageStatus, Role, TranscriptEvent};
use bytes::Bytes;
use common::{ChannelTransport, chunk, conversation, in_flight_content, wait_for};

#[tokio::test]
async fn test_chunks_accumulate_into_one_reply() {
    let transport = ChannelTransport::new();
    let tx = transport.script_stream(None);
    let conversation = conversation(transport.clone());
    let mut events = conversation.subscribe();

    let handle = conversation.send("greet").unwrap();
    assert!(conversation.is_responding());

    tx.send(chunk("Hel")).unwrap();
    wait_for(&conversation, |m| in_flight_content(m) == Some("Hel")).await;
    tx.send(chunk("lo wor")).unwrap();
    wait_for(&conversation, |m| in_flight_content(m) == Some("Hello wor")).await;
    tx.send(chunk("ld")).unwrap();
    drop(tx);

    let outcome = handle.outcome().await;
    let StreamOutcome::Completed { message_id, metrics } = outcome else {
        panic!("expected completion, got {outcome:?}");
    };
    assert_eq!(metrics.chunks, 3);
    assert_eq!(metrics.bytes, 11);
    assert!(metrics.first_chunk_latency.is_some());

    let messages = conversation.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::User);
    assert_eq!(messages[0].content, "greet");
    assert_eq!(messages[1].id, message_id);
    assert_eq!(messages[1].content, "Hello world");
    assert_eq!(messages[1].status, MessageStatus::Complete);
    assert!(!conversation.is_responding());

    let mut lengths = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let TranscriptEvent::Updated { len, .. } = event {
            lengths.push(len);
        }
    }
    assert_eq!(lengths, vec![9, 11]);
}

#[tokio::test]
async fn test_multibyte_characters_split_across_chunks() {
    let transport = ChannelTransport::new();
    let tx = transport.script_stream(None);
    let conversation = conversation(transport.clone());
    let handle = conversation.send("سلام").unwrap();

    let bytes = "سلام".as_bytes();
    tx.send(Ok(Bytes::copy_from_slice(&bytes[..3]))).unwrap();
    wait_for(&conversation, |m| in_flight_content(m) == Some("س")).await;
    tx.send(Ok(Bytes::copy_from_slice(&bytes[3..]))).unwrap();
    drop(tx);

    assert!(matches!(
        handle.outcome().await,
        StreamOutcome::Completed { .. }
    ));
    let reply = conversation.messages().pop().unwrap();
    assert_eq!(reply.content, "سلام");
    assert!(!reply.content.contains('\u{FFFD}'));
}

#[tokio::test]
async fn test_http_error_before_any_chunk_appends_failure_message() {
    let transport = ChannelTransport::new();
    transport.script_failure(StreamError::HttpStatus { status: 500 });
    let conversation = conversation(transport.clone());

    let outcome = conversation.send("question").unwrap().outcome().await;
    assert!(matches!(
        outcome,
        StreamOutcome::Failed {
            error: StreamError::HttpStatus { status: 500 },
            ..
        }
    ));

    let messages = conversation.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, Role::Assistant);
    assert_eq!(messages[1].content, "failed");
    assert!(messages[1].is_complete());
    assert!(!conversation.is_responding());
}

#[tokio::test]
async fn test_second_send_supersedes_first_stream() {
    let transport = ChannelTransport::new();
    let tx_a = transport.script_stream(None);
    let tx_b = transport.script_stream(None);
    let conversation = conversation(transport.clone());

    let handle_a = conversation.send("A").unwrap();
    tx_a.send(chunk("partial answer to A")).unwrap();
    wait_for(&conversation, |m| in_flight_content(m).is_some()).await;

    let handle_b = conversation.send("B").unwrap();
    // A's bytes arriving after the supersede must never land
    let _ = tx_a.send(chunk(" more A"));
    tx_b.send(chunk("answer to B")).unwrap();
    drop(tx_b);

    assert_eq!(handle_a.outcome().await, StreamOutcome::Cancelled);
    assert!(matches!(
        handle_b.outcome().await,
        StreamOutcome::Completed { .. }
    ));

    let contents: Vec<_> = conversation
        .messages()
        .into_iter()
        .map(|m| (m.role, m.content))
        .collect();
    assert_eq!(
        contents,
        vec![
            (Role::User, "A".to_string()),
            (Role::User, "B".to_string()),
            (Role::Assistant, "answer to B".to_string()),
        ]
    );
    assert!(!conversation.is_responding());
}

#[tokio::test]
async fn test_cancel_drops_partial_reply() {
    let transport = ChannelTransport::new();
    let tx = transport.script_stream(None);
    let conversation = conversation(transport.clone());

    let handle = conversation.send("long question").unwrap();
    tx.send(chunk("thinking")).unwrap();
    wait_for(&conversation, |m| in_flight_content(m) == Some("thinking")).await;

    conversation.cancel();
    assert!(!conversation.is_responding());
    assert_eq!(handle.outcome().await, StreamOutcome::Cancelled);

    let messages = conversation.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].role, Role::User);
}

#[tokio::test]
async fn test_handle_cancel_cleans_up_after_task() {
    let transport = ChannelTransport::new();
    let tx = transport.script_stream(None);
    let conversation = conversation(transport.clone());

    let handle = conversation.send("q").unwrap();
    tx.send(chunk("par")).unwrap();
    wait_for(&conversation, |m| in_flight_content(m) == Some("par")).await;

    handle.cancel();
    assert_eq!(handle.outcome().await, StreamOutcome::Cancelled);
    assert_eq!(conversation.messages().len(), 1);
    assert!(!conversation.is_responding());
}

#[tokio::test]
async fn test_session_token_is_sent_with_next_query() {
    let transport = ChannelTransport::new();
    let first = transport.script_stream(Some("tok-1"));
    let second = transport.script_stream(None);
    let conversation = conversation(transport.clone());

    first.send(chunk("one")).unwrap();
    drop(first);
    conversation.send("first").unwrap().outcome().await;
    assert_eq!(conversation.session().token().as_deref(), Some("tok-1"));

    second.send(chunk("two")).unwrap();
    drop(second);
    conversation.send("second").unwrap().outcome().await;

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].session_token, None);
    assert_eq!(requests[1].query, "second");
    assert_eq!(requests[1].session_token.as_deref(), Some("tok-1"));
    // No new token leaves the old one in place
    assert_eq!(conversation.session().token().as_deref(), Some("tok-1"));
}

#[tokio::test(start_paused = true)]
async fn test_silent_stream_times_out_and_keeps_partial() {
    let transport = ChannelTransport::new();
    let tx = transport.script_stream(None);
    tx.send(chunk("partial")).unwrap();
    let conversation = conversation(transport.clone());

    let outcome = conversation.send("q").unwrap().outcome().await;
    assert!(matches!(
        outcome,
        StreamOutcome::Failed {
            error: StreamError::Timeout {
                phase: TimeoutPhase::Chunk,
                ..
            },
            ..
        }
    ));

    let messages = conversation.messages();
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].content, "partial");
    assert!(messages[1].is_complete());
    assert_eq!(messages[2].content, "failed");
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn test_no_first_chunk_times_out() {
    let transport = ChannelTransport::new();
    let _tx = transport.script_stream(None);
    let conversation = conversation(transport.clone());

    let outcome = conversation.send("q").unwrap().outcome().await;
    assert!(matches!(
        outcome,
        StreamOutcome::Failed {
            error: StreamError::Timeout {
                phase: TimeoutPhase::FirstChunk,
                ..
            },
            ..
        }
    ));
    assert_eq!(conversation.messages().len(), 2);
}

#[tokio::test]
async fn test_network_error_mid_stream() {
    let transport = ChannelTransport::new();
    let tx = transport.script_stream(None);
    tx.send(chunk("par")).unwrap();
    tx.send(Err(StreamError::network("connection reset"))).unwrap();
    let conversation = conversation(transport.clone());

    let outcome = conversation.send("q").unwrap().outcome().await;
    let StreamOutcome::Failed { error, metrics } = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(error, StreamError::network("connection reset"));
    assert_eq!(metrics.chunks, 1);

    let contents: Vec<_> = conversation
        .messages()
        .into_iter()
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, vec!["q", "par", "failed"]);
}

#[tokio::test]
async fn test_empty_body_is_a_failure() {
    let transport = ChannelTransport::new();
    drop(transport.script_stream(None));
    let conversation = conversation(transport.clone());

    let outcome = conversation.send("q").unwrap().outcome().await;
    assert!(matches!(
        outcome,
        StreamOutcome::Failed {
            error: StreamError::MissingBody,
            ..
        }
    ));
    assert_eq!(conversation.messages().len(), 2);
}

#[tokio::test]
async fn test_blank_query_is_rejected_without_request() {
    let transport = ChannelTransport::new();
    let conversation = conversation(transport.clone());

    assert_eq!(conversation.send(" \n\t").unwrap_err(), SendError::EmptyQuery);
    assert!(conversation.messages().is_empty());
    assert!(transport.requests().is_empty());
    assert!(!conversation.is_responding());
}
