//! Integration tests for streamed and single-shot replies.
//!
//! These tests drive the public handlers with in-memory doubles:
//! 1. The coordinator's send sequence for fast and failing streams
//! 2. Incomplete and cancelled streams
//! 3. The non-streamed generation path

use std::sync::Arc;
use std::time::Duration;

use futures::stream;
use tokio_util::sync::CancellationToken;

use relay_bot::adapters::ai::MockCompletionSource;
use relay_bot::adapters::botframework::RecordingTransport;
use relay_bot::adapters::clock::ManualClock;
use relay_bot::application::handlers::conversation::{
    GenerateReplyCommand, GenerateReplyHandler, ReplySettings,
};
use relay_bot::application::handlers::streaming::{StreamCoordinator, StreamError};
use relay_bot::domain::streaming::StreamPhase;
use relay_bot::ports::{
    CompletionChunk, CompletionError, CompletionSource, FragmentStream, TransportError,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn fragments(items: Vec<Result<CompletionChunk, CompletionError>>) -> FragmentStream {
    Box::pin(stream::iter(items))
}

fn hello_world() -> FragmentStream {
    fragments(vec![
        Ok(CompletionChunk::content("Hel")),
        Ok(CompletionChunk::content("lo, ")),
        Ok(CompletionChunk::content("world")),
        Ok(CompletionChunk::finished("stop")),
    ])
}

fn coordinator(transport: Arc<RecordingTransport>) -> StreamCoordinator {
    StreamCoordinator::new(transport, Arc::new(ManualClock::new()))
}

// =============================================================================
// Streamed replies
// =============================================================================

#[tokio::test]
async fn fast_stream_sends_informative_then_final() {
    let transport = Arc::new(RecordingTransport::new());

    let update = coordinator(transport.clone())
        .run(hello_world(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(update.text(), "Hello, world");
    let infos = transport.stream_infos();
    let observed: Vec<_> = infos
        .iter()
        .map(|i| (i.stream_type, i.stream_sequence))
        .collect();
    assert_eq!(
        observed,
        vec![(StreamPhase::Informative, 1), (StreamPhase::Final, 5)]
    );
    assert_eq!(
        transport.activities()[1].text.as_deref(),
        Some("Hello, world")
    );
}

#[tokio::test]
async fn failed_informative_send_aborts_the_session() {
    let transport = Arc::new(RecordingTransport::failing_send());

    let result = coordinator(transport.clone())
        .run(hello_world(), CancellationToken::new())
        .await;

    assert!(matches!(
        result,
        Err(StreamError::TransportFailure(TransportError::Rejected { status: 502, .. }))
    ));
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn failed_final_update_is_reported() {
    let transport = Arc::new(RecordingTransport::failing_update());

    let result = coordinator(transport.clone())
        .run(hello_world(), CancellationToken::new())
        .await;

    assert!(matches!(result, Err(StreamError::TransportFailure(_))));
    assert_eq!(transport.calls().len(), 2);
}

#[tokio::test]
async fn stream_without_terminal_marker_is_incomplete() {
    let transport = Arc::new(RecordingTransport::new());

    let result = coordinator(transport.clone())
        .run(
            fragments(vec![
                Ok(CompletionChunk::content("partial ")),
                Ok(CompletionChunk::content("answer")),
            ]),
            CancellationToken::new(),
        )
        .await;

    match result {
        Err(StreamError::IncompleteStream(checkpoint)) => {
            assert_eq!(checkpoint.accumulated_text, "partial answer");
            assert_eq!(checkpoint.sequence, 3);
            let forced = checkpoint.final_update().unwrap();
            assert_eq!(forced.phase(), StreamPhase::Final);
            assert_eq!(forced.sequence(), 4);
        }
        other => panic!("expected IncompleteStream, got {:?}", other),
    }
    // Only the placeholder went out
    assert_eq!(transport.calls().len(), 1);
}

#[tokio::test]
async fn upstream_error_mid_stream_is_surfaced() {
    let transport = Arc::new(RecordingTransport::new());

    let result = coordinator(transport)
        .run(
            fragments(vec![
                Ok(CompletionChunk::content("a")),
                Err(CompletionError::with_status(429, "rate limited")),
            ]),
            CancellationToken::new(),
        )
        .await;

    match result {
        Err(StreamError::Upstream(e)) => assert_eq!(e.status(), Some(429)),
        other => panic!("expected Upstream, got {:?}", other),
    }
}

#[tokio::test]
async fn cancellation_stops_a_slow_stream() {
    let transport = Arc::new(RecordingTransport::new());
    let source = MockCompletionSource::new()
        .with_stream(vec![
            CompletionChunk::content("never"),
            CompletionChunk::finished("stop"),
        ])
        .with_fragment_delay(Duration::from_secs(30));
    let fragments = source.stream(ReplySettings::default().request_for("hi"));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let result = coordinator(transport.clone()).run(fragments, cancel).await;

    assert!(matches!(result, Err(StreamError::Cancelled)));
    assert_eq!(transport.calls().len(), 1);
}

// =============================================================================
// Single-shot replies
// =============================================================================

#[tokio::test]
async fn generate_failure_returns_no_partial_text() {
    let source = Arc::new(
        MockCompletionSource::new().with_error(CompletionError::with_status(500, "server error")),
    );
    let handler = GenerateReplyHandler::new(source.clone(), ReplySettings::default());

    let result = handler
        .handle(GenerateReplyCommand {
            prompt: "hello".to_string(),
        })
        .await;

    assert_eq!(result, Err(CompletionError::with_status(500, "server error")));
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn generate_applies_reply_settings() {
    let source = Arc::new(MockCompletionSource::new().with_reply("Paris"));
    let settings = ReplySettings {
        system_prompt: "Answer briefly.".to_string(),
        temperature: 0.1,
        max_tokens: 64,
    };
    let handler = GenerateReplyHandler::new(source.clone(), settings);

    let reply = handler
        .handle(GenerateReplyCommand {
            prompt: "Capital of France?".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(reply, "Paris");
    let request = &source.requests()[0];
    assert_eq!(request.system_prompt.as_deref(), Some("Answer briefly."));
    assert_eq!(request.max_tokens, Some(64));
    assert_eq!(request.temperature, Some(0.1));
}
