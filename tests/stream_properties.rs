//! Property tests for streamed replies.
//!
//! Random fragment sequences with random arrival gaps are driven through
//! the coordinator against a recording transport and a manual clock.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use futures::{stream, StreamExt};
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use relay_bot::adapters::botframework::{RecordingTransport, TransportCall};
use relay_bot::adapters::clock::ManualClock;
use relay_bot::application::handlers::streaming::{StreamCoordinator, StreamingConfig};
use relay_bot::domain::activity::{Activity, ActivityId};
use relay_bot::domain::streaming::StreamPhase;
use relay_bot::ports::{
    Clock, CompletionChunk, CompletionError, FragmentStream, Transport, TransportError,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

/// Records the clock reading at every call before delegating.
struct TimedTransport {
    inner: Arc<RecordingTransport>,
    clock: Arc<ManualClock>,
    times: Mutex<Vec<Instant>>,
}

impl TimedTransport {
    fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            inner: Arc::new(RecordingTransport::new()),
            clock,
            times: Mutex::new(Vec::new()),
        }
    }

    fn times(&self) -> Vec<Instant> {
        self.times.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for TimedTransport {
    async fn send(&self, activity: Activity) -> Result<ActivityId, TransportError> {
        self.times.lock().unwrap().push(self.clock.now());
        self.inner.send(activity).await
    }

    async fn update(&self, id: &ActivityId, activity: Activity) -> Result<(), TransportError> {
        self.times.lock().unwrap().push(self.clock.now());
        self.inner.update(id, activity).await
    }
}

/// One upstream batch: an optional text delta and the gap before it arrives.
#[derive(Debug, Clone)]
struct Batch {
    delta: Option<String>,
    gap_ms: u64,
}

fn batch() -> impl Strategy<Value = Batch> {
    (proptest::option::weighted(0.8, "[a-zA-Z0-9 ,.!?]{0,12}"), 0u64..2500)
        .prop_map(|(delta, gap_ms)| Batch { delta, gap_ms })
}

struct Run {
    text: String,
    sequence: u32,
    transport: Arc<TimedTransport>,
}

fn run(batches: &[Batch], terminal_gap_ms: u64, interval: Duration) -> Run {
    let clock = Arc::new(ManualClock::new());
    let transport = Arc::new(TimedTransport::new(clock.clone()));

    let mut items: Vec<(u64, CompletionChunk)> = batches
        .iter()
        .map(|b| {
            let chunk = match &b.delta {
                Some(text) => CompletionChunk::content(text.clone()),
                None => CompletionChunk::empty(),
            };
            (b.gap_ms, chunk)
        })
        .collect();
    items.push((terminal_gap_ms, CompletionChunk::finished("stop")));

    let pacing = clock.clone();
    let fragments: FragmentStream = Box::pin(stream::iter(items).map(move |(gap, chunk)| {
        pacing.advance(Duration::from_millis(gap));
        Ok::<_, CompletionError>(chunk)
    }));

    let coordinator = StreamCoordinator::with_config(
        transport.clone(),
        clock,
        StreamingConfig {
            min_flush_interval: interval,
            ..StreamingConfig::default()
        },
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let update = runtime
        .block_on(coordinator.run(fragments, CancellationToken::new()))
        .unwrap();

    Run {
        text: update.text().to_string(),
        sequence: update.sequence(),
        transport,
    }
}

fn interval() -> impl Strategy<Value = Duration> {
    (0u64..2000).prop_map(Duration::from_millis)
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn final_text_is_concatenation_of_deltas(
        batches in prop::collection::vec(batch(), 0..30),
        terminal_gap in 0u64..2500,
        interval in interval(),
    ) {
        let expected: String = batches.iter().filter_map(|b| b.delta.clone()).collect();
        let result = run(&batches, terminal_gap, interval);

        prop_assert_eq!(&result.text, &expected);
        let last = result.transport.inner.activities().pop().unwrap();
        prop_assert_eq!(last.text.unwrap_or_default(), expected);
    }

    #[test]
    fn sequences_increase_strictly_from_one(
        batches in prop::collection::vec(batch(), 0..30),
        terminal_gap in 0u64..2500,
        interval in interval(),
    ) {
        let result = run(&batches, terminal_gap, interval);
        let sequences: Vec<u32> = result
            .transport
            .inner
            .stream_infos()
            .iter()
            .map(|info| info.stream_sequence)
            .collect();

        prop_assert_eq!(sequences[0], 1);
        prop_assert!(sequences.windows(2).all(|w| w[0] < w[1]));
        // One increment per batch, terminal included
        prop_assert_eq!(result.sequence as usize, batches.len() + 2);
        prop_assert_eq!(*sequences.last().unwrap(), result.sequence);
    }

    #[test]
    fn one_informative_first_and_one_final_last(
        batches in prop::collection::vec(batch(), 0..30),
        terminal_gap in 0u64..2500,
        interval in interval(),
    ) {
        let result = run(&batches, terminal_gap, interval);
        let phases: Vec<StreamPhase> = result
            .transport
            .inner
            .stream_infos()
            .iter()
            .map(|info| info.stream_type)
            .collect();

        prop_assert_eq!(phases.iter().filter(|p| **p == StreamPhase::Informative).count(), 1);
        prop_assert_eq!(phases.iter().filter(|p| **p == StreamPhase::Final).count(), 1);
        prop_assert_eq!(phases[0], StreamPhase::Informative);
        prop_assert_eq!(*phases.last().unwrap(), StreamPhase::Final);
    }

    #[test]
    fn stream_id_is_shared_by_all_later_sends(
        batches in prop::collection::vec(batch(), 0..30),
        terminal_gap in 0u64..2500,
        interval in interval(),
    ) {
        let result = run(&batches, terminal_gap, interval);
        let calls = result.transport.inner.calls();
        let stream_id = ActivityId::new("activity-1");

        prop_assert!(matches!(calls[0], TransportCall::Send(_)));
        for call in &calls[1..] {
            match call {
                TransportCall::Update(id, _) => prop_assert_eq!(id, &stream_id),
                TransportCall::Send(_) => prop_assert!(false, "only the first call is a send"),
            }
        }
        for info in result.transport.inner.stream_infos().iter().skip(1) {
            prop_assert_eq!(info.stream_id.as_ref(), Some(&stream_id));
        }
    }

    #[test]
    fn streaming_flushes_respect_the_interval(
        batches in prop::collection::vec(batch(), 0..30),
        terminal_gap in 0u64..2500,
        interval in interval(),
    ) {
        let result = run(&batches, terminal_gap, interval);
        let infos = result.transport.inner.stream_infos();
        let times = result.transport.times();

        let mut last_flush = times[0];
        for (info, at) in infos.iter().zip(times.iter()).skip(1) {
            if info.stream_type == StreamPhase::Streaming {
                prop_assert!(at.saturating_duration_since(last_flush) > interval);
                last_flush = *at;
            }
        }
    }
}
