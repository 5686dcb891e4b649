/*!
 * Tests for bounded-concurrency dispatch and progress aggregation
 */

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use doctrans::chunker::Chunk;
use doctrans::dispatcher::{Dispatcher, JobProgress, NullProgressSink, ProgressSink};
use doctrans::translator::{Translator, TranslatorOptions};

use crate::common::mock_providers::MockProvider;

fn make_chunks(count: usize) -> Vec<Chunk> {
    (0..count)
        .map(|id| Chunk {
            id,
            text: format!("body of chunk {}", id),
            token_start: 0,
            token_end: 0,
            is_first: id == 0,
            is_last: id + 1 == count,
            has_prefix_context: false,
            context_size: 0,
        })
        .collect()
}

fn fast_translator(provider: Arc<MockProvider>) -> Translator {
    Translator::with_options(
        provider,
        TranslatorOptions {
            retry_delay: Duration::ZERO,
            ..TranslatorOptions::default()
        },
    )
}

/// Sink that records every published progress value
#[derive(Default)]
struct RecordingSink {
    published: Mutex<Vec<JobProgress>>,
}

impl RecordingSink {
    fn completed_values(&self) -> Vec<usize> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.completed_chunks)
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn publish(&self, _job_id: &str, progress: &JobProgress) -> Result<()> {
        self.published.lock().unwrap().push(*progress);
        Ok(())
    }
}

/// Sink that always fails, to prove delivery errors stay contained
struct FailingSink;

impl ProgressSink for FailingSink {
    fn publish(&self, _job_id: &str, _progress: &JobProgress) -> Result<()> {
        Err(anyhow!("sink is down"))
    }
}

#[tokio::test]
async fn test_dispatch_all_withManyChunks_shouldBoundConcurrency() {
    let provider = Arc::new(MockProvider::slow(10));
    let dispatcher = Dispatcher::with_max_parallel(fast_translator(provider.clone()), 8);
    let chunks = make_chunks(60);

    let results = dispatcher
        .dispatch_all(&chunks, "en", "fr", None, Arc::new(NullProgressSink))
        .await;

    assert_eq!(results.len(), 60);
    assert!(
        provider.max_in_flight() <= 8,
        "at most 8 calls may ever be in flight, saw {}",
        provider.max_in_flight()
    );
    assert!(provider.max_in_flight() >= 2, "dispatch should actually overlap calls");
}

#[tokio::test]
async fn test_dispatch_all_withAnyCompletionOrder_shouldProduceOneResultPerChunk() {
    let provider = Arc::new(MockProvider::slow(2));
    let dispatcher = Dispatcher::with_max_parallel(fast_translator(provider), 16);
    let chunks = make_chunks(40);

    let results = dispatcher
        .dispatch_all(&chunks, "en", "fr", None, Arc::new(NullProgressSink))
        .await;

    let mut ids: Vec<usize> = results.iter().map(|r| r.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, (0..40).collect::<Vec<_>>(), "exactly one result per chunk");
}

#[tokio::test]
async fn test_dispatch_all_withSequentialDispatch_shouldPublishMonotonicProgress() {
    let provider = Arc::new(MockProvider::echo());
    let dispatcher = Dispatcher::with_max_parallel(fast_translator(provider), 1);
    let chunks = make_chunks(10);
    let sink = Arc::new(RecordingSink::default());

    dispatcher
        .dispatch_all(&chunks, "en", "fr", None, sink.clone())
        .await;

    let completed = sink.completed_values();
    assert_eq!(completed, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_dispatch_all_withParallelDispatch_shouldReachTotalExactlyOnce() {
    let provider = Arc::new(MockProvider::slow(3));
    let dispatcher = Dispatcher::with_max_parallel(fast_translator(provider), 8);
    let chunks = make_chunks(25);
    let sink = Arc::new(RecordingSink::default());

    dispatcher
        .dispatch_all(&chunks, "en", "fr", None, sink.clone())
        .await;

    // Publication order is not guaranteed, but the counter values must be a
    // permutation of 1..=total, so the total is reached exactly once.
    let mut completed = sink.completed_values();
    completed.sort_unstable();
    assert_eq!(completed, (1..=25).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_dispatch_all_withFailingSink_shouldStillCompleteJob() {
    let provider = Arc::new(MockProvider::echo());
    let dispatcher = Dispatcher::with_max_parallel(fast_translator(provider), 4);
    let chunks = make_chunks(12);

    let results = dispatcher
        .dispatch_all(&chunks, "en", "fr", None, Arc::new(FailingSink))
        .await;

    assert_eq!(results.len(), 12);
    assert!(results.iter().all(|r| !r.failed), "sink failures must not fail chunks");
}

#[tokio::test]
async fn test_dispatch_all_withFailingProvider_shouldAggregateFailuresNotPropagate() {
    let provider = Arc::new(MockProvider::failing());
    let dispatcher = Dispatcher::with_max_parallel(fast_translator(provider), 4);
    let chunks = make_chunks(5);

    let results = dispatcher
        .dispatch_all(&chunks, "en", "fr", None, Arc::new(NullProgressSink))
        .await;

    assert_eq!(results.len(), 5);
    for result in &results {
        assert!(result.failed);
        assert!(result.translated_text.contains(&format!("chunk {}", result.id)));
    }
}

#[tokio::test]
async fn test_dispatch_all_withEmptyChunkList_shouldReturnEmpty() {
    let provider = Arc::new(MockProvider::echo());
    let dispatcher = Dispatcher::new(fast_translator(provider.clone()));

    let results = dispatcher
        .dispatch_all(&[], "en", "fr", None, Arc::new(NullProgressSink))
        .await;

    assert!(results.is_empty());
    assert_eq!(provider.request_count(), 0);
}
