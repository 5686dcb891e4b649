/*!
 * Bounded-concurrency dispatch of chunk translations.
 *
 * This module fans every chunk of a job out to the translation client under
 * a concurrency cap, aggregates the per-chunk results, and publishes progress
 * to a caller-supplied sink. Individual chunk failures never fail the job;
 * they arrive as sentinel results and are reported as a count, leaving the
 * call about job-level success to the caller.
 */

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use futures::stream::{self, StreamExt};
use log::{debug, error, warn};
use tokio::sync::Semaphore;
use uuid::Uuid;

use crate::chunker::Chunk;
use crate::translator::{TranslationResult, Translator};

/// Default cap on simultaneous in-flight translate calls.
///
/// Bounds pressure on the remote API's rate limits regardless of how many
/// chunks a document produces.
pub const DEFAULT_MAX_PARALLEL: usize = 40;

/// Progress of one dispatch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobProgress {
    /// Number of chunks in the job.
    pub total_chunks: usize,
    /// Number of chunks finished so far (failed sentinels included).
    pub completed_chunks: usize,
}

impl JobProgress {
    /// Completion percentage, floored.
    pub fn percent(&self) -> u8 {
        if self.total_chunks == 0 {
            100
        } else {
            (100 * self.completed_chunks / self.total_chunks) as u8
        }
    }
}

/// Receiver for progress notifications.
///
/// Invoked concurrently from chunk tasks, possibly out of order; the
/// percentage only ever increases, so last-write-wins rendering is fine.
/// Publish failures are logged by the dispatcher and never propagated.
pub trait ProgressSink: Send + Sync {
    /// Deliver one progress update for the given job.
    fn publish(&self, job_id: &str, progress: &JobProgress) -> Result<()>;
}

/// Sink for callers that do not track progress.
#[derive(Debug, Default)]
pub struct NullProgressSink;

impl ProgressSink for NullProgressSink {
    fn publish(&self, _job_id: &str, _progress: &JobProgress) -> Result<()> {
        Ok(())
    }
}

/// Fan-out orchestrator for one translation job.
pub struct Dispatcher {
    /// The translation client to run chunks through.
    translator: Translator,

    /// Maximum number of simultaneous in-flight translate calls.
    max_parallel: usize,
}

impl Dispatcher {
    /// Create a dispatcher with the default concurrency cap.
    pub fn new(translator: Translator) -> Self {
        Self::with_max_parallel(translator, DEFAULT_MAX_PARALLEL)
    }

    /// Create a dispatcher with an explicit concurrency cap.
    pub fn with_max_parallel(translator: Translator, max_parallel: usize) -> Self {
        Self {
            translator,
            max_parallel: max_parallel.max(1),
        }
    }

    /// Translate all chunks of a job.
    ///
    /// Results are returned in completion order, not chunk order; the
    /// reassembler's sort by id is the only ordering authority. The returned
    /// vector always contains exactly one result per chunk.
    pub async fn dispatch_all(
        &self,
        chunks: &[Chunk],
        source_lang: &str,
        target_lang: &str,
        instructions: Option<&str>,
        progress_sink: Arc<dyn ProgressSink>,
    ) -> Vec<TranslationResult> {
        let total_chunks = chunks.len();
        if total_chunks == 0 {
            return Vec::new();
        }

        let job_id = Uuid::new_v4().to_string();
        debug!("Dispatching {} chunks for job {}", total_chunks, job_id);

        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let completed_chunks = Arc::new(AtomicUsize::new(0));
        let instructions = instructions.map(|s| s.to_string());

        let results = stream::iter(chunks.iter())
            .map(|chunk| {
                let translator = self.translator.clone();
                let semaphore = semaphore.clone();
                let completed_chunks = completed_chunks.clone();
                let progress_sink = progress_sink.clone();
                let job_id = job_id.clone();
                let source_lang = source_lang.to_string();
                let target_lang = target_lang.to_string();
                let instructions = instructions.clone();

                async move {
                    // Hold a permit only for the duration of the remote call
                    // (and its backoff sleeps).
                    let permit = semaphore.acquire().await.unwrap();
                    let result = translator
                        .translate_chunk(chunk, &source_lang, &target_lang, instructions.as_deref())
                        .await;
                    drop(permit);

                    let completed = completed_chunks.fetch_add(1, Ordering::SeqCst) + 1;
                    let progress = JobProgress {
                        total_chunks,
                        completed_chunks: completed,
                    };
                    if let Err(e) = progress_sink.publish(&job_id, &progress) {
                        // Best effort only; a sink failure must not fail the chunk.
                        warn!("Failed to publish progress for job {}: {}", job_id, e);
                    }

                    result
                }
            })
            .buffer_unordered(self.max_parallel)
            .collect::<Vec<_>>()
            .await;

        let failed = results.iter().filter(|r| r.failed).count();
        if failed > 0 {
            error!("Job {} completed with {} chunk errors", job_id, failed);
        } else {
            debug!("Job {} completed cleanly", job_id);
        }

        results
    }
}
