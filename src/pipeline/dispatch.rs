//! Render dispatcher and result collector.
//!
//! ## Fan-out
//!
//! Every source becomes a [`RenderJob`]. Jobs are driven through
//! `buffer_unordered(max_sessions)`, so at most `max_sessions` jobs are
//! awaited at any moment. Each job runs its whole session
//! (open → navigate → print → drop) inside `spawn_blocking`, because the
//! Chrome client is synchronous.
//!
//! ## Fan-in
//!
//! Results land in an arena of `Option<RenderResult>` sized to the batch
//! and addressed by submission index, so completion order is irrelevant.
//! The arena is turned into an ordered `Vec` only after every job has
//! reported or the batch deadline fired; slots still empty at that point
//! become [`JobError::BatchDeadline`].
//!
//! ## Session cap
//!
//! `buffer_unordered` bounds the jobs being awaited, not the sessions that
//! are open. A timed-out job stops being awaited while its blocking thread
//! may still hold a session, so each job also takes a permit from a
//! `Semaphore` of `max_sessions` slots. The permit moves into the blocking
//! closure and is only released after the session has been dropped.
//!
//! ## Failure isolation
//!
//! A job never aborts its siblings. Its error is stored in its own slot
//! and the collector leaves that index out of the [`ArtifactSet`].

use crate::backend::{BackendError, RenderBackend};
use crate::config::PrinterConfig;
use crate::error::{JobError, PrinterError};
use crate::pipeline::artifacts::ArtifactStore;
use crate::pipeline::options::PrintOptions;
use crate::pipeline::source::navigable_reference;
use futures::stream::{self, StreamExt};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// One source's unit of work.
#[derive(Debug, Clone)]
pub struct RenderJob {
    /// 0-based submission index, unique within the batch.
    pub index: usize,
    /// URL or inline markup as submitted.
    pub content: String,
    pub options: Arc<PrintOptions>,
}

/// Exactly one per [`RenderJob`], whatever happened to it.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub index: usize,
    pub outcome: Result<Vec<u8>, JobError>,
}

impl RenderResult {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Persisted successes in submission order plus the failures left out.
#[derive(Debug, Clone, Default)]
pub struct ArtifactSet {
    pub components: Vec<PathBuf>,
    pub failures: Vec<JobError>,
}

/// Build one job per source, all sharing `options`.
pub fn jobs_from_sources(sources: &[String], options: PrintOptions) -> Vec<RenderJob> {
    let options = Arc::new(options);
    sources
        .iter()
        .enumerate()
        .map(|(index, content)| RenderJob {
            index,
            content: content.clone(),
            options: Arc::clone(&options),
        })
        .collect()
}

// ── Dispatcher ───────────────────────────────────────────────────────────

/// Render every job and return one result per job, ordered by index.
///
/// Never fails as a whole: backend errors, timeouts and panics are all
/// recorded per job.
pub async fn dispatch_batch(
    backend: Arc<dyn RenderBackend>,
    jobs: Vec<RenderJob>,
    config: &PrinterConfig,
) -> Vec<RenderResult> {
    let total = jobs.len();
    let job_timeout = Duration::from_secs(config.job_timeout_secs);
    let callback = config.progress_callback.clone();

    if let Some(ref cb) = callback {
        cb.on_batch_start(total);
    }
    info!(
        "Dispatching {} jobs to '{}' (max {} sessions)",
        total,
        backend.name(),
        config.max_sessions
    );

    let mut arena: Vec<Option<RenderResult>> = (0..total).map(|_| None).collect();
    let max_sessions = config.max_sessions.max(1);
    let sessions = Arc::new(Semaphore::new(max_sessions));

    let mut pending = stream::iter(jobs.into_iter().map(|job| {
        let backend = Arc::clone(&backend);
        let sessions = Arc::clone(&sessions);
        let cb = callback.clone();
        async move {
            let index = job.index;
            let permit = match sessions.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    return RenderResult {
                        index,
                        outcome: Err(JobError::Panicked {
                            index,
                            detail: e.to_string(),
                        }),
                    }
                }
            };
            if let Some(ref cb) = cb {
                cb.on_job_start(index, total);
            }
            let result = run_job(backend, job, permit, job_timeout).await;
            if let Some(ref cb) = cb {
                match &result.outcome {
                    Ok(bytes) => cb.on_job_complete(result.index, total, bytes.len()),
                    Err(e) => cb.on_job_error(result.index, total, &e.to_string()),
                }
            }
            result
        }
    }))
    .buffer_unordered(max_sessions);

    let deadline = config
        .batch_timeout_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));

    loop {
        let next = match deadline {
            Some(at) => match tokio::time::timeout_at(at, pending.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!("Batch deadline elapsed with jobs still pending");
                    break;
                }
            },
            None => pending.next().await,
        };
        let Some(result) = next else { break };

        match arena.get_mut(result.index) {
            Some(slot) => *slot = Some(result),
            None => warn!("Discarding result for out-of-range index {}", result.index),
        }
    }
    // Dropping the stream abandons in-flight jobs; their blocking threads
    // finish on their own once the session's timeout expires.
    drop(pending);

    let batch_secs = config.batch_timeout_secs.unwrap_or_default();
    let results: Vec<RenderResult> = arena
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                let error = JobError::BatchDeadline {
                    index,
                    secs: batch_secs,
                };
                if let Some(ref cb) = callback {
                    cb.on_job_error(index, total, &error.to_string());
                }
                RenderResult {
                    index,
                    outcome: Err(error),
                }
            })
        })
        .collect();

    let success = results.iter().filter(|r| r.is_success()).count();
    if let Some(ref cb) = callback {
        cb.on_batch_complete(total, success);
    }
    info!("Batch finished: {}/{} jobs rendered", success, total);

    results
}

async fn run_job(
    backend: Arc<dyn RenderBackend>,
    job: RenderJob,
    permit: OwnedSemaphorePermit,
    timeout: Duration,
) -> RenderResult {
    let index = job.index;
    // The permit outlives the session even when the wait below gives up.
    let task = tokio::task::spawn_blocking(move || {
        let outcome = render_blocking(backend.as_ref(), &job, timeout);
        drop(permit);
        outcome
    });

    let outcome = match tokio::time::timeout(timeout, task).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(join)) => Err(JobError::Panicked {
            index,
            detail: join.to_string(),
        }),
        Err(_) => Err(JobError::Timeout {
            index,
            secs: timeout.as_secs(),
        }),
    };

    if let Err(ref e) = outcome {
        warn!("{}", e);
    }
    RenderResult { index, outcome }
}

/// One session, start to finish. The session is dropped, and so released,
/// on every return path.
fn render_blocking(
    backend: &dyn RenderBackend,
    job: &RenderJob,
    timeout: Duration,
) -> Result<Vec<u8>, JobError> {
    let index = job.index;
    let failed = |e: BackendError| JobError::RenderFailed {
        index,
        detail: e.to_string(),
    };

    let reference = navigable_reference(&job.content);
    debug!("Job {}: navigating ({} bytes of reference)", index, reference.len());

    let mut session = backend.open_session(timeout).map_err(failed)?;
    session.navigate(&reference).map_err(failed)?;
    let bytes = session.print_pdf(&job.options).map_err(failed)?;

    if bytes.is_empty() {
        return Err(JobError::EmptyPayload { index });
    }
    debug!("Job {}: {} bytes", index, bytes.len());
    Ok(bytes)
}

// ── Collector ────────────────────────────────────────────────────────────

/// Persist the successes in numeric index order and set the failures aside.
///
/// A write failure for a successful job is fatal to the whole request.
pub async fn collect_artifacts(
    mut results: Vec<RenderResult>,
    store: &ArtifactStore,
) -> Result<ArtifactSet, PrinterError> {
    results.sort_by_key(|r| r.index);

    let store = store.clone();
    tokio::task::spawn_blocking(move || -> Result<ArtifactSet, PrinterError> {
        let mut set = ArtifactSet::default();
        for result in results {
            match result.outcome {
                Ok(bytes) => set.components.push(store.write_component(result.index, &bytes)?),
                Err(e) => set.failures.push(e),
            }
        }
        Ok(set)
    })
    .await
    .map_err(|e| PrinterError::Internal(format!("Artifact writer panicked: {}", e)))?
}
