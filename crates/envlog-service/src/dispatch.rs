//! Non-overlapping render dispatch.
//!
//! At most one render worker exists at a time. The dispatcher holds its
//! [`JoinHandle`]; a new render is started only once the previous handle has
//! been reaped. Workers run on the blocking pool, so a slow render never
//! delays a sampling tick.

use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::OverlapPolicy;
use crate::render::{RenderError, RenderReport};

type RenderResult = Result<RenderReport, RenderError>;

/// What happened to a dispatch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A new worker was started.
    Started,
    /// A worker was still running and the request was dropped.
    Skipped,
}

/// Owns the single in-flight render worker.
#[derive(Debug, Default)]
pub struct RenderDispatcher {
    policy: OverlapPolicy,
    in_flight: Option<JoinHandle<RenderResult>>,
    completed: u64,
    failed: u64,
    skipped: u64,
}

impl RenderDispatcher {
    pub fn new(policy: OverlapPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Whether a worker has been started and not yet reaped.
    pub fn in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Renders that finished successfully.
    pub fn completed(&self) -> u64 {
        self.completed
    }

    /// Renders that returned an error or panicked.
    pub fn failed(&self) -> u64 {
        self.failed
    }

    /// Dispatch requests dropped because a worker was running.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }

    /// Reap the worker if it has finished, logging its outcome.
    ///
    /// Returns without waiting when the worker is still running.
    pub async fn reap(&mut self) {
        if self.in_flight.as_ref().is_some_and(JoinHandle::is_finished) {
            self.join().await;
        }
    }

    /// Wait for the in-flight worker, if any, and log its outcome.
    ///
    /// The handle is only released once the worker has finished, so a join
    /// that is cancelled part way leaves the worker tracked.
    pub async fn join(&mut self) {
        let Some(handle) = self.in_flight.as_mut() else {
            return;
        };
        let result = handle.await;
        self.in_flight = None;

        match result {
            Ok(Ok(report)) => {
                self.completed += 1;
                debug!(
                    "Render for {} finished: {} samples, {} charts",
                    report.now,
                    report.samples,
                    report.charts.len()
                );
            }
            Ok(Err(e)) => {
                self.failed += 1;
                error!("Render failed, previous charts kept: {}", e);
            }
            Err(e) if e.is_panic() => {
                self.failed += 1;
                error!("Render worker panicked, previous charts kept: {}", e);
            }
            Err(e) => {
                self.failed += 1;
                warn!("Render worker cancelled: {}", e);
            }
        }
    }

    /// Start `job` on the blocking pool unless a worker is still running.
    ///
    /// With [`OverlapPolicy::Wait`] the running worker is joined first and
    /// the job always starts.
    pub async fn dispatch<F>(&mut self, job: F) -> DispatchOutcome
    where
        F: FnOnce() -> RenderResult + Send + 'static,
    {
        self.reap().await;

        if self.in_flight.is_some() {
            match self.policy {
                OverlapPolicy::Skip => {
                    self.skipped += 1;
                    info!("Previous render still running, skipping this one");
                    return DispatchOutcome::Skipped;
                }
                OverlapPolicy::Wait => {
                    debug!("Waiting for previous render to finish");
                    self.join().await;
                }
            }
        }

        self.in_flight = Some(tokio::task::spawn_blocking(job));
        DispatchOutcome::Started
    }
}
