//! Job-keyed progress registry.
//!
//! The registry is the only state shared between running jobs and pollers.
//! Processing threads write through [`ProgressRegistry::sink`]; pollers take
//! snapshots with [`ProgressRegistry::get`]. Terminal states are sticky.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use zonecount_engine::ProgressCallback;
use zonecount_models::{JobId, JobOutputs, JobProgress, ProgressUpdate};

/// Thread-safe map from job ID to its latest progress.
#[derive(Debug, Clone, Default)]
pub struct ProgressRegistry {
    jobs: Arc<RwLock<HashMap<JobId, JobProgress>>>,
}

impl ProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while holding the lock leaves the map itself consistent, so
    // poisoning is ignored.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<JobId, JobProgress>> {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<JobId, JobProgress>> {
        self.jobs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a job as queued, replacing any previous entry.
    pub fn register(&self, job_id: &JobId) -> JobProgress {
        let progress = JobProgress::new(job_id.clone());
        self.write().insert(job_id.clone(), progress.clone());
        progress
    }

    /// Snapshot of one job.
    pub fn get(&self, job_id: &JobId) -> Option<JobProgress> {
        self.read().get(job_id).cloned()
    }

    /// Snapshots of every job.
    pub fn list(&self) -> Vec<JobProgress> {
        let mut jobs: Vec<JobProgress> = self.read().values().cloned().collect();
        jobs.sort_by_key(|p| p.started_at);
        jobs
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Apply a progress report. Returns false for unknown jobs.
    pub fn update(&self, job_id: &JobId, update: ProgressUpdate) -> bool {
        self.modify(job_id, |p| p.apply(update))
    }

    pub fn complete(&self, job_id: &JobId, outputs: JobOutputs) -> bool {
        self.modify(job_id, |p| p.complete(outputs))
    }

    pub fn fail(&self, job_id: &JobId, error: impl Into<String>) -> bool {
        let error = error.into();
        self.modify(job_id, |p| p.fail(error))
    }

    pub fn cancel(&self, job_id: &JobId) -> bool {
        self.modify(job_id, |p| p.cancel())
    }

    /// Drop a job's entry.
    pub fn remove(&self, job_id: &JobId) -> Option<JobProgress> {
        self.write().remove(job_id)
    }

    fn modify(&self, job_id: &JobId, f: impl FnOnce(&mut JobProgress)) -> bool {
        let mut jobs = self.write();
        match jobs.get_mut(job_id) {
            Some(progress) => {
                f(progress);
                debug!(
                    job_id = %job_id,
                    stage = %progress.stage,
                    percent = progress.percent,
                    seq = progress.event_seq,
                    "Progress updated"
                );
                true
            }
            None => false,
        }
    }

    /// Progress sink that writes into this registry for one job.
    pub fn sink(&self, job_id: &JobId) -> ProgressCallback {
        let registry = self.clone();
        let job_id = job_id.clone();
        Arc::new(move |update: ProgressUpdate| {
            registry.update(&job_id, update);
        })
    }
}
