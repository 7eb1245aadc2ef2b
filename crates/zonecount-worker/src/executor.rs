//! Job executor.
//!
//! Every job gets its own engine and runs on the blocking pool once it holds
//! a semaphore permit. Jobs share nothing but the progress registry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument};

use zonecount_engine::progress::EXPORTING_PERCENT;
use zonecount_engine::{run_analysis, EngineConfig, EngineError, JsonlDetectionSource, ProgressSink};
use zonecount_models::{JobId, JobOutputs, ProgressStage, ProgressUpdate};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::job::AnalysisJob;
use crate::logging::{JobLogger, ZONE_ANALYSIS};
use crate::progress::ProgressRegistry;
use crate::storage::ReportStore;

/// Runs analysis jobs with bounded concurrency.
#[derive(Clone)]
pub struct JobExecutor {
    config: WorkerConfig,
    engine_config: EngineConfig,
    registry: ProgressRegistry,
    store: ReportStore,
    job_semaphore: Arc<Semaphore>,
    tokens: Arc<Mutex<HashMap<JobId, CancellationToken>>>,
    shutdown: CancellationToken,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig) -> Self {
        Self::with_registry(config, ProgressRegistry::new())
    }

    /// Create an executor that reports into an existing registry.
    pub fn with_registry(config: WorkerConfig, registry: ProgressRegistry) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));
        Self {
            engine_config: config.engine_config(),
            store: ReportStore::new(config.data_dir.clone()),
            config,
            registry,
            job_semaphore,
            tokens: Arc::new(Mutex::new(HashMap::new())),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProgressRegistry {
        &self.registry
    }

    /// Register a job as queued and start it in the background.
    pub fn submit(&self, job: AnalysisJob) -> JoinHandle<WorkerResult<JobOutputs>> {
        let job_id = job.job_id.clone();
        self.registry.register(&job_id);

        let token = self.shutdown.child_token();
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(job_id.clone(), token.clone());

        let executor = self.clone();
        let logger = JobLogger::new(&job_id, ZONE_ANALYSIS);
        let span = logger.create_span();
        tokio::spawn(
            async move {
                let result = executor.execute_job(job, token, &logger).await;
                executor
                    .tokens
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&job_id);
                executor.finish_job(&job_id, &result, &logger);
                result
            }
            .instrument(span),
        )
    }

    /// Request cancellation of a queued or running job.
    pub fn cancel(&self, job_id: &JobId) -> WorkerResult<()> {
        let tokens = self.tokens.lock().unwrap_or_else(PoisonError::into_inner);
        let token = tokens
            .get(job_id)
            .ok_or_else(|| WorkerError::JobNotFound(job_id.clone()))?;
        info!(job_id = %job_id, "Cancellation requested");
        token.cancel();
        Ok(())
    }

    /// Cancel every job, queued or running.
    pub fn shutdown(&self) {
        info!("Shutdown signal received, cancelling jobs");
        self.shutdown.cancel();
    }

    /// Number of jobs registered and not yet finished.
    pub fn active_jobs(&self) -> usize {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    async fn execute_job(
        &self,
        job: AnalysisJob,
        token: CancellationToken,
        logger: &JobLogger,
    ) -> WorkerResult<JobOutputs> {
        let permit = tokio::select! {
            permit = self.job_semaphore.clone().acquire_owned() => {
                permit.map_err(|_| WorkerError::job_failed("Semaphore closed"))?
            }
            _ = token.cancelled() => {
                return Err(EngineError::Cancelled.into());
            }
        };

        logger.log_start(
            &job.detections,
            job.request.zones.len(),
            job.request.lines.len(),
        );

        let sink = self.registry.sink(&job.job_id);
        sink.report(ProgressUpdate::new(
            ProgressStage::Starting,
            0,
            "Starting analysis...",
        ));

        let engine_config = self.engine_config.clone();
        let store = self.store.clone();
        let logger = logger.clone();
        let handle = tokio::task::spawn_blocking(move || -> WorkerResult<JobOutputs> {
            let _permit = permit;
            let mut source = JsonlDetectionSource::open(&job.detections)?;
            let report = run_analysis(&job.request, &mut source, &engine_config, &sink, &token)?;
            logger.log_analysis_done(
                report.video_info.total_frames,
                report.summary.total_persons_seen,
            );

            sink.report(ProgressUpdate::new(
                ProgressStage::Exporting,
                EXPORTING_PERCENT,
                "Writing report...",
            ));
            store.save(&job.name, &report)
        });

        handle
            .await
            .map_err(|e| WorkerError::job_failed(format!("Analysis task panicked: {}", e)))?
    }

    fn finish_job(&self, job_id: &JobId, result: &WorkerResult<JobOutputs>, logger: &JobLogger) {
        match result {
            Ok(outputs) => {
                self.registry.complete(job_id, outputs.clone());
                let elapsed_ms = self
                    .registry
                    .get(job_id)
                    .map(|p| (Utc::now() - p.started_at).num_milliseconds())
                    .unwrap_or_default();
                logger.log_completion(outputs, elapsed_ms);
            }
            Err(e) if e.is_cancelled() => {
                self.registry.cancel(job_id);
                logger.log_cancelled();
            }
            Err(e) => {
                self.registry.fail(job_id, e.to_string());
                logger.log_error(e);
            }
        }
    }
}
