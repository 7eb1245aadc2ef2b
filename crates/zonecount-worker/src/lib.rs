//! Analysis job worker.
//!
//! This crate provides:
//! - Env-driven worker configuration
//! - A job executor running one independent engine per video
//! - The job-keyed progress registry polled by callers
//! - Report persistence (JSON and CSV)
//! - Structured job logging

pub mod config;
pub mod error;
pub mod executor;
pub mod job;
pub mod logging;
pub mod progress;
pub mod storage;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use job::AnalysisJob;
pub use logging::JobLogger;
pub use progress::ProgressRegistry;
pub use storage::ReportStore;
