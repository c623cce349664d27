//! Job definition and execution.

use crate::error::CronResult;
use chrono::{DateTime, Local};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Job execution function type.
pub type JobFn =
    Arc<dyn Fn(JobContext) -> Pin<Box<dyn Future<Output = CronResult<()>> + Send>> + Send + Sync>;

/// Job execution context.
#[derive(Debug, Clone)]
pub struct JobContext {
    /// Job name
    pub name: String,

    /// Local wall-clock time of the tick that triggered this run
    pub tick_time: DateTime<Local>,

    /// Execution count (0-based)
    pub execution_count: u64,
}

impl JobContext {
    /// Create a new job context.
    pub fn new(name: String, tick_time: DateTime<Local>, execution_count: u64) -> Self {
        Self {
            name,
            tick_time,
            execution_count,
        }
    }
}

/// Job status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Waiting for the next tick
    Idle,

    /// Job is currently running
    Running,

    /// Last run completed successfully
    Completed,

    /// Last run failed
    Failed(String),
}

/// A unit of work invoked on every scheduler tick.
///
/// Jobs decide for themselves whether a tick is due; the scheduler only
/// guarantees that runs of the same job never overlap.
pub struct Job {
    /// Job name
    pub name: String,

    /// Job function
    pub function: JobFn,

    /// Job status
    pub status: JobStatus,

    /// Last execution time
    pub last_run: Option<DateTime<Local>>,

    /// Total execution count
    pub execution_count: u64,

    /// Whether the job is enabled
    pub enabled: bool,
}

impl Job {
    /// Create a new job.
    pub fn new<F, Fut>(name: impl Into<String>, function: F) -> Self
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CronResult<()>> + Send + 'static,
    {
        let wrapped_fn = Arc::new(
            move |ctx: JobContext| -> Pin<Box<dyn Future<Output = CronResult<()>> + Send>> {
                Box::pin(function(ctx))
            },
        );

        Self {
            name: name.into(),
            function: wrapped_fn,
            status: JobStatus::Idle,
            last_run: None,
            execution_count: 0,
            enabled: true,
        }
    }

    /// Execute the job for the tick at `tick_time`.
    pub async fn execute(&mut self, tick_time: DateTime<Local>) -> CronResult<()> {
        if !self.enabled {
            return Ok(());
        }

        self.status = JobStatus::Running;

        let context = JobContext::new(self.name.clone(), tick_time, self.execution_count);
        let result = (self.function)(context).await;

        self.last_run = Some(tick_time);
        self.execution_count += 1;

        match result {
            Ok(()) => {
                self.status = JobStatus::Completed;
                Ok(())
            }
            Err(e) => {
                self.status = JobStatus::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Enable the job.
    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Disable the job.
    pub fn disable(&mut self) {
        self.enabled = false;
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("status", &self.status)
            .field("last_run", &self.last_run)
            .field("execution_count", &self.execution_count)
            .field("enabled", &self.enabled)
            .finish()
    }
}
