//! Fixed-tick job scheduler.

use crate::error::{CronError, CronResult};
use crate::job::{Job, JobContext, JobStatus};
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Scheduler configuration.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between ticks
    pub tick_interval: Duration,

    /// Whether to log job execution
    pub log_execution: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(60),
            log_execution: true,
        }
    }
}

impl SchedulerConfig {
    /// Set the tick interval.
    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }
}

/// Statistics for a single job.
#[derive(Debug, Clone)]
pub struct JobStats {
    pub name: String,
    pub status: JobStatus,
    pub last_run: Option<DateTime<Local>>,
    pub execution_count: u64,
    pub enabled: bool,
}

type SharedJob = Arc<Mutex<Job>>;

/// Runs every registered job once per tick.
///
/// The first tick fires immediately after [`start`](Self::start). A job
/// whose previous run is still in progress when a tick arrives is skipped
/// for that tick, so runs of one job never overlap.
pub struct CronScheduler {
    jobs: Arc<RwLock<HashMap<String, SharedJob>>>,
    config: SchedulerConfig,
    running: Arc<RwLock<bool>>,
    handle: Option<JoinHandle<()>>,
}

impl CronScheduler {
    /// Create a new scheduler with default configuration.
    pub fn new() -> Self {
        Self::with_config(SchedulerConfig::default())
    }

    /// Create a new scheduler with custom configuration.
    pub fn with_config(config: SchedulerConfig) -> Self {
        debug!(tick_interval = ?config.tick_interval, "Initializing scheduler");
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            config,
            running: Arc::new(RwLock::new(false)),
            handle: None,
        }
    }

    /// Register a job.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use rolewatch_cron::*;
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), CronError> {
    /// let mut scheduler = CronScheduler::new();
    ///
    /// scheduler
    ///     .add_job("rotate", |ctx| async move {
    ///         println!("tick at {}", ctx.tick_time);
    ///         Ok(())
    ///     })
    ///     .await?;
    ///
    /// scheduler.start().await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn add_job<F, Fut>(&self, name: impl Into<String>, function: F) -> CronResult<()>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = CronResult<()>> + Send + 'static,
    {
        let name = name.into();
        let mut jobs = self.jobs.write().await;
        if jobs.contains_key(&name) {
            return Err(CronError::JobAlreadyExists(name));
        }

        info!(job = %name, "Registered scheduled job");
        let job = Job::new(name.clone(), function);
        jobs.insert(name, Arc::new(Mutex::new(job)));
        Ok(())
    }

    /// Remove a job from the scheduler.
    pub async fn remove_job(&self, name: &str) -> CronResult<()> {
        let mut jobs = self.jobs.write().await;
        jobs.remove(name)
            .ok_or_else(|| CronError::JobNotFound(name.to_string()))?;
        Ok(())
    }

    /// Get a sorted list of all job names.
    pub async fn list_jobs(&self) -> Vec<String> {
        let jobs = self.jobs.read().await;
        let mut names: Vec<String> = jobs.keys().cloned().collect();
        names.sort();
        names
    }

    /// Enable a job.
    pub async fn enable_job(&self, name: &str) -> CronResult<()> {
        let job = self.job(name).await?;
        job.lock().await.enable();
        Ok(())
    }

    /// Disable a job.
    pub async fn disable_job(&self, name: &str) -> CronResult<()> {
        let job = self.job(name).await?;
        job.lock().await.disable();
        Ok(())
    }

    /// Get statistics for a job.
    pub async fn get_stats(&self, name: &str) -> CronResult<JobStats> {
        let job = self.job(name).await?;
        let job = job.lock().await;
        Ok(JobStats {
            name: job.name.clone(),
            status: job.status.clone(),
            last_run: job.last_run,
            execution_count: job.execution_count,
            enabled: job.enabled,
        })
    }

    /// Run a job immediately with the current local time, waiting for any
    /// in-flight run of the same job to finish first.
    pub async fn run_now(&self, name: &str) -> CronResult<()> {
        let job = self.job(name).await?;
        let mut job = job.lock().await;
        job.execute(Local::now()).await
    }

    /// Start the tick loop.
    pub async fn start(&mut self) -> CronResult<()> {
        {
            let mut running = self.running.write().await;
            if *running {
                return Err(CronError::SchedulerAlreadyRunning);
            }
            *running = true;
        }

        info!(tick_interval = ?self.config.tick_interval, "Starting scheduler");

        let jobs = self.jobs.clone();
        let running = self.running.clone();
        let tick_interval = self.config.tick_interval;
        let log_execution = self.config.log_execution;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                interval.tick().await;

                if !*running.read().await {
                    break;
                }

                let tick_time = Local::now();
                let snapshot: Vec<SharedJob> = jobs.read().await.values().cloned().collect();
                for job in snapshot {
                    tokio::spawn(run_tick(job, tick_time, log_execution));
                }
            }
        });

        self.handle = Some(handle);
        Ok(())
    }

    /// Stop the tick loop. Runs already in progress are allowed to finish.
    pub async fn stop(&mut self) -> CronResult<()> {
        {
            let mut running = self.running.write().await;
            if !*running {
                return Err(CronError::SchedulerNotRunning);
            }
            *running = false;
        }

        if let Some(handle) = self.handle.take() {
            handle.abort();
        }

        info!("Scheduler stopped");
        Ok(())
    }

    /// Check if the scheduler is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    async fn job(&self, name: &str) -> CronResult<SharedJob> {
        self.jobs
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| CronError::JobNotFound(name.to_string()))
    }
}

impl Default for CronScheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn run_tick(job: SharedJob, tick_time: DateTime<Local>, log_execution: bool) {
    let Ok(mut job) = job.try_lock_owned() else {
        debug!("Previous run still in progress, skipping tick");
        return;
    };

    if !job.enabled {
        return;
    }

    if log_execution {
        debug!(job = %job.name, tick = %tick_time, "Running job");
    }

    if let Err(e) = job.execute(tick_time).await {
        warn!(job = %job.name, error = %e, "Job failed");
    }
}
