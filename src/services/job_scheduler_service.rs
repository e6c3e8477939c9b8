use crate::config::ServerConfig;
use crate::errors::AppError;
use crate::jobs::{collect_quotes_job, load_latest_job};
use crate::models::InvocationResult;
use crate::state::AppState;
use chrono::Utc;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    state: AppState,
}

impl JobSchedulerService {
    pub async fn new(state: AppState) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, state })
    }

    /// Register the collect and load jobs and start ticking.
    ///
    /// Runs are not coordinated: a slow load can overlap the next one, which
    /// is harmless because inserts skip keys that already exist.
    pub async fn start(&mut self, config: &ServerConfig) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        self.schedule_job(
            &config.collect_schedule,
            collect_quotes_job::JOB_NAME,
            |state: AppState| async move { collect_quotes_job::run(&state.collector).await },
        )
        .await?;

        self.schedule_job(
            &config.load_schedule,
            load_latest_job::JOB_NAME,
            |state: AppState| async move { load_latest_job::run(&state.loader).await },
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started successfully with 2 jobs");
        Ok(())
    }

    /// Stop the scheduler gracefully
    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(AppState) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = InvocationResult> + Send + 'static,
    {
        let state = self.state.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let state = state.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job_with_tracking(job_name, state, job_fn).await;
            })
        })
        .map_err(|e| AppError::Config(format!("Invalid schedule for {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} [cron: {}]", job_name, schedule);
        Ok(())
    }
}

async fn execute_job_with_tracking<F, Fut>(job_name: &str, state: AppState, job_fn: Arc<F>)
where
    F: Fn(AppState) -> Fut,
    Fut: std::future::Future<Output = InvocationResult>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(state).await;

    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result.status_code {
        200..=299 => info!(
            status = result.status_code,
            duration_ms, "✅ Job completed: {} - {}", job_name, result.body
        ),
        400..=499 => warn!(
            status = result.status_code,
            duration_ms, "⚠️ Job finished without work: {} - {}", job_name, result.body
        ),
        _ => error!(
            status = result.status_code,
            duration_ms, "❌ Job failed: {} - {}", job_name, result.body
        ),
    }
}
