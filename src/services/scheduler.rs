use tokio_cron_scheduler::{Job, JobScheduler};

use crate::models::batch::BackfillOutcome;
use crate::services::backfill_service::BackfillService;

/// Registers a periodic backfill pass with the default limit.
///
/// `schedule` uses the six-field cron syntax (seconds first).
pub async fn start_backfill_schedule(
    service: BackfillService,
    schedule: &str,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create scheduler: {:?}", e))?;

    let job = Job::new_async(schedule, move |_id, _lock| {
        let service = service.clone();
        Box::pin(async move {
            let limit = service.settings().default_limit;
            match service.run(limit).await {
                Ok(BackfillOutcome::Completed(summary)) => tracing::info!(
                    books_processed = summary.books_processed,
                    quizzes_generated = summary.quizzes_generated,
                    books_with_errors = summary.books_with_errors,
                    "Scheduled backfill finished"
                ),
                Ok(outcome) => tracing::info!(?outcome, "Scheduled backfill found no work"),
                Err(e) => tracing::error!(error = %e, "Scheduled backfill failed"),
            }
        })
    })
    .map_err(|e| anyhow::anyhow!("Invalid BACKFILL_SCHEDULE '{}': {:?}", schedule, e))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to register backfill job: {:?}", e))?;
    scheduler
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start scheduler: {:?}", e))?;

    tracing::info!(schedule, "Scheduled backfill enabled");
    Ok(scheduler)
}
