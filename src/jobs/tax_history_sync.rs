use std::collections::BTreeMap;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::services::esi::EsiClient;
use crate::services::tax_history::{self, SyncOutcome};

#[derive(Debug, Default, PartialEq)]
pub struct SyncStats {
    pub total_corporations: usize,
    pub synced: usize,
    pub failed: usize,
    pub rows_added: usize,
}

pub fn summarize(outcomes: &BTreeMap<i64, SyncOutcome>) -> SyncStats {
    let mut stats = SyncStats {
        total_corporations: outcomes.len(),
        ..SyncStats::default()
    };

    for outcome in outcomes.values() {
        match outcome {
            SyncOutcome::Synced { added } => {
                stats.synced += 1;
                stats.rows_added += added;
            }
            SyncOutcome::Failed { .. } => stats.failed += 1,
        }
    }

    stats
}

/// Background job that pulls the tax history of every tracked corporation
pub async fn sync_tax_histories(pool: &PgPool, esi: &EsiClient) -> Result<SyncStats, sqlx::Error> {
    tracing::info!("Starting corporation tax history sync job");

    let outcomes = tax_history::sync_all_corps(pool, esi).await?;
    let stats = summarize(&outcomes);

    tracing::info!(?stats, "Corporation tax history sync job completed");

    Ok(stats)
}

/// Starts the scheduler running [`sync_tax_histories`] on `cron`.
/// Returns `None` when `cron` is empty.
pub async fn start_scheduler(
    pool: PgPool,
    esi: EsiClient,
    cron: &str,
) -> anyhow::Result<Option<JobScheduler>> {
    if cron.trim().is_empty() {
        tracing::info!("Tax history sync job disabled");
        return Ok(None);
    }

    let scheduler = JobScheduler::new().await.map_err(scheduler_error)?;

    let job = Job::new_async(cron, move |_id, _scheduler| {
        let pool = pool.clone();
        let esi = esi.clone();
        Box::pin(async move {
            if let Err(e) = sync_tax_histories(&pool, &esi).await {
                tracing::error!(error = %e, "Corporation tax history sync job failed");
            }
        })
    })
    .map_err(scheduler_error)?;

    scheduler.add(job).await.map_err(scheduler_error)?;
    scheduler.start().await.map_err(scheduler_error)?;

    tracing::info!(cron = %cron, "Tax history sync job scheduled");

    Ok(Some(scheduler))
}

fn scheduler_error(e: tokio_cron_scheduler::JobSchedulerError) -> anyhow::Error {
    anyhow::anyhow!("job scheduler error: {:?}", e)
}
