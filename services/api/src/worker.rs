//! services/api/src/worker.rs
//!
//! The narration queue worker: claims batches of jobs, processes each batch
//! concurrently, and acks or retries every job on its own.

use crate::pipeline::process_audio_job;
use crate::web::state::AppState;
use futures::future::join_all;
use monogatari_core::domain::QueuedAudioJob;
use monogatari_core::ports::{PortResult, RetryDisposition};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// How one delivered job ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Acked,
    Retried(RetryDisposition),
}

async fn handle_delivery(app_state: &AppState, delivery: &QueuedAudioJob) -> PortResult<JobOutcome> {
    match process_audio_job(app_state, &delivery.job).await {
        Ok(_) => {
            app_state.audio_queue.ack(delivery.delivery_id).await?;
            Ok(JobOutcome::Acked)
        }
        Err(e) => {
            let disposition = app_state.audio_queue.retry(delivery, &e.to_string()).await?;
            if disposition == RetryDisposition::DeadLettered {
                error!(
                    job_id = delivery.delivery_id,
                    story_id = delivery.job.story_id,
                    attempts = delivery.attempts,
                    "Narration job dead-lettered"
                );
            }
            Ok(JobOutcome::Retried(disposition))
        }
    }
}

/// Claims one batch and processes it. Returns how many jobs were claimed.
pub async fn run_batch(app_state: &AppState) -> PortResult<usize> {
    let config = &app_state.config.worker;
    let batch = app_state
        .audio_queue
        .receive(config.batch_size, config.visibility_timeout)
        .await?;
    if batch.is_empty() {
        return Ok(0);
    }

    let results = join_all(batch.iter().map(|delivery| handle_delivery(app_state, delivery))).await;
    for (delivery, result) in batch.iter().zip(results) {
        if let Err(e) = result {
            // The job stays claimed and reappears after the visibility timeout.
            warn!(job_id = delivery.delivery_id, "Could not settle narration job: {}", e);
        }
    }
    Ok(batch.len())
}

/// Polls the queue until `shutdown` is cancelled.
pub async fn run_worker(app_state: Arc<AppState>, shutdown: CancellationToken) {
    let poll_interval = app_state.config.worker.poll_interval;
    info!(
        queue = %app_state.config.worker.queue_name,
        batch_size = app_state.config.worker.batch_size,
        "Narration worker started"
    );

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        let claimed = match run_batch(&app_state).await {
            Ok(claimed) => claimed,
            Err(e) => {
                error!("Failed to receive narration jobs: {}", e);
                0
            }
        };

        // Drain without pausing while there is work.
        if claimed > 0 {
            continue;
        }

        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(poll_interval) => {}
        }
    }

    info!("Narration worker stopped");
}
