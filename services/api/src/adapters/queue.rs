//! services/api/src/adapters/queue.rs
//!
//! A Postgres-backed implementation of the `AudioJobQueue` port.
//!
//! Jobs live in the `audio_jobs` table, partitioned by queue name. Receiving a
//! batch bumps `attempts` and pushes `visible_at` forward, so a consumer that dies
//! mid-job leaves the row to be redelivered: delivery is at-least-once.

use async_trait::async_trait;
use monogatari_core::domain::{AudioJob, NarrationVoice, QueuedAudioJob};
use monogatari_core::ports::{AudioJobQueue, PortError, PortResult, RetryDisposition};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// A queue adapter that implements the `AudioJobQueue` port on top of PostgreSQL.
#[derive(Clone)]
pub struct PgAudioQueue {
    pool: PgPool,
    queue_name: String,
    retry_delay: Duration,
    max_attempts: i32,
}

impl PgAudioQueue {
    /// Creates a new `PgAudioQueue` bound to one named queue.
    pub fn new(pool: PgPool, queue_name: String, retry_delay: Duration, max_attempts: i32) -> Self {
        Self {
            pool,
            queue_name,
            retry_delay,
            max_attempts,
        }
    }
}

#[derive(FromRow)]
struct JobRecord {
    id: i64,
    story_id: i64,
    voice: String,
    attempts: i32,
}

/// Dead-letters one job and fails its story in the same statement, so the story
/// leaves `queued` and can be requested again.
const DEAD_LETTER_UNDECODABLE: &str = "\
    WITH dead AS ( \
        UPDATE audio_jobs SET status = 'dead', last_error = $2 WHERE id = $1 RETURNING story_id) \
    UPDATE stories SET audio_status = 'failed', updated_at = NOW() \
    WHERE id IN (SELECT story_id FROM dead) AND audio_status IN ('queued', 'in_progress')";

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

#[async_trait]
impl AudioJobQueue for PgAudioQueue {
    async fn send(&self, job: &AudioJob) -> PortResult<()> {
        sqlx::query("INSERT INTO audio_jobs (queue_name, story_id, voice) VALUES ($1, $2, $3)")
            .bind(&self.queue_name)
            .bind(job.story_id)
            .bind(job.voice.as_ref())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn receive(&self, max: i64, visibility_timeout: Duration) -> PortResult<Vec<QueuedAudioJob>> {
        let records = sqlx::query_as::<_, JobRecord>(
            "UPDATE audio_jobs SET attempts = attempts + 1, \
                 visible_at = NOW() + make_interval(secs => $3) \
             WHERE id IN ( \
                 SELECT id FROM audio_jobs \
                 WHERE queue_name = $1 AND status = 'pending' AND visible_at <= NOW() \
                 ORDER BY id LIMIT $2 FOR UPDATE SKIP LOCKED) \
             RETURNING id, story_id, voice, attempts",
        )
        .bind(&self.queue_name)
        .bind(max)
        .bind(visibility_timeout.as_secs_f64())
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut jobs = Vec::with_capacity(records.len());
        for record in records {
            match NarrationVoice::from_str(&record.voice) {
                Ok(voice) => jobs.push(QueuedAudioJob {
                    delivery_id: record.id,
                    attempts: record.attempts,
                    job: AudioJob {
                        story_id: record.story_id,
                        voice,
                    },
                }),
                Err(_) => {
                    // Unparseable payloads can never succeed.
                    warn!(
                        job_id = record.id,
                        story_id = record.story_id,
                        voice = %record.voice,
                        "Dead-lettering job with unknown voice"
                    );
                    sqlx::query(DEAD_LETTER_UNDECODABLE)
                        .bind(record.id)
                        .bind("unknown voice")
                        .execute(&self.pool)
                        .await
                        .map_err(unexpected)?;
                }
            }
        }
        Ok(jobs)
    }

    async fn ack(&self, delivery_id: i64) -> PortResult<()> {
        sqlx::query("DELETE FROM audio_jobs WHERE id = $1")
            .bind(delivery_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn retry(&self, delivery: &QueuedAudioJob, error: &str) -> PortResult<RetryDisposition> {
        if delivery.attempts >= self.max_attempts {
            sqlx::query("UPDATE audio_jobs SET status = 'dead', last_error = $2 WHERE id = $1")
                .bind(delivery.delivery_id)
                .bind(error)
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
            return Ok(RetryDisposition::DeadLettered);
        }

        sqlx::query(
            "UPDATE audio_jobs SET visible_at = NOW() + make_interval(secs => $2), last_error = $3 \
             WHERE id = $1",
        )
        .bind(delivery.delivery_id)
        .bind(self.retry_delay.as_secs_f64())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(RetryDisposition::Requeued)
    }
}
