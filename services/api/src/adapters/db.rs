//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Ownership and visibility rules are part of every query's WHERE clause, so a
//! foreign or private story is indistinguishable from a missing one.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use monogatari_core::domain::{
    Audio, AudioStatus, Illustration, NewAudio, NewIllustration, Story, StoryDetails,
};
use monogatari_core::ports::{DatabaseService, PortError, PortResult};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    async fn illustrations_for(&self, story_ids: &[i64]) -> PortResult<HashMap<i64, Vec<Illustration>>> {
        let records = sqlx::query_as::<_, IllustrationRecord>(
            "SELECT id, story_id, image_url, prompt, created_at FROM illustrations \
             WHERE story_id = ANY($1) ORDER BY created_at ASC",
        )
        .bind(story_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut grouped: HashMap<i64, Vec<Illustration>> = HashMap::new();
        for record in records {
            grouped.entry(record.story_id).or_default().push(record.to_domain());
        }
        Ok(grouped)
    }

    async fn audios_for(&self, story_id: i64) -> PortResult<Vec<Audio>> {
        let records = sqlx::query_as::<_, AudioRecord>(
            "SELECT id, story_id, audio_url, voice, created_at FROM audios \
             WHERE story_id = $1 ORDER BY created_at DESC",
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(AudioRecord::to_domain).collect())
    }

    async fn with_assets(&self, story: Story) -> PortResult<StoryDetails> {
        let mut illustrations = self.illustrations_for(&[story.id]).await?;
        let audios = self.audios_for(story.id).await?;
        Ok(StoryDetails {
            illustrations: illustrations.remove(&story.id).unwrap_or_default(),
            audios,
            story,
        })
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        _ => PortError::Unexpected(e.to_string()),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const STORY_COLUMNS: &str =
    "id, user_id, title, content, is_public, published_at, audio_status, created_at, updated_at";

#[derive(FromRow)]
struct StoryRecord {
    id: i64,
    user_id: Uuid,
    title: String,
    content: String,
    is_public: bool,
    published_at: Option<DateTime<Utc>>,
    audio_status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl StoryRecord {
    fn to_domain(self) -> PortResult<Story> {
        let audio_status = AudioStatus::from_str(&self.audio_status).map_err(|_| {
            PortError::Unexpected(format!(
                "Story {} has unknown audio_status '{}'",
                self.id, self.audio_status
            ))
        })?;
        Ok(Story {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            content: self.content,
            is_public: self.is_public,
            published_at: self.published_at,
            audio_status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct IllustrationRecord {
    id: i64,
    story_id: i64,
    image_url: String,
    prompt: String,
    created_at: DateTime<Utc>,
}
impl IllustrationRecord {
    fn to_domain(self) -> Illustration {
        Illustration {
            id: self.id,
            story_id: self.story_id,
            image_url: self.image_url,
            prompt: self.prompt,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct AudioRecord {
    id: i64,
    story_id: i64,
    audio_url: String,
    voice: String,
    created_at: DateTime<Utc>,
}
impl AudioRecord {
    fn to_domain(self) -> Audio {
        Audio {
            id: self.id,
            story_id: self.story_id,
            audio_url: self.audio_url,
            voice: self.voice,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_story(&self, user_id: Uuid, title: &str, content: &str) -> PortResult<Story> {
        let record = sqlx::query_as::<_, StoryRecord>(&format!(
            "INSERT INTO stories (user_id, title, content) VALUES ($1, $2, $3) RETURNING {STORY_COLUMNS}"
        ))
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn list_stories(&self, user_id: Uuid, limit: Option<i64>) -> PortResult<Vec<StoryDetails>> {
        let records = sqlx::query_as::<_, StoryRecord>(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let stories = records
            .into_iter()
            .map(StoryRecord::to_domain)
            .collect::<PortResult<Vec<_>>>()?;
        let ids: Vec<i64> = stories.iter().map(|s| s.id).collect();
        let mut illustrations = self.illustrations_for(&ids).await?;

        Ok(stories
            .into_iter()
            .map(|story| StoryDetails {
                illustrations: illustrations.remove(&story.id).unwrap_or_default(),
                audios: Vec::new(),
                story,
            })
            .collect())
    }

    async fn get_visible_story(&self, story_id: i64, viewer: Option<Uuid>) -> PortResult<StoryDetails> {
        let record = sqlx::query_as::<_, StoryRecord>(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 AND (is_public OR user_id = $2)"
        ))
        .bind(story_id)
        .bind(viewer)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Story {} not found", story_id)))?;
        self.with_assets(record.to_domain()?).await
    }

    async fn get_owned_story(&self, story_id: i64, user_id: Uuid) -> PortResult<StoryDetails> {
        let record = sqlx::query_as::<_, StoryRecord>(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 AND user_id = $2"
        ))
        .bind(story_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Story {} not found", story_id)))?;
        self.with_assets(record.to_domain()?).await
    }

    async fn get_story(&self, story_id: i64) -> PortResult<Story> {
        let record = sqlx::query_as::<_, StoryRecord>(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE id = $1"
        ))
        .bind(story_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Story {} not found", story_id)))?;
        record.to_domain()
    }

    async fn update_story_content(
        &self,
        story_id: i64,
        user_id: Uuid,
        title: &str,
        content: &str,
    ) -> PortResult<Story> {
        let record = sqlx::query_as::<_, StoryRecord>(&format!(
            "UPDATE stories SET title = $3, content = $4, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {STORY_COLUMNS}"
        ))
        .bind(story_id)
        .bind(user_id)
        .bind(title)
        .bind(content)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Story {} not found", story_id)))?;
        record.to_domain()
    }

    async fn set_story_visibility(&self, story_id: i64, user_id: Uuid, is_public: bool) -> PortResult<Story> {
        let record = sqlx::query_as::<_, StoryRecord>(&format!(
            "UPDATE stories SET is_public = $3, \
             published_at = CASE WHEN $3 THEN NOW() ELSE NULL END, updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 RETURNING {STORY_COLUMNS}"
        ))
        .bind(story_id)
        .bind(user_id)
        .bind(is_public)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Story {} not found", story_id)))?;
        record.to_domain()
    }

    async fn delete_story(&self, story_id: i64, user_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM stories WHERE id = $1 AND user_id = $2")
            .bind(story_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Story {} not found", story_id)));
        }
        Ok(())
    }

    async fn try_mark_audio_queued(&self, story_id: i64, user_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query(
            "UPDATE stories SET audio_status = 'queued', updated_at = NOW() \
             WHERE id = $1 AND user_id = $2 AND audio_status NOT IN ('queued', 'in_progress')",
        )
        .bind(story_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_audio_status(&self, story_id: i64, status: AudioStatus) -> PortResult<()> {
        let result = sqlx::query("UPDATE stories SET audio_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(story_id)
            .bind(status.as_ref())
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Story {} not found", story_id)));
        }
        Ok(())
    }

    async fn insert_illustration(&self, illustration: NewIllustration) -> PortResult<Illustration> {
        let record = sqlx::query_as::<_, IllustrationRecord>(
            "INSERT INTO illustrations (story_id, image_url, prompt) VALUES ($1, $2, $3) \
             RETURNING id, story_id, image_url, prompt, created_at",
        )
        .bind(illustration.story_id)
        .bind(&illustration.image_url)
        .bind(&illustration.prompt)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn insert_audio(&self, audio: NewAudio) -> PortResult<Audio> {
        let record = sqlx::query_as::<_, AudioRecord>(
            "INSERT INTO audios (story_id, audio_url, voice) VALUES ($1, $2, $3) \
             RETURNING id, story_id, audio_url, voice, created_at",
        )
        .bind(audio.story_id)
        .bind(&audio.audio_url)
        .bind(&audio.voice)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_owned_audio(&self, audio_id: i64, user_id: Uuid) -> PortResult<Audio> {
        let record = sqlx::query_as::<_, AudioRecord>(
            "SELECT a.id, a.story_id, a.audio_url, a.voice, a.created_at \
             FROM audios a JOIN stories s ON s.id = a.story_id \
             WHERE a.id = $1 AND s.user_id = $2",
        )
        .bind(audio_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(not_found_or_unexpected(format!("Audio {} not found", audio_id)))?;
        Ok(record.to_domain())
    }

    async fn delete_audio(&self, audio_id: i64) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM audios WHERE id = $1")
            .bind(audio_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Audio {} not found", audio_id)));
        }
        Ok(())
    }
}
