//! crates/monogatari_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or HTTP representation; the
//! closed value sets derive `serde`/`strum` so every layer agrees on their
//! string forms.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

//=========================================================================================
// Closed Value Sets
//=========================================================================================

/// The narration lifecycle of a story.
///
/// not_started → queued → in_progress → completed | failed. A new narration
/// request re-enters `queued` from any state that is not already running.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AudioStatus {
    NotStarted,
    Queued,
    InProgress,
    Completed,
    Failed,
}

impl AudioStatus {
    /// True while a narration job is waiting or running.
    pub fn is_active(self) -> bool {
        matches!(self, AudioStatus::Queued | AudioStatus::InProgress)
    }

    /// Whether a new narration request may move the story to `queued`.
    pub fn accepts_new_request(self) -> bool {
        !self.is_active()
    }
}

/// The reader's age bracket, used to pick vocabulary and tone.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
pub enum AgeBracket {
    #[serde(rename = "1-2歳")]
    #[strum(serialize = "1-2歳")]
    OneToTwo,
    #[serde(rename = "3-4歳")]
    #[strum(serialize = "3-4歳")]
    ThreeToFour,
    #[serde(rename = "5-6歳")]
    #[strum(serialize = "5-6歳")]
    FiveToSix,
    #[serde(rename = "7-8歳")]
    #[strum(serialize = "7-8歳")]
    SevenToEight,
    #[serde(rename = "9-10歳")]
    #[strum(serialize = "9-10歳")]
    NineToTen,
    #[serde(rename = "11-12歳")]
    #[strum(serialize = "11-12歳")]
    ElevenToTwelve,
}

/// The requested story length.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoryLength {
    VeryShort,
    Short,
    Medium,
    Long,
    VeryLong,
}

/// Voices offered for narration.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NarrationVoice {
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

//=========================================================================================
// Persisted Entities
//=========================================================================================

/// A generated children's story owned by one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Story {
    pub id: i64,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub audio_status: AudioStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An image generated for a story, stored in object storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Illustration {
    pub id: i64,
    pub story_id: i64,
    pub image_url: String,
    pub prompt: String,
    pub created_at: DateTime<Utc>,
}

/// One narrated rendition of a story.
#[derive(Debug, Clone, PartialEq)]
pub struct Audio {
    pub id: i64,
    pub story_id: i64,
    pub audio_url: String,
    pub voice: String,
    pub created_at: DateTime<Utc>,
}

/// A story together with the assets that hang off it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryDetails {
    pub story: Story,
    pub illustrations: Vec<Illustration>,
    pub audios: Vec<Audio>,
}

#[derive(Debug, Clone)]
pub struct NewIllustration {
    pub story_id: i64,
    pub image_url: String,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct NewAudio {
    pub story_id: i64,
    pub audio_url: String,
    pub voice: String,
}

//=========================================================================================
// Identity
//=========================================================================================

/// The caller identity, as validated by the hosted auth provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: Option<String>,
}

/// A bearer session issued by the auth provider.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: String,
}

/// Result of a signup. Providers that require email confirmation return no session.
#[derive(Debug, Clone)]
pub struct SignUp {
    pub user: AuthUser,
    pub session: Option<AuthSession>,
}

/// Result of a password login.
#[derive(Debug, Clone)]
pub struct SignIn {
    pub user: AuthUser,
    pub session: AuthSession,
}

//=========================================================================================
// Queue
//=========================================================================================

/// The narration job payload. It deliberately carries no user data; the consumer
/// re-reads everything it needs with privileged access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioJob {
    pub story_id: i64,
    pub voice: NarrationVoice,
}

/// A job as handed out by the queue, with its delivery bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedAudioJob {
    pub delivery_id: i64,
    pub attempts: i32,
    pub job: AudioJob,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn age_bracket_uses_japanese_labels() {
        assert_eq!(AgeBracket::ThreeToFour.as_ref(), "3-4歳");
        assert_eq!(AgeBracket::from_str("11-12歳").unwrap(), AgeBracket::ElevenToTwelve);
        assert!(AgeBracket::from_str("13-14歳").is_err());
        assert_eq!(AgeBracket::iter().count(), 6);
    }

    #[test]
    fn serde_and_strum_agree_on_names() {
        for length in StoryLength::iter() {
            let json = serde_json::to_value(length).unwrap();
            assert_eq!(json.as_str().unwrap(), length.as_ref());
        }
        for status in AudioStatus::iter() {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json.as_str().unwrap(), status.to_string());
        }
    }

    #[test]
    fn only_idle_statuses_accept_requests() {
        assert!(AudioStatus::NotStarted.accepts_new_request());
        assert!(AudioStatus::Failed.accepts_new_request());
        assert!(AudioStatus::Completed.accepts_new_request());
        assert!(!AudioStatus::Queued.accepts_new_request());
        assert!(!AudioStatus::InProgress.accepts_new_request());
    }

    #[test]
    fn audio_job_payload_is_minimal() {
        let job = AudioJob { story_id: 7, voice: NarrationVoice::Nova };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json, serde_json::json!({ "story_id": 7, "voice": "nova" }));
    }
}
