//! In-memory fakes of every port plus a helper that wires them into an
//! `AppState` and the real router.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
    Router,
};
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use monogatari_api::config::Config;
use monogatari_api::web::{build_router, AppState};
use monogatari_core::domain::{
    Audio, AudioJob, AudioStatus, AuthSession, AuthUser, Illustration, NarrationVoice, NewAudio,
    NewIllustration, QueuedAudioJob, SignIn, SignUp, Story, StoryDetails,
};
use monogatari_core::ports::{
    AspectRatio, AudioJobQueue, AuthService, DatabaseService, ImageGenerationService,
    ObjectStorageService, PortError, PortResult, RetryDisposition, SpeechGenerationService,
    TextGenerationService,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

pub const ALICE_TOKEN: &str = "token-alice";
pub const BOB_TOKEN: &str = "token-bob";
pub const STORAGE_BASE: &str = "https://storage.test/object/public";

/// A base64 PNG signature, enough for the pipeline to decode and upload.
pub const FAKE_IMAGE_B64: &str = "iVBORw0KGgo=";

pub fn story_reply(title: &str, body: &str) -> String {
    serde_json::json!({ "story_text": format!("{}\n{}", title, body) }).to_string()
}

pub fn illustration_reply(prompt: &str) -> String {
    format!("```json\n{}\n```", serde_json::json!({ "illustration_prompt": prompt }))
}

//=========================================================================================
// Database
//=========================================================================================

#[derive(Default)]
struct DbState {
    next_id: i64,
    stories: Vec<Story>,
    illustrations: Vec<Illustration>,
    audios: Vec<Audio>,
    status_history: Vec<(i64, AudioStatus)>,
}

impl DbState {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn details(&self, story: &Story) -> StoryDetails {
        StoryDetails {
            story: story.clone(),
            illustrations: self
                .illustrations
                .iter()
                .filter(|i| i.story_id == story.id)
                .cloned()
                .collect(),
            audios: self.audios.iter().filter(|a| a.story_id == story.id).cloned().collect(),
        }
    }

    fn owned_mut(&mut self, story_id: i64, user_id: Uuid) -> PortResult<&mut Story> {
        self.stories
            .iter_mut()
            .find(|s| s.id == story_id && s.user_id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("Story {} not found", story_id)))
    }
}

/// Mirrors the ownership, visibility and compare-and-set rules of the Postgres adapter.
#[derive(Default)]
pub struct FakeDb {
    state: Mutex<DbState>,
    pub fail_create: AtomicBool,
    /// Lets a concurrent request queue the story between the read and the compare-and-set.
    pub concurrent_queue: AtomicBool,
}

impl FakeDb {
    pub fn seed_story(&self, user_id: Uuid, title: &str, is_public: bool, audio_status: AudioStatus) -> Story {
        let mut state = self.state.lock().unwrap();
        let id = state.next_id();
        // Seeded stories are spaced one minute apart so ordering is deterministic.
        let created_at = Utc::now() - ChronoDuration::hours(1) + ChronoDuration::minutes(id);
        let story = Story {
            id,
            user_id,
            title: title.to_string(),
            content: format!("{} body", title),
            is_public,
            published_at: is_public.then_some(created_at),
            audio_status,
            created_at,
            updated_at: created_at,
        };
        state.stories.push(story.clone());
        story
    }

    pub fn seed_illustration(&self, story_id: i64, image_url: &str) -> Illustration {
        let mut state = self.state.lock().unwrap();
        let illustration = Illustration {
            id: state.next_id(),
            story_id,
            image_url: image_url.to_string(),
            prompt: "seeded".to_string(),
            created_at: Utc::now(),
        };
        state.illustrations.push(illustration.clone());
        illustration
    }

    pub fn seed_audio(&self, story_id: i64, audio_url: &str) -> Audio {
        let mut state = self.state.lock().unwrap();
        let audio = Audio {
            id: state.next_id(),
            story_id,
            audio_url: audio_url.to_string(),
            voice: "nova".to_string(),
            created_at: Utc::now(),
        };
        state.audios.push(audio.clone());
        audio
    }

    pub fn story(&self, story_id: i64) -> Option<Story> {
        self.state
            .lock()
            .unwrap()
            .stories
            .iter()
            .find(|s| s.id == story_id)
            .cloned()
    }

    pub fn story_count(&self) -> usize {
        self.state.lock().unwrap().stories.len()
    }

    pub fn illustrations(&self) -> Vec<Illustration> {
        self.state.lock().unwrap().illustrations.clone()
    }

    pub fn audios(&self) -> Vec<Audio> {
        self.state.lock().unwrap().audios.clone()
    }

    /// Every status written through `set_audio_status`, in order.
    pub fn status_history(&self, story_id: i64) -> Vec<AudioStatus> {
        self.state
            .lock()
            .unwrap()
            .status_history
            .iter()
            .filter(|(id, _)| *id == story_id)
            .map(|(_, status)| *status)
            .collect()
    }
}

#[async_trait]
impl DatabaseService for FakeDb {
    async fn create_story(&self, user_id: Uuid, title: &str, content: &str) -> PortResult<Story> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("insert failed".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let now = Utc::now();
        let story = Story {
            id: state.next_id(),
            user_id,
            title: title.to_string(),
            content: content.to_string(),
            is_public: false,
            published_at: None,
            audio_status: AudioStatus::NotStarted,
            created_at: now,
            updated_at: now,
        };
        state.stories.push(story.clone());
        Ok(story)
    }

    async fn list_stories(&self, user_id: Uuid, limit: Option<i64>) -> PortResult<Vec<StoryDetails>> {
        let state = self.state.lock().unwrap();
        let mut owned: Vec<&Story> = state.stories.iter().filter(|s| s.user_id == user_id).collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        let limit = limit.map(|l| l as usize).unwrap_or(usize::MAX);
        Ok(owned
            .into_iter()
            .take(limit)
            .map(|s| StoryDetails {
                audios: Vec::new(),
                ..state.details(s)
            })
            .collect())
    }

    async fn get_visible_story(&self, story_id: i64, viewer: Option<Uuid>) -> PortResult<StoryDetails> {
        let state = self.state.lock().unwrap();
        state
            .stories
            .iter()
            .find(|s| s.id == story_id && (s.is_public || Some(s.user_id) == viewer))
            .map(|s| state.details(s))
            .ok_or_else(|| PortError::NotFound(format!("Story {} not found", story_id)))
    }

    async fn get_owned_story(&self, story_id: i64, user_id: Uuid) -> PortResult<StoryDetails> {
        let state = self.state.lock().unwrap();
        state
            .stories
            .iter()
            .find(|s| s.id == story_id && s.user_id == user_id)
            .map(|s| state.details(s))
            .ok_or_else(|| PortError::NotFound(format!("Story {} not found", story_id)))
    }

    async fn get_story(&self, story_id: i64) -> PortResult<Story> {
        self.story(story_id)
            .ok_or_else(|| PortError::NotFound(format!("Story {} not found", story_id)))
    }

    async fn update_story_content(
        &self,
        story_id: i64,
        user_id: Uuid,
        title: &str,
        content: &str,
    ) -> PortResult<Story> {
        let mut state = self.state.lock().unwrap();
        let story = state.owned_mut(story_id, user_id)?;
        story.title = title.to_string();
        story.content = content.to_string();
        story.updated_at = Utc::now();
        Ok(story.clone())
    }

    async fn set_story_visibility(&self, story_id: i64, user_id: Uuid, is_public: bool) -> PortResult<Story> {
        let mut state = self.state.lock().unwrap();
        let story = state.owned_mut(story_id, user_id)?;
        story.is_public = is_public;
        story.published_at = is_public.then(Utc::now);
        story.updated_at = Utc::now();
        Ok(story.clone())
    }

    async fn delete_story(&self, story_id: i64, user_id: Uuid) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        state.owned_mut(story_id, user_id)?;
        state.stories.retain(|s| s.id != story_id);
        state.illustrations.retain(|i| i.story_id != story_id);
        state.audios.retain(|a| a.story_id != story_id);
        Ok(())
    }

    async fn try_mark_audio_queued(&self, story_id: i64, user_id: Uuid) -> PortResult<bool> {
        let mut state = self.state.lock().unwrap();
        if self.concurrent_queue.load(Ordering::SeqCst) {
            if let Ok(story) = state.owned_mut(story_id, user_id) {
                story.audio_status = AudioStatus::Queued;
            }
        }
        match state.owned_mut(story_id, user_id) {
            Ok(story) if story.audio_status.accepts_new_request() => {
                story.audio_status = AudioStatus::Queued;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn set_audio_status(&self, story_id: i64, status: AudioStatus) -> PortResult<()> {
        let mut state = self.state.lock().unwrap();
        let story = state
            .stories
            .iter_mut()
            .find(|s| s.id == story_id)
            .ok_or_else(|| PortError::NotFound(format!("Story {} not found", story_id)))?;
        story.audio_status = status;
        state.status_history.push((story_id, status));
        Ok(())
    }

    async fn insert_illustration(&self, illustration: NewIllustration) -> PortResult<Illustration> {
        let mut state = self.state.lock().unwrap();
        let row = Illustration {
            id: state.next_id(),
            story_id: illustration.story_id,
            image_url: illustration.image_url,
            prompt: illustration.prompt,
            created_at: Utc::now(),
        };
        state.illustrations.push(row.clone());
        Ok(row)
    }

    async fn insert_audio(&self, audio: NewAudio) -> PortResult<Audio> {
        let mut state = self.state.lock().unwrap();
        let row = Audio {
            id: state.next_id(),
            story_id: audio.story_id,
            audio_url: audio.audio_url,
            voice: audio.voice,
            created_at: Utc::now(),
        };
        state.audios.push(row.clone());
        Ok(row)
    }

    async fn get_owned_audio(&self, audio_id: i64, user_id: Uuid) -> PortResult<Audio> {
        let state = self.state.lock().unwrap();
        state
            .audios
            .iter()
            .find(|a| {
                a.id == audio_id
                    && state
                        .stories
                        .iter()
                        .any(|s| s.id == a.story_id && s.user_id == user_id)
            })
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Audio {} not found", audio_id)))
    }

    async fn delete_audio(&self, audio_id: i64) -> PortResult<()> {
        self.state.lock().unwrap().audios.retain(|a| a.id != audio_id);
        Ok(())
    }
}

//=========================================================================================
// Auth
//=========================================================================================

pub struct FakeAuth {
    tokens: Mutex<HashMap<String, AuthUser>>,
    accounts: Mutex<HashMap<String, (String, AuthUser)>>,
    /// Makes token validation fail as if the provider were unreachable.
    pub unreachable: AtomicBool,
}

impl FakeAuth {
    fn new(alice: &AuthUser, bob: &AuthUser) -> Self {
        let tokens = HashMap::from([
            (ALICE_TOKEN.to_string(), alice.clone()),
            (BOB_TOKEN.to_string(), bob.clone()),
        ]);
        Self {
            tokens: Mutex::new(tokens),
            accounts: Mutex::new(HashMap::new()),
            unreachable: AtomicBool::new(false),
        }
    }

    fn issue(&self, user: &AuthUser) -> AuthSession {
        let token = format!("token-{}", user.id);
        self.tokens.lock().unwrap().insert(token.clone(), user.clone());
        AuthSession {
            access_token: token,
            refresh_token: Some("refresh".to_string()),
            expires_in: Some(3600),
            token_type: "bearer".to_string(),
        }
    }
}

#[async_trait]
impl AuthService for FakeAuth {
    async fn sign_up(&self, email: &str, password: &str) -> PortResult<SignUp> {
        let user = {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(PortError::Conflict("User already registered".to_string()));
            }
            let user = AuthUser {
                id: Uuid::new_v4(),
                email: Some(email.to_string()),
            };
            accounts.insert(email.to_string(), (password.to_string(), user.clone()));
            user
        };
        let session = self.issue(&user);
        Ok(SignUp {
            user,
            session: Some(session),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> PortResult<SignIn> {
        let user = match self.accounts.lock().unwrap().get(email) {
            Some((stored, user)) if stored == password => user.clone(),
            _ => return Err(PortError::Unauthorized),
        };
        let session = self.issue(&user);
        Ok(SignIn { user, session })
    }

    async fn get_user(&self, access_token: &str) -> PortResult<AuthUser> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("auth provider unreachable".to_string()));
        }
        self.tokens
            .lock()
            .unwrap()
            .get(access_token)
            .cloned()
            .ok_or(PortError::Unauthorized)
    }
}

//=========================================================================================
// Storage
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub bucket: String,
    pub path: String,
    pub len: usize,
    pub content_type: String,
}

#[derive(Default)]
pub struct FakeStorage {
    pub uploads: Mutex<Vec<Upload>>,
    /// Every removal attempt, including failed ones.
    pub removals: Mutex<Vec<(String, Vec<String>)>>,
    pub fail_uploads: AtomicBool,
    pub fail_removals: AtomicBool,
}

impl FakeStorage {
    pub fn uploads(&self) -> Vec<Upload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn removals(&self) -> Vec<(String, Vec<String>)> {
        self.removals.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStorageService for FakeStorage {
    async fn upload(&self, bucket: &str, path: &str, body: Bytes, content_type: &str) -> PortResult<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("storage unavailable".to_string()));
        }
        self.uploads.lock().unwrap().push(Upload {
            bucket: bucket.to_string(),
            path: path.to_string(),
            len: body.len(),
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    async fn remove(&self, bucket: &str, paths: &[String]) -> PortResult<()> {
        self.removals
            .lock()
            .unwrap()
            .push((bucket.to_string(), paths.to_vec()));
        if self.fail_removals.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("storage unavailable".to_string()));
        }
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/{}/{}", STORAGE_BASE, bucket, path)
    }

    fn object_path(&self, bucket: &str, public_url: &str) -> Option<String> {
        public_url
            .strip_prefix(&format!("{}/{}/", STORAGE_BASE, bucket))
            .map(str::to_string)
    }
}

//=========================================================================================
// AI
//=========================================================================================

/// Answers story prompts and illustration prompts with separately configured replies.
/// A `None` reply makes the call fail.
pub struct FakeText {
    pub story_reply: Mutex<Option<String>>,
    pub illustration_reply: Mutex<Option<String>>,
    pub calls: AtomicUsize,
}

impl Default for FakeText {
    fn default() -> Self {
        Self {
            story_reply: Mutex::new(Some(story_reply("こうえんの くまくん", "くまくんは こうえんで ないちゃった。"))),
            illustration_reply: Mutex::new(Some(illustration_reply("A small bear crying in a sunny park"))),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl TextGenerationService for FakeText {
    async fn generate_text(&self, prompt: &str) -> PortResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = if prompt.contains("\"illustration_prompt\"") {
            self.illustration_reply.lock().unwrap().clone()
        } else {
            self.story_reply.lock().unwrap().clone()
        };
        reply.ok_or_else(|| PortError::Unexpected("model unavailable".to_string()))
    }
}

pub struct FakeImage {
    pub reply: Mutex<Option<String>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub last_aspect: Mutex<Option<AspectRatio>>,
}

impl Default for FakeImage {
    fn default() -> Self {
        Self {
            reply: Mutex::new(Some(FAKE_IMAGE_B64.to_string())),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last_aspect: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ImageGenerationService for FakeImage {
    async fn generate_image(&self, _prompt: &str, aspect_ratio: AspectRatio) -> PortResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_aspect.lock().unwrap() = Some(aspect_ratio);
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("image model unavailable".to_string()));
        }
        Ok(self.reply.lock().unwrap().clone())
    }
}

pub struct FakeSpeech {
    pub pcm: Mutex<Option<Vec<u8>>>,
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
    pub last_text: Mutex<Option<String>>,
}

impl Default for FakeSpeech {
    fn default() -> Self {
        Self {
            pcm: Mutex::new(Some(vec![0u8; 480])),
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            last_text: Mutex::new(None),
        }
    }
}

#[async_trait]
impl SpeechGenerationService for FakeSpeech {
    async fn generate_speech(
        &self,
        text: &str,
        _voice: NarrationVoice,
        _instructions: &str,
    ) -> PortResult<Option<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_text.lock().unwrap() = Some(text.to_string());
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("speech model unavailable".to_string()));
        }
        Ok(self.pcm.lock().unwrap().clone())
    }
}

//=========================================================================================
// Queue
//=========================================================================================

pub struct FakeQueue {
    next_id: Mutex<i64>,
    pub sent: Mutex<Vec<AudioJob>>,
    pending: Mutex<VecDeque<QueuedAudioJob>>,
    pub acked: Mutex<Vec<i64>>,
    pub retried: Mutex<Vec<(i64, RetryDisposition)>>,
    pub fail_send: AtomicBool,
    pub max_attempts: i32,
}

impl Default for FakeQueue {
    fn default() -> Self {
        Self {
            next_id: Mutex::new(0),
            sent: Mutex::new(Vec::new()),
            pending: Mutex::new(VecDeque::new()),
            acked: Mutex::new(Vec::new()),
            retried: Mutex::new(Vec::new()),
            fail_send: AtomicBool::new(false),
            max_attempts: 2,
        }
    }
}

impl FakeQueue {
    pub fn sent(&self) -> Vec<AudioJob> {
        self.sent.lock().unwrap().clone()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[async_trait]
impl AudioJobQueue for FakeQueue {
    async fn send(&self, job: &AudioJob) -> PortResult<()> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("queue unavailable".to_string()));
        }
        let delivery_id = {
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            *next
        };
        self.sent.lock().unwrap().push(job.clone());
        self.pending.lock().unwrap().push_back(QueuedAudioJob {
            delivery_id,
            attempts: 0,
            job: job.clone(),
        });
        Ok(())
    }

    async fn receive(&self, max: i64, _visibility_timeout: Duration) -> PortResult<Vec<QueuedAudioJob>> {
        let mut pending = self.pending.lock().unwrap();
        let take = (max.max(0) as usize).min(pending.len());
        Ok(pending
            .drain(..take)
            .map(|mut delivery| {
                delivery.attempts += 1;
                delivery
            })
            .collect())
    }

    async fn ack(&self, delivery_id: i64) -> PortResult<()> {
        self.acked.lock().unwrap().push(delivery_id);
        Ok(())
    }

    async fn retry(&self, delivery: &QueuedAudioJob, _error: &str) -> PortResult<RetryDisposition> {
        let disposition = if delivery.attempts >= self.max_attempts {
            RetryDisposition::DeadLettered
        } else {
            self.pending.lock().unwrap().push_back(delivery.clone());
            RetryDisposition::Requeued
        };
        self.retried
            .lock()
            .unwrap()
            .push((delivery.delivery_id, disposition));
        Ok(disposition)
    }
}

//=========================================================================================
// Wiring
//=========================================================================================

pub fn test_config() -> Config {
    let vars = HashMap::from([
        ("DATABASE_URL", "postgres://localhost/monogatari_test"),
        ("SUPABASE_URL", "https://project.supabase.test"),
        ("SUPABASE_ANON_KEY", "anon"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service"),
        ("AUDIO_WORKER_ENABLED", "false"),
        ("AUDIO_BATCH_SIZE", "5"),
    ]);
    Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).expect("test config should load")
}

/// Every fake, shared with the `AppState` handed to the code under test.
pub struct TestApp {
    pub alice: AuthUser,
    pub bob: AuthUser,
    pub db: Arc<FakeDb>,
    pub auth: Arc<FakeAuth>,
    pub storage: Arc<FakeStorage>,
    pub text: Arc<FakeText>,
    pub image: Arc<FakeImage>,
    pub speech: Arc<FakeSpeech>,
    pub queue: Arc<FakeQueue>,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        let alice = AuthUser {
            id: Uuid::new_v4(),
            email: Some("alice@example.com".to_string()),
        };
        let bob = AuthUser {
            id: Uuid::new_v4(),
            email: Some("bob@example.com".to_string()),
        };
        let db = Arc::new(FakeDb::default());
        let auth = Arc::new(FakeAuth::new(&alice, &bob));
        let storage = Arc::new(FakeStorage::default());
        let text = Arc::new(FakeText::default());
        let image = Arc::new(FakeImage::default());
        let speech = Arc::new(FakeSpeech::default());
        let queue = Arc::new(FakeQueue::default());

        let state = Arc::new(AppState {
            db: db.clone(),
            config: Arc::new(test_config()),
            auth: auth.clone(),
            storage: storage.clone(),
            text_adapter: text.clone(),
            image_adapter: image.clone(),
            speech_adapter: speech.clone(),
            audio_queue: queue.clone(),
        });

        Self {
            alice,
            bob,
            db,
            auth,
            storage,
            text,
            image,
            speech,
            queue,
            state,
        }
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Number of calls made to any AI model.
    pub fn ai_calls(&self) -> usize {
        self.text.calls.load(Ordering::SeqCst)
            + self.image.calls.load(Ordering::SeqCst)
            + self.speech.calls.load(Ordering::SeqCst)
    }
}

//=========================================================================================
// HTTP Helpers
//=========================================================================================

pub fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}
