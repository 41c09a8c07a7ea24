//! services/api/src/pipeline/story.rs
//!
//! The story orchestrator: prompt → story text → saved story → best-effort
//! illustration.

use crate::pipeline::envelope::{extract_field, split_title};
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::illustration::create_illustration;
use crate::pipeline::prompts::{
    render_illustration_prompt, render_story_prompt, ILLUSTRATION_PROMPT_FIELD, STORY_TEXT_FIELD,
};
use crate::web::state::AppState;
use monogatari_core::domain::{AgeBracket, AuthUser, Illustration, Story, StoryLength};
use tracing::{info, warn};

/// A validated story request.
#[derive(Debug, Clone)]
pub struct StoryRequest {
    pub prompt: String,
    pub age: AgeBracket,
    pub length: StoryLength,
}

/// Outcome of an optional pipeline step.
#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome<T> {
    Completed(T),
    /// The step failed but the overall request still succeeded.
    Degraded { reason: String },
}

impl<T> StepOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            StepOutcome::Completed(value) => Some(value),
            StepOutcome::Degraded { .. } => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, StepOutcome::Degraded { .. })
    }
}

/// Everything produced by one story request.
#[derive(Debug, Clone)]
pub struct StoryCreation {
    pub story: Story,
    pub illustration: StepOutcome<Illustration>,
}

/// Asks the model for the story envelope and returns `(title, body)`.
async fn write_story(app_state: &AppState, request: &StoryRequest) -> PipelineResult<(String, String)> {
    let prompt = render_story_prompt(&request.prompt, request.age, request.length);
    let reply = app_state.text_adapter.generate_text(&prompt).await?;

    let story_text = extract_field(&reply, STORY_TEXT_FIELD)?;
    let parts = split_title(&story_text).ok_or_else(|| {
        PipelineError::GenerationFormat("story_text must contain a title line and a body".to_string())
    })?;
    Ok((parts.title, parts.body))
}

/// Asks the model for an English illustration description, then draws it.
async fn illustrate(app_state: &AppState, story: &Story) -> PipelineResult<Illustration> {
    let prompt = render_illustration_prompt(&story.title, &story.content);
    let reply = app_state.text_adapter.generate_text(&prompt).await?;
    let illustration_prompt = extract_field(&reply, ILLUSTRATION_PROMPT_FIELD)?;
    create_illustration(app_state, story, &illustration_prompt).await
}

/// Generates and saves a story for `user`.
///
/// Fails only if the story itself cannot be produced or saved. Once the story row
/// exists, illustration problems are logged and reported as `Degraded`.
pub async fn create_story(
    app_state: &AppState,
    user: &AuthUser,
    request: &StoryRequest,
) -> PipelineResult<StoryCreation> {
    info!(user_id = %user.id, age = %request.age, length = %request.length, "Generating story");

    let (title, body) = write_story(app_state, request).await?;
    let story = app_state.db.create_story(user.id, &title, &body).await?;
    info!(story_id = story.id, "Story saved");

    let illustration = match illustrate(app_state, &story).await {
        Ok(illustration) => StepOutcome::Completed(illustration),
        Err(e) => {
            warn!(story_id = story.id, "Illustration step failed, continuing without it: {}", e);
            StepOutcome::Degraded { reason: e.to_string() }
        }
    };

    Ok(StoryCreation { story, illustration })
}
