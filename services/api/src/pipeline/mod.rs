pub mod cleanup;
pub mod envelope;
pub mod error;
pub mod illustration;
pub mod narration;
pub mod prompts;
pub mod story;
pub mod wav;

pub use cleanup::{delete_audio, delete_story};
pub use error::{PipelineError, PipelineResult};
pub use illustration::create_illustration;
pub use narration::{process_audio_job, request_audio};
pub use story::{create_story, StepOutcome, StoryCreation, StoryRequest};
