pub mod auth;
pub mod db;
pub mod image;
pub mod queue;
pub mod storage;
pub mod story_llm;
pub mod tts;

pub use auth::SupabaseAuthAdapter;
pub use db::DbAdapter;
pub use image::OpenAiImageAdapter;
pub use queue::PgAudioQueue;
pub use storage::SupabaseStorageAdapter;
pub use story_llm::OpenAiStoryAdapter;
pub use tts::OpenAiTtsAdapter;
