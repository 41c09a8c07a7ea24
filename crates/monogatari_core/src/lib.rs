pub mod domain;
pub mod ports;

pub use domain::{
    AgeBracket, Audio, AudioJob, AudioStatus, AuthSession, AuthUser, Illustration,
    NarrationVoice, NewAudio, NewIllustration, QueuedAudioJob, SignIn, SignUp, Story,
    StoryDetails, StoryLength,
};
pub use ports::{
    AspectRatio, AudioJobQueue, AuthService, DatabaseService, ImageGenerationService,
    ObjectStorageService, PortError, PortResult, RetryDisposition, SpeechGenerationService,
    TextGenerationService,
};
