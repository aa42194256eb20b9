pub mod domain;
pub mod generation;
pub mod imaging;
pub mod lesson;
pub mod links;
pub mod orchestrator;
pub mod ports;
pub mod prompts;
pub mod seeds;
pub mod speech;
pub mod store;
pub mod view;

pub use domain::{ExternalLink, Flashcard, FlashcardSet, ImageRef, LessonPlan, LinkKind, Story, StoryPage};
pub use generation::ContentGenerator;
pub use imaging::ImageChain;
pub use lesson::LessonPlanner;
pub use links::LinkLibrary;
pub use orchestrator::{
    BatchProgress, BatchReport, CardViewer, FlashcardWorkflow, GenerationLock, PageOutcome, PageStatus,
    Rejection, ScriptOutcome, StoryPhase, StoryWorkflow, WorkflowTiming,
};
pub use ports::{
    FeedSource, ImageBackend, KeyValueStore, Notification, NotificationKind, Notifier, PortError, PortResult,
    SpeechSynthesizer, TextGenerationService,
};
pub use speech::SpeechPlayback;
pub use store::{ContentStore, MemoryStore};
pub use view::{AppView, BackEffect, KidActivity, Navigator, TeacherTool};
