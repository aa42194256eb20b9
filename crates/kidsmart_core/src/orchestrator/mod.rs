//! Generation orchestrator: the story and flashcard workflows that sequence
//! text generation, gated image generation, and incremental persistence.

pub mod flashcards;
pub mod gate;
pub mod story;

use std::time::Duration;

pub use flashcards::{BatchProgress, BatchReport, CardViewer, FlashcardWorkflow};
pub use gate::{Cooldown, GenerationLock, GenerationPermit};
pub use story::{PageOutcome, PageStatus, Rejection, ScriptOutcome, StoryPhase, StoryWorkflow};

/// Cooldown after each successful story-page image.
pub const DEFAULT_PAGE_COOLDOWN: Duration = Duration::from_secs(20);
/// Pause between consecutive flashcard images in a batch.
pub const DEFAULT_CARD_DELAY: Duration = Duration::from_secs(25);

pub const MIN_STORY_PAGES: usize = 3;
pub const MAX_STORY_PAGES: usize = 10;
pub const DEFAULT_STORY_PAGES: usize = 4;
pub const MAX_FLASHCARDS: usize = 20;
pub const DEFAULT_FLASHCARDS: usize = 8;

/// Timing knobs for the workflows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowTiming {
    pub page_cooldown: Duration,
    pub card_delay: Duration,
}

impl Default for WorkflowTiming {
    fn default() -> Self {
        Self {
            page_cooldown: DEFAULT_PAGE_COOLDOWN,
            card_delay: DEFAULT_CARD_DELAY,
        }
    }
}
