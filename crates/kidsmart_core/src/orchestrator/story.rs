//! The story workflow: script first, then one page image at a time, each page
//! unlocked by its predecessor and spaced out by a cooldown.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{error, info, warn};

use crate::domain::{ImageRef, Story};
use crate::generation::ContentGenerator;
use crate::imaging::ImageChain;
use crate::ports::{Notification, Notifier, PortError, PortResult};
use crate::prompts;
use crate::seeds;
use crate::speech::SpeechPlayback;
use crate::store::ContentStore;

use super::gate::{Cooldown, GenerationLock};
use super::{MAX_STORY_PAGES, MIN_STORY_PAGES};

/// Coarse position of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryPhase {
    Idle,
    ScriptRequested,
    ScriptReady,
    Generating { page: usize },
    AllPagesComplete,
}

/// What a single page currently allows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    /// The previous page has no image yet.
    Locked,
    /// Waiting for the cooldown to run out.
    CoolingDown { remaining_secs: u64 },
    /// Some image generation is in flight.
    Busy,
    /// This page's image is being generated.
    Generating,
    /// May be generated now.
    Ready,
    /// Has an image; may be regenerated when nothing blocks it.
    Complete,
}

/// Why a generation request was refused. Refusals are no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    NoActiveStory,
    PageOutOfRange,
    PreviousPageIncomplete,
    CoolingDown { remaining_secs: u64 },
    Busy,
    NothingToRegenerate,
}

/// Result of asking for a page image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    Attached(ImageRef),
    /// Every backend was exhausted; the page stays re-attemptable.
    Unavailable,
    Rejected(Rejection),
    /// The workflow was reset or switched stories while the request was in flight.
    Discarded,
}

/// Result of asking for a story script.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptOutcome {
    Ready(Story),
    /// The topic was blank; nothing was sent.
    EmptyTopic,
    /// The workflow was reset while the script was being written.
    Discarded,
}

impl ScriptOutcome {
    pub fn into_story(self) -> Option<Story> {
        match self {
            ScriptOutcome::Ready(story) => Some(story),
            ScriptOutcome::EmptyTopic | ScriptOutcome::Discarded => None,
        }
    }
}

#[derive(Debug, Default)]
struct StoryState {
    story: Option<Story>,
    requesting: bool,
    generating: Option<usize>,
    /// Bumped on every reset or story switch; late results from an older
    /// epoch are dropped.
    epoch: u64,
}

pub struct StoryWorkflow {
    generator: ContentGenerator,
    images: ImageChain,
    library: ContentStore<Story>,
    lock: GenerationLock,
    cooldown: Cooldown,
    speech: SpeechPlayback,
    notifier: Arc<dyn Notifier>,
    state: Mutex<StoryState>,
}

impl StoryWorkflow {
    pub fn new(
        generator: ContentGenerator,
        images: ImageChain,
        library: ContentStore<Story>,
        lock: GenerationLock,
        speech: SpeechPlayback,
        notifier: Arc<dyn Notifier>,
        page_cooldown: Duration,
    ) -> Self {
        Self {
            generator,
            images,
            library,
            lock,
            cooldown: Cooldown::new(page_cooldown),
            speech,
            notifier,
            state: Mutex::new(StoryState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, StoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    //-------------------------------------------------------------------------------------
    // Queries
    //-------------------------------------------------------------------------------------

    pub fn phase(&self) -> StoryPhase {
        let state = self.state();
        if state.requesting {
            return StoryPhase::ScriptRequested;
        }
        if let Some(page) = state.generating {
            return StoryPhase::Generating { page };
        }
        match &state.story {
            None => StoryPhase::Idle,
            Some(story) if !story.pages.is_empty() && story.is_complete() => {
                StoryPhase::AllPagesComplete
            }
            Some(_) => StoryPhase::ScriptReady,
        }
    }

    /// Deep copy of the active story.
    pub fn story(&self) -> Option<Story> {
        self.state().story.clone()
    }

    pub fn cooldown_remaining_secs(&self) -> u64 {
        self.cooldown.remaining_secs()
    }

    pub fn page_status(&self, index: usize) -> Option<PageStatus> {
        let state = self.state();
        let story = state.story.as_ref()?;
        let page = story.pages.get(index)?;

        if state.generating == Some(index) {
            return Some(PageStatus::Generating);
        }
        if page.has_image() {
            return Some(PageStatus::Complete);
        }
        if index > 0 && !story.pages[index - 1].has_image() {
            return Some(PageStatus::Locked);
        }
        if self.lock.is_busy() {
            return Some(PageStatus::Busy);
        }
        let remaining_secs = self.cooldown.remaining_secs();
        if remaining_secs > 0 {
            return Some(PageStatus::CoolingDown { remaining_secs });
        }
        Some(PageStatus::Ready)
    }

    //-------------------------------------------------------------------------------------
    // Script
    //-------------------------------------------------------------------------------------

    /// Writes a new story script. An empty topic is a no-op.
    /// Backend failures roll back to idle and are returned.
    pub async fn request_script(&self, topic: &str, page_count: usize) -> PortResult<ScriptOutcome> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Ok(ScriptOutcome::EmptyTopic);
        }
        let page_count = page_count.clamp(MIN_STORY_PAGES, MAX_STORY_PAGES);

        let epoch = {
            let mut state = self.state();
            state.epoch += 1;
            state.story = None;
            state.generating = None;
            state.requesting = true;
            state.epoch
        };
        self.cooldown.clear();
        self.speech.stop();
        info!(topic, page_count, "requesting story script");

        let result = self.generator.generate_story_script(topic, page_count).await;

        let mut state = self.state();
        if state.epoch != epoch {
            info!(topic, "story script arrived after reset, discarding");
            return Ok(ScriptOutcome::Discarded);
        }
        state.requesting = false;
        match result {
            Ok(story) => {
                state.story = Some(story.clone());
                drop(state);
                info!(story_id = %story.id, pages = story.pages.len(), "story script ready");
                self.notifier.notify(Notification::success(
                    "Đã xong kịch bản! Hãy bấm nút để vẽ từng trang nhé.",
                ));
                Ok(ScriptOutcome::Ready(story))
            }
            Err(e) => {
                drop(state);
                error!(topic, error = %e, "story script generation failed");
                self.notifier.notify(Notification::error("Có lỗi khi tạo truyện"));
                Err(e)
            }
        }
    }

    //-------------------------------------------------------------------------------------
    // Page images
    //-------------------------------------------------------------------------------------

    /// Generates (or regenerates) the image of page `index`.
    ///
    /// Refused unless the global lock is free, the cooldown has elapsed and the
    /// previous page already has an image. Only a storage failure while
    /// checkpointing returns `Err`; the image stays attached in memory.
    pub async fn generate_page_image(&self, index: usize) -> PortResult<PageOutcome> {
        let (epoch, story_id, seed, permit) = {
            let mut state = self.state();
            let epoch = state.epoch;
            let Some(story) = state.story.as_ref() else {
                return Ok(PageOutcome::Rejected(Rejection::NoActiveStory));
            };
            let Some(page) = story.pages.get(index) else {
                return Ok(PageOutcome::Rejected(Rejection::PageOutOfRange));
            };
            if index > 0 && !story.pages[index - 1].has_image() {
                return Ok(PageOutcome::Rejected(Rejection::PreviousPageIncomplete));
            }
            let remaining_secs = self.cooldown.remaining_secs();
            if remaining_secs > 0 {
                return Ok(PageOutcome::Rejected(Rejection::CoolingDown { remaining_secs }));
            }
            let Some(permit) = self.lock.try_acquire() else {
                return Ok(PageOutcome::Rejected(Rejection::Busy));
            };
            let story_id = story.id.clone();
            let seed = page.image_prompt_seed.clone();
            state.generating = Some(index);
            (epoch, story_id, seed, permit)
        };

        info!(story_id = %story_id, page = index, "generating page image");
        let prompt = prompts::story_page_image_prompt(&seed);
        let image = self.images.generate_image(&prompt).await;

        let mut state = self.state();
        let same_story = state.story.as_ref().is_some_and(|s| s.id == story_id);
        if state.epoch != epoch || !same_story {
            drop(permit);
            info!(story_id = %story_id, page = index, "page image arrived after reset, discarding");
            return Ok(PageOutcome::Discarded);
        }
        state.generating = None;

        let Some(image) = image else {
            drop(state);
            drop(permit);
            warn!(story_id = %story_id, page = index, "no image backend produced a page image");
            self.notifier
                .notify(Notification::error("Không tạo được ảnh, hãy thử lại!"));
            return Ok(PageOutcome::Unavailable);
        };

        let snapshot = match state.story.as_mut() {
            Some(story) => {
                story.pages[index].image_ref = Some(image.clone());
                story.clone()
            }
            None => return Ok(PageOutcome::Discarded),
        };
        drop(state);
        self.cooldown.start();
        drop(permit);

        if let Err(e) = self.library.checkpoint(&snapshot) {
            error!(story_id = %story_id, error = %e, "failed to checkpoint story");
            self.notifier.notify(Notification::error("Không lưu được tiến độ truyện"));
            return Err(e);
        }
        Ok(PageOutcome::Attached(image))
    }

    /// Like `generate_page_image`, but only for pages that already have an image.
    pub async fn regenerate_page_image(&self, index: usize) -> PortResult<PageOutcome> {
        let has_image = {
            let state = self.state();
            match state.story.as_ref() {
                None => return Ok(PageOutcome::Rejected(Rejection::NoActiveStory)),
                Some(story) => match story.pages.get(index) {
                    None => return Ok(PageOutcome::Rejected(Rejection::PageOutOfRange)),
                    Some(page) => page.has_image(),
                },
            }
        };
        if !has_image {
            return Ok(PageOutcome::Rejected(Rejection::NothingToRegenerate));
        }
        self.generate_page_image(index).await
    }

    //-------------------------------------------------------------------------------------
    // Library
    //-------------------------------------------------------------------------------------

    /// Saved stories, with the built-in templates merged in on first use.
    pub fn load_library(&self) -> PortResult<Vec<Story>> {
        self.library.merge_seed_defaults(&seeds::default_teacher_stories())
    }

    pub fn library(&self) -> PortResult<Vec<Story>> {
        self.library.list_all()
    }

    pub fn is_saved(&self) -> PortResult<bool> {
        let Some(id) = self.state().story.as_ref().map(|s| s.id.clone()) else {
            return Ok(false);
        };
        self.library.contains(&id)
    }

    /// Saves a snapshot of the active story. Returns `false` when there is no
    /// active story or it is already in the library.
    pub fn save_story(&self) -> PortResult<bool> {
        let Some(snapshot) = self.story() else {
            return Ok(false);
        };
        match self.library.save(snapshot) {
            Ok(_) => {
                self.notifier
                    .notify(Notification::success("Đã lưu truyện vào thư viện! 📘"));
                Ok(true)
            }
            Err(PortError::AlreadyExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Makes an independent copy of a stored story the active one.
    pub fn open_story(&self, story: &Story) {
        let mut state = self.state();
        state.epoch += 1;
        state.requesting = false;
        state.generating = None;
        state.story = Some(story.clone());
    }

    pub fn delete_story(&self, id: &str) -> PortResult<()> {
        self.library.delete(id)?;
        {
            let mut state = self.state();
            if state.story.as_ref().is_some_and(|s| s.id == id) {
                state.epoch += 1;
                state.generating = None;
                state.story = None;
            }
        }
        self.notifier.notify(Notification::success("Đã xóa truyện!"));
        Ok(())
    }

    //-------------------------------------------------------------------------------------
    // Speech and reset
    //-------------------------------------------------------------------------------------

    /// Toggles reading page `index` aloud. Returns whether it is now speaking.
    pub fn toggle_page_speech(&self, index: usize) -> PortResult<bool> {
        let (text, id) = {
            let state = self.state();
            let story = state
                .story
                .as_ref()
                .ok_or_else(|| PortError::NotFound("active story".to_string()))?;
            let page = story
                .pages
                .get(index)
                .ok_or_else(|| PortError::NotFound(format!("page {}", index)))?;
            (page.narrative_text.clone(), format!("{}-{}", story.id, index))
        };
        self.speech.toggle(&text, &id)
    }

    pub fn is_page_speaking(&self, index: usize) -> bool {
        let Some(id) = self.state().story.as_ref().map(|s| format!("{}-{}", s.id, index)) else {
            return false;
        };
        self.speech.is_speaking(&id)
    }

    /// Back to idle: drops unsaved state, stops speech, zeroes the cooldown.
    /// In-flight requests are not cancelled; their results are discarded.
    pub fn reset(&self) {
        {
            let mut state = self.state();
            state.epoch += 1;
            state.story = None;
            state.requesting = false;
            state.generating = None;
        }
        self.cooldown.clear();
        self.speech.stop();
    }
}
