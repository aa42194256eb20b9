//! services/studio/src/state.rs
//!
//! Defines the application state: every adapter and workflow, wired once at
//! startup from the `Config`.

use std::sync::{Arc, Mutex};

use async_openai::{config::OpenAIConfig, Client};
use kidsmart_core::ports::{
    FeedSource, ImageBackend, KeyValueStore, Notifier, SpeechSynthesizer, TextGenerationService,
};
use kidsmart_core::store::{SAVED_FLASHCARDS_KEY, SAVED_STORIES_KEY};
use kidsmart_core::{
    AppView, BackEffect, ContentGenerator, ContentStore, FlashcardWorkflow, GenerationLock,
    ImageChain, KidActivity, LessonPlanner, LinkKind, LinkLibrary, Navigator, SpeechPlayback,
    StoryWorkflow, TeacherTool,
};
use tracing::info;

use crate::adapters::{
    FileStore, GeminiImageAdapter, LogNotifier, OpenAiImageAdapter, OpenAiSpeechAdapter,
    OpenAiTextAdapter, RenderUrlAdapter, SheetFeedAdapter, TranscriptSpeech,
};
use crate::config::Config;
use crate::error::StudioError;

//=========================================================================================
// AppState
//=========================================================================================

/// The shared application state, created once at startup.
pub struct AppState {
    pub config: Arc<Config>,
    pub stories: StoryWorkflow,
    pub flashcards: FlashcardWorkflow,
    pub lessons: LessonPlanner,
    pub story_links: LinkLibrary,
    pub game_links: LinkLibrary,
    navigator: Mutex<Navigator>,
}

impl AppState {
    /// Builds every adapter the configuration allows and wires the workflows.
    pub fn build(config: Arc<Config>) -> Result<Self, StudioError> {
        let (text_key, text_base) = config.text_endpoint().ok_or_else(|| {
            StudioError::Internal("an OpenAI or Gemini API key is required".to_string())
        })?;
        let text_client = openai_client(&text_key, text_base.as_deref());
        let text: Arc<dyn TextGenerationService> = Arc::new(OpenAiTextAdapter::new(
            text_client,
            config.text_model.clone(),
        ));
        let generator = ContentGenerator::new(text);

        let http = reqwest::Client::builder()
            .user_agent(concat!("kidsmart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let images = image_chain(&config, &http);
        info!(backends = ?images.backend_names(), "image chain ready");

        let kv: Arc<dyn KeyValueStore> = Arc::new(FileStore::open(&config.data_dir)?);
        let feed: Arc<dyn FeedSource> = Arc::new(SheetFeedAdapter::new(http));
        let notifier: Arc<dyn Notifier> = Arc::new(LogNotifier);

        let synth: Arc<dyn SpeechSynthesizer> = match &config.openai_api_key {
            Some(key) => Arc::new(OpenAiSpeechAdapter::new(
                openai_client(key, config.openai_api_base.as_deref()),
                &config.tts_voice,
                config.data_dir.join("speech"),
            )),
            None => Arc::new(TranscriptSpeech::default()),
        };

        // Stories and flashcard batches never draw at the same time.
        let lock = GenerationLock::new();

        let stories = StoryWorkflow::new(
            generator.clone(),
            images.clone(),
            ContentStore::new(kv.clone(), SAVED_STORIES_KEY),
            lock.clone(),
            SpeechPlayback::new(synth),
            notifier.clone(),
            config.timing.page_cooldown,
        );
        let flashcards = FlashcardWorkflow::new(
            generator.clone(),
            images,
            ContentStore::new(kv.clone(), SAVED_FLASHCARDS_KEY),
            lock,
            notifier.clone(),
            config.timing.card_delay,
        );
        let lessons = LessonPlanner::new(generator, notifier);

        let story_links = LinkLibrary::new(
            LinkKind::Story,
            kv.clone(),
            feed.clone(),
            config.story_feed_url.clone(),
        );
        let game_links = LinkLibrary::new(LinkKind::Game, kv, feed, config.game_feed_url.clone());

        Ok(Self {
            config,
            stories,
            flashcards,
            lessons,
            story_links,
            game_links,
            navigator: Mutex::new(Navigator::new()),
        })
    }

    pub fn links(&self, kind: LinkKind) -> &LinkLibrary {
        match kind {
            LinkKind::Story => &self.story_links,
            LinkKind::Game => &self.game_links,
        }
    }

    /// Moves into the teacher zone and opens `tool`.
    pub fn open_tool(&self, tool: TeacherTool) {
        let mut navigator = self.navigator.lock().unwrap_or_else(|e| e.into_inner());
        navigator.enter_teacher();
        navigator.open_tool(tool);
    }

    /// Moves into the kid zone shelf that lists `kind` links.
    pub fn open_shelf(&self, kind: LinkKind) {
        let activity = match kind {
            LinkKind::Story => KidActivity::StoryTime,
            LinkKind::Game => KidActivity::GameQuiz,
        };
        let mut navigator = self.navigator.lock().unwrap_or_else(|e| e.into_inner());
        navigator.enter_kid_zone();
        navigator.open_activity(activity);
    }

    pub fn view(&self) -> AppView {
        self.navigator.lock().unwrap_or_else(|e| e.into_inner()).view()
    }

    /// Leaves the current view; closing a teacher tool clears its workspace.
    pub fn back(&self) {
        let effect = self
            .navigator
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .back();
        if effect == BackEffect::ResetTeacherWorkspace {
            self.stories.reset();
            self.flashcards.reset();
            self.lessons.reset();
        }
    }
}

fn openai_client(api_key: &str, api_base: Option<&str>) -> Client<OpenAIConfig> {
    let mut config = OpenAIConfig::new().with_api_key(api_key);
    if let Some(base) = api_base {
        config = config.with_api_base(base);
    }
    Client::with_config(config)
}

/// Fast inline backend first, quality backend second, render URL last.
fn image_chain(config: &Config, http: &reqwest::Client) -> ImageChain {
    let mut backends: Vec<Arc<dyn ImageBackend>> = Vec::new();
    if let Some(key) = &config.gemini_api_key {
        backends.push(Arc::new(GeminiImageAdapter::new(
            http.clone(),
            key.clone(),
            config.gemini_image_model.clone(),
        )));
    }
    if let Some(key) = &config.openai_api_key {
        backends.push(Arc::new(OpenAiImageAdapter::new(
            openai_client(key, config.openai_api_base.as_deref()),
            &config.openai_image_model,
        )));
    }
    backends.push(Arc::new(RenderUrlAdapter::default()));
    ImageChain::new(backends)
}
