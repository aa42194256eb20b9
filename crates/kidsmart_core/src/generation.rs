//! crates/kidsmart_core/src/generation.rs
//!
//! The text generation client: sends builder prompts through the
//! `TextGenerationService` port and turns the raw reply into domain objects.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::domain::{Flashcard, Story, StoryPage};
use crate::ports::{PortError, PortResult, TextGenerationService, TextRequest};
use crate::prompts;

/// Title used when the backend returns an empty one.
pub const UNTITLED_STORY: &str = "Câu chuyện không tên";
/// Title of the empty shell returned when the script cannot be parsed.
pub const FAILED_STORY_TITLE: &str = "Lỗi tạo truyện";
/// Lesson-plan text used when the backend answers with nothing.
pub const EMPTY_LESSON_PLAN: &str = "Không tạo được nội dung.";

//=========================================================================================
// Wire Shapes (validated on receipt)
//=========================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlashcardDraft {
    word: String,
    english_word: String,
    visual_description: String,
}

#[derive(Debug, Deserialize)]
struct StoryScript {
    title: String,
    pages: Vec<PageDraft>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageDraft {
    text: String,
    image_prompt: String,
}

//=========================================================================================
// Cleanup Heuristics
//=========================================================================================

/// Strips code fences and trims to the outermost JSON object or array.
pub fn clean_json_text(raw: &str) -> String {
    let unfenced = raw.replace("```json", "").replace("```", "");
    let Some(open) = unfenced.find(['{', '[']) else {
        return unfenced.trim().to_string();
    };
    let body = &unfenced[open..];
    let close = match (body.rfind('}'), body.rfind(']')) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };
    match close {
        Some(end) => body[..=end].trim().to_string(),
        None => body.trim().to_string(),
    }
}

/// Parses `raw` as `T`, retrying once on the cleaned text.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> PortResult<T> {
    match serde_json::from_str(raw) {
        Ok(value) => Ok(value),
        Err(first) => {
            debug!(error = %first, "direct parse failed, retrying on cleaned text");
            serde_json::from_str(&clean_json_text(raw))
                .map_err(|e| PortError::GenerationParse(e.to_string()))
        }
    }
}

//=========================================================================================
// The Client
//=========================================================================================

/// Wraps a text backend with schema validation and degradation rules.
#[derive(Clone)]
pub struct ContentGenerator {
    text: Arc<dyn TextGenerationService>,
}

impl ContentGenerator {
    pub fn new(text: Arc<dyn TextGenerationService>) -> Self {
        Self { text }
    }

    /// Sends `request` and validates the reply against `T`.
    pub async fn generate_structured<T: DeserializeOwned>(&self, request: TextRequest) -> PortResult<T> {
        let raw = self.text.generate(request).await?;
        parse_structured(&raw)
    }

    /// Markdown passthrough.
    pub async fn generate_lesson_plan(&self, topic: &str) -> PortResult<String> {
        let raw = self.text.generate(prompts::lesson_plan_request(topic)).await?;
        if raw.trim().is_empty() {
            return Ok(EMPTY_LESSON_PLAN.to_string());
        }
        Ok(raw)
    }

    /// Returns at most `count` cards, in backend order. A reply that cannot be
    /// parsed degrades to an empty list.
    pub async fn generate_flashcard_list(&self, topic: &str, count: usize) -> PortResult<Vec<Flashcard>> {
        let request = prompts::flashcard_list_request(topic, count);
        let drafts: Vec<FlashcardDraft> = match self.generate_structured(request).await {
            Ok(drafts) => drafts,
            Err(PortError::GenerationParse(reason)) => {
                warn!(topic, %reason, "flashcard list did not parse, using empty list");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        Ok(drafts
            .into_iter()
            .take(count)
            .map(|draft| Flashcard {
                local_term: draft.word,
                foreign_term: Some(draft.english_word),
                visual_description: Some(draft.visual_description),
                image_ref: None,
            })
            .collect())
    }

    /// Returns a story skeleton with `pages` image-less pages at most. A reply
    /// that cannot be parsed degrades to an empty story with a fallback title.
    pub async fn generate_story_script(&self, topic: &str, pages: usize) -> PortResult<Story> {
        let request = prompts::story_script_request(topic, pages);
        let script: StoryScript = match self.generate_structured(request).await {
            Ok(script) => script,
            Err(PortError::GenerationParse(reason)) => {
                warn!(topic, %reason, "story script did not parse, using empty shell");
                return Ok(Story::new(FAILED_STORY_TITLE, Vec::new()));
            }
            Err(e) => return Err(e),
        };

        let title = if script.title.trim().is_empty() {
            UNTITLED_STORY.to_string()
        } else {
            script.title
        };
        let pages = script
            .pages
            .into_iter()
            .take(pages)
            .map(|page| StoryPage::new(page.text, page.image_prompt))
            .collect();
        Ok(Story::new(title, pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct CannedText {
        reply: PortResult<String>,
        seen: Mutex<Vec<TextRequest>>,
    }

    impl CannedText {
        fn ok(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(reply.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: Err(PortError::GenerationBackend("quota exceeded".into())),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerationService for CannedText {
        async fn generate(&self, request: TextRequest) -> PortResult<String> {
            self.seen.lock().unwrap().push(request);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(PortError::GenerationBackend(e.to_string())),
            }
        }
    }

    #[test]
    fn clean_strips_fences_and_chatter() {
        let raw = "Here you go:\n```json\n[{\"a\":1}]\n```\nEnjoy!";
        assert_eq!(clean_json_text(raw), "[{\"a\":1}]");
    }

    #[test]
    fn clean_keeps_last_closing_bracket_of_either_kind() {
        let raw = "{\"pages\":[1,2]} trailing";
        assert_eq!(clean_json_text(raw), "{\"pages\":[1,2]}");
    }

    #[test]
    fn parse_reports_parse_error_when_cleanup_fails() {
        let err = parse_structured::<Vec<String>>("no json here").unwrap_err();
        assert!(matches!(err, PortError::GenerationParse(_)));
    }

    #[tokio::test]
    async fn flashcards_are_mapped_in_order_and_truncated() {
        let text = CannedText::ok(
            r#"```json
            [
              {"word":"Con mèo","englishWord":"Cat","visualDescription":"cat"},
              {"word":"Con chó","englishWord":"Dog","visualDescription":"dog"},
              {"word":"Con cá","englishWord":"Fish","visualDescription":"fish"}
            ]
            ```"#,
        );
        let generator = ContentGenerator::new(text.clone());

        let cards = generator.generate_flashcard_list("Vật nuôi", 2).await.unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].local_term, "Con mèo");
        assert_eq!(cards[1].foreign_term.as_deref(), Some("Dog"));
        assert!(cards.iter().all(|c| c.image_ref.is_none()));
        assert!(text.seen.lock().unwrap()[0].schema.is_some());
    }

    #[tokio::test]
    async fn unparseable_flashcards_degrade_to_empty() {
        let generator = ContentGenerator::new(CannedText::ok("Xin lỗi, tôi không thể."));
        let cards = generator.generate_flashcard_list("Hoa quả", 4).await.unwrap();
        assert!(cards.is_empty());
    }

    #[tokio::test]
    async fn unparseable_story_degrades_to_fallback_shell() {
        let generator = ContentGenerator::new(CannedText::ok("{ broken"));
        let story = generator.generate_story_script("Bé Thỏ đi học", 3).await.unwrap();
        assert_eq!(story.title, FAILED_STORY_TITLE);
        assert!(story.pages.is_empty());
    }

    #[tokio::test]
    async fn story_with_blank_title_gets_untitled() {
        let generator = ContentGenerator::new(CannedText::ok(
            r#"{"title":"  ","pages":[{"text":"t","imagePrompt":"p"}]}"#,
        ));
        let story = generator.generate_story_script("x", 3).await.unwrap();
        assert_eq!(story.title, UNTITLED_STORY);
        assert_eq!(story.pages.len(), 1);
    }

    #[tokio::test]
    async fn backend_errors_are_not_defaulted() {
        let generator = ContentGenerator::new(CannedText::failing());
        let err = generator.generate_story_script("x", 3).await.unwrap_err();
        assert!(matches!(err, PortError::GenerationBackend(_)));
        let err = generator.generate_flashcard_list("x", 3).await.unwrap_err();
        assert!(matches!(err, PortError::GenerationBackend(_)));
    }

    #[tokio::test]
    async fn blank_lesson_plan_uses_placeholder_text() {
        let generator = ContentGenerator::new(CannedText::ok("   "));
        let plan = generator.generate_lesson_plan("Tết").await.unwrap();
        assert_eq!(plan, EMPTY_LESSON_PLAN);
    }
}
