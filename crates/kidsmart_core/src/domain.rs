//! crates/kidsmart_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs carry serde derives because their JSON form is exactly what
//! the local content store persists.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reference to a generated image: either a direct URL or an inline
/// `data:` URI. Never a placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    /// Wraps a URL pointing at a rendering service or CDN.
    pub fn url(url: impl Into<String>) -> Self {
        Self(url.into())
    }

    /// Builds a renderable `data:` URI from already base64-encoded bytes.
    pub fn inline(mime_type: &str, base64_data: &str) -> Self {
        Self(format!("data:{};base64,{}", mime_type, base64_data))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_inline(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_inline() {
            write!(f, "<inline image, {} bytes>", self.0.len())
        } else {
            f.write_str(&self.0)
        }
    }
}

/// One page of a story: narrative text plus the seed used to illustrate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPage {
    #[serde(rename = "text")]
    pub narrative_text: String,
    #[serde(rename = "imagePrompt")]
    pub image_prompt_seed: String,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,
    #[serde(rename = "audioBase64", default, skip_serializing_if = "Option::is_none")]
    pub speech_audio_ref: Option<String>,
}

impl StoryPage {
    pub fn new(narrative_text: impl Into<String>, image_prompt_seed: impl Into<String>) -> Self {
        Self {
            narrative_text: narrative_text.into(),
            image_prompt_seed: image_prompt_seed.into(),
            image_ref: None,
            speech_audio_ref: None,
        }
    }

    pub fn has_image(&self) -> bool {
        self.image_ref.is_some()
    }
}

/// A generated (or seeded) picture story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    pub pages: Vec<StoryPage>,
}

impl Story {
    /// Creates a story with a freshly minted id.
    pub fn new(title: impl Into<String>, pages: Vec<StoryPage>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: title.into(),
            pages,
        }
    }

    /// True once every page carries an image.
    pub fn is_complete(&self) -> bool {
        self.pages.iter().all(StoryPage::has_image)
    }
}

/// A single vocabulary card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    #[serde(rename = "word")]
    pub local_term: String,
    #[serde(rename = "englishWord", default, skip_serializing_if = "Option::is_none")]
    pub foreign_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual_description: Option<String>,
    #[serde(rename = "imageUrl", default, skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<ImageRef>,
}

/// An immutable saved snapshot of a flashcard batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardSet {
    pub id: String,
    pub topic: String,
    pub cards: Vec<Flashcard>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl FlashcardSet {
    /// Snapshots `cards` under a fresh id.
    pub fn snapshot(topic: impl Into<String>, cards: &[Flashcard]) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            topic: topic.into(),
            cards: cards.to_vec(),
            created_at: Utc::now(),
        }
    }
}

/// Which kid-zone shelf a bookmark belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Story,
    Game,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Story => "story",
            LinkKind::Game => "game",
        }
    }
}

/// A bookmark to an external story video or game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalLink {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(rename = "color", default)]
    pub display_color: String,
    #[serde(rename = "isFromSheet", default)]
    pub originates_from_feed: bool,
}

/// A generated lesson plan; `content` is markdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonPlan {
    pub topic: String,
    pub content: String,
}
