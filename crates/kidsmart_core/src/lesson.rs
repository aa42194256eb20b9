//! crates/kidsmart_core/src/lesson.rs
//!
//! Lesson planning: a single free-form text generation plus the plain-text
//! export used when the teacher copies the plan.

use std::sync::{Arc, LazyLock, Mutex, MutexGuard};

use regex::Regex;
use tracing::{error, info};

use crate::domain::LessonPlan;
use crate::generation::ContentGenerator;
use crate::ports::{Notification, Notifier, PortResult};

static MARKDOWN_SYMBOLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[#*`]").expect("valid markdown symbol regex"));
static LIST_MARKERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*-\s").expect("valid list marker regex"));
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid blank line regex"));

/// Flattens markdown for pasting into a plain-text editor.
pub fn plain_text(markdown: &str) -> String {
    let text = MARKDOWN_SYMBOLS.replace_all(markdown, "");
    let text = LIST_MARKERS.replace_all(&text, "• ");
    BLANK_RUNS.replace_all(&text, "\n\n").into_owned()
}

pub struct LessonPlanner {
    generator: ContentGenerator,
    notifier: Arc<dyn Notifier>,
    current: Mutex<Option<LessonPlan>>,
}

impl LessonPlanner {
    pub fn new(generator: ContentGenerator, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            generator,
            notifier,
            current: Mutex::new(None),
        }
    }

    fn current_slot(&self) -> MutexGuard<'_, Option<LessonPlan>> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn current(&self) -> Option<LessonPlan> {
        self.current_slot().clone()
    }

    /// Generates a plan for `topic`. An empty topic is a no-op.
    pub async fn create(&self, topic: &str) -> PortResult<Option<LessonPlan>> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Ok(None);
        }
        *self.current_slot() = None;
        info!(topic, "generating lesson plan");

        match self.generator.generate_lesson_plan(topic).await {
            Ok(content) => {
                let plan = LessonPlan {
                    topic: topic.to_string(),
                    content,
                };
                *self.current_slot() = Some(plan.clone());
                Ok(Some(plan))
            }
            Err(e) => {
                error!(topic, error = %e, "lesson plan generation failed");
                self.notifier.notify(Notification::error("Có lỗi khi tạo giáo án"));
                Err(e)
            }
        }
    }

    /// Plain-text copy of the current plan.
    pub fn copy_text(&self) -> Option<String> {
        let plan = self.current()?;
        self.notifier
            .notify(Notification::success("Đã sao chép nội dung! 📋"));
        Some(plain_text(&plan.content))
    }

    pub fn reset(&self) {
        *self.current_slot() = None;
    }
}
