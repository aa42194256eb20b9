//! crates/kidsmart_core/src/prompts.rs
//!
//! Prompt builder: pure functions turning a topic and structural parameters into
//! the exact instruction text and output schema sent to the backends.

use serde_json::json;

use crate::ports::{OutputSchema, TextRequest};

/// Visual style prepended to every story-page image prompt.
pub const STORY_STYLE_PREFIX: &str =
    "soft 3d cute cartoon style, warm lighting, pastel colors, high detail, masterpiece";

/// Negative constraints appended to every story-page image prompt.
pub const STORY_NEGATIVE_SUFFIX: &str =
    "no text, no words, no letters, no labels, no speech bubbles, no watermark, no signature";

/// Negative constraints appended to every flashcard image prompt.
pub const CARD_NEGATIVE_SUFFIX: &str = "No text, no words, no labels.";

const LESSON_PLAN_TEMPLATE: &str = r#"Bạn là chuyên gia giáo dục mầm non. Hãy soạn giáo án cho chủ đề: "{topic}".
Trình bày dạng Markdown rõ ràng.
Nội dung gồm: Mục tiêu, Chuẩn bị, Tiến trình hoạt động, Câu hỏi gợi mở."#;

const FLASHCARD_TEMPLATE: &str = r#"Tạo danh sách {count} từ vựng cho trẻ mầm non về chủ đề: "{topic}".
Trả về JSON Array.
Mỗi phần tử gồm:
- "word": Từ tiếng Việt.
- "englishWord": Từ tiếng Anh.
- "visualDescription": Mô tả hình ảnh bằng tiếng Anh để vẽ minh họa (Ví dụ: "Cute cat white background")."#;

const STORY_TEMPLATE: &str = r#"Bạn là một hệ thống tạo truyện tranh cho trẻ em (API JSON).
Yêu cầu: Viết một câu chuyện về chủ đề "{topic}".
Độ dài: Chính xác {pages} trang.
Nhân vật phải giữ nguyên ngoại hình (màu sắc, trang phục) ở tất cả các trang.

BẮT BUỘC TRẢ VỀ ĐỊNH DẠNG JSON với cấu trúc sau:
{
  "title": "Tên câu chuyện (Tiếng Việt)",
  "pages": [
    {
      "text": "Lời dẫn truyện của trang này (Tiếng Việt, ngắn gọn 2-3 câu, phù hợp trẻ 3-5 tuổi)",
      "imagePrompt": "Mô tả hình ảnh minh họa cho trang này bằng TIẾNG ANH (Ví dụ: Cute rabbit running in forest, cartoon style). KHÔNG yêu cầu vẽ chữ."
    }
  ]
}

Chỉ trả về JSON. Không thêm lời bình."#;

/// Free-form markdown lesson plan with the four fixed sections.
pub fn lesson_plan_request(topic: &str) -> TextRequest {
    TextRequest {
        prompt: LESSON_PLAN_TEMPLATE.replace("{topic}", topic),
        schema: None,
    }
}

/// A list of `count` vocabulary cards conforming to the three-field record schema.
pub fn flashcard_list_request(topic: &str, count: usize) -> TextRequest {
    TextRequest {
        prompt: FLASHCARD_TEMPLATE
            .replace("{count}", &count.to_string())
            .replace("{topic}", topic),
        schema: Some(flashcard_list_schema()),
    }
}

/// A titled story of exactly `pages` pages.
pub fn story_script_request(topic: &str, pages: usize) -> TextRequest {
    TextRequest {
        prompt: STORY_TEMPLATE
            .replace("{topic}", topic)
            .replace("{pages}", &pages.to_string()),
        schema: Some(story_script_schema()),
    }
}

pub fn flashcard_list_schema() -> OutputSchema {
    OutputSchema {
        name: "flashcard_list_v1",
        json_schema: json!({
            "type": "array",
            "items": {
                "type": "object",
                "properties": {
                    "word": { "type": "string" },
                    "englishWord": { "type": "string" },
                    "visualDescription": { "type": "string" }
                },
                "required": ["word", "englishWord", "visualDescription"]
            }
        }),
    }
}

pub fn story_script_schema() -> OutputSchema {
    OutputSchema {
        name: "story_script_v1",
        json_schema: json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "pages": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "text": { "type": "string" },
                            "imagePrompt": { "type": "string" }
                        },
                        "required": ["text", "imagePrompt"]
                    }
                }
            },
            "required": ["title", "pages"]
        }),
    }
}

/// Style prefix + page description + negative suffix.
pub fn story_page_image_prompt(image_prompt_seed: &str) -> String {
    format!(
        "{}. {}. {}",
        STORY_STYLE_PREFIX,
        image_prompt_seed.trim(),
        STORY_NEGATIVE_SUFFIX
    )
}

/// Isolated, photographic card illustration.
pub fn flashcard_image_prompt(foreign_term: Option<&str>, visual_description: Option<&str>) -> String {
    let subject = foreign_term.unwrap_or_default().trim();
    let hint = visual_description.unwrap_or_default().trim();
    format!(
        "Single isolated image of {} ({}). White background, high quality, realistic photography style. {}",
        subject, hint, CARD_NEGATIVE_SUFFIX
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lesson_plan_embeds_topic_without_schema() {
        let request = lesson_plan_request("Khám phá nước");
        assert!(request.prompt.contains("\"Khám phá nước\""));
        assert!(request.prompt.contains("Câu hỏi gợi mở"));
        assert!(request.schema.is_none());
    }

    #[test]
    fn flashcard_prompt_embeds_count_and_three_field_schema() {
        let request = flashcard_list_request("Vật nuôi", 8);
        assert!(request.prompt.starts_with("Tạo danh sách 8 từ vựng"));
        let schema = request.schema.expect("schema");
        let required = schema.json_schema["items"]["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
    }

    #[test]
    fn story_prompt_requires_exact_page_count_and_no_lettering() {
        let request = story_script_request("Bé Thỏ đi học", 3);
        assert!(request.prompt.contains("Chính xác 3 trang"));
        assert!(request.prompt.contains("KHÔNG yêu cầu vẽ chữ"));
        assert!(request.prompt.contains("giữ nguyên ngoại hình"));
        assert_eq!(request.schema.unwrap().name, "story_script_v1");
    }

    #[test]
    fn page_image_prompt_wraps_seed_in_style_and_negatives() {
        let prompt = story_page_image_prompt("  rabbit with a red backpack ");
        assert_eq!(
            prompt,
            format!(
                "{}. rabbit with a red backpack. {}",
                STORY_STYLE_PREFIX, STORY_NEGATIVE_SUFFIX
            )
        );
    }

    #[test]
    fn card_image_prompt_tolerates_missing_fields() {
        let prompt = flashcard_image_prompt(Some("Cat"), None);
        assert!(prompt.starts_with("Single isolated image of Cat ()."));
        assert!(prompt.ends_with(CARD_NEGATIVE_SUFFIX));
    }
}
