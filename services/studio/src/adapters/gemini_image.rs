//! services/studio/src/adapters/gemini_image.rs
//!
//! The fast image backend: Gemini's `generateContent` REST endpoint asked for an
//! image modality. Images come back inline as base64 parts.

use async_trait::async_trait;
use kidsmart_core::ports::{ImageBackend, PortError, PortResult};
use kidsmart_core::ImageRef;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

impl GenerateContentResponse {
    /// The first inline image part across all candidates.
    fn first_image(self) -> Option<ImageRef> {
        self.candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .filter_map(|part| part.inline_data)
            .find(|data| !data.data.is_empty())
            .map(|data| ImageRef::inline(&data.mime_type, &data.data))
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An `ImageBackend` calling the Gemini REST API with an API key header.
#[derive(Clone)]
pub struct GeminiImageAdapter {
    http: reqwest::Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiImageAdapter {
    pub fn new(http: reqwest::Client, api_key: String, model: String) -> Self {
        Self {
            http,
            api_key,
            model,
            api_base: GEMINI_API_BASE.to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_base, self.model)
    }
}

#[async_trait]
impl ImageBackend for GeminiImageAdapter {
    fn name(&self) -> &str {
        "gemini-inline"
    }

    async fn attempt_generate_image(&self, prompt: &str) -> PortResult<Option<ImageRef>> {
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseModalities": ["IMAGE"] },
        });

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::GenerationBackend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortError::GenerationBackend(format!(
                "{} answered {}",
                self.model, status
            )));
        }

        let payload: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| PortError::GenerationParse(e.to_string()))?;
        let image = payload.first_image();
        debug!(model = %self.model, found = image.is_some(), "gemini image response parsed");
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_first_inline_part() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "Here is your picture" },
                    { "inlineData": { "mimeType": "image/png", "data": "iVBORw0" } }
                ]}
            }]
        }))
        .unwrap();

        let image = payload.first_image().unwrap();
        assert_eq!(image.as_str(), "data:image/png;base64,iVBORw0");
    }

    #[test]
    fn text_only_answer_has_no_image() {
        let payload: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "Sorry" }] } }]
        }))
        .unwrap();
        assert!(payload.first_image().is_none());

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "promptFeedback": {} })).unwrap();
        assert!(blocked.first_image().is_none());
    }

    #[test]
    fn endpoint_names_the_model() {
        let adapter = GeminiImageAdapter::new(
            reqwest::Client::new(),
            "key".into(),
            "gemini-2.5-flash-image".into(),
        );
        assert_eq!(
            adapter.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-image:generateContent"
        );
    }
}
