//! services/studio/src/adapters/text_llm.rs
//!
//! This module contains the adapter for the text-generating LLM.
//! It implements the `TextGenerationService` port from the `core` crate against
//! any OpenAI-compatible chat completions endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use kidsmart_core::ports::{PortError, PortResult, TextGenerationService, TextRequest};
use tracing::debug;

const SYSTEM_PROMPT: &str =
    "Bạn là trợ lý soạn nội dung giáo dục mầm non bằng tiếng Việt. Trả lời ngắn gọn, phù hợp với trẻ nhỏ.";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `TextGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiTextAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiTextAdapter {
    /// Creates a new `OpenAiTextAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

//=========================================================================================
// `TextGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextGenerationService for OpenAiTextAdapter {
    /// Sends the prompt, asking for schema-conforming JSON when a schema is given.
    async fn generate(&self, request: TextRequest) -> PortResult<String> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_PROMPT)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder.model(&self.model).messages(messages).n(1);
        // Structured outputs only accept an object at the root. Array-shaped
        // replies rely on the prompt wording and the core's cleanup instead.
        if let Some(schema) = request
            .schema
            .filter(|schema| schema.json_schema["type"] == "object")
        {
            builder.response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: schema.name.to_string(),
                    schema: Some(schema.json_schema),
                    strict: None,
                },
            });
        }
        let chat_request = builder
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // OpenAIError is foreign to the core, so it is mapped by hand.
        let response = self
            .client
            .chat()
            .create(chat_request)
            .await
            .map_err(|e: OpenAIError| PortError::GenerationBackend(e.to_string()))?;

        // Only the first choice is requested.
        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        debug!(model = %self.model, chars = content.len(), "text generation finished");
        Ok(content)
    }
}
