//! services/studio/src/adapters/openai_image.rs
//!
//! The quality image backend, using the OpenAI images endpoint.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::images::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize},
    Client,
};
use async_trait::async_trait;
use kidsmart_core::ports::{ImageBackend, PortError, PortResult};
use kidsmart_core::ImageRef;

/// An `ImageBackend` backed by `client.images().generate`.
#[derive(Clone)]
pub struct OpenAiImageAdapter {
    client: Client<OpenAIConfig>,
    model: ImageModel,
}

impl OpenAiImageAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: &str) -> Self {
        Self {
            client,
            model: image_model(model),
        }
    }
}

/// Maps a configured model name onto the client's enum.
pub fn image_model(name: &str) -> ImageModel {
    match name {
        "gpt-image-1" => ImageModel::GptImage1,
        "gpt-image-1.5" => ImageModel::GptImage1dot5,
        "gpt-image-1-mini" => ImageModel::GptImage1Mini,
        "dall-e-2" => ImageModel::DallE2,
        "dall-e-3" => ImageModel::DallE3,
        other => ImageModel::Other(other.to_string()),
    }
}

fn image_ref(image: &Image) -> Option<ImageRef> {
    match image {
        Image::Url { url, .. } if !url.is_empty() => Some(ImageRef::url(url.clone())),
        Image::B64Json { b64_json, .. } if !b64_json.is_empty() => {
            Some(ImageRef::inline("image/png", b64_json))
        }
        _ => None,
    }
}

#[async_trait]
impl ImageBackend for OpenAiImageAdapter {
    fn name(&self) -> &str {
        "openai-images"
    }

    async fn attempt_generate_image(&self, prompt: &str) -> PortResult<Option<ImageRef>> {
        let mut builder = CreateImageRequestArgs::default();
        builder
            .prompt(prompt)
            .model(self.model.clone())
            .n(1)
            .size(ImageSize::S1024x1024);
        // GPT image models reject `response_format` and always answer in base64.
        if matches!(self.model, ImageModel::DallE2 | ImageModel::DallE3) {
            builder.response_format(ImageResponseFormat::B64Json);
        }
        let request = builder
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = self
            .client
            .images()
            .generate(request)
            .await
            .map_err(|e: OpenAIError| PortError::GenerationBackend(e.to_string()))?;

        Ok(response.data.iter().find_map(|image| image_ref(image)))
    }
}
