//! services/studio/src/adapters/render_url.rs
//!
//! The last-resort image backend. It performs no network call: the prompt is
//! embedded in a render-service URL and the client fetches the image lazily.

use async_trait::async_trait;
use kidsmart_core::imaging::sanitize_prompt;
use kidsmart_core::ports::{ImageBackend, PortResult};
use kidsmart_core::ImageRef;
use rand::Rng;

const RENDER_BASE: &str = "https://pollinations.ai/p";
const STYLE_SUFFIX: &str = " , high quality, children book style, cute, vibrant colors, 4k, detailed";

#[derive(Clone, Debug)]
pub struct RenderUrlAdapter {
    base: String,
    size: u32,
}

impl Default for RenderUrlAdapter {
    fn default() -> Self {
        Self {
            base: RENDER_BASE.to_string(),
            size: 768,
        }
    }
}

impl RenderUrlAdapter {
    /// Builds the reference for `prompt` with an explicit seed.
    pub fn url_for(&self, prompt: &str, seed: u32) -> String {
        let styled = format!("{}{}", sanitize_prompt(prompt), STYLE_SUFFIX);
        format!(
            "{}/{}?width={size}&height={size}&seed={}&model=flux&nologo=true",
            self.base,
            urlencoding::encode(&styled),
            seed,
            size = self.size,
        )
    }
}

#[async_trait]
impl ImageBackend for RenderUrlAdapter {
    fn name(&self) -> &str {
        "render-url"
    }

    async fn attempt_generate_image(&self, prompt: &str) -> PortResult<Option<ImageRef>> {
        let seed = rand::rng().random_range(0..1_000_000);
        Ok(Some(ImageRef::url(self.url_for(prompt, seed))))
    }
}
