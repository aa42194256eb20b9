//! crates/kidsmart_core/src/imaging.rs
//!
//! The image generation client: an ordered chain of `ImageBackend` strategies
//! tried in sequence until one yields an image.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::ImageRef;
use crate::ports::ImageBackend;

/// Collapses newlines and runs of whitespace into single spaces.
///
/// Backends that embed the prompt in a URL must call this before encoding.
pub fn sanitize_prompt(prompt: &str) -> String {
    prompt.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Ordered fallback over image backends.
#[derive(Clone, Default)]
pub struct ImageChain {
    backends: Vec<Arc<dyn ImageBackend>>,
}

impl ImageChain {
    pub fn new(backends: Vec<Arc<dyn ImageBackend>>) -> Self {
        Self { backends }
    }

    /// Appends a backend at the lowest priority.
    pub fn push(&mut self, backend: Arc<dyn ImageBackend>) {
        self.backends.push(backend);
    }

    pub fn backend_names(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }

    /// Tries every backend in order. `None` means all of them were exhausted;
    /// it is never an error.
    pub async fn generate_image(&self, prompt: &str) -> Option<ImageRef> {
        for backend in &self.backends {
            match backend.attempt_generate_image(prompt).await {
                Ok(Some(image)) => {
                    info!(backend = backend.name(), image = %image, "image generated");
                    return Some(image);
                }
                Ok(None) => {
                    warn!(backend = backend.name(), "backend returned no image, trying next");
                }
                Err(e) => {
                    warn!(backend = backend.name(), error = %e, "backend failed, trying next");
                }
            }
        }
        warn!(attempted = self.backends.len(), "all image backends exhausted");
        None
    }
}

impl std::fmt::Debug for ImageChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageChain")
            .field("backends", &self.backend_names())
            .finish()
    }
}
