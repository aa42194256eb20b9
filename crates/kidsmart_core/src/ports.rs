//! crates/kidsmart_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific generative backends, storage, or speech engines.

use async_trait::async_trait;

use crate::domain::ImageRef;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (network, filesystem).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    /// Network, auth or quota failure while calling a generation backend.
    #[error("Generation backend error: {0}")]
    GenerationBackend(String),
    /// The backend answered but the payload did not match the expected shape.
    #[error("Generation parse error: {0}")]
    GenerationParse(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Request / Message Types Crossing the Ports
//=========================================================================================

/// A named JSON schema the text backend is asked to conform to.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub json_schema: serde_json::Value,
}

/// A single text-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRequest {
    pub prompt: String,
    /// `None` means free-form (markdown) output.
    pub schema: Option<OutputSchema>,
}

/// Something to read aloud.
#[derive(Debug, Clone, PartialEq)]
pub struct Utterance {
    pub text: String,
    pub lang: String,
    pub rate: f32,
}

/// Invoked exactly once when an utterance finishes, errors, or is cancelled.
pub type SpeechDone = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A transient, toast-style message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            message: message.into(),
        }
    }
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait TextGenerationService: Send + Sync {
    /// Sends a prompt (and optional output schema) and returns the raw text.
    async fn generate(&self, request: TextRequest) -> PortResult<String>;
}

#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Attempts one generation. `Ok(None)` means the backend answered without
    /// an image; `Err` means the call itself failed. Both are non-fatal to the
    /// fallback chain.
    async fn attempt_generate_image(&self, prompt: &str) -> PortResult<Option<ImageRef>>;
}

/// Key/value persistence with whole-value overwrite semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> PortResult<Option<String>>;
    fn put(&self, key: &str, value: &str) -> PortResult<()>;
}

#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetches the published tabular text behind `url`.
    async fn fetch_text(&self, url: &str) -> PortResult<String>;
}

pub trait SpeechSynthesizer: Send + Sync {
    /// Starts speaking without waiting for completion.
    fn speak(&self, utterance: Utterance, on_end: SpeechDone) -> PortResult<()>;
    /// Stops whatever is being spoken.
    fn cancel(&self);
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}
