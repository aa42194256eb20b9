pub mod file_store;
pub mod gemini_image;
pub mod notifier;
pub mod openai_image;
pub mod render_url;
pub mod sheet_feed;
pub mod speech;
pub mod text_llm;

pub use file_store::FileStore;
pub use gemini_image::GeminiImageAdapter;
pub use notifier::LogNotifier;
pub use openai_image::OpenAiImageAdapter;
pub use render_url::RenderUrlAdapter;
pub use sheet_feed::SheetFeedAdapter;
pub use speech::{OpenAiSpeechAdapter, TranscriptSpeech};
pub use text_llm::OpenAiTextAdapter;
