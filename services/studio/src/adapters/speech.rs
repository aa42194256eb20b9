//! services/studio/src/adapters/speech.rs
//!
//! This module contains the read-aloud adapters. They implement the
//! `SpeechSynthesizer` port from the `core` crate.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::audio::{CreateSpeechRequest, SpeechModel, SpeechResponseFormat, Voice},
    Client,
};
use kidsmart_core::ports::{PortError, PortResult, SpeechDone, SpeechSynthesizer, Utterance};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Maps a configured voice name onto the client's enum.
pub fn voice(name: &str) -> Voice {
    match name.to_ascii_lowercase().as_str() {
        "alloy" => Voice::Alloy,
        "ash" => Voice::Ash,
        "ballad" => Voice::Ballad,
        "coral" => Voice::Coral,
        "echo" => Voice::Echo,
        "fable" => Voice::Fable,
        "onyx" => Voice::Onyx,
        "nova" => Voice::Nova,
        "sage" => Voice::Sage,
        "shimmer" => Voice::Shimmer,
        "verse" => Voice::Verse,
        other => Voice::Other(other.to_string()),
    }
}

//=========================================================================================
// OpenAI TTS
//=========================================================================================

/// Renders each utterance to an mp3 file under `out_dir` with the OpenAI TTS API.
///
/// Only one utterance runs at a time; `cancel` aborts the in-flight request.
pub struct OpenAiSpeechAdapter {
    client: Client<OpenAIConfig>,
    model: SpeechModel,
    voice: Voice,
    out_dir: PathBuf,
    current: Mutex<Option<CancellationToken>>,
    counter: AtomicU64,
}

impl OpenAiSpeechAdapter {
    /// Creates a new `OpenAiSpeechAdapter`.
    pub fn new(client: Client<OpenAIConfig>, voice_name: &str, out_dir: PathBuf) -> Self {
        Self {
            client,
            model: SpeechModel::Tts1Hd,
            voice: voice(voice_name),
            out_dir,
            current: Mutex::new(None),
            counter: AtomicU64::new(0),
        }
    }

    fn request(&self, utterance: &Utterance) -> CreateSpeechRequest {
        CreateSpeechRequest {
            model: self.model.clone(),
            input: utterance.text.clone(),
            voice: self.voice.clone(),
            response_format: Some(SpeechResponseFormat::Mp3),
            speed: Some(utterance.rate.clamp(0.25, 4.0)),
            ..Default::default()
        }
    }

    fn replace_token(&self, next: Option<CancellationToken>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = std::mem::replace(&mut *current, next) {
            previous.cancel();
        }
    }
}

impl SpeechSynthesizer for OpenAiSpeechAdapter {
    fn speak(&self, utterance: Utterance, on_end: SpeechDone) -> PortResult<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PortError::Unexpected(format!("no async runtime for speech: {e}")))?;

        let token = CancellationToken::new();
        self.replace_token(Some(token.clone()));

        let client = self.client.clone();
        let request = self.request(&utterance);
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let path = self.out_dir.join(format!("utterance-{n}.mp3"));
        let out_dir = self.out_dir.clone();

        runtime.spawn(async move {
            let render = async {
                let response = client
                    .audio()
                    .speech()
                    .create(request)
                    .await
                    .map_err(|e: OpenAIError| e.to_string())?;
                tokio::fs::create_dir_all(&out_dir)
                    .await
                    .map_err(|e| e.to_string())?;
                tokio::fs::write(&path, &response.bytes)
                    .await
                    .map_err(|e| e.to_string())
            };

            tokio::select! {
                _ = token.cancelled() => info!(utterance = n, "speech cancelled"),
                result = render => match result {
                    Ok(()) => info!(path = %path.display(), "speech rendered"),
                    Err(e) => warn!(error = %e, "speech synthesis failed"),
                },
            }
            on_end();
        });
        Ok(())
    }

    fn cancel(&self) {
        self.replace_token(None);
    }
}

//=========================================================================================
// Transcript fallback
//=========================================================================================

/// Time one word takes at rate 1.0.
const WORD_TIME: Duration = Duration::from_millis(400);

/// Used when no TTS backend is configured: logs the text, then stays
/// "speaking" for about as long as reading it aloud would take.
#[derive(Debug)]
pub struct TranscriptSpeech {
    word_time: Duration,
    current: Mutex<Option<CancellationToken>>,
}

impl Default for TranscriptSpeech {
    fn default() -> Self {
        Self::with_word_time(WORD_TIME)
    }
}

impl TranscriptSpeech {
    pub fn with_word_time(word_time: Duration) -> Self {
        Self {
            word_time,
            current: Mutex::new(None),
        }
    }

    fn reading_time(&self, utterance: &Utterance) -> Duration {
        let words = utterance.text.split_whitespace().count().max(1) as u32;
        (self.word_time * words).div_f32(utterance.rate.clamp(0.25, 4.0))
    }

    fn replace_token(&self, next: Option<CancellationToken>) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = std::mem::replace(&mut *current, next) {
            previous.cancel();
        }
    }
}

impl SpeechSynthesizer for TranscriptSpeech {
    fn speak(&self, utterance: Utterance, on_end: SpeechDone) -> PortResult<()> {
        info!(lang = %utterance.lang, "🔊 {}", utterance.text);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            on_end();
            return Ok(());
        };

        let token = CancellationToken::new();
        self.replace_token(Some(token.clone()));
        let reading = self.reading_time(&utterance);
        runtime.spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(reading) => {}
            }
            on_end();
        });
        Ok(())
    }

    fn cancel(&self) {
        self.replace_token(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kidsmart_core::SpeechPlayback;
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;

    #[test]
    fn voice_names_are_case_insensitive() {
        assert_eq!(voice("Nova"), Voice::Nova);
        assert_eq!(voice("marin"), Voice::Other("marin".to_string()));
    }

    #[test]
    fn requests_carry_rate_and_voice() {
        let adapter = OpenAiSpeechAdapter::new(Client::new(), "coral", PathBuf::from("/tmp"));
        let request = adapter.request(&Utterance {
            text: "Xin chào".into(),
            lang: "vi-VN".into(),
            rate: 0.9,
        });
        assert_eq!(request.voice, Voice::Coral);
        assert_eq!(request.speed, Some(0.9));
        assert_eq!(request.input, "Xin chào");
    }

    fn page(text: &str) -> Utterance {
        Utterance {
            text: text.into(),
            lang: "vi-VN".into(),
            rate: 1.0,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn transcript_speech_ends_after_the_reading_time() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        TranscriptSpeech::default()
            .speak(page("Bé Thỏ đi học"), Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        tokio::task::yield_now().await;
        assert!(!done.load(Ordering::SeqCst));

        // Four words at 400 ms each.
        tokio::time::sleep(Duration::from_millis(1_700)).await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn toggled_page_keeps_speaking_until_read() {
        let playback = SpeechPlayback::new(Arc::new(TranscriptSpeech::default()));

        assert!(playback.toggle("Bé Thỏ đi học", "page-0").unwrap());
        tokio::task::yield_now().await;
        assert!(playback.is_speaking("page-0"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!playback.is_speaking("page-0"));
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_ends_transcript_speech_early() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        let speech = TranscriptSpeech::default();
        speech
            .speak(page("Bé Thỏ đi học"), Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        speech.cancel();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn transcript_speech_outside_a_runtime_finishes_at_once() {
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        TranscriptSpeech::default()
            .speak(page("Trang một"), Box::new(move || flag.store(true, Ordering::SeqCst)))
            .unwrap();
        assert!(done.load(Ordering::SeqCst));
    }

    #[test]
    fn speaking_outside_a_runtime_is_an_error() {
        let adapter = OpenAiSpeechAdapter::new(Client::new(), "alloy", PathBuf::from("/tmp"));
        let result = adapter.speak(
            Utterance {
                text: "a".into(),
                lang: "vi-VN".into(),
                rate: 1.0,
            },
            Box::new(|| {}),
        );
        assert!(result.is_err());
    }
}
