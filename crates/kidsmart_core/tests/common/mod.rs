//! Test doubles for the core ports.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use kidsmart_core::ports::{SpeechDone, TextRequest, Utterance};
use kidsmart_core::{
    FeedSource, ImageBackend, ImageRef, Notification, NotificationKind, Notifier, PortError, PortResult,
    SpeechSynthesizer, TextGenerationService,
};

/// Replies with queued texts in order; errors once the queue is empty.
#[derive(Default)]
pub struct ScriptedText {
    replies: Mutex<VecDeque<PortResult<String>>>,
    latency: Mutex<Duration>,
    pub seen: Mutex<Vec<TextRequest>>,
}

impl ScriptedText {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(self: &Arc<Self>, text: &str) -> Arc<Self> {
        self.replies.lock().unwrap().push_back(Ok(text.to_string()));
        self.clone()
    }

    pub fn fail(self: &Arc<Self>) -> Arc<Self> {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(PortError::GenerationBackend("401 unauthorized".into())));
        self.clone()
    }

    /// Every reply takes `latency` to arrive.
    pub fn slow(self: &Arc<Self>, latency: Duration) -> Arc<Self> {
        *self.latency.lock().unwrap() = latency;
        self.clone()
    }
}

#[async_trait]
impl TextGenerationService for ScriptedText {
    async fn generate(&self, request: TextRequest) -> PortResult<String> {
        self.seen.lock().unwrap().push(request);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(PortError::Unexpected("no scripted reply left".into())))
    }
}

/// An image backend that takes `latency` per call and can be told to come
/// back empty on chosen call numbers (zero-based).
pub struct SlowImages {
    latency: Duration,
    empty_on: Vec<usize>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub log: Mutex<Vec<(Instant, String)>>,
}

impl SlowImages {
    pub fn new(latency: Duration) -> Arc<Self> {
        Self::empty_on(latency, Vec::new())
    }

    pub fn empty_on(latency: Duration, empty_on: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            latency,
            empty_on,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }

    pub fn started_at(&self) -> Vec<Instant> {
        self.log.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }
}

#[async_trait]
impl ImageBackend for SlowImages {
    fn name(&self) -> &str {
        "slow-test"
    }

    async fn attempt_generate_image(&self, prompt: &str) -> PortResult<Option<ImageRef>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push((Instant::now(), prompt.to_string()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        tokio::time::sleep(self.latency).await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.empty_on.contains(&call) {
            return Ok(None);
        }
        Ok(Some(ImageRef::url(format!("https://img.test/{}", call))))
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.seen.lock().unwrap().iter().map(|n| n.message.clone()).collect()
    }

    pub fn errors(&self) -> usize {
        self.seen
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.kind == NotificationKind::Error)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().unwrap().push(notification);
    }
}

/// Never finishes on its own; counts cancels.
#[derive(Default)]
pub struct MuteSynth {
    pub spoken: Mutex<Vec<Utterance>>,
    pub cancels: AtomicUsize,
}

impl SpeechSynthesizer for MuteSynth {
    fn speak(&self, utterance: Utterance, _on_end: SpeechDone) -> PortResult<()> {
        self.spoken.lock().unwrap().push(utterance);
        Ok(())
    }

    fn cancel(&self) {
        self.cancels.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct StaticFeed {
    reply: PortResult<String>,
    pub fetches: AtomicUsize,
}

impl StaticFeed {
    pub fn ok(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            fetches: AtomicUsize::new(0),
        })
    }

    pub fn down() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(PortError::GenerationBackend("dns failure".into())),
            fetches: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FeedSource for StaticFeed {
    async fn fetch_text(&self, _url: &str) -> PortResult<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(e) => Err(PortError::Unexpected(e.to_string())),
        }
    }
}

pub fn story_script_json(title: &str, pages: usize) -> String {
    let pages: Vec<serde_json::Value> = (0..pages)
        .map(|i| {
            serde_json::json!({
                "text": format!("Trang {}", i + 1),
                "imagePrompt": format!("little rabbit scene {}", i + 1),
            })
        })
        .collect();
    serde_json::json!({ "title": title, "pages": pages }).to_string()
}

pub fn flashcards_json(words: &[(&str, &str)]) -> String {
    let cards: Vec<serde_json::Value> = words
        .iter()
        .map(|(word, english)| {
            serde_json::json!({
                "word": word,
                "englishWord": english,
                "visualDescription": format!("a {}", english.to_lowercase()),
            })
        })
        .collect();
    serde_json::Value::Array(cards).to_string()
}
