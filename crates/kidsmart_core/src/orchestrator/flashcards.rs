//! The flashcard batch: one text call for the word list, then one image per
//! card in list order, each after a fixed pause. The batch holds the global
//! generation lock from start to finish.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{error, info, warn};

use crate::domain::{Flashcard, FlashcardSet};
use crate::generation::ContentGenerator;
use crate::imaging::ImageChain;
use crate::ports::{Notification, Notifier, PortResult};
use crate::prompts;
use crate::store::ContentStore;

use super::gate::GenerationLock;
use super::MAX_FLASHCARDS;

pub const DEFAULT_SET_TOPIC: &str = "Chủ đề mới";

/// Live status of a running batch, published on a watch channel.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BatchProgress {
    #[default]
    Idle,
    /// Waiting for the word list.
    Listing,
    /// Pausing before card `next` (zero-based).
    Waiting {
        next: usize,
        total: usize,
        remaining_secs: u64,
    },
    Drawing {
        index: usize,
        total: usize,
        word: String,
    },
    Finished {
        with_image: usize,
        total: usize,
    },
}

impl BatchProgress {
    /// Human-readable status line, `None` when nothing is running.
    pub fn status_text(&self) -> Option<String> {
        match self {
            BatchProgress::Idle | BatchProgress::Finished { .. } => None,
            BatchProgress::Listing => Some("Đang tạo bộ thẻ...".to_string()),
            BatchProgress::Waiting { remaining_secs, .. } => Some(format!(
                "Đang nghỉ để nạp năng lượng... Vẽ thẻ tiếp theo sau {}s",
                remaining_secs
            )),
            BatchProgress::Drawing { index, total, word } => {
                Some(format!("Đang vẽ thẻ {}/{}: {}", index + 1, total, word))
            }
        }
    }
}

/// Summary of a finished batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchReport {
    pub topic: String,
    pub cards: Vec<Flashcard>,
    /// Cards whose image request came back empty, by position.
    pub missing_images: Vec<usize>,
    /// Set when a reset or set switch happened mid-batch; remaining cards
    /// were skipped and no result was applied.
    pub interrupted: bool,
}

#[derive(Debug, Default)]
struct FlashcardState {
    topic: String,
    cards: Vec<Flashcard>,
    current_set_id: Option<String>,
    epoch: u64,
}

pub struct FlashcardWorkflow {
    generator: ContentGenerator,
    images: ImageChain,
    library: ContentStore<FlashcardSet>,
    lock: GenerationLock,
    notifier: Arc<dyn Notifier>,
    card_delay: Duration,
    state: Mutex<FlashcardState>,
    progress: watch::Sender<BatchProgress>,
}

impl FlashcardWorkflow {
    pub fn new(
        generator: ContentGenerator,
        images: ImageChain,
        library: ContentStore<FlashcardSet>,
        lock: GenerationLock,
        notifier: Arc<dyn Notifier>,
        card_delay: Duration,
    ) -> Self {
        let (progress, _) = watch::channel(BatchProgress::Idle);
        Self {
            generator,
            images,
            library,
            lock,
            notifier,
            card_delay,
            state: Mutex::new(FlashcardState::default()),
            progress,
        }
    }

    fn state(&self) -> MutexGuard<'_, FlashcardState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, progress: BatchProgress) {
        self.progress.send_replace(progress);
    }

    /// Publishes only while `epoch` is still current. The state lock is held
    /// across the send so a concurrent reset cannot be overwritten.
    fn publish_current(&self, epoch: u64, progress: BatchProgress) -> bool {
        let state = self.state();
        if state.epoch != epoch {
            return false;
        }
        self.progress.send_replace(progress);
        true
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.state().epoch == epoch
    }

    pub fn subscribe(&self) -> watch::Receiver<BatchProgress> {
        self.progress.subscribe()
    }

    pub fn progress(&self) -> BatchProgress {
        self.progress.borrow().clone()
    }

    pub fn topic(&self) -> String {
        self.state().topic.clone()
    }

    /// Snapshot of the visible cards.
    pub fn cards(&self) -> Vec<Flashcard> {
        self.state().cards.clone()
    }

    /// Id of the saved set the visible cards came from, if any.
    pub fn current_set_id(&self) -> Option<String> {
        self.state().current_set_id.clone()
    }

    //-------------------------------------------------------------------------------------
    // Batch
    //-------------------------------------------------------------------------------------

    /// Runs a full batch for `topic`. Returns `Ok(None)` without doing
    /// anything when the topic is empty or another generation holds the lock.
    ///
    /// Individual image failures never abort the batch; only a failed word
    /// list request returns `Err`.
    pub async fn create(&self, topic: &str, count: usize) -> PortResult<Option<BatchReport>> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Ok(None);
        }
        let Some(_permit) = self.lock.try_acquire() else {
            warn!(topic, "flashcard batch refused, an image generation is in flight");
            return Ok(None);
        };
        let count = count.clamp(1, MAX_FLASHCARDS);

        let epoch = {
            let mut state = self.state();
            state.epoch += 1;
            state.topic = topic.to_string();
            state.cards.clear();
            state.current_set_id = None;
            state.epoch
        };
        info!(topic, count, "starting flashcard batch");
        self.publish(BatchProgress::Listing);

        let list = match self.generator.generate_flashcard_list(topic, count).await {
            Ok(list) => list,
            Err(e) => {
                error!(topic, error = %e, "flashcard list generation failed");
                self.publish(BatchProgress::Idle);
                self.notifier.notify(Notification::error("Có lỗi khi tạo flashcard"));
                return Err(e);
            }
        };

        {
            let mut state = self.state();
            if state.epoch != epoch {
                drop(state);
                return Ok(Some(self.interrupted(topic, list)));
            }
            state.cards = list.clone();
        }

        let total = list.len();
        let mut cards = list;
        let mut missing_images = Vec::new();
        for index in 0..total {
            if index > 0 && !self.wait_before(index, total, epoch).await {
                info!(topic, next = index, "flashcard batch interrupted during pause");
                return Ok(Some(self.interrupted(topic, cards)));
            }

            let word = cards[index].local_term.clone();
            let drawing = BatchProgress::Drawing {
                index,
                total,
                word: word.clone(),
            };
            if !self.publish_current(epoch, drawing) {
                info!(topic, next = index, "flashcard batch interrupted before drawing");
                return Ok(Some(self.interrupted(topic, cards)));
            }

            let prompt = prompts::flashcard_image_prompt(
                cards[index].foreign_term.as_deref(),
                cards[index].visual_description.as_deref(),
            );
            let image = self.images.generate_image(&prompt).await;
            if image.is_none() {
                warn!(topic, index, word = %word, "no image for flashcard, continuing");
                missing_images.push(index);
            }
            cards[index].image_ref = image.clone();

            let mut state = self.state();
            if state.epoch != epoch {
                drop(state);
                info!(topic, index, "flashcard image arrived after reset, discarding");
                return Ok(Some(self.interrupted(topic, cards)));
            }
            if let Some(card) = state.cards.get_mut(index) {
                card.image_ref = image;
            }
        }

        self.publish(BatchProgress::Finished {
            with_image: total - missing_images.len(),
            total,
        });
        info!(topic, total, missing = missing_images.len(), "flashcard batch finished");
        self.notifier
            .notify(Notification::success("Đã gửi yêu cầu vẽ xong! 📷"));

        Ok(Some(BatchReport {
            topic: topic.to_string(),
            cards,
            missing_images,
            interrupted: false,
        }))
    }

    /// Ends a batch that lost its epoch. The batch still holds the lock, so
    /// no newer batch can be publishing when the status is cleared here.
    fn interrupted(&self, topic: &str, cards: Vec<Flashcard>) -> BatchReport {
        self.publish(BatchProgress::Idle);
        BatchReport {
            topic: topic.to_string(),
            cards,
            missing_images: Vec::new(),
            interrupted: true,
        }
    }

    /// Counts the inter-card pause down in whole seconds. Returns `false` if
    /// the workflow was reset while waiting.
    async fn wait_before(&self, next: usize, total: usize, epoch: u64) -> bool {
        let deadline = Instant::now() + self.card_delay;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.is_current(epoch);
            }
            let remaining_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            let waiting = BatchProgress::Waiting {
                next,
                total,
                remaining_secs,
            };
            if !self.publish_current(epoch, waiting) {
                return false;
            }
            tokio::time::sleep(remaining.min(Duration::from_secs(1))).await;
        }
    }

    //-------------------------------------------------------------------------------------
    // Library
    //-------------------------------------------------------------------------------------

    pub fn saved_sets(&self) -> PortResult<Vec<FlashcardSet>> {
        self.library.list_all()
    }

    /// Saves the visible cards as a new set with a fresh id. Returns `None`
    /// when there is nothing to save.
    pub fn save_current_set(&self) -> PortResult<Option<FlashcardSet>> {
        let (topic, cards) = {
            let state = self.state();
            if state.cards.is_empty() {
                return Ok(None);
            }
            let topic = if state.topic.trim().is_empty() {
                DEFAULT_SET_TOPIC.to_string()
            } else {
                state.topic.clone()
            };
            (topic, state.cards.clone())
        };

        let set = FlashcardSet::snapshot(topic, &cards);
        self.library.save(set.clone())?;
        self.state().current_set_id = Some(set.id.clone());
        info!(set_id = %set.id, cards = set.cards.len(), "saved flashcard set");
        self.notifier
            .notify(Notification::success("Đã lưu bộ thẻ vào thư viện! ✅"));
        Ok(Some(set))
    }

    /// Shows a copy of a saved set. A batch still running is left to finish
    /// without touching the loaded cards.
    pub fn load_set(&self, set: &FlashcardSet) {
        let mut state = self.state();
        state.epoch += 1;
        state.topic = set.topic.clone();
        state.cards = set.cards.clone();
        state.current_set_id = Some(set.id.clone());
    }

    pub fn delete_set(&self, id: &str) -> PortResult<()> {
        self.library.delete(id)?;
        {
            let mut state = self.state();
            if state.current_set_id.as_deref() == Some(id) {
                state.epoch += 1;
                state.cards.clear();
                state.topic.clear();
                state.current_set_id = None;
            }
        }
        self.notifier.notify(Notification::success("Đã xóa bộ thẻ!"));
        Ok(())
    }

    /// Drops the visible cards. A running batch stops issuing new image
    /// requests and its late results are discarded.
    pub fn reset(&self) {
        let mut state = self.state();
        state.epoch += 1;
        state.topic.clear();
        state.cards.clear();
        state.current_set_id = None;
        self.progress.send_replace(BatchProgress::Idle);
    }
}

/// Cursor for the full-screen card viewer. Navigation wraps around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CardViewer {
    len: usize,
    selected: Option<usize>,
}

impl CardViewer {
    pub fn new(len: usize) -> Self {
        Self { len, selected: None }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Opens card `index`; out-of-range indices are ignored.
    pub fn open(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.selected = Some(index);
        true
    }

    pub fn next(&mut self) -> Option<usize> {
        let current = self.selected?;
        let next = if current + 1 < self.len { current + 1 } else { 0 };
        self.selected = Some(next);
        self.selected
    }

    pub fn prev(&mut self) -> Option<usize> {
        let current = self.selected?;
        let prev = if current > 0 { current - 1 } else { self.len - 1 };
        self.selected = Some(prev);
        self.selected
    }

    pub fn close(&mut self) {
        self.selected = None;
    }
}
