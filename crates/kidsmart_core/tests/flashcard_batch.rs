mod common;

use std::sync::Arc;
use std::time::Duration;

use kidsmart_core::store::SAVED_FLASHCARDS_KEY;
use kidsmart_core::{
    BatchProgress, ContentGenerator, ContentStore, FlashcardSet, FlashcardWorkflow, GenerationLock, ImageChain,
    MemoryStore,
};

use common::{flashcards_json, RecordingNotifier, ScriptedText, SlowImages};

const CARD_DELAY: Duration = Duration::from_secs(25);
const IMAGE_LATENCY: Duration = Duration::from_secs(3);

struct Harness {
    workflow: FlashcardWorkflow,
    images: Arc<SlowImages>,
    notifier: Arc<RecordingNotifier>,
    lock: GenerationLock,
}

fn harness(text: Arc<ScriptedText>, images: Arc<SlowImages>) -> Harness {
    let notifier = RecordingNotifier::new();
    let lock = GenerationLock::new();
    let workflow = FlashcardWorkflow::new(
        ContentGenerator::new(text),
        ImageChain::new(vec![images.clone()]),
        ContentStore::new(Arc::new(MemoryStore::new()), SAVED_FLASHCARDS_KEY),
        lock.clone(),
        notifier.clone(),
        CARD_DELAY,
    );
    Harness {
        workflow,
        images,
        notifier,
        lock,
    }
}

const ANIMALS: [(&str, &str); 3] = [("Con mèo", "Cat"), ("Con chó", "Dog"), ("Con cá", "Fish")];

#[tokio::test(start_paused = true)]
async fn batch_keeps_list_order_and_spaces_requests_by_the_delay() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS)),
        SlowImages::new(IMAGE_LATENCY),
    );

    let report = h.workflow.create("Con vật", 3).await.unwrap().unwrap();

    let words: Vec<_> = report.cards.iter().map(|c| c.local_term.as_str()).collect();
    assert_eq!(words, vec!["Con mèo", "Con chó", "Con cá"]);
    assert!(report.cards.iter().all(|c| c.image_ref.is_some()));
    assert!(!report.interrupted);

    let prompts = h.images.prompts();
    assert!(prompts[0].contains("Cat"));
    assert!(prompts[1].contains("Dog"));
    assert!(prompts[2].contains("Fish"));

    // Each request starts only after the previous one resolved plus the pause.
    let started = h.images.started_at();
    for pair in started.windows(2) {
        assert!(pair[1] - pair[0] >= IMAGE_LATENCY + CARD_DELAY);
    }
    assert_eq!(h.images.max_in_flight.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(h.workflow.cards(), report.cards);
    assert!(!h.lock.is_busy());
}

#[tokio::test(start_paused = true)]
async fn failed_card_images_do_not_stop_the_batch() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS)),
        SlowImages::empty_on(IMAGE_LATENCY, vec![1]),
    );

    let report = h.workflow.create("Con vật", 3).await.unwrap().unwrap();

    assert_eq!(report.missing_images, vec![1]);
    assert!(report.cards[0].image_ref.is_some());
    assert!(report.cards[1].image_ref.is_none());
    assert!(report.cards[2].image_ref.is_some());
    assert_eq!(h.images.calls(), 3);
    assert_eq!(
        h.workflow.progress(),
        BatchProgress::Finished {
            with_image: 2,
            total: 3
        }
    );
}

#[tokio::test(start_paused = true)]
async fn countdown_is_published_while_waiting() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS[..2])),
        SlowImages::new(IMAGE_LATENCY),
    );
    let mut progress = h.workflow.subscribe();

    let (report, seen) = tokio::join!(h.workflow.create("Con vật", 2), async {
        let mut seen = Vec::new();
        while progress.changed().await.is_ok() {
            let current = progress.borrow_and_update().clone();
            let done = matches!(current, BatchProgress::Finished { .. });
            seen.push(current);
            if done {
                break;
            }
        }
        seen
    });
    report.unwrap();

    let countdown: Vec<u64> = seen
        .iter()
        .filter_map(|p| match p {
            BatchProgress::Waiting { remaining_secs, .. } => Some(*remaining_secs),
            _ => None,
        })
        .collect();
    assert_eq!(countdown.first(), Some(&25));
    assert_eq!(countdown.last(), Some(&1));
    assert_eq!(
        seen.iter()
            .find_map(|p| p.status_text().filter(|s| s.starts_with("Đang vẽ thẻ 2/2"))),
        Some("Đang vẽ thẻ 2/2: Con chó".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn unparseable_list_gives_an_empty_batch() {
    let h = harness(
        ScriptedText::new().reply("Tôi không hiểu yêu cầu."),
        SlowImages::new(IMAGE_LATENCY),
    );
    let report = h.workflow.create("Con vật", 5).await.unwrap().unwrap();
    assert!(report.cards.is_empty());
    assert_eq!(h.images.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn list_failure_is_reported() {
    let h = harness(ScriptedText::new().fail(), SlowImages::new(IMAGE_LATENCY));
    assert!(h.workflow.create("Con vật", 5).await.is_err());
    assert_eq!(h.notifier.messages(), vec!["Có lỗi khi tạo flashcard".to_string()]);
    assert!(!h.lock.is_busy());
}

#[tokio::test(start_paused = true)]
async fn batch_is_refused_while_another_generation_holds_the_lock() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS)),
        SlowImages::new(IMAGE_LATENCY),
    );
    let permit = h.lock.try_acquire().unwrap();
    assert!(h.workflow.create("Con vật", 3).await.unwrap().is_none());
    drop(permit);
    assert!(h.workflow.create("Con vật", 3).await.unwrap().is_some());
}

#[tokio::test(start_paused = true)]
async fn reset_mid_batch_stops_new_requests() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS)),
        SlowImages::new(IMAGE_LATENCY),
    );

    let (report, _) = tokio::join!(h.workflow.create("Con vật", 3), async {
        // Inside the first pause.
        tokio::time::sleep(Duration::from_secs(10)).await;
        h.workflow.reset();
    });

    let report = report.unwrap().unwrap();
    assert!(report.interrupted);
    assert_eq!(h.images.calls(), 1);
    assert!(h.workflow.cards().is_empty());
    assert!(!h.lock.is_busy());
}

#[tokio::test(start_paused = true)]
async fn loading_a_set_mid_batch_clears_the_status() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS)),
        SlowImages::new(IMAGE_LATENCY),
    );
    let saved = FlashcardSet::snapshot("Trái cây", &[]);

    let (report, _) = tokio::join!(h.workflow.create("Con vật", 3), async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.workflow.progress().status_text().is_some());
        h.workflow.load_set(&saved);
    });

    let report = report.unwrap().unwrap();
    assert!(report.interrupted);
    assert_eq!(h.workflow.progress(), BatchProgress::Idle);
    assert!(h.workflow.progress().status_text().is_none());
    assert_eq!(h.images.calls(), 1);
    assert!(!h.lock.is_busy());
}

#[tokio::test(start_paused = true)]
async fn deleting_the_shown_set_mid_batch_clears_the_status() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS)),
        SlowImages::new(IMAGE_LATENCY),
    );

    let (report, _) = tokio::join!(h.workflow.create("Con vật", 3), async {
        tokio::time::sleep(Duration::from_secs(10)).await;
        let saved = h.workflow.save_current_set().unwrap().unwrap();
        h.workflow.delete_set(&saved.id).unwrap();
    });

    let report = report.unwrap().unwrap();
    assert!(report.interrupted);
    assert!(h.workflow.progress().status_text().is_none());
    assert!(h.workflow.cards().is_empty());
    assert!(!h.lock.is_busy());
}

#[tokio::test(start_paused = true)]
async fn saving_twice_creates_two_independent_sets() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS)),
        SlowImages::new(IMAGE_LATENCY),
    );
    h.workflow.create("Con vật", 3).await.unwrap();

    let first = h.workflow.save_current_set().unwrap().unwrap();
    let second = h.workflow.save_current_set().unwrap().unwrap();
    assert_ne!(first.id, second.id);

    let sets = h.workflow.saved_sets().unwrap();
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[0].id, second.id);
    assert_eq!(h.workflow.current_set_id(), Some(second.id.clone()));

    // Loading and re-saving never overwrites the original.
    h.workflow.load_set(&first);
    h.workflow.save_current_set().unwrap();
    let sets = h.workflow.saved_sets().unwrap();
    assert_eq!(sets.len(), 3);
    assert!(sets.iter().any(|s| s.id == first.id && s.cards == first.cards));
}

#[tokio::test(start_paused = true)]
async fn deleting_the_loaded_set_clears_the_cards() {
    let h = harness(
        ScriptedText::new().reply(&flashcards_json(&ANIMALS)),
        SlowImages::new(IMAGE_LATENCY),
    );
    h.workflow.create("Con vật", 3).await.unwrap();
    let set = h.workflow.save_current_set().unwrap().unwrap();

    h.workflow.delete_set(&set.id).unwrap();
    assert!(h.workflow.cards().is_empty());
    assert_eq!(h.workflow.current_set_id(), None);
    assert!(h.workflow.saved_sets().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn nothing_to_save_without_cards() {
    let h = harness(ScriptedText::new(), SlowImages::new(IMAGE_LATENCY));
    assert!(h.workflow.save_current_set().unwrap().is_none());
}
