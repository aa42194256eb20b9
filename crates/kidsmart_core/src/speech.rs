//! crates/kidsmart_core/src/speech.rs
//!
//! Read-aloud playback control. Owns the single "currently speaking" handle so
//! each text unit can toggle between speak and stop.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::ports::{PortResult, SpeechSynthesizer, Utterance};

pub const DEFAULT_SPEECH_LANG: &str = "vi-VN";
pub const DEFAULT_SPEECH_RATE: f32 = 0.9;

#[derive(Debug, Default)]
struct ActiveUtterance {
    id: Option<String>,
    ticket: u64,
}

/// Cloning shares the same active handle.
#[derive(Clone)]
pub struct SpeechPlayback {
    synth: Arc<dyn SpeechSynthesizer>,
    active: Arc<Mutex<ActiveUtterance>>,
    lang: String,
    rate: f32,
}

impl SpeechPlayback {
    pub fn new(synth: Arc<dyn SpeechSynthesizer>) -> Self {
        Self::with_voice(synth, DEFAULT_SPEECH_LANG, DEFAULT_SPEECH_RATE)
    }

    pub fn with_voice(synth: Arc<dyn SpeechSynthesizer>, lang: &str, rate: f32) -> Self {
        Self {
            synth,
            active: Arc::new(Mutex::new(ActiveUtterance::default())),
            lang: lang.to_string(),
            rate,
        }
    }

    /// Identity of the unit being read, if any.
    pub fn speaking(&self) -> Option<String> {
        self.active.lock().ok().and_then(|a| a.id.clone())
    }

    pub fn is_speaking(&self, id: &str) -> bool {
        self.speaking().as_deref() == Some(id)
    }

    /// Stops `id` if it is the active utterance, otherwise cancels whatever is
    /// playing and starts reading `text`. Returns whether `id` is now speaking.
    pub fn toggle(&self, text: &str, id: &str) -> PortResult<bool> {
        if self.is_speaking(id) {
            self.stop();
            return Ok(false);
        }

        self.synth.cancel();
        let ticket = {
            let Ok(mut active) = self.active.lock() else {
                return Ok(false);
            };
            active.ticket += 1;
            active.id = Some(id.to_string());
            active.ticket
        };

        let handle = self.active.clone();
        let finished_id = id.to_string();
        let on_end = Box::new(move || {
            if let Ok(mut active) = handle.lock() {
                if active.ticket == ticket && active.id.as_deref() == Some(finished_id.as_str()) {
                    active.id = None;
                    debug!(id = %finished_id, "utterance finished");
                }
            }
        });

        let utterance = Utterance {
            text: text.to_string(),
            lang: self.lang.clone(),
            rate: self.rate,
        };
        if let Err(e) = self.synth.speak(utterance, on_end) {
            warn!(id, error = %e, "speech synthesis failed to start");
            self.clear_if(ticket);
            return Err(e);
        }
        Ok(true)
    }

    /// Cancels any active utterance.
    pub fn stop(&self) {
        self.synth.cancel();
        if let Ok(mut active) = self.active.lock() {
            active.ticket += 1;
            active.id = None;
        }
    }

    fn clear_if(&self, ticket: u64) {
        if let Ok(mut active) = self.active.lock() {
            if active.ticket == ticket {
                active.id = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{PortError, SpeechDone};

    /// Holds on to `on_end` callbacks so tests decide when playback ends.
    #[derive(Default)]
    struct ManualSynth {
        pending: Mutex<Vec<(String, SpeechDone)>>,
        cancels: Mutex<usize>,
        fail: bool,
    }

    impl ManualSynth {
        fn finish_all(&self) {
            let pending: Vec<_> = self.pending.lock().unwrap().drain(..).collect();
            for (_, done) in pending {
                done();
            }
        }
    }

    impl SpeechSynthesizer for ManualSynth {
        fn speak(&self, utterance: Utterance, on_end: SpeechDone) -> PortResult<()> {
            if self.fail {
                return Err(PortError::Unexpected("no voices".into()));
            }
            self.pending.lock().unwrap().push((utterance.text, on_end));
            Ok(())
        }

        fn cancel(&self) {
            *self.cancels.lock().unwrap() += 1;
        }
    }

    #[test]
    fn toggle_starts_then_stops_same_unit() {
        let synth = Arc::new(ManualSynth::default());
        let playback = SpeechPlayback::new(synth.clone());

        assert!(playback.toggle("Trang một", "story-0").unwrap());
        assert!(playback.is_speaking("story-0"));

        assert!(!playback.toggle("Trang một", "story-0").unwrap());
        assert_eq!(playback.speaking(), None);
    }

    #[test]
    fn starting_another_unit_cancels_the_previous_one() {
        let synth = Arc::new(ManualSynth::default());
        let playback = SpeechPlayback::new(synth.clone());

        playback.toggle("a", "story-0").unwrap();
        playback.toggle("b", "story-1").unwrap();
        assert!(playback.is_speaking("story-1"));
        assert_eq!(*synth.cancels.lock().unwrap(), 2);

        // The stale end callback of story-0 must not clear story-1.
        let (_, first_done) = synth.pending.lock().unwrap().remove(0);
        first_done();
        assert!(playback.is_speaking("story-1"));
    }

    #[test]
    fn natural_end_clears_active_handle() {
        let synth = Arc::new(ManualSynth::default());
        let playback = SpeechPlayback::new(synth.clone());
        playback.toggle("a", "card-3").unwrap();
        synth.finish_all();
        assert_eq!(playback.speaking(), None);
    }

    #[test]
    fn failed_start_leaves_nothing_active() {
        let synth = Arc::new(ManualSynth {
            fail: true,
            ..Default::default()
        });
        let playback = SpeechPlayback::new(synth);
        assert!(playback.toggle("a", "x").is_err());
        assert_eq!(playback.speaking(), None);
    }
}
