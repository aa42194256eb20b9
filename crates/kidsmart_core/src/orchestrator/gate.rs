//! Gating primitives shared by every workflow: the single global generation
//! lock and the post-generation cooldown timer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;

/// At most one image generation may be in flight across all workflows.
///
/// Cloning shares the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct GenerationLock {
    busy: Arc<AtomicBool>,
}

impl GenerationLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lock if it is free. The returned permit releases it on drop,
    /// on every exit path.
    pub fn try_acquire(&self) -> Option<GenerationPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| GenerationPermit {
                busy: self.busy.clone(),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Proof of holding the `GenerationLock`.
#[derive(Debug)]
pub struct GenerationPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for GenerationPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// A fixed-length countdown started after a successful generation.
#[derive(Debug)]
pub struct Cooldown {
    period: Duration,
    deadline: Mutex<Option<Instant>>,
}

impl Cooldown {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            deadline: Mutex::new(None),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Restarts the countdown from the full period.
    pub fn start(&self) {
        if let Ok(mut deadline) = self.deadline.lock() {
            *deadline = Some(Instant::now() + self.period);
        }
    }

    /// Zeroes the countdown.
    pub fn clear(&self) {
        if let Ok(mut deadline) = self.deadline.lock() {
            *deadline = None;
        }
    }

    pub fn remaining(&self) -> Duration {
        let deadline = self.deadline.lock().ok().and_then(|d| *d);
        match deadline {
            Some(at) => at.saturating_duration_since(Instant::now()),
            None => Duration::ZERO,
        }
    }

    /// Remaining time rounded up to whole seconds, as shown to the user.
    pub fn remaining_secs(&self) -> u64 {
        let remaining = self.remaining();
        let secs = remaining.as_secs();
        if remaining.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }

    pub fn is_active(&self) -> bool {
        !self.remaining().is_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lock_is_exclusive_until_permit_drops() {
        let lock = GenerationLock::new();
        let shared = lock.clone();

        let permit = lock.try_acquire().expect("free lock");
        assert!(shared.is_busy());
        assert!(shared.try_acquire().is_none());

        drop(permit);
        assert!(!lock.is_busy());
        assert!(shared.try_acquire().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cooldown_counts_down_in_whole_seconds() {
        let cooldown = Cooldown::new(Duration::from_secs(20));
        assert!(!cooldown.is_active());

        cooldown.start();
        assert_eq!(cooldown.remaining_secs(), 20);

        tokio::time::advance(Duration::from_millis(5_500)).await;
        assert_eq!(cooldown.remaining_secs(), 15);

        tokio::time::advance(Duration::from_secs(15)).await;
        assert!(!cooldown.is_active());
        assert_eq!(cooldown.remaining_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn clear_zeroes_an_active_cooldown() {
        let cooldown = Cooldown::new(Duration::from_secs(20));
        cooldown.start();
        cooldown.clear();
        assert!(!cooldown.is_active());
    }
}
