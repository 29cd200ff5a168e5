//! Pauses taken by the harness.
//!
//! Every blocking pause goes through [`Sleeper`] so tests can count pauses
//! without waiting for them.

use std::time::Duration;

/// Why the harness is pausing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    /// After warm-up round `round` (1-based)
    WarmUp { round: usize },
    /// Thermal cooldown after measured iteration `after_iteration` (1-based)
    Cooldown { after_iteration: usize },
    /// Synchronization gate waiting for result files
    Poll,
}

pub trait Sleeper {
    fn sleep(&mut self, duration: Duration, reason: Pause);
}

/// Blocks the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration, reason: Pause) {
        if let Pause::Cooldown { after_iteration } = reason {
            tracing::info!(
                "[RUN] Pausing {:?} after iteration {} to cool off the CPU",
                duration,
                after_iteration
            );
        }
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Records pauses instead of sleeping.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    pub pauses: Vec<(Pause, Duration)>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterations after which a cooldown was taken, in order.
    pub fn cooldowns(&self) -> Vec<usize> {
        self.pauses
            .iter()
            .filter_map(|(p, _)| match p {
                Pause::Cooldown { after_iteration } => Some(*after_iteration),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Pause) -> bool) -> usize {
        self.pauses.iter().filter(|(p, _)| pred(p)).count()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&mut self, duration: Duration, reason: Pause) {
        self.pauses.push((reason, duration));
    }
}

impl<S: Sleeper + ?Sized> Sleeper for &mut S {
    fn sleep(&mut self, duration: Duration, reason: Pause) {
        (**self).sleep(duration, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_recording_sleeper_does_not_block() {
        let mut sleeper = RecordingSleeper::new();
        let start = Instant::now();
        sleeper.sleep(Duration::from_secs(60), Pause::Cooldown { after_iteration: 20 });
        sleeper.sleep(Duration::from_secs(2), Pause::WarmUp { round: 1 });
        assert!(start.elapsed() < Duration::from_secs(1));
        assert_eq!(sleeper.cooldowns(), vec![20]);
        assert_eq!(sleeper.count(|p| matches!(p, Pause::WarmUp { .. })), 1);
    }

    #[test]
    fn test_thread_sleeper_zero_duration_returns() {
        let mut sleeper = ThreadSleeper;
        sleeper.sleep(Duration::ZERO, Pause::Poll);
    }
}
