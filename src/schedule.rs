//! Timer policy for the feed, kept apart from the transport so the poller
//! thread and the tests drive it with whatever clock they have.

use std::time::{Duration, Instant};

/// Holds raw keystrokes until the input has been quiet for `quiet`.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    pending: Option<(String, Instant)>,
    committed: String,
}

impl Debouncer {
    pub fn new(quiet: Duration, committed: impl Into<String>) -> Self {
        Self {
            quiet,
            pending: None,
            committed: committed.into(),
        }
    }

    /// Records the current input. Each call restarts the quiet window.
    pub fn push(&mut self, input: &str, now: Instant) {
        self.pending = Some((input.to_string(), now));
    }

    /// Commits `input` immediately, discarding anything pending.
    pub fn submit(&mut self, input: &str) -> Option<String> {
        self.pending = None;
        self.commit(input.trim())
    }

    /// Returns the newly committed term once the quiet window has elapsed
    /// and the settled input differs from the committed one.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        let (_, at) = self.pending.as_ref()?;
        if now.saturating_duration_since(*at) < self.quiet {
            return None;
        }
        let (input, _) = self.pending.take()?;
        self.commit(input.trim())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, at)| *at + self.quiet)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }

    fn commit(&mut self, term: &str) -> Option<String> {
        if term == self.committed {
            return None;
        }
        self.committed = term.to_string();
        Some(self.committed.clone())
    }
}

/// A single re-armable interval. Re-arming replaces the previous deadline, so
/// a search change never leaves two interval timers running.
#[derive(Debug, Clone)]
pub struct PollClock {
    interval: Duration,
    next_due: Option<Instant>,
}

impl PollClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time left until the next tick; zero once overdue, `None` when
    /// cancelled.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.next_due
            .map(|due| due.saturating_duration_since(now))
    }

    /// True when a tick is due; the clock re-arms itself from `now`.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.next_due {
            Some(due) if now >= due => {
                self.arm(now);
                true
            }
            _ => false,
        }
    }
}

/// Time left until a scheduled start, for upcoming fixtures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Countdown {
    Remaining { secs: i64 },
    Starting,
}

impl Countdown {
    pub fn from_timestamps(start: i64, now: i64) -> Self {
        let secs = start - now;
        if secs <= 0 {
            Countdown::Starting
        } else {
            Countdown::Remaining { secs }
        }
    }

    pub fn label(&self) -> String {
        let secs = match *self {
            Countdown::Starting => return "starting".to_string(),
            Countdown::Remaining { secs } => secs,
        };
        let days = secs / 86_400;
        let hours = (secs % 86_400) / 3_600;
        let minutes = (secs % 3_600) / 60;
        if days > 0 {
            format!("{days}d {hours:02}h")
        } else if hours > 0 {
            format!("{hours}h {minutes:02}m")
        } else if minutes > 0 {
            format!("{minutes}m {:02}s", secs % 60)
        } else {
            format!("{secs}s")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn countdown_labels() {
        assert_eq!(Countdown::from_timestamps(100, 100).label(), "starting");
        assert_eq!(Countdown::from_timestamps(145, 100).label(), "45s");
        assert_eq!(Countdown::from_timestamps(7_600, 100).label(), "2h 05m");
        assert_eq!(Countdown::from_timestamps(100 + 90_000, 100).label(), "1d 01h");
    }

    #[test]
    fn cancelled_clock_never_fires() {
        let start = Instant::now();
        let mut clock = PollClock::new(Duration::from_secs(60));
        clock.arm(start);
        clock.cancel();
        assert!(!clock.fire(start + Duration::from_secs(600)));
        assert_eq!(clock.remaining(start), None);
    }
}
