use chrono::{DateTime, Duration, Utc};

/// Source of "now" for progress stamps and idle deadlines.
///
/// Services hold a `Clock` by value; tests pin it with [`Clock::fixed`] so
/// timestamps written to storage are reproducible.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Timestamp for a new save that must not precede `previous`.
    ///
    /// Wall clocks can step backwards; persisted `updatedAt` values may not.
    #[must_use]
    pub fn stamp_after(&self, previous: DateTime<Utc>) -> DateTime<Utc> {
        self.now().max(previous)
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Anchor instant shared by tests: 2025-01-06T08:00:00Z, a Monday morning
/// when a learner starts a course.
pub const TERM_START_SECS: i64 = 1_736_150_400;

#[must_use]
pub fn term_start() -> DateTime<Utc> {
    DateTime::UNIX_EPOCH + Duration::seconds(TERM_START_SECS)
}

/// A clock pinned at [`term_start`].
#[must_use]
pub fn term_start_clock() -> Clock {
    Clock::fixed(term_start())
}
