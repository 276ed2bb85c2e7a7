//! Time sources and expiry rules.
//!
//! Every store in the pipeline that ages data out (sessions, the spending
//! ledger, the blacklist) reads time through a [`Clock`] so tests can drive
//! expiry deterministically with a [`ManualClock`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::RwLock;

/// Abstraction over wall-clock time.
///
/// Production code injects [`SystemClock`]. Tests inject [`ManualClock`] and
/// advance it explicitly.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
///
/// # Example
///
/// ```
/// use accessgate_core::{Clock, ManualClock};
/// use chrono::Duration;
///
/// let clock = ManualClock::epoch();
/// let before = clock.now();
/// clock.advance(Duration::hours(1));
/// assert_eq!(clock.now() - before, Duration::hours(1));
/// ```
pub struct ManualClock {
    now: RwLock<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    /// Create a clock frozen at the Unix epoch.
    #[must_use]
    pub fn epoch() -> Self {
        Self::new(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Move the clock forward (or backward, for a negative duration).
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(|e| {
            tracing::warn!("ManualClock lock poisoned, recovering");
            e.into_inner()
        });
        if let Some(next) = now.checked_add_signed(by) {
            *now = next;
        }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, instant: DateTime<Utc>) {
        let mut now = self.now.write().unwrap_or_else(|e| {
            tracing::warn!("ManualClock lock poisoned, recovering");
            e.into_inner()
        });
        *now = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.now())
            .finish()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.read().map_or_else(|e| *e.into_inner(), |n| *n)
    }
}

/// How an age that lands exactly on a limit is treated.
///
/// Applies uniformly to blacklist duration, spending window and session
/// idle timeout so the three never disagree about the same instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpiryBoundary {
    /// `age == limit` is still live; expiry requires `age > limit`.
    #[default]
    Inclusive,
    /// `age == limit` has already expired.
    Exclusive,
}

impl ExpiryBoundary {
    /// Whether something created at `since` has expired at `now`.
    #[must_use]
    pub fn is_expired(self, since: DateTime<Utc>, now: DateTime<Utc>, limit: Duration) -> bool {
        let age = now.signed_duration_since(since);
        match self {
            Self::Inclusive => age > limit,
            Self::Exclusive => age >= limit,
        }
    }

    /// Inverse of [`is_expired`](Self::is_expired).
    #[must_use]
    pub fn is_live(self, since: DateTime<Utc>, now: DateTime<Utc>, limit: Duration) -> bool {
        !self.is_expired(since, now, limit)
    }
}

impl fmt::Display for ExpiryBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inclusive => write!(f, "inclusive"),
            Self::Exclusive => write!(f, "exclusive"),
        }
    }
}
