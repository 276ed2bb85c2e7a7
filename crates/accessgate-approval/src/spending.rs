//! Rolling-window hardware spending ledger.
//!
//! The ledger is append-only. Records are never edited or removed one at a
//! time; they only age out when a read finds them older than the window.
//! Both approved and approval-pending purchases count toward a user's
//! total, so routing a request through manual approval does not bypass the
//! cap.

use accessgate_core::{Clock, ExpiryBoundary};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

use crate::error::{ApprovalError, ApprovalResult};

/// Status a spend was recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpendingStatus {
    /// Purchase approved outright.
    Approved,
    /// Purchase awaiting manual approval.
    RequiresApproval,
}

impl fmt::Display for SpendingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => write!(f, "APPROVED"),
            Self::RequiresApproval => write!(f, "REQUIRES_APPROVAL"),
        }
    }
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingRecord {
    /// Request that produced the spend.
    pub request_id: String,
    /// User charged.
    pub user: String,
    /// Dollar amount.
    pub amount: f64,
    /// When it was recorded.
    pub timestamp: DateTime<Utc>,
    /// Approval status at recording time.
    pub status: SpendingStatus,
}

/// Per-user spending within a rolling window.
///
/// Thread-safe via internal [`RwLock`].
///
/// # Example
///
/// ```
/// use accessgate_approval::{SpendingStatus, SpendingTracker};
/// use accessgate_core::{ExpiryBoundary, ManualClock};
/// use chrono::Duration;
/// use std::sync::Arc;
///
/// let clock = Arc::new(ManualClock::epoch());
/// let ledger =
///     SpendingTracker::new(clock.clone(), Duration::days(90), ExpiryBoundary::Inclusive).unwrap();
/// ledger.record("req-1", "intern@corp.com", 1200.0, SpendingStatus::Approved);
/// assert!((ledger.get_spending("intern@corp.com") - 1200.0).abs() < f64::EPSILON);
///
/// clock.advance(Duration::days(91));
/// assert_eq!(ledger.get_spending("intern@corp.com"), 0.0);
/// ```
pub struct SpendingTracker {
    clock: Arc<dyn Clock>,
    window: Duration,
    boundary: ExpiryBoundary,
    ledger: RwLock<Vec<SpendingRecord>>,
}

impl SpendingTracker {
    /// Create an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError::InvalidWindow`] if `window` is not positive.
    pub fn new(
        clock: Arc<dyn Clock>,
        window: Duration,
        boundary: ExpiryBoundary,
    ) -> ApprovalResult<Self> {
        if window <= Duration::zero() {
            return Err(ApprovalError::InvalidWindow(format!(
                "{} seconds",
                window.num_seconds()
            )));
        }
        Ok(Self {
            clock,
            window,
            boundary,
            ledger: RwLock::new(Vec::new()),
        })
    }

    /// The rolling window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Append a spend.
    ///
    /// Amounts are not validated. Zero, negative or non-finite amounts are
    /// accepted and logged, because a negative entry lowers the user's total.
    pub fn record(&self, request_id: &str, user: &str, amount: f64, status: SpendingStatus) {
        if !amount.is_finite() || amount <= 0.0 {
            warn!(request_id, user, amount, "recording non-positive or non-finite spend");
        }
        let record = SpendingRecord {
            request_id: request_id.to_owned(),
            user: user.to_owned(),
            amount,
            timestamp: self.clock.now(),
            status,
        };
        self.write_ledger().push(record);
        debug!(request_id, user, amount, %status, "spend recorded");
    }

    /// Sum of `user`'s spending within the window.
    ///
    /// Evicts every record older than the window first.
    #[must_use]
    pub fn get_spending(&self, user: &str) -> f64 {
        self.with_live_records(|ledger| {
            ledger
                .iter()
                .filter(|r| r.user == user)
                .map(|r| r.amount)
                .sum()
        })
    }

    /// `user`'s records within the window, oldest first.
    #[must_use]
    pub fn records_for(&self, user: &str) -> Vec<SpendingRecord> {
        self.with_live_records(|ledger| {
            ledger
                .iter()
                .filter(|r| r.user == user)
                .cloned()
                .collect()
        })
    }

    /// Number of live records across all users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.with_live_records(<[SpendingRecord]>::len)
    }

    /// Whether the ledger holds no live records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_ledger(&self) -> std::sync::RwLockWriteGuard<'_, Vec<SpendingRecord>> {
        self.ledger.write().unwrap_or_else(|e| {
            warn!("SpendingTracker lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn with_live_records<T>(&self, read: impl FnOnce(&[SpendingRecord]) -> T) -> T {
        let now = self.clock.now();
        let mut ledger = self.write_ledger();
        let before = ledger.len();
        ledger.retain(|r| self.boundary.is_live(r.timestamp, now, self.window));
        let evicted = before.saturating_sub(ledger.len());
        if evicted > 0 {
            debug!(evicted, "aged spending records out of the window");
        }
        read(ledger.as_slice())
    }
}

impl fmt::Debug for SpendingTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpendingTracker")
            .field("window", &self.window)
            .field("boundary", &self.boundary)
            .finish_non_exhaustive()
    }
}
