// ── TTL cache entry ──
//
// A value stamped with its creation time. Freshness policy (which
// window applies, and whether a longer grace window is in play) stays
// with the owning service — the entry only answers "is this younger
// than the given window".

use std::time::Duration;

use chrono::{DateTime, Utc};

/// Whether a value cached at `cached_at` is still fresh at `now` under
/// the given window. Timestamps from the future (clock skew across
/// sessions) count as fresh rather than tripping an immediate refetch.
pub fn is_fresh(cached_at: DateTime<Utc>, now: DateTime<Utc>, window: Duration) -> bool {
    let age = now.signed_duration_since(cached_at);
    match chrono::Duration::from_std(window) {
        Ok(window) => age <= window,
        // A window too large for chrono is effectively "never expires".
        Err(_) => true,
    }
}

/// A cached value paired with its creation timestamp.
#[derive(Debug, Clone)]
pub struct TtlEntry<T> {
    value: T,
    cached_at: DateTime<Utc>,
}

impl<T> TtlEntry<T> {
    /// Cache `value` as of now.
    pub fn new(value: T) -> Self {
        Self {
            value,
            cached_at: Utc::now(),
        }
    }

    /// Cache `value` with an explicit timestamp.
    pub fn at(value: T, cached_at: DateTime<Utc>) -> Self {
        Self { value, cached_at }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn cached_at(&self) -> DateTime<Utc> {
        self.cached_at
    }

    /// Is this entry younger than `window` at `now`?
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        is_fresh(self.cached_at, now, window)
    }
}
