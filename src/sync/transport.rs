//! Seams to the outside world: fan-out of match updates, and time.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use super::protocol::MatchUpdate;

/// Fans out updates to every viewer of a match.
///
/// Delivery may be at-least-once and unordered; clients re-derive order
/// from entry indices.
pub trait Broadcaster: Send + Sync {
    fn broadcast(&self, update: &MatchUpdate);
}

/// Keeps every broadcast update. Useful in tests and for replaying a
/// session's traffic.
#[derive(Debug, Default)]
pub struct RecordingBroadcaster {
    updates: Mutex<Vec<MatchUpdate>>,
}

impl RecordingBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates broadcast so far.
    pub fn updates(&self) -> Vec<MatchUpdate> {
        self.updates
            .lock()
            .map(|updates| updates.clone())
            .unwrap_or_default()
    }

    /// Remove and return the updates broadcast so far.
    pub fn take(&self) -> Vec<MatchUpdate> {
        self.updates
            .lock()
            .map(|mut updates| std::mem::take(&mut *updates))
            .unwrap_or_default()
    }
}

impl Broadcaster for RecordingBroadcaster {
    fn broadcast(&self, update: &MatchUpdate) {
        match self.updates.lock() {
            Ok(mut updates) => updates.push(update.clone()),
            Err(_) => tracing::warn!(match_id = %update.match_id, "broadcast log poisoned"),
        }
    }
}

/// Channel-backed fan-out, e.g. to a transport thread.
impl Broadcaster for Sender<MatchUpdate> {
    fn broadcast(&self, update: &MatchUpdate) {
        if self.send(update.clone()).is_err() {
            tracing::warn!(match_id = %update.match_id, "update receiver dropped");
        }
    }
}

/// Source of server time, in milliseconds.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time since the Unix epoch.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
            .unwrap_or(0)
    }
}

/// Time that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualTimeSource {
    now_ms: AtomicU64,
}

impl ManualTimeSource {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, by_ms: u64) {
        self.now_ms.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl TimeSource for ManualTimeSource {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
