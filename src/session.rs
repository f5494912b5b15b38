//! Per-session epochs for overlapping turns
//!
//! Each new turn for a session bumps its epoch. A turn that finds its epoch
//! is no longer current stops and returns what it has so far; the newest
//! turn owns the conversation from then on.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Epoch bookkeeping shared by every turn in the process
pub trait SessionRegistry: Send + Sync {
    /// Register a new turn for `session_id` and return its epoch
    fn begin(&self, session_id: &str) -> u64;

    /// Whether `epoch` is still the newest turn for `session_id`
    fn is_current(&self, session_id: &str, epoch: u64) -> bool;

    /// Drop the entry if `epoch` is still current; otherwise a newer turn
    /// will clean up when it finishes
    fn end(&self, session_id: &str, epoch: u64);
}

impl<T: SessionRegistry + ?Sized> SessionRegistry for Arc<T> {
    fn begin(&self, session_id: &str) -> u64 {
        (**self).begin(session_id)
    }

    fn is_current(&self, session_id: &str, epoch: u64) -> bool {
        (**self).is_current(session_id, epoch)
    }

    fn end(&self, session_id: &str, epoch: u64) {
        (**self).end(session_id, epoch);
    }
}

/// Mutex-guarded in-memory registry.
///
/// Epochs come from one counter shared by all sessions, so an epoch is
/// never handed out twice even after a session's entry has been removed.
#[derive(Debug, Default)]
pub struct EpochRegistry {
    inner: Mutex<Epochs>,
}

#[derive(Debug, Default)]
struct Epochs {
    sessions: HashMap<String, u64>,
    last: u64,
}

impl EpochRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Epochs> {
        // Every critical section leaves the map consistent, so a poisoned
        // lock is still usable
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Number of sessions with a turn in flight
    pub fn active_sessions(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn current_epoch(&self, session_id: &str) -> Option<u64> {
        self.lock().sessions.get(session_id).copied()
    }
}

impl SessionRegistry for EpochRegistry {
    fn begin(&self, session_id: &str) -> u64 {
        let mut epochs = self.lock();
        epochs.last += 1;
        let epoch = epochs.last;
        epochs.sessions.insert(session_id.to_string(), epoch);
        epoch
    }

    fn is_current(&self, session_id: &str, epoch: u64) -> bool {
        self.lock().sessions.get(session_id) == Some(&epoch)
    }

    fn end(&self, session_id: &str, epoch: u64) {
        let mut epochs = self.lock();
        if epochs.sessions.get(session_id) == Some(&epoch) {
            epochs.sessions.remove(session_id);
        }
    }
}

/// Holds one turn's epoch and releases it on drop, on every exit path
pub(crate) struct EpochGuard<'a, R: SessionRegistry + ?Sized> {
    registry: &'a R,
    session_id: &'a str,
    epoch: u64,
}

impl<'a, R: SessionRegistry + ?Sized> EpochGuard<'a, R> {
    pub(crate) fn begin(registry: &'a R, session_id: &'a str) -> Self {
        let epoch = registry.begin(session_id);
        Self {
            registry,
            session_id,
            epoch,
        }
    }

    pub(crate) fn epoch(&self) -> u64 {
        self.epoch
    }

    pub(crate) fn is_current(&self) -> bool {
        self.registry.is_current(self.session_id, self.epoch)
    }
}

impl<R: SessionRegistry + ?Sized> Drop for EpochGuard<'_, R> {
    fn drop(&mut self) {
        self.registry.end(self.session_id, self.epoch);
    }
}
