//! # In-flight intent tracker.
//!
//! Records which intents are currently running so teardown can name the ones
//! that did not stop within the grace period.
//!
//! ```text
//! runner ──enter(id, name)──► HashMap<IntentId, name>
//!    └─ guard dropped (any exit) ──► entry removed
//! close() ──grace exceeded──► snapshot() → ContainerError::GraceExceeded { stuck }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::intent::IntentId;

/// Thread-safe set of running intents.
#[derive(Default)]
pub(crate) struct Inflight {
    running: Mutex<HashMap<IntentId, Arc<str>>>,
}

impl Inflight {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Marks the intent as running until the returned guard is dropped.
    pub(crate) fn enter(self: &Arc<Self>, id: IntentId, name: Arc<str>) -> InflightGuard {
        self.running.lock().insert(id, name);
        InflightGuard {
            owner: Arc::clone(self),
            id,
        }
    }

    /// Returns sorted `name#id` labels of running intents.
    pub(crate) fn snapshot(&self) -> Vec<String> {
        let running = self.running.lock();
        let mut ids: Vec<(&IntentId, &Arc<str>)> = running.iter().collect();
        ids.sort_unstable_by_key(|(id, _)| **id);
        ids.into_iter().map(|(id, name)| format!("{name}{id}")).collect()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.running.lock().len()
    }
}

pub(crate) struct InflightGuard {
    owner: Arc<Inflight>,
    id: IntentId,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        self.owner.running.lock().remove(&self.id);
    }
}
