//! One review pass per repository at a time.
//!
//! A [`RunToken`] is proof that the caller holds the repository's slot in a
//! [`RunRegistry`]. The slot is released when the token is dropped, so an
//! early return or a panic inside a pass cannot leave a repository locked.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

type Slots = Arc<Mutex<HashMap<String, Uuid>>>;

/// Tracks which repositories currently have a pass in flight.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    active: Slots,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `repo_key`, or `None` when a pass for it is already running.
    pub fn try_acquire(&self, repo_key: &str) -> Option<RunToken> {
        let mut active = lock(&self.active);
        if active.contains_key(repo_key) {
            return None;
        }
        let id = Uuid::new_v4();
        active.insert(repo_key.to_string(), id);
        Some(RunToken {
            repo_key: repo_key.to_string(),
            id,
            slots: Arc::clone(&self.active),
        })
    }

    /// Whether a pass for `repo_key` is in flight.
    pub fn is_running(&self, repo_key: &str) -> bool {
        lock(&self.active).contains_key(repo_key)
    }
}

/// Exclusive right to review one repository. Released on drop.
#[derive(Debug)]
pub struct RunToken {
    repo_key: String,
    id: Uuid,
    slots: Slots,
}

impl RunToken {
    pub fn repo_key(&self) -> &str {
        &self.repo_key
    }

    /// Unique id of this pass, for log correlation.
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for RunToken {
    fn drop(&mut self) {
        let mut active = lock(&self.slots);
        // Only release the slot this token claimed.
        if active.get(&self.repo_key) == Some(&self.id) {
            active.remove(&self.repo_key);
        }
    }
}

/// The map stays consistent even if a holder panicked, so poisoning is ignored.
fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<String, Uuid>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
