//! The versioned result cache.
//!
//! One entry per conversation, keyed by a monotonic math tick. Readers and
//! the prefetch poller never block each other: writes are wholesale entry
//! replacements under a short-lived lock, and versions only move forward, so
//! no reader ever observes a rollback.
//!
//! The cache is an explicitly constructed component passed by reference to
//! whatever needs it — no process-wide singleton.
//!
//! # Conditional reads
//!
//! [`ResultCache::get`] is a pure cache read. A cached entry strictly newer
//! than the caller's floor is served; everything else — unchanged, not yet
//! cached, or never computed — is one uniform "not modified". Callers cannot
//! distinguish those cases; see DESIGN.md.
//!
//! # Absent memo
//!
//! Conversations confirmed to have no snapshot at all are memoized so that
//! repeated client polls skip the backing-store lookup. The memo is advisory:
//! the prefetch poller keeps probing memoized conversations, and the first
//! successful fetch overrides the memo permanently. A recompute trigger also
//! clears it.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::store::Store;
use crate::types::{ConversationId, MathTick};

pub mod entry;
pub mod poller;
pub mod validator;

pub use entry::{CacheEntry, CacheError};
pub use poller::{prefetch_pass, run_prefetch_loop};
pub use validator::{floor_from_header, ValidatorToken};

/// Result of a conditional cache read.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// The cached payload is strictly newer than the caller's floor.
    Fresh(Arc<CacheEntry>),

    /// Nothing newer to serve. Deliberately uniform across "unchanged",
    /// "not yet cached", and "never computed".
    NotModified,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<ConversationId, Arc<CacheEntry>>,
    absent: HashSet<ConversationId>,
}

/// Versioned per-conversation result cache.
#[derive(Debug, Default)]
pub struct ResultCache {
    inner: RwLock<CacheInner>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Conditional read: serves the entry iff it is strictly newer than
    /// `floor`. `floor = None` means unconditional.
    pub fn get(&self, conversation: ConversationId, floor: Option<MathTick>) -> Lookup {
        let inner = self.inner.read().expect("result cache lock poisoned");
        match inner.entries.get(&conversation) {
            Some(entry) if floor.is_none_or(|floor| entry.math_tick > floor) => {
                Lookup::Fresh(Arc::clone(entry))
            }
            _ => Lookup::NotModified,
        }
    }

    /// The cached version for a conversation, if any.
    pub fn version_of(&self, conversation: ConversationId) -> Option<MathTick> {
        let inner = self.inner.read().expect("result cache lock poisoned");
        inner.entries.get(&conversation).map(|e| e.math_tick)
    }

    /// Replaces a conversation's entry wholesale if the new one is strictly
    /// newer. Returns whether the entry was installed.
    ///
    /// Installing an entry permanently clears the conversation's absent memo.
    pub fn insert(&self, entry: CacheEntry) -> bool {
        let mut inner = self.inner.write().expect("result cache lock poisoned");
        if let Some(existing) = inner.entries.get(&entry.conversation) {
            if existing.math_tick >= entry.math_tick {
                debug!(
                    conversation = %entry.conversation,
                    cached = %existing.math_tick,
                    offered = %entry.math_tick,
                    "ignoring non-newer snapshot"
                );
                return false;
            }
        }
        info!(
            conversation = %entry.conversation,
            math_tick = %entry.math_tick,
            "cached new result snapshot"
        );
        inner.absent.remove(&entry.conversation);
        inner.entries.insert(entry.conversation, Arc::new(entry));
        true
    }

    /// Records that the conversation has no snapshot in the backing store.
    pub fn mark_absent(&self, conversation: ConversationId) {
        let mut inner = self.inner.write().expect("result cache lock poisoned");
        if !inner.entries.contains_key(&conversation) {
            inner.absent.insert(conversation);
        }
    }

    /// Drops the absent memo for a conversation, so the next request probes
    /// the store again. Called when a recompute is triggered.
    pub fn mark_dirty(&self, conversation: ConversationId) {
        let mut inner = self.inner.write().expect("result cache lock poisoned");
        inner.absent.remove(&conversation);
    }

    /// Whether the conversation is memoized as having no snapshot.
    pub fn is_absent(&self, conversation: ConversationId) -> bool {
        let inner = self.inner.read().expect("result cache lock poisoned");
        inner.absent.contains(&conversation)
    }

    /// Every conversation the cache knows about: cached entries and
    /// absent-memoized conversations alike. The prefetch poller probes all of
    /// them.
    pub fn tracked(&self) -> Vec<ConversationId> {
        let inner = self.inner.read().expect("result cache lock poisoned");
        inner
            .entries
            .keys()
            .chain(inner.absent.iter())
            .copied()
            .collect()
    }

    /// Makes sure the cache has an answer for `conversation`, performing at
    /// most one backing-store lookup.
    ///
    /// A no-op when an entry exists or the conversation is memoized absent —
    /// this is what makes repeated client polls for a snapshotless
    /// conversation cheap. Otherwise the store is consulted once: a found
    /// snapshot is cached, a missing one is memoized.
    pub async fn ensure_cached<S: Store>(
        &self,
        store: &S,
        conversation: ConversationId,
    ) -> Result<(), CacheError> {
        {
            let inner = self.inner.read().expect("result cache lock poisoned");
            if inner.entries.contains_key(&conversation) || inner.absent.contains(&conversation) {
                return Ok(());
            }
        }

        match store.latest_snapshot(conversation, None).await? {
            Some(snapshot) => {
                self.insert(CacheEntry::build(snapshot)?);
            }
            None => {
                debug!(conversation = %conversation, "no snapshot computed yet; memoizing");
                self.mark_absent(conversation);
            }
        }
        Ok(())
    }
}
