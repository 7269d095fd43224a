//! Query cache for room views
//!
//! Each entry moves through a small state machine:
//!
//! ```text
//!   Clean ──apply_optimistic──▶ Optimistic(snapshot)
//!     ▲ ▲                           │ rollback / settle
//!     │ └───────────────────────────┘
//!     │ complete_fetch
//!     └──── Reconciling ◀──invalidate── Clean
//! ```
//!
//! Every entry carries a generation. A refetch captures the generation in a
//! [`FetchTicket`] when it starts; `cancel` and `invalidate` bump it so that
//! results of refetches started earlier are discarded. Refetch results are
//! also discarded while an optimistic write is outstanding, and `invalidate`
//! leaves such an entry untouched apart from its generation: only the
//! write's own outcome (`rollback` or `settle`) may end it.

use std::collections::HashMap;

use crate::domain::room::dto::RoomDetailResponse;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    RoomById(String),
    RoomBySlug(String),
}

impl QueryKey {
    /// Both keys under which a room may be cached
    pub fn for_room(room: &RoomDetailResponse) -> [QueryKey; 2] {
        [
            QueryKey::RoomById(room.room_id.clone()),
            QueryKey::RoomBySlug(room.slug.clone()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryState {
    Clean,
    /// Local write not yet confirmed; `snapshot` is the value before it
    Optimistic {
        snapshot: Option<RoomDetailResponse>,
    },
    /// Known stale; waiting for a refetch
    Reconciling,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Option<RoomDetailResponse>,
    state: EntryState,
    generation: u64,
}

impl Default for CacheEntry {
    fn default() -> Self {
        Self {
            value: None,
            state: EntryState::Clean,
            generation: 0,
        }
    }
}

/// Proof of when a refetch started
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: QueryKey,
    generation: u64,
}

impl FetchTicket {
    pub fn key(&self) -> &QueryKey {
        &self.key
    }
}

#[derive(Debug, Default)]
pub struct RoomCache {
    entries: HashMap<QueryKey, CacheEntry>,
}

impl RoomCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &QueryKey) -> Option<&RoomDetailResponse> {
        self.entries.get(key).and_then(|e| e.value.as_ref())
    }

    pub fn state(&self, key: &QueryKey) -> Option<&EntryState> {
        self.entries.get(key).map(|e| &e.state)
    }

    /// Authoritative write, e.g. the initial load
    pub fn set(&mut self, key: QueryKey, value: RoomDetailResponse) {
        let entry = self.entries.entry(key).or_default();
        entry.value = Some(value);
        entry.state = EntryState::Clean;
        entry.generation += 1;
    }

    /// Discard the results of every refetch in flight for `key`.
    pub fn cancel(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.generation += 1;
        }
    }

    pub fn begin_fetch(&mut self, key: &QueryKey) -> FetchTicket {
        let entry = self.entries.entry(key.clone()).or_default();
        FetchTicket {
            key: key.clone(),
            generation: entry.generation,
        }
    }

    /// Store a refetch result. Returns `false` when the result was discarded.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, value: RoomDetailResponse) -> bool {
        let Some(entry) = self.entries.get_mut(&ticket.key) else {
            return false;
        };

        if entry.generation != ticket.generation
            || matches!(entry.state, EntryState::Optimistic { .. })
        {
            return false;
        }

        entry.value = Some(value);
        entry.state = EntryState::Clean;
        true
    }

    /// Snapshot the entry and apply `mutate` to its value.
    ///
    /// If a write is already outstanding its original snapshot is kept.
    /// Returns the snapshot a rollback would restore.
    pub fn apply_optimistic<F>(&mut self, key: &QueryKey, mutate: F) -> Option<RoomDetailResponse>
    where
        F: FnOnce(&mut RoomDetailResponse),
    {
        let entry = self.entries.entry(key.clone()).or_default();

        if !matches!(entry.state, EntryState::Optimistic { .. }) {
            entry.state = EntryState::Optimistic {
                snapshot: entry.value.clone(),
            };
        }

        if let Some(value) = entry.value.as_mut() {
            mutate(value);
        }

        match &entry.state {
            EntryState::Optimistic { snapshot } => snapshot.clone(),
            _ => None,
        }
    }

    /// Restore the exact pre-mutation snapshot.
    pub fn rollback(&mut self, key: &QueryKey) {
        let Some(entry) = self.entries.get_mut(key) else {
            return;
        };

        if let EntryState::Optimistic { snapshot } = &entry.state {
            entry.value = snapshot.clone();
            entry.state = EntryState::Clean;
        }
    }

    /// Accept an optimistic write; its snapshot is dropped.
    pub fn settle(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            if matches!(entry.state, EntryState::Optimistic { .. }) {
                entry.state = EntryState::Clean;
            }
        }
    }

    /// Mark stale so the next refetch supersedes the cached value.
    ///
    /// An outstanding optimistic write keeps its value and snapshot.
    pub fn invalidate(&mut self, key: &QueryKey) {
        if let Some(entry) = self.entries.get_mut(key) {
            entry.generation += 1;
            if !matches!(entry.state, EntryState::Optimistic { .. }) {
                entry.state = EntryState::Reconciling;
            }
        }
    }

    pub fn remove(&mut self, key: &QueryKey) {
        self.entries.remove(key);
    }
}
