use std::collections::{HashMap, VecDeque};

use ahash::RandomState as AHasher;

use super::Merit;
use crate::engine::{Board, Direction};

/// Initial table allocation; most searches stay well under this.
const USUAL_CACHE: usize = 1 << 16;

/// When a stored result may answer a request for a given remaining depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Only a result searched to exactly the requested depth.
    Exact,
    /// Any result searched at least as deep as requested.
    #[default]
    AtLeast,
}

/// A memoized search result for one board, kept in fixed-point [`Merit`] units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheEntry {
    pub evaluation: Merit,
    pub best_move: Direction,
    pub depth: u32,
}

/// Capacity-bounded board -> result map with first-in-first-out eviction.
///
/// Overwriting an existing key keeps its original place in the eviction order.
#[derive(Debug)]
pub struct SearchCache {
    map: HashMap<Board, CacheEntry, AHasher>,
    order: VecDeque<Board>,
    capacity: usize,
    policy: CachePolicy,
}

impl SearchCache {
    pub fn new(capacity: usize, policy: CachePolicy) -> Self {
        let initial = capacity.min(USUAL_CACHE);
        Self {
            map: HashMap::with_capacity_and_hasher(initial, AHasher::new()),
            order: VecDeque::with_capacity(initial),
            capacity,
            policy,
        }
    }

    /// Entry for `board` if it is valid for a search with `depth` plies remaining.
    #[inline]
    pub fn lookup(&self, board: Board, depth: u32) -> Option<CacheEntry> {
        let entry = self.map.get(&board)?;
        let usable = match self.policy {
            CachePolicy::Exact => entry.depth == depth,
            CachePolicy::AtLeast => entry.depth >= depth,
        };
        usable.then_some(*entry)
    }

    pub fn insert(&mut self, board: Board, entry: CacheEntry) {
        if self.capacity == 0 {
            return;
        }
        if let Some(slot) = self.map.get_mut(&board) {
            *slot = entry;
            return;
        }
        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        self.order.push_back(board);
        self.map.insert(board, entry);
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }

    #[inline]
    pub fn len(&self) -> usize { self.map.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    #[inline]
    pub fn capacity(&self) -> usize { self.capacity }

    #[inline]
    pub fn policy(&self) -> CachePolicy { self.policy }
}
