use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::models::ReopenHandle;

pub const HANDLE_CACHE_CAPACITY: usize = 200;

struct CacheInner {
    handles: HashMap<String, ReopenHandle>,
    /// Insertion-order ledger; strict FIFO, a re-access never moves a key.
    order: VecDeque<String>,
}

/// Bounded cache from notification key to reopen handle. One lock guards the
/// map and the ledger together so the FIFO invariant stays atomic with the
/// map mutation. Put and get are O(1) amortized and never block on I/O.
pub struct HandleCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

impl Default for HandleCache {
    fn default() -> Self {
        Self::new(HANDLE_CACHE_CAPACITY)
    }
}

impl HandleCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                handles: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    /// Unconditional upsert. Evicts oldest-first while the ledger exceeds
    /// capacity; a ledger entry for a key that was re-put later may evict the
    /// newer handle early, which callers tolerate (the open path falls back).
    pub fn put(&self, key: &str, handle: ReopenHandle) {
        let mut inner = self.inner.lock().unwrap();
        inner.handles.insert(key.to_string(), handle);
        inner.order.push_back(key.to_string());
        while inner.order.len() > self.capacity {
            match inner.order.pop_front() {
                Some(oldest) => {
                    inner.handles.remove(&oldest);
                }
                None => break,
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<ReopenHandle> {
        self.inner.lock().unwrap().handles.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
