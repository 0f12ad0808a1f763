// src/state.rs
// The state store: the node's one in-memory State, its mutex, and the
// scoped critical-section helpers that are the only way to touch it.

use std::collections::HashMap;
use std::sync::Mutex;

use indexmap::IndexSet;
use uuid::Uuid;

use crate::chain::{Election, Mempool};

/// Everything the mutex in `State` guards. Kept as a plain struct so the
/// lock can be taken once and every field touched in the same critical
/// section — any read or write spanning more than one of these fields must
/// happen inside one `with`/`with_mut` call.
pub struct Inner {
    pub elections: HashMap<Uuid, Election>,
    pub mempools: HashMap<Uuid, Mempool>,
    /// Known peer ports, in the order they were learned.
    pub peers: IndexSet<u16>,
    pub is_miner: bool,
    /// Length of the chain currently being extended, or `None` when idle.
    pub mining_height: Option<usize>,
}

/// The node's one piece of shared state. The store exposes no iterator or
/// reference that outlives a critical section — callers that need a
/// snapshot for work outside the lock must deep-copy within `with`.
pub struct State {
    inner: Mutex<Inner>,
}

impl State {
    pub fn new(is_miner: bool, seed_peers: impl IntoIterator<Item = u16>) -> Self {
        State {
            inner: Mutex::new(Inner {
                elections: HashMap::new(),
                mempools: HashMap::new(),
                peers: seed_peers.into_iter().collect(),
                is_miner,
                mining_height: None,
            }),
        }
    }

    /// Run `f` with exclusive, read/write access to the guarded state.
    pub fn with<T>(&self, f: impl FnOnce(&mut Inner) -> T) -> T {
        let mut guard = self.inner.lock().expect("state mutex poisoned");
        f(&mut guard)
    }
}

impl Inner {
    pub fn peer_list(&self) -> Vec<u16> {
        self.peers.iter().copied().collect()
    }
}
