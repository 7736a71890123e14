//! Lock-guarded store shared between writers and concurrent readers.
//!
//! [`SharedGraphStore`] wraps a [`GraphStore`] in `Arc<RwLock<_>>`. Every
//! mutation holds the write lock for its whole duration, so a reader can
//! never observe a half-applied edge. Readers do not query under the lock:
//! they take an `Arc<Snapshot>` and search it lock-free.
//!
//! Snapshots are cached per store generation, so concurrent readers between
//! two mutations share one snapshot instead of each copying the adjacency.
//!
//! # Lock Ordering
//!
//! `store` (read) is acquired before `cache`. Writers only take `store`.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use routegraph_core::{CoreError, EdgeAttrs, EdgeId, NodeId, Snapshot, SnapshotSource};

use crate::graph::GraphStore;

struct Inner {
    store: RwLock<GraphStore>,
    cache: Mutex<Option<(u64, Arc<Snapshot>)>>,
}

/// Cloneable handle to a store shared across threads.
#[derive(Clone)]
pub struct SharedGraphStore {
    inner: Arc<Inner>,
}

impl SharedGraphStore {
    pub fn new(store: GraphStore) -> Self {
        SharedGraphStore {
            inner: Arc::new(Inner {
                store: RwLock::new(store),
                cache: Mutex::new(None),
            }),
        }
    }

    /// Runs `f` with exclusive access to the store.
    pub fn write<R>(&self, f: impl FnOnce(&mut GraphStore) -> R) -> R {
        let mut store = self.inner.store.write();
        f(&mut store)
    }

    /// Runs `f` with shared access to the store.
    pub fn read<R>(&self, f: impl FnOnce(&GraphStore) -> R) -> R {
        let store = self.inner.store.read();
        f(&store)
    }

    pub fn add_edge(&self, u: NodeId, v: NodeId, attrs: EdgeAttrs) -> Result<EdgeId, CoreError> {
        self.write(|store| store.add_edge(u, v, attrs))
    }

    pub fn add_or_update_edge(
        &self,
        u: NodeId,
        v: NodeId,
        attrs: EdgeAttrs,
    ) -> Result<EdgeId, CoreError> {
        self.write(|store| store.add_or_update_edge(u, v, attrs))
    }

    pub fn update_edge(&self, u: NodeId, v: NodeId, weight: f64) -> Result<bool, CoreError> {
        self.write(|store| store.update_edge(u, v, weight))
    }

    pub fn remove_edge(&self, u: NodeId, v: NodeId) -> Result<usize, CoreError> {
        self.write(|store| store.remove_edge(u, v))
    }

    pub fn set_node_available(&self, node: NodeId, available: bool) -> Result<(), CoreError> {
        self.write(|store| store.set_node_available(node, available))
    }

    /// Snapshot of the current state, shared with other readers until the
    /// next mutation.
    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        let store = self.inner.store.read();
        let generation = store.generation();
        let mut cache = self.inner.cache.lock();
        if let Some((cached_generation, snapshot)) = cache.as_ref() {
            if *cached_generation == generation {
                return Arc::clone(snapshot);
            }
        }
        let snapshot = Arc::new(store.snapshot());
        *cache = Some((generation, Arc::clone(&snapshot)));
        snapshot
    }
}

impl SnapshotSource for SharedGraphStore {
    fn snapshot(&self) -> Snapshot {
        Snapshot::clone(&self.current_snapshot())
    }
}
