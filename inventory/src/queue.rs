use crate::{metrics::Metrics, Config, Duplicate, Error};
use prometheus_client::registry::Registry;
use slab::Slab;
use std::{
    collections::{hash_map::Entry, HashMap},
    fmt::Debug,
    hash::Hash,
};
use tracing::{debug, trace};

/// Panic message shown when a key referenced by the requester index has no queue.
const MISSING_KEY: &str = "indexed key has no queue";

/// Panic message shown when a slab key referenced by either index has no node.
const MISSING_NODE: &str = "indexed node is missing";

/// A requester waiting to be asked for a key.
struct Node<R> {
    requester: R,
    prev: Option<usize>,
    next: Option<usize>,
}

/// The (non-empty) list of requesters queued for a key, oldest first.
struct List {
    head: usize,
    tail: usize,
    len: usize,
}

/// Tracks, for each key, the requesters that can supply it (in the order they announced it)
/// and, for each requester, the keys it is queued for.
///
/// Nodes are stored in a [Slab] and each key's requesters form a doubly linked list of slab
/// keys. The requester index stores the slab key of each of its nodes, so a node can be
/// unlinked from either side without searching.
pub struct RequestQueue<K: Eq + Hash + Clone + Debug, R: Eq + Hash + Clone + Debug> {
    duplicate: Duplicate,

    nodes: Slab<Node<R>>,

    // Only keys with at least one queued requester are present
    keys: HashMap<K, List>,

    // Requesters stay present (possibly with no keys) until forgotten
    requesters: HashMap<R, HashMap<K, usize>>,

    metrics: Metrics,
}

impl<K: Eq + Hash + Clone + Debug, R: Eq + Hash + Clone + Debug> Default for RequestQueue<K, R> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<K: Eq + Hash + Clone + Debug, R: Eq + Hash + Clone + Debug> RequestQueue<K, R> {
    /// Create an empty queue.
    pub fn new(cfg: Config) -> Self {
        Self {
            duplicate: cfg.duplicate,
            nodes: Slab::with_capacity(cfg.pending_capacity),
            keys: HashMap::with_capacity(cfg.key_capacity),
            requesters: HashMap::with_capacity(cfg.requester_capacity),
            metrics: Metrics::default(),
        }
    }

    /// Register the queue's metrics in the provided registry.
    pub fn register(&self, registry: &mut Registry) {
        self.metrics.register(registry);
    }

    /// Queue `requester` behind all requesters already queued for `key`.
    ///
    /// Returns the number of distinct keys with queued requesters after the call.
    pub fn enqueue(&mut self, key: K, requester: R) -> usize {
        let existing = self
            .requesters
            .get(&requester)
            .and_then(|queued| queued.get(&key))
            .copied();
        if let Some(handle) = existing {
            self.metrics.duplicates.inc();
            match self.duplicate {
                Duplicate::Ignore => {
                    trace!(?key, ?requester, "ignored duplicate");
                    return self.keys.len();
                }
                Duplicate::MoveToTail => {
                    // The requester index entry is overwritten below
                    self.unlink(&key, handle);
                }
            }
        }

        // Append to the tail of the key's list
        let handle = self.nodes.insert(Node {
            requester: requester.clone(),
            prev: None,
            next: None,
        });
        match self.keys.entry(key.clone()) {
            Entry::Occupied(mut entry) => {
                let list = entry.get_mut();
                self.nodes[handle].prev = Some(list.tail);
                self.nodes[list.tail].next = Some(handle);
                list.tail = handle;
                list.len += 1;
            }
            Entry::Vacant(entry) => {
                entry.insert(List {
                    head: handle,
                    tail: handle,
                    len: 1,
                });
            }
        }
        let keys = self.keys.len();
        trace!(?key, ?requester, keys, "enqueued");
        self.requesters
            .entry(requester)
            .or_default()
            .insert(key, handle);

        self.metrics.enqueued.inc();
        self.update();
        keys
    }

    /// Remove and return the requester that has been queued for `key` the longest.
    ///
    /// The requester remains registered even if it is no longer queued for any key.
    pub fn dequeue_best(&mut self, key: &K) -> Result<R, Error> {
        let Some(list) = self.keys.get(key) else {
            self.metrics.misses.inc();
            return Err(Error::NotFound);
        };
        let head = list.head;
        let requester = self.unlink(key, head);
        if let Some(queued) = self.requesters.get_mut(&requester) {
            queued.remove(key);
        }
        trace!(?key, ?requester, "dequeued");

        self.metrics.dequeued.inc();
        self.update();
        Ok(requester)
    }

    /// Drop all requesters queued for `key`.
    ///
    /// Requesters remain registered even if they are no longer queued for any key.
    pub fn clear(&mut self, key: &K) {
        let Some(list) = self.keys.remove(key) else {
            return;
        };
        let mut cursor = Some(list.head);
        while let Some(handle) = cursor {
            let Some(node) = self.nodes.try_remove(handle) else {
                unreachable!("{MISSING_NODE}");
            };
            if let Some(queued) = self.requesters.get_mut(&node.requester) {
                queued.remove(key);
            }
            cursor = node.next;
        }
        debug!(?key, requesters = list.len, "cleared");

        self.metrics.cleared.inc();
        self.update();
    }

    /// Drop `requester` and remove it from the queue of every key it was queued for.
    ///
    /// Any key left with no queued requesters is removed.
    pub fn forget(&mut self, requester: &R) {
        let Some(queued) = self.requesters.remove(requester) else {
            return;
        };
        let keys = queued.len();
        for (key, handle) in queued {
            self.unlink(&key, handle);
        }
        debug!(?requester, keys, "forgot requester");

        self.metrics.forgotten.inc();
        self.update();
    }

    /// Clear every key for which `predicate` returns `false`.
    pub fn retain(&mut self, predicate: impl Fn(&K) -> bool) {
        let dropped: Vec<K> = self
            .keys
            .keys()
            .filter(|key| !predicate(*key))
            .cloned()
            .collect();
        if dropped.is_empty() {
            return;
        }
        debug!(keys = dropped.len(), "retaining keys");
        for key in dropped.iter() {
            self.clear(key);
        }
    }

    /// Returns the requester [Self::dequeue_best] would select for `key` (without removing it).
    pub fn peek_best(&self, key: &K) -> Option<&R> {
        let list = self.keys.get(key)?;
        Some(&self.nodes[list.head].requester)
    }

    /// Iterate over the requesters queued for `key`, oldest first.
    pub fn iter_key(&self, key: &K) -> impl Iterator<Item = &R> + '_ {
        let head = self.keys.get(key).map(|list| list.head);
        std::iter::successors(head, move |handle| self.nodes[*handle].next)
            .map(move |handle| &self.nodes[handle].requester)
    }

    /// Iterate over the keys `requester` is queued for (in no particular order).
    pub fn iter_requester(&self, requester: &R) -> impl Iterator<Item = &K> + '_ {
        self.requesters
            .get(requester)
            .into_iter()
            .flat_map(|queued| queued.keys())
    }

    /// Returns the number of keys with at least one queued requester.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no key has a queued requester.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of registered requesters (including those with nothing queued).
    pub fn requesters(&self) -> usize {
        self.requesters.len()
    }

    /// Returns the number of queued `(key, requester)` pairs.
    pub fn pending(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if at least one requester is queued for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains_key(key)
    }

    /// Returns `true` if `requester` has been enqueued and not yet forgotten.
    pub fn is_registered(&self, requester: &R) -> bool {
        self.requesters.contains_key(requester)
    }

    /// Returns the number of keys `requester` is queued for, or `None` if it is not registered.
    pub fn queued(&self, requester: &R) -> Option<usize> {
        self.requesters.get(requester).map(|queued| queued.len())
    }

    /// Returns the number of requesters queued for `key`.
    pub fn waiting(&self, key: &K) -> usize {
        self.keys.get(key).map_or(0, |list| list.len)
    }

    /// Remove the node at `handle` from the list of `key`, removing `key` if the list becomes
    /// empty, and return its requester.
    ///
    /// The caller is responsible for the requester index.
    fn unlink(&mut self, key: &K, handle: usize) -> R {
        let Some(node) = self.nodes.try_remove(handle) else {
            unreachable!("{MISSING_NODE}");
        };
        let Some(list) = self.keys.get_mut(key) else {
            unreachable!("{MISSING_KEY}");
        };
        list.len -= 1;
        if list.len == 0 {
            self.keys.remove(key);
            return node.requester;
        }
        match node.prev {
            Some(prev) => self.nodes[prev].next = node.next,
            None => {
                if let Some(next) = node.next {
                    list.head = next;
                }
            }
        }
        match node.next {
            Some(next) => self.nodes[next].prev = node.prev,
            None => {
                if let Some(prev) = node.prev {
                    list.tail = prev;
                }
            }
        }
        node.requester
    }

    fn update(&self) {
        self.metrics.keys.set(self.keys.len() as i64);
        self.metrics.requesters.set(self.requesters.len() as i64);
        self.metrics.pending.set(self.nodes.len() as i64);
    }
}
