//! Value-typed facade over the key-level trie.
//!
//! Values are de-duplicated through a bidirectional registry: the trie only
//! ever stores a dense `u64` key, so a value bound to many prefixes is held
//! once, however many nodes point at it. The registry and the trie are
//! guarded together by a single reader/writer lock, so no reader observes a
//! partially-applied mutation.

use std::collections::HashMap;
use std::hash::Hash;
use std::net::IpAddr;

use ipnet::IpNet;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::trie::{Key, PrefixTrie};

/// A longest-prefix-match map from IP prefixes to values of type `V`.
///
/// Matches an [`IpAddr`] to the most specific registered prefix containing
/// it and returns the associated value. IPv4 and IPv6 prefixes occupy
/// disjoint address spaces; an IPv4-mapped IPv6 query address is matched
/// against the IPv4 space.
///
/// All methods take `&self`; the map is safe for arbitrary concurrent use.
/// Mutations acquire the internal lock exclusively, lookups share it.
pub struct PrefixMap<V> {
    inner: RwLock<Inner<V>>,
}

struct Inner<V> {
    trie: PrefixTrie,
    key_to_value: HashMap<Key, V>,
    value_to_key: HashMap<V, Key>,
    /// Strictly monotonic; keys are never reused after eviction.
    next_key: Key,
}

impl<V> PrefixMap<V>
where
    V: Clone + Eq + Hash,
{
    /// Creates an empty map.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner {
                trie: PrefixTrie::default(),
                key_to_value: HashMap::new(),
                value_to_key: HashMap::new(),
                next_key: 0,
            }),
        }
    }

    /// Binds `prefix` to `value`. An existing binding at the identical
    /// prefix is replaced; a value left without any binding by the
    /// replacement is dropped from the registry.
    pub fn insert(&self, prefix: IpNet, value: V) {
        let mut inner = self.inner.write();
        let key = inner.resolve_or_create(value);
        let displaced = inner.trie.insert(prefix, key);
        trace!(%prefix, key, "bound prefix");
        if let Some(old) = displaced {
            inner.evict_if_unreferenced(old);
        }
    }

    /// Returns the value of the longest registered prefix containing
    /// `addr`, or `None` if no prefix of that family contains it.
    pub fn get(&self, addr: IpAddr) -> Option<V> {
        let inner = self.inner.read();
        let key = inner.trie.get(addr)?;
        inner.key_to_value.get(&key).cloned()
    }

    /// Removes the binding at exactly `prefix` (not a longest match).
    /// Returns true iff such a binding existed and was deleted.
    pub fn remove(&self, prefix: &IpNet) -> bool {
        let mut inner = self.inner.write();
        match inner.trie.remove(prefix) {
            Some(key) => {
                debug!(%prefix, key, "removed prefix binding");
                inner.evict_if_unreferenced(key);
                true
            }
            None => false,
        }
    }

    /// Removes every prefix bound to `value`. No-op if the value was never
    /// inserted.
    pub fn remove_value(&self, value: &V) {
        let mut inner = self.inner.write();
        let key = match inner.value_to_key.get(value) {
            Some(&key) => key,
            None => return,
        };
        let removed = inner.trie.remove_all(key);
        debug!(key, removed, "removed all bindings for value");
        inner.key_to_value.remove(&key);
        inner.value_to_key.remove(value);
    }

    /// True iff the map holds no bindings.
    pub fn is_empty(&self) -> bool {
        self.inner.read().trie.is_empty()
    }

    /// Number of registry entries, for registry-hygiene assertions.
    #[cfg(test)]
    pub(crate) fn registry_sizes(&self) -> (usize, usize) {
        let inner = self.inner.read();
        (inner.key_to_value.len(), inner.value_to_key.len())
    }
}

impl<V> Default for PrefixMap<V>
where
    V: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Inner<V>
where
    V: Clone + Eq + Hash,
{
    fn resolve_or_create(&mut self, value: V) -> Key {
        if let Some(&key) = self.value_to_key.get(&value) {
            return key;
        }
        let key = self.next_key;
        self.next_key += 1;
        self.value_to_key.insert(value.clone(), key);
        self.key_to_value.insert(key, value);
        trace!(key, "registered value");
        key
    }

    /// Drops a key from both registry directions once no trie node holds it.
    /// The value must be fetched before the forward entry goes away.
    fn evict_if_unreferenced(&mut self, key: Key) {
        if self.trie.ref_count(key) > 0 {
            return;
        }
        if let Some(value) = self.key_to_value.remove(&key) {
            self.value_to_key.remove(&value);
            debug!(key, "evicted unreferenced value");
        }
    }
}
