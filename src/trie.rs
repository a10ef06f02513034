//! Binary trie over address bits.
//!
//! The trie never sees caller values: nodes store `(prefix, key)` pairs,
//! where the key is a dense synthetic identifier managed by the facade in
//! [`crate::map`]. IPv4 and IPv6 live in fully disjoint subtrees under their
//! own lazily-created roots, so one bit-walk algorithm serves both families.

use std::collections::HashMap;
use std::net::IpAddr;

use ipnet::IpNet;
use smallvec::SmallVec;

use crate::bits::{canonical, AddrBits};

/// Dense synthetic identifier standing in for a de-duplicated value.
pub(crate) type Key = u64;

#[derive(Debug, Default)]
struct TrieNode {
    zero: Option<Box<TrieNode>>,
    one: Option<Box<TrieNode>>,
    value: Option<NodeValue>,
}

/// Terminal binding stored at the node reached by walking the prefix's bits.
#[derive(Debug, Clone, Copy)]
struct NodeValue {
    prefix: IpNet,
    key: Key,
}

impl TrieNode {
    /// A vacant node is detached by pruning; only an empty root may persist.
    #[inline]
    fn is_vacant(&self) -> bool {
        self.value.is_none() && self.zero.is_none() && self.one.is_none()
    }

    #[inline]
    fn child(&self, bit: bool) -> Option<&TrieNode> {
        if bit {
            self.one.as_deref()
        } else {
            self.zero.as_deref()
        }
    }

    #[inline]
    fn child_slot(&mut self, bit: bool) -> &mut Option<Box<TrieNode>> {
        if bit {
            &mut self.one
        } else {
            &mut self.zero
        }
    }
}

/// The key-level trie: one root per family plus reference counts for the
/// keys currently held by nodes.
#[derive(Debug, Default)]
pub(crate) struct PrefixTrie {
    v4_root: Option<Box<TrieNode>>,
    v6_root: Option<Box<TrieNode>>,
    key_refs: HashMap<Key, usize>,
}

impl PrefixTrie {
    /// Binds `prefix` to `key`, creating any missing nodes along the bit
    /// path. Returns the key displaced from the terminal node, if it already
    /// held a binding; the caller decides whether the displaced key is still
    /// referenced anywhere.
    pub(crate) fn insert(&mut self, prefix: IpNet, key: Key) -> Option<Key> {
        let bits = AddrBits::new(prefix.addr());
        let (root, key_refs) = match prefix {
            IpNet::V4(_) => (&mut self.v4_root, &mut self.key_refs),
            IpNet::V6(_) => (&mut self.v6_root, &mut self.key_refs),
        };

        let mut node = root.get_or_insert_with(Default::default);
        let width = bits.width();
        for depth in 0..prefix.prefix_len() {
            let bit = bits.bit(width - 1 - depth);
            node = node.child_slot(bit).get_or_insert_with(Default::default);
        }

        let displaced = node.value.take().map(|old| {
            release(key_refs, old.key);
            old.key
        });
        *key_refs.entry(key).or_insert(0) += 1;
        node.value = Some(NodeValue { prefix, key });
        displaced
    }

    /// Longest-prefix match: the key of the most specific stored prefix
    /// containing `addr`, or `None`. IPv4-mapped IPv6 addresses are matched
    /// against the IPv4 subtree.
    pub(crate) fn get(&self, addr: IpAddr) -> Option<Key> {
        let addr = canonical(addr);
        let mut node = match addr {
            IpAddr::V4(_) => self.v4_root.as_deref()?,
            IpAddr::V6(_) => self.v6_root.as_deref()?,
        };

        let bits = AddrBits::new(addr);
        let width = bits.width();

        // The root may match before any bit is consumed (a /0 binding).
        let mut best: Option<(Key, u8)> = None;
        consider(node, &addr, &mut best);
        for depth in 0..width {
            match node.child(bits.bit(width - 1 - depth)) {
                Some(child) => node = child,
                None => break,
            }
            consider(node, &addr, &mut best);
        }

        best.map(|(key, _)| key)
    }

    /// Removes the binding whose stored prefix is exactly `prefix` (not a
    /// longest match), pruning any nodes left vacant. Returns the unbound
    /// key, or `None` if no exact binding existed.
    pub(crate) fn remove(&mut self, prefix: &IpNet) -> Option<Key> {
        let bits = AddrBits::new(prefix.addr());
        let (root, key_refs) = match prefix {
            IpNet::V4(_) => (&mut self.v4_root, &mut self.key_refs),
            IpNet::V6(_) => (&mut self.v6_root, &mut self.key_refs),
        };

        // The root itself is never detached; `is_empty` accounts for a
        // vacant root.
        let node = root.as_deref_mut()?;
        let removed = remove_at(node, prefix, bits, 0)?;
        release(key_refs, removed);
        Some(removed)
    }

    /// Removes every binding carrying `key`. The prefixes are snapshotted
    /// before the first removal, since removal prunes the structure it is
    /// traversing. Returns the number of bindings removed.
    pub(crate) fn remove_all(&mut self, key: Key) -> usize {
        let mut prefixes: Vec<IpNet> = Vec::new();
        {
            let mut stack: SmallVec<[&TrieNode; 32]> = SmallVec::new();
            if let Some(root) = self.v4_root.as_deref() {
                stack.push(root);
            }
            if let Some(root) = self.v6_root.as_deref() {
                stack.push(root);
            }
            while let Some(node) = stack.pop() {
                if let Some(value) = &node.value {
                    if value.key == key {
                        prefixes.push(value.prefix);
                    }
                }
                if let Some(child) = node.zero.as_deref() {
                    stack.push(child);
                }
                if let Some(child) = node.one.as_deref() {
                    stack.push(child);
                }
            }
        }

        for prefix in &prefixes {
            self.remove(prefix);
        }
        prefixes.len()
    }

    /// Number of nodes currently holding `key`.
    pub(crate) fn ref_count(&self, key: Key) -> usize {
        self.key_refs.get(&key).copied().unwrap_or(0)
    }

    /// True iff each family's root is absent or vacant.
    pub(crate) fn is_empty(&self) -> bool {
        self.v4_root.as_deref().map_or(true, TrieNode::is_vacant)
            && self.v6_root.as_deref().map_or(true, TrieNode::is_vacant)
    }

    #[cfg(test)]
    fn node_count(&self) -> usize {
        fn count(node: &TrieNode) -> usize {
            1 + node.zero.as_deref().map_or(0, count) + node.one.as_deref().map_or(0, count)
        }
        self.v4_root.as_deref().map_or(0, count) + self.v6_root.as_deref().map_or(0, count)
    }
}

#[inline]
fn consider(node: &TrieNode, addr: &IpAddr, best: &mut Option<(Key, u8)>) {
    if let Some(value) = &node.value {
        let len = value.prefix.prefix_len();
        if value.prefix.contains(addr) && best.map_or(true, |(_, best_len)| len > best_len) {
            *best = Some((value.key, len));
        }
    }
}

/// Walks the insert path for `prefix`, removing the exact binding at the
/// terminal node. The call stack is the transient ancestor chain: each frame
/// detaches its child if the removal below left it vacant, so pruning
/// cascades bottom-up and stops at the first node still carrying value or
/// children.
fn remove_at(node: &mut TrieNode, prefix: &IpNet, bits: AddrBits, depth: u8) -> Option<Key> {
    if depth == prefix.prefix_len() {
        return match &node.value {
            Some(held) if held.prefix == *prefix => node.value.take().map(|v| v.key),
            _ => None,
        };
    }

    let bit = bits.bit(bits.width() - 1 - depth);
    let slot = node.child_slot(bit);
    let child = slot.as_deref_mut()?;
    let removed = remove_at(child, prefix, bits, depth + 1)?;
    if child.is_vacant() {
        *slot = None;
    }
    Some(removed)
}

fn release(key_refs: &mut HashMap<Key, usize>, key: Key) {
    if let Some(count) = key_refs.get_mut(&key) {
        *count -= 1;
        if *count == 0 {
            key_refs.remove(&key);
        }
    }
}
