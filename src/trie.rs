// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! An in-memory, ordered key-set: a ternary search tree over byte strings.
//!
//! Used ahead of a dictionary build to hold terms that are still arriving
//! (an [`crate::inverter::Inverter`]'s current in-memory run) before they're
//! sorted and spilled. Unlike `original_source/src/utils/trie.c`'s
//! block-arena-of-raw-pointers design, nodes here live in a flat `Vec` and
//! reference each other by `u32` index — no unsafe, no per-node heap
//! allocation, and the whole tree can be dropped in one deallocation.

use crate::error::{Error, Result};

const NONE: u32 = u32::MAX;

struct Node {
    byte: u8,
    low: u32,
    eq: u32,
    high: u32,
    /// Set only on a node that terminates a key; indexes into `values`.
    value: Option<u32>,
}

/// Where, in the tree, a not-yet-created child node should be linked from.
enum Link {
    Root,
    Low(u32),
    Eq(u32),
    High(u32),
}

/// An ordered set of byte-string keys, optionally each carrying a value.
pub struct Trie<V> {
    nodes: Vec<Node>,
    values: Vec<V>,
    root: u32,
    len: usize,
}

impl<V> Default for Trie<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Trie<V> {
    pub fn new() -> Self {
        Trie {
            nodes: Vec::new(),
            values: Vec::new(),
            root: NONE,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Inserts `key -> value`. Returns the previous value if `key` was
    /// already present (and replaces it). `key` must not be empty.
    pub fn insert(&mut self, key: &[u8], value: V) -> Result<Option<V>> {
        if key.is_empty() {
            return Err(Error::invalid_key("trie keys must not be empty"));
        }
        let mut link = Link::Root;
        let mut cur = self.root;
        let mut i = 0;
        loop {
            if cur == NONE {
                let idx = self.nodes.len() as u32;
                self.nodes.push(Node {
                    byte: key[i],
                    low: NONE,
                    eq: NONE,
                    high: NONE,
                    value: None,
                });
                self.link_child(&link, idx);
                cur = idx;
            }
            let node_byte = self.nodes[cur as usize].byte;
            let byte = key[i];
            if byte < node_byte {
                link = Link::Low(cur);
                cur = self.nodes[cur as usize].low;
            } else if byte > node_byte {
                link = Link::High(cur);
                cur = self.nodes[cur as usize].high;
            } else {
                i += 1;
                if i == key.len() {
                    let slot = self.nodes[cur as usize].value;
                    return Ok(match slot {
                        Some(vidx) => {
                            Some(std::mem::replace(&mut self.values[vidx as usize], value))
                        }
                        None => {
                            let vidx = self.values.len() as u32;
                            self.values.push(value);
                            self.nodes[cur as usize].value = Some(vidx);
                            self.len += 1;
                            None
                        }
                    });
                }
                link = Link::Eq(cur);
                cur = self.nodes[cur as usize].eq;
            }
        }
    }

    fn link_child(&mut self, link: &Link, idx: u32) {
        match *link {
            Link::Root => self.root = idx,
            Link::Low(p) => self.nodes[p as usize].low = idx,
            Link::Eq(p) => self.nodes[p as usize].eq = idx,
            Link::High(p) => self.nodes[p as usize].high = idx,
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&V> {
        let idx = self.find_node(key)?;
        self.nodes[idx].value.map(|vidx| &self.values[vidx as usize])
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    pub fn get_mut(&mut self, key: &[u8]) -> Option<&mut V> {
        let idx = self.find_node(key)?;
        let vidx = self.nodes[idx].value?;
        Some(&mut self.values[vidx as usize])
    }

    fn find_node(&self, key: &[u8]) -> Option<usize> {
        if key.is_empty() {
            return None;
        }
        let mut cur = self.root;
        let mut i = 0;
        while cur != NONE {
            let node = &self.nodes[cur as usize];
            let byte = key[i];
            if byte < node.byte {
                cur = node.low;
            } else if byte > node.byte {
                cur = node.high;
            } else {
                i += 1;
                if i == key.len() {
                    return Some(cur as usize);
                }
                cur = node.eq;
            }
        }
        None
    }

    /// Visits every key greater than or equal to `start_key`, in ascending
    /// order, invoking `cb(key, value)` until it returns `false`.
    pub fn scan(&self, start_key: &[u8], mut cb: impl FnMut(&[u8], &V) -> bool) {
        let mut buf = Vec::new();
        self.scan_from(self.root, start_key, &mut buf, &mut cb);
    }

    /// In-order walk (low, exact match, eq-subtree, high) with a `>=`
    /// filter applied at each candidate key rather than by pruning
    /// subtrees — simpler to get right than position-wise pruning, and the
    /// key-sets this holds (one in-memory indexing run) are small enough
    /// that the extra visits don't matter.
    fn scan_from(
        &self,
        node: u32,
        start_key: &[u8],
        buf: &mut Vec<u8>,
        cb: &mut impl FnMut(&[u8], &V) -> bool,
    ) -> bool {
        if node == NONE {
            return true;
        }
        let (byte, low, eq, high, value) = {
            let n = &self.nodes[node as usize];
            (n.byte, n.low, n.eq, n.high, n.value)
        };

        if !self.scan_from(low, start_key, buf, cb) {
            return false;
        }

        buf.push(byte);
        if let Some(vidx) = value {
            if buf.as_slice() >= start_key && !cb(buf, &self.values[vidx as usize]) {
                buf.pop();
                return false;
            }
        }
        if !self.scan_from(eq, start_key, buf, cb) {
            buf.pop();
            return false;
        }
        buf.pop();

        self.scan_from(high, start_key, buf, cb)
    }
}
