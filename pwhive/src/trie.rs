use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::error::StoreError;
use crate::store::UniquenessStore;

const ROOT: usize = 0;

#[derive(Debug, Default)]
struct Node {
    // Sorted by byte for binary search.
    children: Vec<(u8, u32)>,
    terminal: bool,
}

#[derive(Debug)]
struct Trie {
    nodes: Vec<Node>,
    entries: usize,
}

impl Trie {
    fn new() -> Self {
        Self { nodes: vec![Node::default()], entries: 0 }
    }

    fn insert(&mut self, key: &[u8]) -> Result<bool, StoreError> {
        let mut at = ROOT;
        for &byte in key {
            let node = self.nodes.get(at).ok_or(StoreError::Corrupt("dangling child index"))?;
            match node.children.binary_search_by_key(&byte, |&(b, _)| b) {
                Ok(pos) => at = node.children[pos].1 as usize,
                Err(pos) => at = self.push_child(at, pos, byte)?,
            }
        }

        let node = self.nodes.get_mut(at).ok_or(StoreError::Corrupt("dangling child index"))?;
        if node.terminal {
            return Ok(false);
        }
        node.terminal = true;
        self.entries += 1;
        Ok(true)
    }

    /// Appends a fresh node and links it under `parent` at sorted position `pos`.
    ///
    /// Both allocations are reserved before anything is modified, so a failure
    /// leaves the trie unchanged.
    fn push_child(&mut self, parent: usize, pos: usize, byte: u8) -> Result<usize, StoreError> {
        let entries = self.entries + 1;
        let exhausted = |_| StoreError::Exhausted { entries };
        let index =
            u32::try_from(self.nodes.len()).map_err(|_| StoreError::Exhausted { entries })?;

        self.nodes.try_reserve(1).map_err(exhausted)?;
        self.nodes[parent].children.try_reserve(1).map_err(exhausted)?;

        self.nodes.push(Node::default());
        self.nodes[parent].children.insert(pos, (byte, index));
        Ok(index as usize)
    }
}

/// Prefix tree over the UTF-8 bytes of each entry, held in a node arena.
///
/// Each operation walks at most `len` nodes, with a binary search over the
/// children at every level. Memory grows one node per previously unseen
/// prefix byte, so shared prefixes are stored once and growth is incremental
/// rather than in table doublings. A single lock guards the whole tree.
#[derive(Debug)]
pub struct TrieStore {
    inner: Mutex<Trie>,
    len: AtomicUsize,
}

impl TrieStore {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Trie::new()), len: AtomicUsize::new(0) }
    }

    /// Number of nodes in the arena, including the root.
    pub fn node_count(&self) -> Result<usize, StoreError> {
        let trie = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(trie.nodes.len())
    }
}

impl Default for TrieStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UniquenessStore for TrieStore {
    fn check_and_insert(&self, candidate: &str) -> Result<bool, StoreError> {
        let mut trie = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        let inserted = trie.insert(candidate.as_bytes())?;
        if inserted {
            self.len.store(trie.entries, Ordering::Relaxed);
        }
        Ok(inserted)
    }

    fn count(&self) -> usize {
        self.len.load(Ordering::Relaxed)
    }
}
