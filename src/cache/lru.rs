//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use crate::cache::ContentHash;

/// Handle to a node in the tracker's arena.
pub type NodeId = usize;

#[derive(Debug)]
struct Node {
    key: ContentHash,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Nodes live in an arena and are threaded on a doubly-linked list:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Insert, touch, remove and eviction are all O(1). Freed slots are reused.
#[derive(Debug, Default)]
pub struct LruTracker {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
    head: Option<NodeId>,
    tail: Option<NodeId>,
    len: usize,
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self::default()
    }

    // == Insert ==
    /// Adds a key as the most recently used and returns its handle.
    pub fn insert(&mut self, key: ContentHash) -> NodeId {
        let node = Node {
            key,
            prev: None,
            next: None,
        };
        let id = match self.free.pop() {
            Some(id) => {
                self.nodes[id] = Some(node);
                id
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        self.link_front(id);
        self.len += 1;
        id
    }

    // == Touch ==
    /// Marks a node as recently used (moves to head).
    pub fn touch(&mut self, id: NodeId) {
        if self.head == Some(id) || self.node(id).is_none() {
            return;
        }
        self.unlink(id);
        self.link_front(id);
    }

    // == Remove ==
    /// Removes a node from the tracker, returning its key.
    pub fn remove(&mut self, id: NodeId) -> Option<ContentHash> {
        self.node(id)?;
        self.unlink(id);
        let node = self.nodes.get_mut(id)?.take()?;
        self.free.push(id);
        self.len -= 1;
        Some(node.key)
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<ContentHash> {
        let id = self.tail?;
        self.remove(id)
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&ContentHash> {
        self.tail.and_then(|id| self.node(id)).map(|node| &node.key)
    }

    /// Keys from least to most recently used.
    pub fn keys_oldest_first(&self) -> Vec<ContentHash> {
        let mut keys = Vec::with_capacity(self.len);
        let mut cursor = self.tail;
        while let Some(id) = cursor {
            match self.node(id) {
                Some(node) => {
                    keys.push(node.key.clone());
                    cursor = node.prev;
                }
                None => break,
            }
        }
        keys
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id).and_then(Option::as_mut)
    }

    fn unlink(&mut self, id: NodeId) {
        let (prev, next) = match self.node(id) {
            Some(node) => (node.prev, node.next),
            None => return,
        };

        match prev {
            Some(p) => {
                if let Some(node) = self.node_mut(p) {
                    node.next = next;
                }
            }
            None => self.head = next,
        }
        match next {
            Some(n) => {
                if let Some(node) = self.node_mut(n) {
                    node.prev = prev;
                }
            }
            None => self.tail = prev,
        }

        if let Some(node) = self.node_mut(id) {
            node.prev = None;
            node.next = None;
        }
    }

    fn link_front(&mut self, id: NodeId) {
        let old_head = self.head;
        match self.node_mut(id) {
            Some(node) => {
                node.prev = None;
                node.next = old_head;
            }
            None => return,
        }

        match old_head {
            Some(h) => {
                if let Some(node) = self.node_mut(h) {
                    node.prev = Some(id);
                }
            }
            None => self.tail = Some(id),
        }
        self.head = Some(id);
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> ContentHash {
        ContentHash::from(s)
    }

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.len(), 0);
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_insert_order() {
        let mut lru = LruTracker::new();

        lru.insert(key("key1"));
        lru.insert(key("key2"));
        lru.insert(key("key3"));

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some(&key("key1")));
        assert_eq!(
            lru.keys_oldest_first(),
            vec![key("key1"), key("key2"), key("key3")]
        );
    }

    #[test]
    fn test_lru_touch_moves_to_head() {
        let mut lru = LruTracker::new();

        let a = lru.insert(key("a"));
        lru.insert(key("b"));
        lru.insert(key("c"));

        lru.touch(a);

        assert_eq!(lru.peek_oldest(), Some(&key("b")));
        assert_eq!(lru.evict_oldest(), Some(key("b")));
        assert_eq!(lru.evict_oldest(), Some(key("c")));
        assert_eq!(lru.evict_oldest(), Some(key("a")));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_touch_head_is_noop() {
        let mut lru = LruTracker::new();

        lru.insert(key("a"));
        let b = lru.insert(key("b"));
        lru.touch(b);
        lru.touch(b);

        assert_eq!(lru.keys_oldest_first(), vec![key("a"), key("b")]);
    }

    #[test]
    fn test_lru_order_after_multiple_touches() {
        let mut lru = LruTracker::new();

        let a = lru.insert(key("a"));
        let b = lru.insert(key("b"));
        let c = lru.insert(key("c"));

        lru.touch(a);
        lru.touch(c);
        lru.touch(b);

        // [a] -> [b a] -> [c b a] -> [a c b] -> [c a b] -> [b c a], tail = a
        assert_eq!(lru.evict_oldest(), Some(key("a")));
        assert_eq!(lru.evict_oldest(), Some(key("c")));
        assert_eq!(lru.evict_oldest(), Some(key("b")));
    }

    #[test]
    fn test_lru_remove_middle() {
        let mut lru = LruTracker::new();

        lru.insert(key("key1"));
        let mid = lru.insert(key("key2"));
        lru.insert(key("key3"));

        assert_eq!(lru.remove(mid), Some(key("key2")));
        assert_eq!(lru.len(), 2);
        assert_eq!(lru.keys_oldest_first(), vec![key("key1"), key("key3")]);
    }

    #[test]
    fn test_lru_remove_twice_is_none() {
        let mut lru = LruTracker::new();

        let id = lru.insert(key("key1"));
        assert!(lru.remove(id).is_some());
        assert_eq!(lru.remove(id), None);
        assert_eq!(lru.remove(999), None);
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_evict_empty() {
        let mut lru = LruTracker::new();
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_reuses_freed_slots() {
        let mut lru = LruTracker::new();

        let first = lru.insert(key("a"));
        lru.insert(key("b"));
        lru.remove(first);

        let reused = lru.insert(key("c"));
        assert_eq!(reused, first);
        assert_eq!(lru.keys_oldest_first(), vec![key("b"), key("c")]);
    }

    #[test]
    fn test_lru_single_node_remove_resets_ends() {
        let mut lru = LruTracker::new();

        let only = lru.insert(key("only"));
        lru.remove(only);
        lru.insert(key("next"));

        assert_eq!(lru.peek_oldest(), Some(&key("next")));
        assert_eq!(lru.keys_oldest_first(), vec![key("next")]);
    }
}
