//! Order-B B-tree for sorted-set maintenance
//!
//! This module provides the classic disk-index-style B-tree used by the
//! index layers of storage engines, kept fully in memory. It supports:
//! - Unique keys (duplicate inserts are rejected, not stored twice)
//! - Proactive node splitting on insert, so descent never enters a full node
//! - Sibling borrowing and merging on remove, so descent never enters a
//!   node at the minimum key count
//! - In-order traversal and structural diagnostics (depth, boundary keys,
//!   level-by-level dump)
//!
//! Nodes live in an arena indexed by stable `NodeId`s; parents are tracked
//! implicitly by the recursive call stack rather than stored back-pointers.

mod error;
mod node;

pub use error::{BTreeError, BTreeResult};
pub use node::{BTreeNode, InternalNode, LeafNode, NodeId};

use std::cmp::Ordering;
use std::fmt::Display;

/// Default tree order: non-root nodes hold between 5 and 11 keys
pub const DEFAULT_ORDER: usize = 6;

/// B-tree data structure
///
/// Order `B` means:
/// - Every node holds at most `2B-1` keys
/// - Every non-root node holds at least `B-1` keys
/// - Internal nodes hold exactly one more child than they hold keys
/// - All leaves sit at the same depth
#[derive(Debug)]
pub struct BTree<K> {
    /// Root node ID (None if tree is empty)
    root: Option<NodeId>,

    /// Tree order (minimum child count of non-root internal nodes)
    order: usize,

    /// Node storage
    nodes: Vec<Option<BTreeNode<K>>>,

    /// Free list for recycling slots of merged-away nodes
    free_list: Vec<NodeId>,

    /// Total number of keys in the tree
    key_count: usize,
}

impl<K: Ord> BTree<K> {
    /// Create a new empty B-tree with the given order
    ///
    /// # Arguments
    /// * `order` - The tree order (must be >= 2)
    ///
    /// # Returns
    /// * `Ok(BTree)` - A new empty B-tree
    /// * `Err(BTreeError)` - If the order is invalid
    pub fn new(order: usize) -> BTreeResult<Self> {
        if order < 2 {
            return Err(BTreeError::InvalidOrder(order));
        }

        Ok(Self {
            root: None,
            order,
            nodes: Vec::new(),
            free_list: Vec::new(),
            key_count: 0,
        })
    }

    /// Create a new B-tree with the default order
    pub fn default_order() -> Self {
        Self::new(DEFAULT_ORDER).expect("Default order is valid")
    }

    /// Get the tree order
    pub fn order(&self) -> usize {
        self.order
    }

    /// Check if the tree is empty
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Get the number of keys in the tree
    pub fn len(&self) -> usize {
        self.key_count
    }

    /// Get the number of live nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free_list.len()
    }

    /// Maximum keys per node
    fn max_keys(&self) -> usize {
        2 * self.order - 1
    }

    // ========== Node Management ==========

    /// Allocate a new node, returning its ID
    fn allocate_node(&mut self, node: BTreeNode<K>) -> NodeId {
        if let Some(id) = self.free_list.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            let id = self.nodes.len();
            self.nodes.push(Some(node));
            id
        }
    }

    /// Get a reference to a node by ID
    ///
    /// Reaching a freed slot means the maintenance logic corrupted the
    /// tree, so this fails loudly rather than returning an error.
    fn node(&self, id: NodeId) -> &BTreeNode<K> {
        self.nodes[id].as_ref().expect("node slot is free")
    }

    /// Get a mutable reference to a node by ID
    fn node_mut(&mut self, id: NodeId) -> &mut BTreeNode<K> {
        self.nodes[id].as_mut().expect("node slot is free")
    }

    fn internal(&self, id: NodeId) -> &InternalNode<K> {
        self.node(id).as_internal().expect("expected internal node")
    }

    fn internal_mut(&mut self, id: NodeId) -> &mut InternalNode<K> {
        self.node_mut(id)
            .as_internal_mut()
            .expect("expected internal node")
    }

    fn leaf_mut(&mut self, id: NodeId) -> &mut LeafNode<K> {
        self.node_mut(id).as_leaf_mut().expect("expected leaf node")
    }

    /// Take a node out of the arena, recycling its slot
    fn free_node(&mut self, id: NodeId) -> BTreeNode<K> {
        let node = self.nodes[id].take().expect("node slot is free");
        self.free_list.push(id);
        node
    }

    // ========== Search Operations ==========

    /// Check whether a key is present
    pub fn contains(&self, key: &K) -> bool {
        self.search(key).is_some()
    }

    /// Multiway descent for a key, returning the node and key slot of the
    /// exact hit. Read-only.
    fn search(&self, key: &K) -> Option<(NodeId, usize)> {
        let mut current = self.root?;

        loop {
            let node = self.node(current);
            let idx = node.key_index(key);
            if idx < node.len() && node.keys()[idx] == *key {
                return Some((current, idx));
            }
            match node {
                BTreeNode::Leaf(_) => return None,
                BTreeNode::Internal(n) => current = n.children[idx],
            }
        }
    }

    // ========== Insert Operations ==========

    /// Insert a key into the tree
    ///
    /// Returns `true` if the key was inserted, `false` if it was already
    /// present (the set is left unchanged).
    pub fn insert(&mut self, key: K) -> bool {
        let Some(root_id) = self.root else {
            let id = self.allocate_node(BTreeNode::Leaf(LeafNode::singleton(key)));
            self.root = Some(id);
            self.key_count = 1;
            return true;
        };

        // Grow through the root before descending, so insertion only ever
        // enters non-full nodes. This is the one place height increases.
        let root_id = if self.node(root_id).len() == self.max_keys() {
            let new_root =
                self.allocate_node(BTreeNode::Internal(InternalNode::new(vec![], vec![root_id])));
            self.split_child(new_root, 0);
            self.root = Some(new_root);
            new_root
        } else {
            root_id
        };

        let inserted = self.insert_nonfull(root_id, key);
        if inserted {
            self.key_count += 1;
        }
        inserted
    }

    /// Insert into the subtree at `id`, which is known not to be full
    fn insert_nonfull(&mut self, id: NodeId, key: K) -> bool {
        let mut idx = {
            let node = self.node(id);
            let idx = node.key_index(&key);
            if idx < node.len() && node.keys()[idx] == key {
                return false;
            }
            idx
        };

        if self.node(id).is_leaf() {
            self.leaf_mut(id).keys.insert(idx, key);
            return true;
        }

        if self.node(self.internal(id).children[idx]).len() == self.max_keys() {
            self.split_child(id, idx);
            // The promoted median may be the key itself, or may shift the
            // target child one slot to the right.
            match key.cmp(&self.internal(id).keys[idx]) {
                Ordering::Equal => return false,
                Ordering::Greater => idx += 1,
                Ordering::Less => {}
            }
        }

        let child = self.internal(id).children[idx];
        self.insert_nonfull(child, key)
    }

    /// Split the full child at `parent.children[idx]`, promoting its median
    /// key into the parent (which must have room for it)
    fn split_child(&mut self, parent_id: NodeId, idx: usize) {
        let order = self.order;
        let child_id = self.internal(parent_id).children[idx];

        // The child keeps its lower B-1 keys; the new sibling takes the
        // upper B-1 keys (and upper B children), the median moves up.
        let (median, sibling) = match self.node_mut(child_id) {
            BTreeNode::Leaf(leaf) => {
                debug_assert_eq!(leaf.len(), 2 * order - 1);
                let upper = leaf.keys.split_off(order);
                let median = leaf.keys.pop().expect("full leaf has a median");
                (median, BTreeNode::Leaf(LeafNode::with_keys(upper)))
            }
            BTreeNode::Internal(n) => {
                debug_assert_eq!(n.len(), 2 * order - 1);
                let upper_keys = n.keys.split_off(order);
                let upper_children = n.children.split_off(order);
                let median = n.keys.pop().expect("full node has a median");
                (
                    median,
                    BTreeNode::Internal(InternalNode::new(upper_keys, upper_children)),
                )
            }
        };

        let sibling_id = self.allocate_node(sibling);
        let parent = self.internal_mut(parent_id);
        parent.keys.insert(idx, median);
        parent.children.insert(idx + 1, sibling_id);
    }

    // ========== Remove Operations ==========

    /// Remove a key from the tree
    ///
    /// Returns `true` if the key was removed, `false` if it was absent.
    pub fn remove(&mut self, key: &K) -> bool {
        let Some(root_id) = self.root else {
            return false;
        };

        let removed = self.remove_from(root_id, key);
        if removed {
            self.key_count -= 1;
        }

        // Merging may leave an internal root with no keys: replace it by
        // its sole child (the one way height decreases). Removing the last
        // key leaves an empty root leaf: the tree is empty again.
        let collapse = match self.node(root_id) {
            BTreeNode::Internal(n) if n.is_empty() => Some(Some(n.children[0])),
            BTreeNode::Leaf(leaf) if leaf.is_empty() => Some(None),
            _ => None,
        };
        if let Some(new_root) = collapse {
            self.free_node(root_id);
            self.root = new_root;
        }

        removed
    }

    /// Remove `key` from the subtree at `id`, which is known to hold at
    /// least `order` keys unless it is the root
    fn remove_from(&mut self, id: NodeId, key: &K) -> bool {
        let (idx, found, is_leaf) = {
            let node = self.node(id);
            let idx = node.key_index(key);
            let found = idx < node.len() && node.keys()[idx] == *key;
            (idx, found, node.is_leaf())
        };

        if is_leaf {
            if found {
                self.leaf_mut(id).keys.remove(idx);
            }
            return found;
        }

        if found {
            let (left, right) = {
                let n = self.internal(id);
                (n.children[idx], n.children[idx + 1])
            };

            if self.node(left).len() >= self.order {
                // Substitute the in-order predecessor for the key.
                let pred = self.remove_rightmost(left);
                self.internal_mut(id).keys[idx] = pred;
            } else if self.node(right).len() >= self.order {
                // Substitute the in-order successor.
                let succ = self.remove_leftmost(right);
                self.internal_mut(id).keys[idx] = succ;
            } else {
                // Both neighbors at the minimum: fold them and the key into
                // one node, then delete the key in there.
                self.merge_children(id, idx);
                let merged = self.internal(id).children[idx];
                return self.remove_from(merged, key);
            }
            true
        } else {
            let mut idx = idx;
            let child = self.internal(id).children[idx];
            if self.node(child).len() < self.order {
                idx = self.fix_deficient_child(id, idx);
            }
            let child = self.internal(id).children[idx];
            self.remove_from(child, key)
        }
    }

    /// Remove and return the largest key of the subtree at `id`
    fn remove_rightmost(&mut self, id: NodeId) -> K {
        if self.node(id).is_leaf() {
            return self
                .leaf_mut(id)
                .keys
                .pop()
                .expect("subtree holds at least one key");
        }

        let mut last = self.internal(id).len();
        if self.node(self.internal(id).children[last]).len() < self.order {
            last = self.fix_deficient_child(id, last);
        }
        let child = self.internal(id).children[last];
        self.remove_rightmost(child)
    }

    /// Remove and return the smallest key of the subtree at `id`
    fn remove_leftmost(&mut self, id: NodeId) -> K {
        if self.node(id).is_leaf() {
            let leaf = self.leaf_mut(id);
            debug_assert!(!leaf.is_empty());
            return leaf.keys.remove(0);
        }

        let mut first = 0;
        if self.node(self.internal(id).children[first]).len() < self.order {
            first = self.fix_deficient_child(id, first);
        }
        let child = self.internal(id).children[first];
        self.remove_leftmost(child)
    }

    /// Bring `children[idx]` up to at least `order` keys before removal
    /// descends into it: borrow from a sibling that can lend, otherwise
    /// merge with one. Returns the child's slot afterwards (one to the left
    /// when the child was merged into its left sibling).
    fn fix_deficient_child(&mut self, parent_id: NodeId, idx: usize) -> usize {
        let child_count = self.internal(parent_id).children.len();

        if idx > 0 {
            let left = self.internal(parent_id).children[idx - 1];
            if self.node(left).len() >= self.order {
                self.borrow_from_left(parent_id, idx);
                return idx;
            }
        }

        if idx + 1 < child_count {
            let right = self.internal(parent_id).children[idx + 1];
            if self.node(right).len() >= self.order {
                self.borrow_from_right(parent_id, idx);
                return idx;
            }
        }

        if idx + 1 < child_count {
            self.merge_children(parent_id, idx);
            idx
        } else {
            self.merge_children(parent_id, idx - 1);
            idx - 1
        }
    }

    /// Rotate one key from the right sibling into `children[idx]`: the
    /// parent separator moves down, the sibling's first key moves up, and
    /// for internal nodes the sibling's first child comes along
    fn borrow_from_right(&mut self, parent_id: NodeId, idx: usize) {
        let (child_id, sibling_id) = {
            let n = self.internal(parent_id);
            (n.children[idx], n.children[idx + 1])
        };

        let (first_key, first_child) = match self.node_mut(sibling_id) {
            BTreeNode::Leaf(leaf) => (leaf.keys.remove(0), None),
            BTreeNode::Internal(n) => (n.keys.remove(0), Some(n.children.remove(0))),
        };

        let separator = std::mem::replace(&mut self.internal_mut(parent_id).keys[idx], first_key);

        match self.node_mut(child_id) {
            BTreeNode::Leaf(leaf) => {
                debug_assert!(first_child.is_none());
                leaf.keys.push(separator);
            }
            BTreeNode::Internal(n) => {
                n.keys.push(separator);
                n.children
                    .push(first_child.expect("internal sibling lends a child"));
            }
        }
    }

    /// Mirror of `borrow_from_right`: rotate the left sibling's last key
    /// through the parent separator into the front of `children[idx]`
    fn borrow_from_left(&mut self, parent_id: NodeId, idx: usize) {
        let (child_id, sibling_id) = {
            let n = self.internal(parent_id);
            (n.children[idx], n.children[idx - 1])
        };

        let (last_key, last_child) = match self.node_mut(sibling_id) {
            BTreeNode::Leaf(leaf) => (
                leaf.keys.pop().expect("sibling lends its last key"),
                None,
            ),
            BTreeNode::Internal(n) => (
                n.keys.pop().expect("sibling lends its last key"),
                Some(n.children.pop().expect("internal sibling lends a child")),
            ),
        };

        let separator =
            std::mem::replace(&mut self.internal_mut(parent_id).keys[idx - 1], last_key);

        match self.node_mut(child_id) {
            BTreeNode::Leaf(leaf) => {
                debug_assert!(last_child.is_none());
                leaf.keys.insert(0, separator);
            }
            BTreeNode::Internal(n) => {
                n.keys.insert(0, separator);
                n.children
                    .insert(0, last_child.expect("internal sibling lends a child"));
            }
        }
    }

    /// Fold `children[idx]`, the separator `keys[idx]`, and `children[idx+1]`
    /// into the left child, freeing the right sibling
    fn merge_children(&mut self, parent_id: NodeId, idx: usize) {
        let (separator, right_id) = {
            let parent = self.internal_mut(parent_id);
            let separator = parent.keys.remove(idx);
            let right_id = parent.children.remove(idx + 1);
            (separator, right_id)
        };

        let left_id = self.internal(parent_id).children[idx];
        let right = self.free_node(right_id);

        match (self.node_mut(left_id), right) {
            (BTreeNode::Leaf(left), BTreeNode::Leaf(mut right)) => {
                left.keys.push(separator);
                left.keys.append(&mut right.keys);
            }
            (BTreeNode::Internal(left), BTreeNode::Internal(mut right)) => {
                left.keys.push(separator);
                left.keys.append(&mut right.keys);
                left.children.append(&mut right.children);
            }
            _ => unreachable!("merged siblings must share a kind"),
        }
    }

    // ========== Traversal & Diagnostics ==========

    /// Root-to-leaf edge count, `None` for an empty tree
    pub fn depth(&self) -> Option<usize> {
        let mut current = self.root?;
        let mut depth = 0;

        while let BTreeNode::Internal(n) = self.node(current) {
            current = n.children[0];
            depth += 1;
        }

        Some(depth)
    }

    /// The smallest key in the tree
    pub fn leftmost_key(&self) -> Option<&K> {
        let mut current = self.root?;
        loop {
            match self.node(current) {
                BTreeNode::Leaf(leaf) => return leaf.keys.first(),
                BTreeNode::Internal(n) => current = n.children[0],
            }
        }
    }

    /// The largest key in the tree
    pub fn rightmost_key(&self) -> Option<&K> {
        let mut current = self.root?;
        loop {
            match self.node(current) {
                BTreeNode::Leaf(leaf) => return leaf.keys.last(),
                BTreeNode::Internal(n) => current = n.last_child(),
            }
        }
    }

    /// Visit every key in ascending order, one pass
    pub fn for_each_in_order<F: FnMut(&K)>(&self, mut visit: F) {
        if let Some(root_id) = self.root {
            self.visit_in_order(root_id, &mut visit);
        }
    }

    fn visit_in_order<F: FnMut(&K)>(&self, id: NodeId, visit: &mut F) {
        match self.node(id) {
            BTreeNode::Leaf(leaf) => {
                for key in &leaf.keys {
                    visit(key);
                }
            }
            BTreeNode::Internal(n) => {
                for (i, key) in n.keys.iter().enumerate() {
                    self.visit_in_order(n.children[i], visit);
                    visit(key);
                }
                self.visit_in_order(n.last_child(), visit);
            }
        }
    }
}

impl<K: Ord + Display> BTree<K> {
    /// Render the tree one level per line, each node as `[k1|k2|...]`,
    /// nodes separated by spaces. Debugging aid; the exact format is a
    /// test convenience, not a compatibility contract.
    pub fn format_levels(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        let Some(root_id) = self.root else {
            return out;
        };

        let mut level = vec![root_id];
        while !level.is_empty() {
            let mut next = Vec::new();
            for (i, &id) in level.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let node = self.node(id);
                out.push('[');
                for (j, key) in node.keys().iter().enumerate() {
                    if j > 0 {
                        out.push('|');
                    }
                    let _ = write!(out, "{key}");
                }
                out.push(']');
                if let BTreeNode::Internal(n) = node {
                    next.extend_from_slice(&n.children);
                }
            }
            out.push('\n');
            level = next;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::seq::SliceRandom;
    use std::collections::BTreeSet;

    /// Walk the whole tree, asserting every structural invariant, and
    /// check the walked key count against the tracked length
    fn check_invariants(tree: &BTree<i64>) {
        let Some(root) = tree.root else {
            assert_eq!(tree.len(), 0);
            return;
        };

        let leaf_depth = tree.depth().unwrap();
        let count = check_node(tree, root, 0, leaf_depth, None, None, true);
        assert_eq!(count, tree.len());
    }

    fn check_node(
        tree: &BTree<i64>,
        id: NodeId,
        depth: usize,
        leaf_depth: usize,
        lower: Option<i64>,
        upper: Option<i64>,
        is_root: bool,
    ) -> usize {
        let node = tree.node(id);
        let keys = node.keys();

        assert!(!keys.is_empty(), "live node holds at least one key");
        assert!(keys.len() <= 2 * tree.order - 1, "node over capacity");
        if !is_root {
            assert!(keys.len() >= tree.order - 1, "non-root node underflowed");
        }

        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "keys not strictly sorted");
        }
        if let Some(lo) = lower {
            assert!(keys[0] > lo, "key escapes separator lower bound");
        }
        if let Some(hi) = upper {
            assert!(*keys.last().unwrap() < hi, "key escapes separator upper bound");
        }

        match node {
            BTreeNode::Leaf(_) => {
                assert_eq!(depth, leaf_depth, "leaves at unequal depths");
                keys.len()
            }
            BTreeNode::Internal(n) => {
                assert_eq!(n.children.len(), keys.len() + 1);
                let mut count = keys.len();
                for (i, &child) in n.children.iter().enumerate() {
                    let lo = if i == 0 { lower } else { Some(keys[i - 1]) };
                    let hi = if i == keys.len() { upper } else { Some(keys[i]) };
                    count += check_node(tree, child, depth + 1, leaf_depth, lo, hi, false);
                }
                count
            }
        }
    }

    fn in_order(tree: &BTree<i64>) -> Vec<i64> {
        let mut keys = Vec::new();
        tree.for_each_in_order(|k| keys.push(*k));
        keys
    }

    #[test]
    fn test_new_tree() {
        let tree = BTree::<i64>::new(3).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.order(), 3);
        assert_eq!(tree.depth(), None);
        assert_eq!(tree.leftmost_key(), None);
        assert_eq!(tree.rightmost_key(), None);
        assert_eq!(tree.format_levels(), "");
    }

    #[test]
    fn test_invalid_order() {
        assert!(BTree::<i64>::new(1).is_err());
        assert!(BTree::<i64>::new(0).is_err());
        assert!(BTree::<i64>::new(2).is_ok());
    }

    #[test]
    fn test_default_order() {
        let tree = BTree::<i64>::default_order();
        assert_eq!(tree.order(), DEFAULT_ORDER);
    }

    #[test]
    fn test_single_insert() {
        let mut tree = BTree::new(3).unwrap();

        assert!(tree.insert(42));
        assert!(!tree.is_empty());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.depth(), Some(0));
        assert!(tree.contains(&42));
        assert!(!tree.contains(&41));
    }

    #[test]
    fn test_duplicate_insert_is_idempotent() {
        let mut tree = BTree::new(3).unwrap();

        for key in [5, 1, 9, 3] {
            assert!(tree.insert(key));
        }
        let before = in_order(&tree);

        for key in [5, 1, 9, 3] {
            assert!(!tree.insert(key));
        }
        assert_eq!(tree.len(), 4);
        assert_eq!(in_order(&tree), before);
        check_invariants(&tree);
    }

    #[test]
    fn test_duplicate_on_separator() {
        // 1..=7 at order 2 leaves the last child full ([5|6|7]). Inserting
        // its median again splits that child mid-descent and the key lands
        // exactly on the promoted separator: descent must stop there and
        // report "already present".
        let mut tree = BTree::new(2).unwrap();
        for key in 1..=7 {
            assert!(tree.insert(key));
        }
        let before = in_order(&tree);

        assert!(!tree.insert(6));
        assert_eq!(tree.len(), 7);
        assert_eq!(in_order(&tree), before);
        check_invariants(&tree);
    }

    #[test]
    fn test_sample_scenario_order_3() {
        let mut tree = BTree::new(3).unwrap();

        for key in [18, 26, 15, 16, 42, 70, 57, 93, 22] {
            assert!(tree.insert(key));
        }

        assert_eq!(tree.depth(), Some(1));
        assert_eq!(tree.leftmost_key(), Some(&15));
        assert_eq!(tree.rightmost_key(), Some(&93));
        assert_eq!(in_order(&tree), vec![15, 16, 18, 22, 26, 42, 57, 70, 93]);
        assert_eq!(tree.format_levels(), "[18|57]\n[15|16] [22|26|42] [70|93]\n");
        check_invariants(&tree);
    }

    #[test]
    fn test_sample_scenario_deletions() {
        let mut tree = BTree::new(3).unwrap();
        let keys = [18, 26, 15, 16, 42, 70, 57, 93, 22];
        for key in keys {
            tree.insert(key);
        }

        assert!(tree.remove(&42));
        assert!(tree.remove(&18));
        assert!(!tree.contains(&42));
        assert!(!tree.contains(&18));

        for key in keys {
            if key != 42 && key != 18 {
                assert!(tree.contains(&key), "key {key} lost during removal");
            }
        }
        assert_eq!(tree.len(), 7);
        check_invariants(&tree);
    }

    #[test]
    fn test_remove_absent() {
        let mut tree = BTree::new(2).unwrap();
        assert!(!tree.remove(&7));

        for key in 1..=10 {
            tree.insert(key);
        }
        let before = in_order(&tree);

        assert!(!tree.remove(&42));
        assert!(!tree.remove(&0));
        assert_eq!(tree.len(), 10);
        assert_eq!(in_order(&tree), before);
        check_invariants(&tree);
    }

    #[test]
    fn test_root_collapse() {
        let mut tree = BTree::new(2).unwrap();
        for key in 1..=7 {
            assert!(tree.insert(key));
        }
        assert_eq!(tree.depth(), Some(1));

        // Height stays put while siblings can still lend or fold below a
        // keyed root, and drops exactly when the root empties out.
        for key in [1, 2, 3, 4] {
            assert!(tree.remove(&key));
            assert_eq!(tree.depth(), Some(1));
            check_invariants(&tree);
        }

        assert!(tree.remove(&5));
        assert_eq!(tree.depth(), Some(0));
        assert_eq!(tree.len(), 2);
        assert_eq!(in_order(&tree), vec![6, 7]);
        check_invariants(&tree);
    }

    #[test]
    fn test_remove_until_empty() {
        let mut tree = BTree::new(2).unwrap();
        for key in 1..=15 {
            tree.insert(key);
        }

        for key in 1..=15 {
            assert!(tree.remove(&key));
            check_invariants(&tree);
        }

        assert!(tree.is_empty());
        assert_eq!(tree.len(), 0);
        assert_eq!(tree.depth(), None);
        assert_eq!(tree.node_count(), 0);
    }

    #[test]
    fn test_height_growth() {
        let mut tree = BTree::new(2).unwrap();
        let mut last_depth = 0;

        for key in 1..=40 {
            tree.insert(key);
            let depth = tree.depth().unwrap();
            assert!(depth >= last_depth, "height never shrinks on insert");
            last_depth = depth;
        }

        assert!(last_depth >= 2);
        check_invariants(&tree);
    }

    #[test]
    fn test_fixed_permutation_workload() {
        // A pre-shuffled permutation of 1..=100 and an independently
        // shuffled deletion order, exercising every borrow/merge path at a
        // small order.
        let ins = [
            18, 26, 15, 16, 42, 70, 57, 93, 22, 73, 5, 39, 9, 43, 51, 28, 35, 10, 88, 78, 1, 65,
            29, 98, 100, 81, 31, 40, 8, 92, 44, 90, 55, 47, 19, 12, 54, 45, 32, 68, 38, 46, 2, 62,
            82, 6, 64, 34, 4, 76, 87, 11, 37, 23, 56, 24, 27, 75, 95, 7, 63, 17, 97, 14, 13, 99,
            41, 67, 20, 21, 91, 3, 80, 61, 77, 85, 84, 83, 79, 86, 58, 71, 66, 30, 48, 94, 72, 60,
            89, 69, 50, 49, 33, 59, 36, 25, 52, 53, 96, 74,
        ];
        let del = [
            97, 69, 67, 50, 96, 15, 60, 11, 32, 2, 86, 48, 72, 56, 95, 49, 22, 83, 13, 94, 100, 5,
            33, 12, 89, 73, 52, 64, 41, 85, 59, 25, 6, 54, 36, 44, 39, 61, 18, 46, 63, 42, 35, 77,
            58, 19, 8, 31, 84, 3, 29, 30, 40, 91, 47, 26, 66, 78, 76, 53, 27, 92, 74, 57, 75, 24,
            62, 10, 17, 51, 88, 98, 68, 79, 82, 99, 20, 28, 70, 55, 80, 71, 23, 34, 16, 65, 93, 81,
            21, 4, 87, 90, 43, 45, 7, 38, 37, 9, 1, 14,
        ];

        let mut tree = BTree::new(3).unwrap();
        for key in ins {
            assert!(tree.insert(key));
            check_invariants(&tree);
        }

        assert_eq!(tree.len(), 100);
        assert_eq!(tree.leftmost_key(), Some(&1));
        assert_eq!(tree.rightmost_key(), Some(&100));
        assert_eq!(in_order(&tree), (1..=100).collect::<Vec<_>>());

        for key in del {
            assert!(tree.remove(&key), "key {key} missing at removal");
            assert!(!tree.contains(&key));
            check_invariants(&tree);
        }

        assert!(tree.is_empty());
    }

    #[test]
    fn test_shuffled_stress() {
        let mut rng = rand::thread_rng();
        let mut keys: Vec<i64> = (1..=500).collect();
        keys.shuffle(&mut rng);

        let mut tree = BTree::new(4).unwrap();
        for &key in &keys {
            assert!(tree.insert(key));
        }
        assert_eq!(tree.len(), 500);
        assert_eq!(in_order(&tree), (1..=500).collect::<Vec<_>>());
        check_invariants(&tree);

        let mut victims = keys.clone();
        victims.shuffle(&mut rng);
        victims.truncate(250);
        for key in &victims {
            assert!(tree.remove(key));
        }
        check_invariants(&tree);

        let gone: BTreeSet<i64> = victims.into_iter().collect();
        for key in 1..=500 {
            assert_eq!(tree.contains(&key), !gone.contains(&key));
        }
    }

    #[test]
    fn test_string_keys() {
        let mut tree = BTree::new(2).unwrap();
        for word in ["pear", "apple", "quince", "fig", "mango", "date"] {
            assert!(tree.insert(word.to_string()));
        }

        assert!(tree.contains(&"fig".to_string()));
        assert_eq!(tree.leftmost_key().map(String::as_str), Some("apple"));
        assert_eq!(tree.rightmost_key().map(String::as_str), Some("quince"));

        assert!(tree.remove(&"pear".to_string()));
        assert!(!tree.contains(&"pear".to_string()));
        assert_eq!(tree.len(), 5);
    }

    #[test]
    fn test_format_levels_single_leaf() {
        let mut tree = BTree::new(3).unwrap();
        tree.insert(2);
        tree.insert(1);
        tree.insert(3);
        assert_eq!(tree.format_levels(), "[1|2|3]\n");
    }

    proptest! {
        #[test]
        fn prop_matches_btreeset_model(
            ops in prop::collection::vec((any::<bool>(), 0i64..64), 1..200),
            order in 2usize..6,
        ) {
            let mut tree = BTree::new(order).unwrap();
            let mut model = BTreeSet::new();

            for (is_insert, key) in ops {
                if is_insert {
                    prop_assert_eq!(tree.insert(key), model.insert(key));
                } else {
                    prop_assert_eq!(tree.remove(&key), model.remove(&key));
                }
            }

            check_invariants(&tree);
            prop_assert_eq!(in_order(&tree), model.into_iter().collect::<Vec<_>>());
        }

        #[test]
        fn prop_traversal_sorted_and_complete(
            keys in prop::collection::btree_set(0i64..1000, 0..300),
            order in 2usize..8,
        ) {
            let mut tree = BTree::new(order).unwrap();
            for &key in &keys {
                prop_assert!(tree.insert(key));
            }

            check_invariants(&tree);
            prop_assert_eq!(tree.len(), keys.len());
            prop_assert_eq!(in_order(&tree), keys.into_iter().collect::<Vec<_>>());
        }
    }
}
