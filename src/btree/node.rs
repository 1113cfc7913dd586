/// Node identifier (index into the tree's node arena)
pub type NodeId = usize;

/// Leaf node: stores keys only
#[derive(Debug, Clone)]
pub struct LeafNode<K> {
    /// Keys (sorted, unique)
    pub keys: Vec<K>,
}

impl<K> LeafNode<K> {
    /// Create a new empty leaf node
    pub fn new() -> Self {
        Self { keys: Vec::new() }
    }

    /// Create a leaf node holding a single key
    pub fn singleton(key: K) -> Self {
        Self { keys: vec![key] }
    }

    /// Create a leaf node with the given keys (assumed sorted)
    pub fn with_keys(keys: Vec<K>) -> Self {
        Self { keys }
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the leaf is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K> Default for LeafNode<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Internal node: stores keys interleaved with child pointers
///
/// `children[i]` roots the subtree of keys strictly between `keys[i-1]` and
/// `keys[i]`, so `children.len() == keys.len() + 1` always holds.
#[derive(Debug, Clone)]
pub struct InternalNode<K> {
    /// Separator keys (sorted, unique)
    pub keys: Vec<K>,
    /// Child node IDs, one more than there are keys
    pub children: Vec<NodeId>,
}

impl<K> InternalNode<K> {
    /// Create a new internal node with the given keys and children
    pub fn new(keys: Vec<K>, children: Vec<NodeId>) -> Self {
        debug_assert_eq!(children.len(), keys.len() + 1);
        Self { keys, children }
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the node holds no keys (only legal transiently, or for an
    /// about-to-collapse root)
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// The rightmost child slot
    pub fn last_child(&self) -> NodeId {
        self.children[self.keys.len()]
    }
}

/// B-tree node (either internal or leaf)
#[derive(Debug, Clone)]
pub enum BTreeNode<K> {
    Leaf(LeafNode<K>),
    Internal(InternalNode<K>),
}

impl<K> BTreeNode<K> {
    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        matches!(self, BTreeNode::Leaf(_))
    }

    /// Number of keys in this node
    pub fn len(&self) -> usize {
        match self {
            BTreeNode::Leaf(node) => node.len(),
            BTreeNode::Internal(node) => node.len(),
        }
    }

    /// Check if this node holds no keys
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The keys of this node, sorted ascending
    pub fn keys(&self) -> &[K] {
        match self {
            BTreeNode::Leaf(node) => &node.keys,
            BTreeNode::Internal(node) => &node.keys,
        }
    }

    /// Get as leaf node mutable reference
    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafNode<K>> {
        match self {
            BTreeNode::Leaf(node) => Some(node),
            BTreeNode::Internal(_) => None,
        }
    }

    /// Get as internal node reference
    pub fn as_internal(&self) -> Option<&InternalNode<K>> {
        match self {
            BTreeNode::Leaf(_) => None,
            BTreeNode::Internal(node) => Some(node),
        }
    }

    /// Get as internal node mutable reference
    pub fn as_internal_mut(&mut self) -> Option<&mut InternalNode<K>> {
        match self {
            BTreeNode::Leaf(_) => None,
            BTreeNode::Internal(node) => Some(node),
        }
    }
}

impl<K: Ord> BTreeNode<K> {
    /// Index of the first key `>=` the probe, which is also the child slot
    /// whose subtree covers the probe.
    ///
    /// For a node holding `[ 3 | 9 | 13 | 27 ]`:
    ///
    /// ```text
    /// key_index(2)  == 0
    /// key_index(10) == 2
    /// key_index(13) == 2
    /// key_index(31) == 4
    /// ```
    pub fn key_index(&self, key: &K) -> usize {
        let keys = self.keys();
        keys.iter().position(|k| k >= key).unwrap_or(keys.len())
    }
}
