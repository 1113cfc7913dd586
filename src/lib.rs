//! In-memory order-B B-tree, the index-layer data structure of a storage
//! engine, packaged as a standalone sorted-set library.
//!
//! The tree keeps unique keys in sorted order with guaranteed logarithmic
//! depth: inserts split full nodes on the way down, removals borrow from or
//! merge with siblings before descending, so no recursive step ever has to
//! back up and repair an ancestor.

pub mod btree;

pub use btree::{
    BTree, BTreeError, BTreeNode, BTreeResult, DEFAULT_ORDER, InternalNode, LeafNode, NodeId,
};
