use thiserror::Error;

/// Errors that can occur during B-tree operations
///
/// Expected outcomes (duplicate insert, absent-key removal) are plain
/// booleans on the operations themselves, not errors.
#[derive(Debug, Clone, Error)]
pub enum BTreeError {
    #[error("Invalid order: {0} (must be >= 2)")]
    InvalidOrder(usize),
}

pub type BTreeResult<T> = Result<T, BTreeError>;
