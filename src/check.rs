use crate::bt::Node;
use std::{error::Error, fmt};

/// Structural fault reported by [`crate::bt::BTMap::check`].
///
/// Depth is counted from the root, which is at depth 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    /// Keys in a node are not strictly increasing.
    Unsorted {
        /// Depth of the node.
        depth: usize,
    },
    /// A non-root node holds fewer than M/2 elements.
    Underfull {
        /// Depth of the node.
        depth: usize,
        /// Elements held.
        len: usize,
    },
    /// A node holds M or more elements.
    Overfull {
        /// Depth of the node.
        depth: usize,
        /// Elements held.
        len: usize,
    },
    /// An internal node does not have one more child than elements.
    ChildCount {
        /// Depth of the node.
        depth: usize,
        /// Elements held.
        elements: usize,
        /// Children held.
        children: usize,
    },
    /// Leaves found at different depths.
    UnevenLeaves {
        /// Depth of the first leaf seen.
        expected: usize,
        /// Depth of the offending leaf.
        found: usize,
    },
    /// A key lies outside the range given by its parent's separating keys.
    OutOfRange {
        /// Depth of the node.
        depth: usize,
    },
    /// The stored length does not match the number of elements in the tree.
    LenMismatch {
        /// Stored length.
        len: usize,
        /// Elements counted.
        counted: usize,
    },
}

impl fmt::Display for CheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CheckError::Unsorted { depth } => write!(f, "keys out of order at depth {depth}"),
            CheckError::Underfull { depth, len } => {
                write!(f, "node at depth {depth} holds only {len} elements")
            }
            CheckError::Overfull { depth, len } => {
                write!(f, "node at depth {depth} holds {len} elements")
            }
            CheckError::ChildCount {
                depth,
                elements,
                children,
            } => write!(
                f,
                "node at depth {depth} has {elements} elements but {children} children"
            ),
            CheckError::UnevenLeaves { expected, found } => {
                write!(f, "leaf at depth {found}, expected depth {expected}")
            }
            CheckError::OutOfRange { depth } => {
                write!(f, "key outside parent range at depth {depth}")
            }
            CheckError::LenMismatch { len, counted } => {
                write!(f, "length is {len} but tree holds {counted} elements")
            }
        }
    }
}

impl Error for CheckError {}

impl<K: Ord, V, const M: usize> Node<K, V, M> {
    /// Check this subtree, all keys must lie strictly between lo and hi.
    /// Returns the number of elements in the subtree.
    pub(crate) fn check(
        &self,
        depth: usize,
        lo: Option<&K>,
        hi: Option<&K>,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize, CheckError> {
        let len = self.v.len();
        if len >= M {
            return Err(CheckError::Overfull { depth, len });
        }
        if depth > 0 && len < Self::D {
            return Err(CheckError::Underfull { depth, len });
        }
        if self.v.windows(2).any(|w| w[0].0 >= w[1].0) {
            return Err(CheckError::Unsorted { depth });
        }
        if let (Some(lo), Some(first)) = (lo, self.v.first()) {
            if &first.0 <= lo {
                return Err(CheckError::OutOfRange { depth });
            }
        }
        if let (Some(hi), Some(last)) = (hi, self.v.last()) {
            if &last.0 >= hi {
                return Err(CheckError::OutOfRange { depth });
            }
        }

        if self.is_leaf() {
            match *leaf_depth {
                Some(expected) if expected != depth => {
                    return Err(CheckError::UnevenLeaves {
                        expected,
                        found: depth,
                    });
                }
                Some(_) => {}
                None => *leaf_depth = Some(depth),
            }
            return Ok(len);
        }

        if self.c.len() != len + 1 {
            return Err(CheckError::ChildCount {
                depth,
                elements: len,
                children: self.c.len(),
            });
        }
        let mut count = len;
        for (i, c) in self.c.iter().enumerate() {
            let clo = if i == 0 { lo } else { Some(&self.v[i - 1].0) };
            let chi = if i == len { hi } else { Some(&self.v[i].0) };
            count += c.check(depth + 1, clo, chi, leaf_depth)?;
        }
        Ok(count)
    }
}
