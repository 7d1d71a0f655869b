//! Sparse term-weight vectors keyed by vocabulary index.

use serde::{Deserialize, Serialize};

/// A sparse vector stored as `[index, weight]` pairs in ascending index
/// order, holding only non-zero weights.
///
/// Memory is proportional to the number of distinct terms in the passage,
/// not to the vocabulary size.
///
/// # Examples
///
/// ```
/// use vitae_index::sparse::SparseVector;
///
/// let a = SparseVector::from_unsorted(vec![(2, 1.0), (0, 3.0), (5, 0.0)]);
/// assert_eq!(a.entries(), &[(0, 3.0), (2, 1.0)]);
///
/// let b = SparseVector::from_unsorted(vec![(0, 2.0), (7, 4.0)]);
/// assert_eq!(a.dot(&b), 6.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseVector(Vec<(u32, f64)>);

impl SparseVector {
    /// Build from pairs in any order; zero weights are discarded.
    ///
    /// Duplicate indices are not merged; callers aggregate first.
    pub fn from_unsorted(mut entries: Vec<(u32, f64)>) -> Self {
        entries.retain(|&(_, w)| w != 0.0);
        entries.sort_by_key(|&(i, _)| i);
        Self(entries)
    }

    /// The `(index, weight)` pairs in ascending index order.
    pub fn entries(&self) -> &[(u32, f64)] {
        &self.0
    }

    /// Number of non-zero entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the vector has no non-zero entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Euclidean norm.
    pub fn norm(&self) -> f64 {
        self.0.iter().map(|&(_, w)| w * w).sum::<f64>().sqrt()
    }

    /// Dot product by merge-join over the two sorted entry lists.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut a, mut b) = (self.0.iter().peekable(), other.0.iter().peekable());
        let mut sum = 0.0;
        while let (Some(&&(ia, wa)), Some(&&(ib, wb))) = (a.peek(), b.peek()) {
            match ia.cmp(&ib) {
                std::cmp::Ordering::Less => {
                    a.next();
                }
                std::cmp::Ordering::Greater => {
                    b.next();
                }
                std::cmp::Ordering::Equal => {
                    sum += wa * wb;
                    a.next();
                    b.next();
                }
            }
        }
        sum
    }

    /// Cosine similarity given both norms; zero when either norm is zero.
    pub fn cosine(&self, self_norm: f64, other: &SparseVector, other_norm: f64) -> f64 {
        let denom = self_norm * other_norm;
        if denom == 0.0 {
            return 0.0;
        }
        self.dot(other) / denom
    }
}
