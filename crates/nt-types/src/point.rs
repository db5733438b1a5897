//! Points in a discrete search space.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::PointError;

/// One fully-specified candidate: a value index per dimension.
///
/// Points are plain values. The search loop creates and drops them every
/// iteration, and the landscape only ever hands out copies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Point(Vec<usize>);

impl Point {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    /// Number of dimensions.
    pub fn dims(&self) -> usize {
        self.0.len()
    }

    /// Index chosen at dimension `dim`.
    ///
    /// # Panics
    /// Panics if `dim` is out of range.
    pub fn get(&self, dim: usize) -> usize {
        self.0[dim]
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Copy of this point with dimension `dim` set to `index`.
    pub fn with(&self, dim: usize, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices[dim] = index;
        Self(indices)
    }

    /// Values of this point restricted to `dims`, in the order given.
    pub fn project(&self, dims: &[usize]) -> Vec<usize> {
        dims.iter().map(|&d| self.0[d]).collect()
    }

    /// Number of coordinates at which the two points differ.
    pub fn hamming(&self, other: &Point) -> usize {
        self.0
            .iter()
            .zip(&other.0)
            .filter(|(a, b)| a != b)
            .count()
            + self.0.len().abs_diff(other.0.len())
    }

    /// Check this point against per-dimension cardinalities.
    pub fn check_bounds(&self, n_values: &[usize]) -> Result<(), PointError> {
        if self.0.len() != n_values.len() {
            return Err(PointError::DimensionMismatch {
                expected: n_values.len(),
                actual: self.0.len(),
            });
        }
        for (dim, (&index, &n)) in self.0.iter().zip(n_values).enumerate() {
            if index >= n {
                return Err(PointError::IndexOutOfRange {
                    dim,
                    index,
                    n_values: n,
                });
            }
        }
        Ok(())
    }
}

impl From<Vec<usize>> for Point {
    fn from(indices: Vec<usize>) -> Self {
        Self(indices)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_changes_single_coordinate() {
        let p = Point::new(vec![1, 2, 3]);
        let q = p.with(1, 0);
        assert_eq!(q.indices(), &[1, 0, 3]);
        assert_eq!(p.hamming(&q), 1);
        // original untouched
        assert_eq!(p.get(1), 2);
    }

    #[test]
    fn test_project() {
        let p = Point::new(vec![4, 5, 6, 7]);
        assert_eq!(p.project(&[0, 2]), vec![4, 6]);
        assert_eq!(p.project(&[3]), vec![7]);
    }

    #[test]
    fn test_check_bounds() {
        let p = Point::new(vec![0, 4]);
        assert!(p.check_bounds(&[2, 5]).is_ok());
        assert_eq!(
            p.check_bounds(&[2, 4]),
            Err(PointError::IndexOutOfRange {
                dim: 1,
                index: 4,
                n_values: 4
            })
        );
        assert_eq!(
            p.check_bounds(&[2]),
            Err(PointError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn test_display_and_serde() {
        let p = Point::new(vec![3, 0, 1]);
        assert_eq!(p.to_string(), "[3, 0, 1]");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "[3,0,1]");
        let back: Point = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
    }
}
