use std::collections::BTreeMap;

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// A sparse `f32` vector with sorted, unique indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    dimension: usize,
    indices: Vec<u32>,
    values: Vec<f32>,
}

impl SparseVector {
    pub fn zeros(dimension: usize) -> Self {
        Self {
            dimension,
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Builds a vector from accumulated `(index, value)` entries, dropping zeros.
    /// Indices must be below `dimension`.
    pub fn from_entries(dimension: usize, entries: BTreeMap<u32, f32>) -> Self {
        let (indices, values) = entries
            .into_iter()
            .filter(|(index, value)| *value != 0.0 && (*index as usize) < dimension)
            .unzip();
        Self {
            dimension,
            indices,
            values,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f32)> + '_ {
        self.indices
            .iter()
            .zip(self.values.iter())
            .map(|(&i, &v)| (i as usize, v))
    }

    pub fn get(&self, index: usize) -> f32 {
        match self.indices.binary_search(&(index as u32)) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    pub fn dot(&self, dense: &ArrayView1<f32>) -> f32 {
        self.iter().map(|(i, v)| v * dense[i]).sum()
    }

    pub fn norm_l1(&self) -> f32 {
        self.values.iter().map(|v| v.abs()).sum()
    }

    pub fn norm_l2(&self) -> f32 {
        self.values.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    pub fn norm_inf(&self) -> f32 {
        self.values.iter().fold(0.0f32, |acc, v| acc.max(v.abs()))
    }

    pub fn scale(&mut self, factor: f32) {
        self.values.iter_mut().for_each(|v| *v *= factor);
    }

    /// Places the parts one after another; the result's dimension is the sum of theirs.
    pub fn concat(parts: &[&SparseVector]) -> Self {
        let mut result = Self::zeros(parts.iter().map(|p| p.dimension).sum());
        let mut offset = 0u32;
        for part in parts {
            result.indices.extend(part.indices.iter().map(|i| i + offset));
            result.values.extend_from_slice(&part.values);
            offset += part.dimension as u32;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    fn vector(dimension: usize, entries: &[(u32, f32)]) -> SparseVector {
        SparseVector::from_entries(dimension, entries.iter().copied().collect())
    }

    #[test]
    fn test_from_entries_drops_zeros() {
        let v = vector(4, &[(3, 2.0), (1, 0.0), (0, 1.0)]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.iter().collect::<Vec<_>>(), vec![(0, 1.0), (3, 2.0)]);
    }

    #[test]
    fn test_concat_offsets_indices() {
        let a = vector(3, &[(2, 1.0)]);
        let b = vector(2, &[(0, 5.0), (1, 6.0)]);
        let joined = SparseVector::concat(&[&a, &b]);

        assert_eq!(joined.dimension(), 5);
        assert_eq!(joined.get(2), 1.0);
        assert_eq!(joined.get(3), 5.0);
        assert_eq!(joined.get(4), 6.0);
        assert_eq!(joined.get(0), 0.0);
    }

    #[test]
    fn test_dot_with_dense() {
        let v = vector(3, &[(0, 2.0), (2, 3.0)]);
        let dense = Array1::from(vec![1.0, 10.0, 100.0]);
        assert_eq!(v.dot(&dense.view()), 302.0);
    }
}
