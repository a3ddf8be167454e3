// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Dense per-document weight vectors and their pairwise set-algebra.
//!
//! A `WeightVector` operates on scores that have already been reduced to
//! one float per document by earlier posting-list merges — deliberately the
//! simplest component in the crate, per spec.md §4.6.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// A dense array of 32-bit floats indexed by document id, with the owned-
/// vs-mapped duality spec.md §3 requires captured by `Cow` instead of a
/// hand-written enum: an owned vector is `Cow::Owned`, one backed by a
/// memory-mapped posting/weight file (read through as `&'static [f32]` by
/// the caller, who owns the mapping) is `Cow::Borrowed`.
#[derive(Debug, Clone)]
pub struct WeightVector {
    weights: Cow<'static, [f32]>,
}

impl WeightVector {
    /// An owned, all-zero vector sized for `doc_count` documents (document
    /// ids `0..doc_count`; callers using 1-based `DocId`s should size for
    /// `max_doc_id + 1` and leave slot 0 unused).
    pub fn zeroed(doc_count: usize) -> Self {
        WeightVector {
            weights: Cow::Owned(vec![0.0; doc_count]),
        }
    }

    pub fn from_owned(weights: Vec<f32>) -> Self {
        WeightVector {
            weights: Cow::Owned(weights),
        }
    }

    /// Wraps a borrowed (e.g. memory-mapped) slice without copying it.
    pub fn from_borrowed(weights: &'static [f32]) -> Self {
        WeightVector {
            weights: Cow::Borrowed(weights),
        }
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.weights, Cow::Owned(_))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn get(&self, doc_id: u32) -> f32 {
        self.weights.get(doc_id as usize).copied().unwrap_or(0.0)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }

    fn zip_with(&self, other: &WeightVector, f: impl Fn(f32, f32) -> f32) -> Result<WeightVector> {
        if self.len() != other.len() {
            return Err(Error::invalid_length(format!(
                "weight vectors of length {} and {} cannot be combined",
                self.len(),
                other.len()
            )));
        }
        let combined = self
            .weights
            .iter()
            .zip(other.weights.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Ok(WeightVector::from_owned(combined))
    }

    /// Pairwise minimum: a document survives (non-zero) only where both
    /// inputs are non-zero.
    pub fn and(&self, other: &WeightVector) -> Result<WeightVector> {
        self.zip_with(other, |a, b| if a == 0.0 || b == 0.0 { 0.0 } else { a.min(b) })
    }

    /// Pairwise sum: a document's weight is the total of both inputs.
    pub fn or(&self, other: &WeightVector) -> Result<WeightVector> {
        self.zip_with(other, |a, b| a + b)
    }

    /// Pairwise symmetric difference: non-zero where exactly one input is
    /// non-zero, with that input's weight; zero where both or neither are.
    pub fn xor(&self, other: &WeightVector) -> Result<WeightVector> {
        self.zip_with(other, |a, b| {
            match (a == 0.0, b == 0.0) {
                (true, true) => 0.0,
                (true, false) => b,
                (false, true) => a,
                (false, false) => 0.0,
            }
        })
    }

    /// Pairwise difference: keeps `self`'s weight where `other` is zero,
    /// zeroes it where `other` is non-zero.
    pub fn not(&self, other: &WeightVector) -> Result<WeightVector> {
        self.zip_with(other, |a, b| if b == 0.0 { a } else { 0.0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_keeps_only_shared_nonzero() {
        let a = WeightVector::from_owned(vec![1.0, 0.0, 2.0]);
        let b = WeightVector::from_owned(vec![3.0, 3.0, 0.0]);
        let result = a.and(&b).unwrap();
        assert_eq!(result.as_slice(), &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn or_sums_weights() {
        let a = WeightVector::from_owned(vec![1.0, 0.0]);
        let b = WeightVector::from_owned(vec![2.0, 3.0]);
        let result = a.or(&b).unwrap();
        assert_eq!(result.as_slice(), &[3.0, 3.0]);
    }

    #[test]
    fn xor_keeps_exclusive_nonzero() {
        let a = WeightVector::from_owned(vec![1.0, 0.0, 5.0]);
        let b = WeightVector::from_owned(vec![0.0, 2.0, 5.0]);
        let result = a.xor(&b).unwrap();
        assert_eq!(result.as_slice(), &[1.0, 2.0, 0.0]);
    }

    #[test]
    fn not_clears_where_other_nonzero() {
        let a = WeightVector::from_owned(vec![1.0, 2.0, 3.0]);
        let b = WeightVector::from_owned(vec![0.0, 9.0, 0.0]);
        let result = a.not(&b).unwrap();
        assert_eq!(result.as_slice(), &[1.0, 0.0, 3.0]);
    }

    #[test]
    fn mismatched_lengths_error() {
        let a = WeightVector::from_owned(vec![1.0]);
        let b = WeightVector::from_owned(vec![1.0, 2.0]);
        assert!(a.and(&b).is_err());
    }

    #[test]
    fn mapped_vector_reports_not_owned() {
        static DATA: [f32; 3] = [1.0, 2.0, 3.0];
        let v = WeightVector::from_borrowed(&DATA);
        assert!(!v.is_owned());
        assert_eq!(v.get(1), 2.0);
    }
}
