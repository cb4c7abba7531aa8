//! Even Sampler
//!
//! Produces balanced, class-interleaved orderings over a
//! [`ClassificationDataset`] view. Each draw yields `num_classes * min_len`
//! view indices where `min_len` is the smallest per-class bucket size, laid
//! out so that every consecutive block of `num_classes` indices contains
//! exactly one index per class.
//!
//! With a `shot` limit the sampler keeps only the first `shot` indices per
//! class (in the view's natural order) and exposes the leftovers through
//! [`EvenSampler::remaining`], which is how few-shot train/holdout splits
//! are carved without touching the underlying dataset.

use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::dataset::index::ClassificationDataset;
use crate::utils::error::{DomainPairError, Result};

/// Balanced per-class index sampler.
///
/// Bucket contents are fixed at construction; only the order within buckets
/// changes between [`balance`](EvenSampler::balance) calls.
#[derive(Debug, Clone)]
pub struct EvenSampler {
    /// Per-class view indices, bucket `c` holding indices of label `c`
    buckets: Vec<Vec<usize>>,
    /// Indices dropped by the shot limit, per class
    remaining: Vec<Vec<usize>>,
    /// Smallest bucket size
    min_len: usize,
}

impl EvenSampler {
    /// Bucket the dataset's view indices by label.
    ///
    /// When `shot` is set, each bucket keeps its first `shot` entries in
    /// natural view order (no shuffling happens at construction); the
    /// dropped tail is kept in [`remaining`]. Classes with fewer than
    /// `shot` samples keep everything and leave no remainder. A class with
    /// zero samples is an error since no balanced ordering can include it.
    pub fn new(dataset: &ClassificationDataset, shot: Option<usize>) -> Result<Self> {
        let num_classes = dataset.num_classes();
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
        for view_idx in 0..dataset.len() {
            buckets[dataset.get(view_idx).label].push(view_idx);
        }

        for (label, bucket) in buckets.iter().enumerate() {
            if bucket.is_empty() {
                return Err(DomainPairError::EmptyClass(
                    dataset.class_names()[label].clone(),
                ));
            }
        }

        let mut remaining: Vec<Vec<usize>> = vec![Vec::new(); num_classes];
        if let Some(shot) = shot {
            for (bucket, rest) in buckets.iter_mut().zip(remaining.iter_mut()) {
                if bucket.len() > shot {
                    *rest = bucket.split_off(shot);
                }
            }
        }

        let min_len = buckets.iter().map(|b| b.len()).min().unwrap_or(0);
        debug!(
            "EvenSampler: {} classes, bucket sizes {:?}, min_len {}",
            num_classes,
            buckets.iter().map(|b| b.len()).collect::<Vec<_>>(),
            min_len
        );

        Ok(Self {
            buckets,
            remaining,
            min_len,
        })
    }

    /// Number of indices each [`balance`](EvenSampler::balance) call yields
    pub fn len(&self) -> usize {
        self.num_classes() * self.min_len
    }

    /// Check whether the sampler yields nothing
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of class buckets
    pub fn num_classes(&self) -> usize {
        self.buckets.len()
    }

    /// Smallest per-class bucket size
    pub fn min_len(&self) -> usize {
        self.min_len
    }

    /// Per-class bucket sizes after any shot truncation
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(|b| b.len()).collect()
    }

    /// Indices of class `label` retained in the sampler
    pub fn bucket(&self, label: usize) -> &[usize] {
        &self.buckets[label]
    }

    /// Indices of class `label` dropped by the shot limit
    pub fn remaining(&self, label: usize) -> &[usize] {
        &self.remaining[label]
    }

    /// All shot-dropped indices, flattened in class order
    pub fn remaining_flat(&self) -> Vec<usize> {
        self.remaining.iter().flatten().copied().collect()
    }

    /// Draw a fresh balanced ordering.
    ///
    /// Each bucket is independently reshuffled and truncated to `min_len`,
    /// then the truncated buckets are interleaved round-robin: position
    /// `i * num_classes + c` holds the `i`-th pick from class `c`.
    pub fn balance(&self, rng: &mut ChaCha8Rng) -> Vec<usize> {
        let mut shuffled: Vec<Vec<usize>> = self
            .buckets
            .iter()
            .map(|bucket| {
                let mut b = bucket.clone();
                b.shuffle(rng);
                b.truncate(self.min_len);
                b
            })
            .collect();

        let mut out = Vec::with_capacity(self.len());
        for i in 0..self.min_len {
            for bucket in shuffled.iter_mut() {
                out.push(bucket[i]);
            }
        }
        out
    }
}
