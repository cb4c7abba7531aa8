//! Dataset construction for few-shot domain adaptation.
//!
//! The pipeline flows index → sampler → pairs → paired view:
//! [`ClassificationDataset`] scans a directory-per-class tree,
//! [`EvenSampler`] produces class-balanced orderings over it,
//! [`PairGroups`] enumerates and subsamples the four pair groups, and
//! [`DomainPairDataset`] serves the result to Burn's dataloader via
//! [`PairBatcher`]. [`build_pair_datasets`] wires the whole thing up from a
//! [`crate::config::PairConfig`].

pub mod batcher;
pub mod index;
pub mod paired;
pub mod pairs;
pub mod prepare;
pub mod sampler;
pub mod transform;

pub use batcher::{PairBatch, PairBatcher, PairItem};
pub use index::{ClassificationDataset, ImageSample};
pub use paired::DomainPairDataset;
pub use pairs::{GroupCapacities, PairGroup, PairGroups, PairSample};
pub use prepare::{build_pair_datasets, PairSplits};
pub use sampler::EvenSampler;
pub use transform::{AugmentTransform, ResizeTransform, Transform};

#[cfg(test)]
pub(crate) mod testutil {
    use std::fs::{self, File};

    use tempfile::TempDir;

    /// Root with the given classes, each holding `count` empty .jpg files.
    /// Scan-level tests never decode, so empty files are enough.
    pub(crate) fn fixture_root(classes: &[(&str, usize)]) -> TempDir {
        let root = TempDir::new().unwrap();
        for (name, count) in classes {
            let dir = root.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            for i in 0..*count {
                File::create(dir.join(format!("{}_{:03}.jpg", name, i))).unwrap();
            }
        }
        root
    }
}
